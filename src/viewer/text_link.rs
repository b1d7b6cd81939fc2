// SPDX-License-Identifier: MPL-2.0
//! One text row of a tree node: a navigable link, an external anchor, a
//! footnote, a whitespace spacer, or plain text.
//!
//! Navigable links carry a small selection state machine driven by the
//! navigation controller: the clicked link plays a select transition and
//! stays `Selected` while its subtree is on the chain; when navigation
//! leaves it, a deselect transition returns it to `Active`.

use crate::config::defaults::metrics;
use crate::content::{LinkSpec, NodeId};
use crate::viewer::animation::TransitionKey;

/// Selection lifecycle of one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    /// Non-interactive row (plain text, whitespace, footnote).
    Static,
    /// Clickable and idle.
    Active,
    /// Select transition playing after a click.
    Selecting(TransitionKey),
    /// This link's subtree is the current navigation path.
    Selected,
    /// Deselect transition playing; reverts to `Active` when done.
    Deselecting(TransitionKey),
}

/// View state for one text row.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLink {
    spec: LinkSpec,
    phase: LinkPhase,
}

impl TextLink {
    #[must_use]
    pub fn new(spec: LinkSpec) -> Self {
        let phase = if spec.target.is_some() || spec.href.is_some() {
            LinkPhase::Active
        } else {
            LinkPhase::Static
        };
        Self { spec, phase }
    }

    #[must_use]
    pub fn spec(&self) -> &LinkSpec {
        &self.spec
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.spec.label
    }

    #[must_use]
    pub fn phase(&self) -> LinkPhase {
        self.phase
    }

    /// The navigation target, for links that have one.
    #[must_use]
    pub fn target(&self) -> Option<&NodeId> {
        self.spec.target.as_ref()
    }

    /// Whether a click on this row should be routed to the controller.
    #[must_use]
    pub fn is_navigable(&self) -> bool {
        self.spec.target.is_some()
            && matches!(self.phase, LinkPhase::Active | LinkPhase::Deselecting(_))
    }

    /// Estimated rendered width, used for connector stem geometry.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn width(&self) -> f32 {
        self.spec.label.chars().count() as f32 * metrics::CHAR_WIDTH + metrics::LINK_PADDING
    }

    /// Marks the link selected-pending: called when a click on it starts a
    /// navigation, with the select transition's key.
    pub fn begin_select(&mut self, key: TransitionKey) {
        self.phase = LinkPhase::Selecting(key);
    }

    /// Completes the select transition.
    pub fn finish_select(&mut self) {
        if matches!(self.phase, LinkPhase::Selecting(_)) {
            self.phase = LinkPhase::Selected;
        }
    }

    /// Starts the deselect transition on a previously selected link.
    pub fn begin_deselect(&mut self, key: TransitionKey) {
        if matches!(self.phase, LinkPhase::Selected | LinkPhase::Selecting(_)) {
            self.phase = LinkPhase::Deselecting(key);
        }
    }

    /// Completes the deselect transition; the link is clickable again.
    pub fn finish_deselect(&mut self) {
        if matches!(self.phase, LinkPhase::Deselecting(_)) {
            self.phase = LinkPhase::Active;
        }
    }
}
