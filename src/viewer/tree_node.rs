// SPDX-License-Identifier: MPL-2.0
//! Visual projection of one content-tree node: its text rows, its branch
//! connector, and (for leaves) its media pane.

use crate::config::defaults::{metrics, zoom};
use crate::content::{ContentNode, LinkSpec, NodeId, NodeKind};
use crate::error::{ContentError, Result};
use crate::support::fetcher::CancellationToken;
use crate::viewer::animation::{Sequencer, TransitionKey};
use crate::viewer::connector::BracketSpec;
use crate::viewer::media_pane::MediaPane;
use crate::viewer::text_link::TextLink;
use crate::viewer::PointerGuard;

/// Mount lifecycle of a node on the navigation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePhase {
    /// Entrance transition playing.
    Appending(TransitionKey),
    /// Mounted and quiescent.
    Steady,
    /// Exit transition playing; detached when it completes.
    Removing(TransitionKey),
}

/// One mounted node of the navigation chain.
#[derive(Debug)]
pub struct TreeNode {
    id: NodeId,
    kind: NodeKind,
    phase: NodePhase,
    bracket: Option<BracketSpec>,
    // Most-recently-created first, as built; `links()` yields document
    // order. The internal order is an implementation detail.
    links: Vec<TextLink>,
    pane: Option<MediaPane>,
    mounted: bool,
    disposed: bool,
    // One-shot entrance transform correction, applied on the first layout
    // after mount and then cleared.
    entrance_offset_pending: bool,
    previous_viewport: Option<(f32, f32)>,
}

impl TreeNode {
    /// Projects a content node. `stem_width`/`stem_height` position the
    /// branch connector relative to the link that opened this node; both
    /// are ignored for the root, which draws no connector.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::EmptyNode`] for a node with nothing to
    /// project; constructing from a childless node is a programming error.
    pub fn new(
        node: &ContentNode,
        stem_width: f32,
        stem_height: f32,
        reduced_motion: bool,
        persisted_zoom: Option<f32>,
    ) -> Result<Self> {
        if node.links.is_empty() && node.image.is_none() {
            return Err(ContentError::EmptyNode(node.id.to_string()).into());
        }

        let pane = match (&node.image, node.kind) {
            (Some(image), NodeKind::Leaf) => Some(MediaPane::new(
                image.clone(),
                reduced_motion,
                persisted_zoom,
            )),
            _ => None,
        };

        let mut links: Vec<TextLink> = Vec::with_capacity(node.links.len() + 1);
        for spec in &node.links {
            links.insert(0, TextLink::new(spec.clone()));
        }

        // Zoomable leaves get the zoom instruction appended as a footnote.
        if pane.as_ref().is_some_and(MediaPane::is_zoomable) {
            let footnote = LinkSpec {
                footnote: true,
                ..LinkSpec::text(zoom::INSTRUCTION)
            };
            links.insert(0, TextLink::new(footnote));
        }

        let bracket = (node.kind != NodeKind::Root)
            .then(|| BracketSpec::new(stem_width, stem_height));

        Ok(Self {
            id: node.id.clone(),
            kind: node.kind,
            phase: NodePhase::Steady,
            bracket,
            links,
            pane,
            mounted: false,
            disposed: false,
            entrance_offset_pending: true,
            previous_viewport: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn phase(&self) -> NodePhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: NodePhase) {
        self.phase = phase;
    }

    #[must_use]
    pub fn bracket(&self) -> Option<&BracketSpec> {
        self.bracket.as_ref()
    }

    #[must_use]
    pub fn pane(&self) -> Option<&MediaPane> {
        self.pane.as_ref()
    }

    pub fn pane_mut(&mut self) -> Option<&mut MediaPane> {
        self.pane.as_mut()
    }

    /// Text rows in document order.
    pub fn links(&self) -> impl DoubleEndedIterator<Item = &TextLink> {
        self.links.iter().rev()
    }

    /// Mutable access to every text row (internal order).
    pub fn links_mut(&mut self) -> impl Iterator<Item = &mut TextLink> {
        self.links.iter_mut()
    }

    /// Mutable access to the row targeting `id`.
    pub fn link_targeting_mut(&mut self, id: &NodeId) -> Option<&mut TextLink> {
        self.links
            .iter_mut()
            .find(|link| link.target() == Some(id))
    }

    /// The row currently marked selected, if any.
    pub fn selected_link_mut(&mut self) -> Option<&mut TextLink> {
        use crate::viewer::text_link::LinkPhase;
        self.links.iter_mut().find(|link| {
            matches!(
                link.phase(),
                LinkPhase::Selected | LinkPhase::Selecting(_)
            )
        })
    }

    /// Document-order row index of the link targeting `id`.
    #[must_use]
    pub fn link_index(&self, id: &NodeId) -> Option<usize> {
        self.links()
            .position(|link| link.target() == Some(id))
    }

    /// Rendered width of the node: its widest row.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.links
            .iter()
            .map(TextLink::width)
            .fold(0.0_f32, f32::max)
    }

    /// Height of the node's text block.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn text_height(&self) -> f32 {
        self.links.len() as f32 * metrics::ROW_HEIGHT
    }

    /// Connector stem deltas for a navigation out of this node through the
    /// link targeting `id`: the parent-to-link width delta (zero when this
    /// node is the root) and the distance down to the link's vertical
    /// center.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stem_for_link(&self, id: &NodeId) -> Option<(f32, f32)> {
        let index = self.link_index(id)?;
        let link = self.links().nth(index)?;

        let stem_width = if self.kind == NodeKind::Root {
            0.0
        } else {
            (self.width() - link.width()).max(0.0)
        };
        let stem_height = index as f32 * metrics::ROW_HEIGHT + metrics::ROW_HEIGHT / 2.0;

        Some((stem_width, stem_height))
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Observes insertion into the chain. For leaves this starts the image
    /// transfer; loading begins only once the node is actually mounted.
    /// Returns the transfer to spawn, if any.
    pub fn mounted(&mut self) -> Option<(String, CancellationToken)> {
        self.mounted = true;
        self.pane.as_mut().and_then(MediaPane::load)
    }

    /// Responsive layout for a mounted leaf against the viewport, at the
    /// node's chain origin. No-op when the viewport is unchanged since the
    /// last pass. The entrance transform offset is honored exactly once,
    /// on the first pass after mount.
    #[allow(clippy::cast_precision_loss)]
    pub fn relayout(
        &mut self,
        viewport: (f32, f32),
        origin: (f32, f32),
        entrance_offset: (f32, f32),
    ) {
        if self.previous_viewport == Some(viewport) {
            return;
        }

        let (offset_w, offset_h) = if self.entrance_offset_pending {
            self.entrance_offset_pending = false;
            entrance_offset
        } else {
            (0.0, 0.0)
        };

        let max_width = viewport.0 - origin.0 - metrics::MAIN_MARGIN + offset_w;

        if let Some(pane) = &mut self.pane {
            let max_height =
                viewport.1 - origin.1 - self.links.len() as f32 * metrics::ROW_HEIGHT
                    - metrics::MAIN_MARGIN
                    + offset_h;

            pane.resize(
                max_width,
                max_height,
                metrics::PICTURE_MIN_WIDTH,
                origin.0 - offset_w,
                origin.1 - offset_h,
            );
        }

        self.previous_viewport = Some(viewport);
    }

    /// Releases the node: disposes the media pane (aborting its transfer),
    /// drops rows and connector, and yields the pane's final zoom level for
    /// persistence. Idempotent.
    pub fn dispose<A>(
        &mut self,
        guard: &mut PointerGuard,
        sequencer: &mut Sequencer<A>,
    ) -> Option<f32> {
        if self.disposed {
            return None;
        }
        self.disposed = true;
        self.mounted = false;

        let zoom_level = self
            .pane
            .as_mut()
            .and_then(|pane| pane.dispose(guard, sequencer));

        self.links.clear();
        self.bracket = None;

        zoom_level
    }
}
