// SPDX-License-Identifier: MPL-2.0
//! The navigation controller: translates link clicks into an
//! animation-synchronized remove-cascade followed by an append over the
//! chain of mounted tree nodes.
//!
//! The controller is a state machine:
//!
//! ```text
//! Launching -> Idle -> Collapsing -> AwaitingReflow -> Expanding -> Idle
//! ```
//!
//! The collapse cascade is strictly sequential in chain order and driven by
//! transition completions, never fixed delays: each node after the clicked
//! one's container plays its exit transition, is detached and disposed on
//! completion, and only then is the next node told to exit. After the
//! deepest node detaches, one tick is explicitly yielded (`AwaitingReflow`)
//! so layout is recomputed from settled geometry before the new subtree is
//! appended. Exactly one chain is rendered at any quiescent moment; during
//! a transition at most one cascade and one pending append exist, tied to a
//! single in-flight selected id.

use crate::app::session::{SessionState, SessionStore};
use crate::config::defaults::{duration_ms, metrics};
use crate::content::{ContentTree, NodeId};
use crate::error::{ContentError, Result};
use crate::support::fetcher::{CancellationToken, FetchEvent, FetchPayload};
use crate::viewer::animation::Sequencer;
use crate::viewer::magnifier::ZoomDirection;
use crate::viewer::media_pane::{MediaPane, PanePhase};
use crate::viewer::tree_node::{NodePhase, TreeNode};
use crate::viewer::{GuardHolder, PointerGuard};
use std::time::Duration;

/// Horizontal slide of the entrance transition; also the transform offset
/// compensated on a freshly-mounted leaf's first layout pass.
pub const APPEND_SLIDE: f32 = 40.0;

/// Horizontal gap between chain nodes.
const NODE_GUTTER: f32 = 32.0;

/// Controller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// One-time book-opening sequence around the root's entrance.
    Launching,
    Idle,
    /// Exit cascade running for a selected target.
    Collapsing { selected: NodeId },
    /// Cascade finished; yielding one tick before the append reads layout.
    AwaitingReflow { selected: NodeId },
    /// Entrance transition running for the appended target.
    Expanding { selected: NodeId },
}

/// Completion actions dispatched by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    LinkSelectDone { node: NodeId, target: NodeId },
    LinkDeselectDone { node: NodeId },
    RemoveDone { node: NodeId },
    Reflow,
    AppendDone { node: NodeId },
    PageRightDone,
    LaunchDone,
    MediaFadeOutDone { node: NodeId },
    MediaFadeInDone { node: NodeId },
}

/// Launch sequence state, for the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchPhase {
    /// Right page turning.
    PageRight(crate::viewer::animation::TransitionKey),
    /// Left page turning while the root enters.
    PageLeft(crate::viewer::animation::TransitionKey),
    Done,
}

/// A transfer the application should spawn for a freshly-mounted leaf.
#[derive(Debug)]
pub struct TransferRequest {
    pub node: NodeId,
    pub url: String,
    pub cancel: CancellationToken,
}

/// Top-level orchestrator of the navigation chain.
#[derive(Debug)]
pub struct NavigationController {
    tree: ContentTree,
    chain: Vec<TreeNode>,
    phase: Phase,
    launch: LaunchPhase,
    sequencer: Sequencer<Action>,
    guard: PointerGuard,
    session: SessionState,
    store: SessionStore,
    reduced_motion: bool,
    viewport: (f32, f32),
}

impl NavigationController {
    /// Builds the controller over a parsed content tree. Collaborator
    /// handles (the session store and the viewport) are injected rather
    /// than discovered.
    #[must_use]
    pub fn new(
        tree: ContentTree,
        reduced_motion: bool,
        store: SessionStore,
        viewport: (f32, f32),
    ) -> Self {
        let (session, warning) = store.load();
        if let Some(warning) = warning {
            eprintln!("session state: {warning}");
        }

        Self {
            tree,
            chain: Vec::new(),
            phase: Phase::Launching,
            launch: LaunchPhase::Done,
            sequencer: Sequencer::new(),
            guard: PointerGuard::new(),
            session,
            store,
            reduced_motion,
            viewport,
        }
    }

    /// Mounts the root node and starts the one-time launch sequence: the
    /// right book page turns, then the left page turns while the root
    /// enters. Pointer input stays suspended until the sequence completes.
    pub fn start(&mut self) -> Result<Vec<TransferRequest>> {
        let root_id = self.tree.root_id().clone();
        self.guard.acquire(GuardHolder::Navigation);
        self.phase = Phase::Launching;

        let transfers = self.mount(&root_id, 0.0, 0.0)?;

        let page_right = self.sequencer.begin(self.duration(duration_ms::PAGE_TURN));
        self.sequencer.on_complete(page_right, Action::PageRightDone);
        self.launch = LaunchPhase::PageRight(page_right);

        Ok(transfers)
    }

    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub fn launch_phase(&self) -> LaunchPhase {
        self.launch
    }

    #[must_use]
    pub fn chain(&self) -> &[TreeNode] {
        &self.chain
    }

    #[must_use]
    pub fn is_pointer_suspended(&self) -> bool {
        self.guard.is_suspended()
    }

    /// Whether ticks are needed: transitions live, a deferral pending, or a
    /// media fade waiting for the guard.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.sequencer.is_animating()
            || self
                .chain
                .iter()
                .any(|node| node.pane().is_some_and(|p| p.phase() == PanePhase::AwaitingFade))
    }

    /// Progress of a node or pane transition, `None` once finished.
    #[must_use]
    pub fn transition_progress(&self, key: crate::viewer::animation::TransitionKey) -> Option<f32> {
        self.sequencer.progress(key)
    }

    fn duration(&self, millis: u64) -> Duration {
        // Reduced motion keeps the state machine shape but collapses the
        // timing, so every completion still flows through the sequencer.
        if self.reduced_motion {
            Duration::ZERO
        } else {
            Duration::from_millis(millis)
        }
    }

    /// Chain origin of each node: left-to-right, indented by the widths of
    /// the preceding nodes.
    #[must_use]
    pub fn chain_origins(&self) -> Vec<(f32, f32)> {
        let mut x = metrics::MAIN_MARGIN;
        self.chain
            .iter()
            .map(|node| {
                let origin = (x, metrics::MAIN_MARGIN);
                x += node.width() + NODE_GUTTER;
                origin
            })
            .collect()
    }

    /// Handles a click on the link targeting `target`.
    ///
    /// Unknown ids are rejected with [`ContentError::UnknownTarget`] and
    /// ids no mounted link points at with
    /// [`ContentError::UnreachableTarget`]; both are precondition
    /// violations. Re-entrant clicks while a transition is in flight (or
    /// while a media fade holds the pointer guard) are ignored; mutual
    /// exclusion is the state machine itself, not just the suspended
    /// pointer events.
    pub fn navigate(&mut self, target: &NodeId) -> Result<Vec<TransferRequest>> {
        self.tree.resolve(target)?;

        if self.phase != Phase::Idle {
            return Ok(Vec::new());
        }

        let origin = self
            .chain
            .iter()
            .position(|node| node.link_index(target).is_some())
            .ok_or_else(|| ContentError::UnreachableTarget(target.to_string()))?;

        if !self.guard.acquire(GuardHolder::Navigation) {
            // A media fade holds the region; the click never happened.
            return Ok(Vec::new());
        }

        let select_duration = self.duration(duration_ms::LINK_SELECT);
        let origin_id = self.chain[origin].id().clone();

        // Deselect runs in parallel on the previously active link of the
        // origin node (the one whose subtree is being left).
        if let Some(selected) = self.chain[origin].selected_link_mut() {
            let key = self.sequencer.begin(select_duration);
            selected.begin_deselect(key);
            self.sequencer.on_complete(
                key,
                Action::LinkDeselectDone {
                    node: origin_id.clone(),
                },
            );
        }

        // The clicked link is marked selected-pending.
        if let Some(clicked) = self.chain[origin].link_targeting_mut(target) {
            let key = self.sequencer.begin(select_duration);
            clicked.begin_select(key);
            self.sequencer.on_complete(
                key,
                Action::LinkSelectDone {
                    node: origin_id,
                    target: target.clone(),
                },
            );
        }

        if origin + 1 < self.chain.len() {
            self.phase = Phase::Collapsing {
                selected: target.clone(),
            };
            self.begin_remove(origin + 1);
            Ok(Vec::new())
        } else {
            // Nothing to collapse: append directly, no reflow yield.
            self.phase = Phase::Expanding {
                selected: target.clone(),
            };
            self.append_selected(target.clone())
        }
    }

    /// Starts the exit transition of the chain node at `index`.
    fn begin_remove(&mut self, index: usize) {
        let duration = self.duration(duration_ms::NODE_REMOVE);
        let key = self.sequencer.begin(duration);
        let node = &mut self.chain[index];
        node.set_phase(NodePhase::Removing(key));
        self.sequencer.on_complete(
            key,
            Action::RemoveDone {
                node: node.id().clone(),
            },
        );
    }

    /// Creates, mounts and lays out the node for `id`; connector geometry
    /// comes from the clicked link's on-screen position in the chain tail.
    fn mount(&mut self, id: &NodeId, stem_width: f32, stem_height: f32) -> Result<Vec<TransferRequest>> {
        let content = self.tree.resolve(id)?;
        let mut node = TreeNode::new(
            content,
            stem_width,
            stem_height,
            self.reduced_motion,
            self.session.zoom_level,
        )?;

        let mut transfers = Vec::new();
        if let Some((url, cancel)) = node.mounted() {
            transfers.push(TransferRequest {
                node: id.clone(),
                url,
                cancel,
            });
        }

        self.chain.push(node);

        // Mount-time layout: the entrance transition is at full offset.
        let index = self.chain.len() - 1;
        let origin = self.chain_origins()[index];
        self.chain[index].relayout(self.viewport, origin, (APPEND_SLIDE, 0.0));

        Ok(transfers)
    }

    /// Appends the selected subtree and plays its entrance transition.
    fn append_selected(&mut self, selected: NodeId) -> Result<Vec<TransferRequest>> {
        let (stem_width, stem_height) = self
            .chain
            .last()
            .and_then(|node| node.stem_for_link(&selected))
            .unwrap_or((0.0, 0.0));

        let transfers = self.mount(&selected, stem_width, stem_height)?;

        let duration = self.duration(duration_ms::NODE_APPEND);
        let key = self.sequencer.begin(duration);
        let node = self.chain.last_mut().expect("just mounted");
        node.set_phase(NodePhase::Appending(key));
        self.sequencer.on_complete(
            key,
            Action::AppendDone {
                node: selected.clone(),
            },
        );

        self.phase = Phase::Expanding { selected };
        Ok(transfers)
    }

    /// Advances all live transitions and dispatches their completions.
    /// Also retries media fades that were waiting for the pointer guard.
    /// Returns transfers for any freshly-appended leaf.
    pub fn tick(&mut self, dt: Duration) -> Vec<TransferRequest> {
        let mut transfers = Vec::new();

        for action in self.sequencer.tick(dt) {
            match self.dispatch(action) {
                Ok(mut new_transfers) => transfers.append(&mut new_transfers),
                // Dispatch failures are precondition violations surfaced
                // when the selection was made; at this point the chain is
                // quiesced instead of left mid-transition.
                Err(error) => {
                    eprintln!("navigation: {error}");
                    self.guard.release(GuardHolder::Navigation);
                    self.phase = Phase::Idle;
                }
            }
        }

        self.retry_pending_fades();

        transfers
    }

    fn dispatch(&mut self, action: Action) -> Result<Vec<TransferRequest>> {
        match action {
            Action::LinkSelectDone { node, target } => {
                if let Some(node) = self.node_mut(&node) {
                    if let Some(link) = node.link_targeting_mut(&target) {
                        link.finish_select();
                    }
                }
                Ok(Vec::new())
            }
            Action::LinkDeselectDone { node } => {
                // The link is inactive-pending-reactivation: deselect
                // styling ends and the row is clickable again.
                if let Some(node) = self.node_mut(&node) {
                    for link in node.links_mut() {
                        link.finish_deselect();
                    }
                }
                Ok(Vec::new())
            }
            Action::RemoveDone { node } => self.on_remove_done(&node),
            Action::Reflow => {
                let Phase::AwaitingReflow { selected } = self.phase.clone() else {
                    return Ok(Vec::new());
                };
                self.append_selected(selected)
            }
            Action::AppendDone { node } => {
                if let Some(node) = self.node_mut(&node) {
                    node.set_phase(NodePhase::Steady);
                }
                self.guard.release(GuardHolder::Navigation);
                self.phase = Phase::Idle;
                Ok(Vec::new())
            }
            Action::PageRightDone => {
                // Left page turns while the root enters; the launch ends
                // when both complete.
                let page_left = self.sequencer.begin(self.duration(duration_ms::PAGE_TURN));
                let append = self.sequencer.begin(self.duration(duration_ms::NODE_APPEND));

                if let Some(root) = self.chain.first_mut() {
                    root.set_phase(NodePhase::Appending(append));
                }
                self.launch = LaunchPhase::PageLeft(page_left);
                self.sequencer
                    .on_complete_all(&[page_left, append], Action::LaunchDone);
                Ok(Vec::new())
            }
            Action::LaunchDone => {
                if let Some(root) = self.chain.first_mut() {
                    root.set_phase(NodePhase::Steady);
                }
                self.launch = LaunchPhase::Done;
                self.guard.release(GuardHolder::Navigation);
                self.phase = Phase::Idle;
                Ok(Vec::new())
            }
            Action::MediaFadeOutDone { node } => {
                let duration = self.duration(duration_ms::MEDIA_FADE);
                let done = Action::MediaFadeInDone { node: node.clone() };
                let index = self.chain.iter().position(|n| n.id() == &node);
                if let Some(index) = index {
                    if let Some(pane) = self.chain[index].pane_mut() {
                        // Swap placeholder for image only now, after the
                        // fade-out actually ended.
                        pane.finish_fade_out(&mut self.sequencer, duration, done);
                    }
                }
                Ok(Vec::new())
            }
            Action::MediaFadeInDone { node } => {
                let index = self.chain.iter().position(|n| n.id() == &node);
                if let Some(index) = index {
                    if let Some(pane) = self.chain[index].pane_mut() {
                        pane.finish_fade_in(&mut self.guard);
                    }
                }
                Ok(Vec::new())
            }
        }
    }

    /// One cascade step finished: detach and dispose the node, then either
    /// exit the next one or, after the deepest, yield one tick before
    /// appending.
    fn on_remove_done(&mut self, node: &NodeId) -> Result<Vec<TransferRequest>> {
        // A completion for a node already detached is a guarded no-op.
        let Some(index) = self.chain.iter().position(|n| n.id() == node) else {
            return Ok(Vec::new());
        };

        let mut removed = self.chain.remove(index);
        if let Some(zoom_level) = removed.dispose(&mut self.guard, &mut self.sequencer) {
            self.persist_zoom(zoom_level);
        }

        let Phase::Collapsing { selected } = self.phase.clone() else {
            return Ok(Vec::new());
        };

        if index < self.chain.len() {
            self.begin_remove(index);
        } else {
            // The deepest node is gone: the cascade's logical end. Yield
            // one tick so the append reads recomputed layout.
            self.phase = Phase::AwaitingReflow { selected };
            self.sequencer.defer(Action::Reflow);
        }

        Ok(Vec::new())
    }

    fn retry_pending_fades(&mut self) {
        let duration = self.duration(duration_ms::MEDIA_FADE);
        let guard = &mut self.guard;
        let sequencer = &mut self.sequencer;

        for node in &mut self.chain {
            let id = node.id().clone();
            if let Some(pane) = node.pane_mut() {
                if pane.phase() == PanePhase::AwaitingFade {
                    pane.try_begin_fade_out(
                        guard,
                        sequencer,
                        duration,
                        Action::MediaFadeOutDone { node: id },
                    );
                }
            }
        }
    }

    /// Routes a transfer event to the pane that owns it. Events for a node
    /// no longer on the chain are dropped (its transfer was aborted).
    pub fn on_media_event(&mut self, node: &NodeId, event: &FetchEvent) {
        let Some(index) = self.chain.iter().position(|n| n.id() == node) else {
            return;
        };
        let Some(pane) = self.chain[index].pane_mut() else {
            return;
        };

        match event {
            FetchEvent::Progress { loaded, total } => pane.on_progress(*loaded, *total),
            FetchEvent::Complete(FetchPayload::Binary(bytes)) => {
                pane.on_complete(bytes);
                self.retry_pending_fades();
            }
            FetchEvent::Complete(FetchPayload::Text(_)) => {
                eprintln!("image transfer for `{node}` returned text");
            }
            FetchEvent::Failed(error) => pane.on_failed(error),
        }
    }

    /// Viewport resize: re-lays out every mounted leaf.
    pub fn on_viewport_resized(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);

        let origins = self.chain_origins();
        for (node, origin) in self.chain.iter_mut().zip(origins) {
            node.relayout((width, height), origin, (0.0, 0.0));
        }
    }

    /// The deepest mounted pane, target of pointer and zoom input.
    pub fn active_pane_mut(&mut self) -> Option<&mut MediaPane> {
        self.chain.last_mut().and_then(TreeNode::pane_mut)
    }

    #[must_use]
    pub fn active_pane(&self) -> Option<&MediaPane> {
        self.chain.last().and_then(TreeNode::pane)
    }

    /// Applies a zoom step to the active pane at its last pointer position.
    pub fn zoom_active_pane(&mut self, direction: ZoomDirection, accelerated: bool) {
        let lens = crate::viewer::media_pane::default_lens_geometry();
        if let Some(pane) = self.active_pane_mut() {
            if pane.phase() == PanePhase::Ready {
                pane.apply_zoom(direction, accelerated, lens);
            }
        }
    }

    fn persist_zoom(&mut self, zoom_level: f32) {
        self.session.zoom_level = Some(zoom_level);
        if let Some(warning) = self.store.save(&self.session) {
            // Persistence failures degrade silently; restoration will fall
            // back to the default level.
            eprintln!("session state: {warning}");
        }
    }

    fn node_mut(&mut self, id: &NodeId) -> Option<&mut TreeNode> {
        self.chain.iter_mut().find(|node| node.id() == id)
    }

    /// Disposes the whole chain (persisting zoom levels); used at shutdown.
    pub fn shutdown(&mut self) {
        let mut chain = std::mem::take(&mut self.chain);
        for node in &mut chain {
            if let Some(zoom_level) = node.dispose(&mut self.guard, &mut self.sequencer) {
                self.persist_zoom(zoom_level);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::parser;
    use tempfile::tempdir;

    const MAP: &str = r#"
        <root id="root">
            <branch id="work" label="work">
                <leaf id="work-atlas" label="atlas">
                    <image url="images/atlas.png" width="800" height="600" zoomable="true"/>
                    <note label="shipped 2016"/>
                </leaf>
                <leaf id="work-ledger" label="ledger">
                    <image url="images/ledger.png" width="640" height="480"/>
                </leaf>
            </branch>
            <branch id="about" label="about">
                <leaf id="about-bio" label="bio">
                    <note label="hello"/>
                </leaf>
            </branch>
        </root>
    "#;

    const STEP: Duration = Duration::from_millis(100);

    fn controller() -> (NavigationController, tempfile::TempDir) {
        let temp_dir = tempdir().expect("temp dir");
        let tree = parser::parse(MAP).expect("map parses");
        let store = SessionStore::at(temp_dir.path().to_path_buf());
        let controller = NavigationController::new(tree, false, store, (1024.0, 768.0));
        (controller, temp_dir)
    }

    /// Ticks until quiescent, with a bound to catch livelocks.
    fn settle(controller: &mut NavigationController) -> Vec<TransferRequest> {
        let mut transfers = Vec::new();
        for _ in 0..200 {
            if !controller.is_animating() {
                break;
            }
            transfers.extend(controller.tick(STEP));
        }
        assert!(!controller.is_animating(), "controller failed to settle");
        transfers
    }

    fn launched() -> (NavigationController, tempfile::TempDir) {
        let (mut controller, temp_dir) = controller();
        controller.start().expect("start");
        settle(&mut controller);
        assert_eq!(*controller.phase(), Phase::Idle);
        (controller, temp_dir)
    }

    fn chain_ids(controller: &NavigationController) -> Vec<&str> {
        controller
            .chain()
            .iter()
            .map(|node| node.id().as_str())
            .collect()
    }

    #[test]
    fn launch_mounts_the_root_and_releases_input() {
        let (mut controller, _dir) = controller();
        controller.start().expect("start");

        assert!(controller.is_pointer_suspended());
        assert!(matches!(controller.launch_phase(), LaunchPhase::PageRight(_)));

        settle(&mut controller);

        assert_eq!(chain_ids(&controller), vec!["root"]);
        assert_eq!(controller.launch_phase(), LaunchPhase::Done);
        assert!(!controller.is_pointer_suspended());
    }

    #[test]
    fn navigating_into_a_branch_appends_one_node() {
        let (mut controller, _dir) = launched();

        let transfers = controller.navigate(&NodeId::from("work")).expect("navigate");
        assert!(transfers.is_empty(), "branches carry no media");
        assert!(matches!(controller.phase(), Phase::Expanding { .. }));
        assert!(controller.is_pointer_suspended());

        settle(&mut controller);

        assert_eq!(chain_ids(&controller), vec!["root", "work"]);
        assert_eq!(*controller.phase(), Phase::Idle);
        assert!(!controller.is_pointer_suspended());
    }

    #[test]
    fn navigating_to_a_leaf_requests_its_transfer() {
        let (mut controller, _dir) = launched();
        controller.navigate(&NodeId::from("work")).expect("navigate");
        settle(&mut controller);

        controller
            .navigate(&NodeId::from("work-atlas"))
            .expect("navigate");
        let transfers = settle(&mut controller);

        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].url, "images/atlas.png");
        assert_eq!(
            chain_ids(&controller),
            vec!["root", "work", "work-atlas"]
        );
    }

    #[test]
    fn unknown_target_is_rejected() {
        let (mut controller, _dir) = launched();
        match controller.navigate(&NodeId::from("phantom")) {
            Err(crate::error::Error::Content(ContentError::UnknownTarget(id))) => {
                assert_eq!(id, "phantom");
            }
            other => panic!("expected UnknownTarget, got {other:?}"),
        }
    }

    #[test]
    fn known_but_unreachable_target_is_rejected() {
        let (mut controller, _dir) = launched();
        // work-atlas exists in the tree but no mounted link points at it.
        match controller.navigate(&NodeId::from("work-atlas")) {
            Err(crate::error::Error::Content(ContentError::UnreachableTarget(id))) => {
                assert_eq!(id, "work-atlas");
            }
            other => panic!("expected UnreachableTarget, got {other:?}"),
        }
    }

    #[test]
    fn reentrant_clicks_are_ignored_while_in_flight() {
        let (mut controller, _dir) = launched();
        controller.navigate(&NodeId::from("work")).expect("navigate");
        assert!(matches!(controller.phase(), Phase::Expanding { .. }));

        // A second click during the transition does nothing.
        let transfers = controller.navigate(&NodeId::from("about")).expect("ignored");
        assert!(transfers.is_empty());

        settle(&mut controller);
        assert_eq!(chain_ids(&controller), vec!["root", "work"]);
    }

    #[test]
    fn sibling_navigation_cascades_in_order_and_appends_once() {
        let (mut controller, _dir) = launched();
        controller.navigate(&NodeId::from("work")).expect("navigate");
        settle(&mut controller);
        controller
            .navigate(&NodeId::from("work-atlas"))
            .expect("navigate");
        settle(&mut controller);

        // Root -> work -> work-atlas mounted; clicking "about" on the root
        // removes work and work-atlas (in that order) and appends about.
        let atlas_token = controller
            .chain()
            .iter()
            .find(|n| n.id().as_str() == "work-atlas")
            .and_then(|n| n.pane())
            .expect("atlas pane")
            .cancellation_token();

        controller.navigate(&NodeId::from("about")).expect("navigate");
        assert!(matches!(controller.phase(), Phase::Collapsing { .. }));

        settle(&mut controller);

        assert_eq!(chain_ids(&controller), vec!["root", "about"]);
        assert_eq!(*controller.phase(), Phase::Idle);
        assert!(!controller.is_pointer_suspended());
        assert!(
            atlas_token.load(std::sync::atomic::Ordering::SeqCst),
            "the leaf's in-flight transfer was aborted"
        );
    }

    #[test]
    fn full_cycle_leaves_exactly_one_chain() {
        let (mut controller, _dir) = launched();

        for target in ["work", "work-atlas"] {
            controller.navigate(&NodeId::from(target)).expect("navigate");
            settle(&mut controller);
        }

        // Back via the sibling link on "work".
        controller
            .navigate(&NodeId::from("work-ledger"))
            .expect("navigate");
        settle(&mut controller);

        assert_eq!(
            chain_ids(&controller),
            vec!["root", "work", "work-ledger"]
        );
    }

    #[test]
    fn selected_link_survives_and_deselects_on_return() {
        use crate::viewer::text_link::LinkPhase;
        let (mut controller, _dir) = launched();

        controller.navigate(&NodeId::from("work")).expect("navigate");
        settle(&mut controller);

        let root = &controller.chain()[0];
        let work_link = root
            .links()
            .find(|l| l.target() == Some(&NodeId::from("work")))
            .expect("work link");
        assert_eq!(work_link.phase(), LinkPhase::Selected);

        controller.navigate(&NodeId::from("about")).expect("navigate");
        settle(&mut controller);

        let root = &controller.chain()[0];
        let work_link = root
            .links()
            .find(|l| l.target() == Some(&NodeId::from("work")))
            .expect("work link");
        assert_eq!(work_link.phase(), LinkPhase::Active, "deselected");

        let about_link = root
            .links()
            .find(|l| l.target() == Some(&NodeId::from("about")))
            .expect("about link");
        assert_eq!(about_link.phase(), LinkPhase::Selected);
    }

    #[test]
    fn media_completion_fades_and_releases_the_guard() {
        let (mut controller, _dir) = launched();
        controller.navigate(&NodeId::from("work")).expect("navigate");
        settle(&mut controller);
        controller
            .navigate(&NodeId::from("work-atlas"))
            .expect("navigate");
        settle(&mut controller);

        let image = image_rs::RgbaImage::from_pixel(8, 8, image_rs::Rgba([1, 2, 3, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image_rs::DynamicImage::ImageRgba8(image)
            .write_to(&mut bytes, image_rs::ImageFormat::Png)
            .expect("encode");

        controller.on_media_event(
            &NodeId::from("work-atlas"),
            &FetchEvent::Complete(FetchPayload::Binary(bytes.into_inner())),
        );

        assert!(controller.is_pointer_suspended(), "fade holds the guard");
        settle(&mut controller);

        let pane = controller.active_pane().expect("pane");
        assert_eq!(pane.phase(), PanePhase::Ready);
        assert!(!controller.is_pointer_suspended());
    }

    #[test]
    fn media_events_for_detached_nodes_are_dropped() {
        let (mut controller, _dir) = launched();
        controller.navigate(&NodeId::from("work")).expect("navigate");
        settle(&mut controller);

        // No such node mounted; must not panic or mutate anything.
        controller.on_media_event(
            &NodeId::from("work-atlas"),
            &FetchEvent::Progress {
                loaded: 10,
                total: Some(100),
            },
        );
        assert_eq!(chain_ids(&controller), vec!["root", "work"]);
    }

    #[test]
    fn disposed_leaf_persists_its_zoom_level() {
        let temp_dir = tempdir().expect("temp dir");
        let tree = parser::parse(MAP).expect("map parses");
        let store = SessionStore::at(temp_dir.path().to_path_buf());
        let mut controller =
            NavigationController::new(tree, false, store.clone(), (1024.0, 768.0));

        controller.start().expect("start");
        settle(&mut controller);
        controller.navigate(&NodeId::from("work")).expect("navigate");
        settle(&mut controller);
        controller
            .navigate(&NodeId::from("work-atlas"))
            .expect("navigate");
        settle(&mut controller);

        // Navigate away; the zoomable pane's level lands in the store.
        controller
            .navigate(&NodeId::from("work-ledger"))
            .expect("navigate");
        settle(&mut controller);

        let (state, _) = store.load();
        assert!(state.zoom_level.is_some());
    }

    #[test]
    fn viewport_resize_relayouts_the_leaf() {
        let (mut controller, _dir) = launched();
        controller.navigate(&NodeId::from("work")).expect("navigate");
        settle(&mut controller);
        controller
            .navigate(&NodeId::from("work-atlas"))
            .expect("navigate");
        settle(&mut controller);

        let before = controller.active_pane().expect("pane").fit();
        controller.on_viewport_resized(500.0, 400.0);
        let after = controller.active_pane().expect("pane").fit();

        assert_ne!(before, after);
        assert!(after.width <= 500);
    }
}
