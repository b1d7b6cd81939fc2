// SPDX-License-Identifier: MPL-2.0
//! Top-level messages and runtime flags for the application.

use crate::content::NodeId;
use crate::error::Error;
use crate::support::fetcher::FetchEvent;
use crate::viewer::view::Interaction;
use std::path::PathBuf;

/// Top-level messages consumed by `App::update`.
#[derive(Debug, Clone)]
pub enum Message {
    /// Content map transfer finished (raw XML text or a fatal error).
    MapLoaded(Result<String, Error>),
    /// A viewer widget interaction.
    Interaction(Interaction),
    /// An event from one image transfer.
    Media { node: NodeId, event: FetchEvent },
    /// Animation tick while transitions are live.
    Tick(iced::time::Instant),
    /// The window was resized.
    WindowResized(iced::Size),
    /// Keyboard modifiers changed (tracked for accelerated zoom).
    ModifiersChanged(iced::keyboard::Modifiers),
    /// A key was pressed and not captured by a widget.
    KeyPressed(iced::keyboard::Key),
    /// The mouse wheel scrolled.
    WheelScrolled(iced::mouse::ScrollDelta),
    /// Window close was requested; persist state before exiting.
    CloseRequested(iced::window::Id),
}

/// Runtime flags passed in from the CLI to tweak startup behavior.
#[derive(Debug, Default)]
pub struct Flags {
    /// Optional content map path or URL; overrides configuration and the
    /// bundled default map.
    pub map: Option<String>,
    /// Disables loupe zoomability and collapses transition timing.
    pub reduced_motion: bool,
    /// Optional data directory override for the session state file.
    /// Takes precedence over the `FOLIO_DATA_DIR` environment variable.
    pub data_dir: Option<PathBuf>,
}
