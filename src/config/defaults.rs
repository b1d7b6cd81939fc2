// SPDX-License-Identifier: MPL-2.0
//! Centralized defaults and tuning constants.
//!
//! Grouped by concern so call sites read as `defaults::zoom::MAX` etc.

/// Loupe zoom tuning.
pub mod zoom {
    /// Upper bound for the loupe zoom level.
    pub const MAX: f32 = 4.0;

    /// Zoom level restored when no session value exists.
    pub const DEFAULT: f32 = 1.5;

    /// Zoom increment per wheel notch or key press.
    pub const STEP: f32 = 0.01;

    /// Zoom increment while the accelerator modifier is held.
    pub const STEP_ACCELERATED: f32 = 0.1;

    /// Footnote appended beneath zoomable images.
    pub const INSTRUCTION: &str = "image zoom:  mouse over and scroll or press \
                                   keyboard arrows.  hold shift to accelerate.";
}

/// Transition durations, in milliseconds.
///
/// The sequencer treats these as the single source of truth; the view only
/// ever renders progress, never its own timing.
pub mod duration_ms {
    /// Node entrance (append) transition.
    pub const NODE_APPEND: u64 = 500;

    /// Node exit (remove) transition.
    pub const NODE_REMOVE: u64 = 350;

    /// Link select / deselect transition.
    pub const LINK_SELECT: u64 = 300;

    /// Placeholder fade-out and image fade-in.
    pub const MEDIA_FADE: u64 = 400;

    /// One page of the launch book-opening sequence.
    pub const PAGE_TURN: u64 = 900;

    /// Animation tick interval while any transition is live.
    pub const TICK: u64 = 16;
}

/// Row and chain layout metrics, in logical pixels.
pub mod metrics {
    /// Height of one text-link row.
    pub const ROW_HEIGHT: f32 = 28.0;

    /// Approximate advance width per character for link sizing.
    pub const CHAR_WIDTH: f32 = 9.0;

    /// Horizontal padding added around a link's text.
    pub const LINK_PADDING: f32 = 12.0;

    /// Outer margin of the content region.
    pub const MAIN_MARGIN: f32 = 24.0;

    /// Minimum rendered image width.
    pub const PICTURE_MIN_WIDTH: f32 = 100.0;

    /// Diameter of the loupe lens.
    pub const LENS_SIZE: f32 = 220.0;

    /// Edge length of the preloader glyph inside the placeholder.
    pub const PRELOADER_GLYPH: f32 = 48.0;
}

/// Startup window dimensions.
pub mod window {
    pub const WIDTH: f32 = 1024.0;
    pub const HEIGHT: f32 = 768.0;
}
