// SPDX-License-Identifier: MPL-2.0
//! One image's full lifecycle: placeholder, streamed load, fade-in,
//! responsive resizing and the optional loupe.
//!
//! The pane is a state machine:
//!
//! ```text
//! Idle -> Preloading -> AwaitingFade -> FadingOutPlaceholder
//!      -> FadingInImage -> Ready
//! ```
//!
//! The fade-out is triggered by load completion (never by resize), the
//! placeholder is swapped for the image only after the fade-out transition
//! ends, and pointer input over the content region is suspended for the
//! whole fade sequence. `AwaitingFade` exists to serialize that suspension
//! against the navigation cascade: the fade starts only once the pointer
//! guard is free.

use crate::config::defaults::metrics;
use crate::content::ImageSpec;
use crate::error::FetchError;
use crate::support::fetcher::CancellationToken;
use crate::viewer::animation::{Sequencer, TransitionKey};
use crate::viewer::magnifier::{LensGeometry, Magnifier, RenderTransform, ZoomDirection};
use crate::viewer::resize_math::{self, FitSize};
use crate::viewer::{GuardHolder, PointerGuard};
use iced::widget::image as iced_image;
use std::sync::atomic::Ordering;

/// Lifecycle phase of the pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanePhase {
    /// Constructed; loading not requested yet.
    Idle,
    /// Transfer running; placeholder visible.
    Preloading,
    /// Transfer complete; waiting for the pointer guard before fading.
    AwaitingFade,
    /// Placeholder fading out.
    FadingOutPlaceholder(TransitionKey),
    /// Image fading in.
    FadingInImage(TransitionKey),
    /// Image displayed.
    Ready,
    /// Transfer or decode failed; the leaf renders without media.
    Failed,
    /// Released.
    Disposed,
}

/// Decoded image content: an iced handle for display plus the RGBA pixels
/// for lens cropping.
#[derive(Debug, Clone)]
pub struct ImageContent {
    pub handle: iced_image::Handle,
    rgba: image_rs::RgbaImage,
}

impl ImageContent {
    /// Decodes encoded bytes (PNG, JPEG, ...) into displayable content.
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let decoded = image_rs::load_from_memory(bytes).map_err(|e| e.to_string())?;
        let rgba = decoded.to_rgba8();
        Ok(Self {
            handle: iced_image::Handle::from_bytes(bytes.to_vec()),
            rgba,
        })
    }

    #[must_use]
    pub fn decoded_width(&self) -> u32 {
        self.rgba.width()
    }

    #[must_use]
    pub fn decoded_height(&self) -> u32 {
        self.rgba.height()
    }
}

/// Transfer progress for the placeholder preloader glyph.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

impl LoadProgress {
    /// Fraction in `[0, 1]`, zero while the total is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f32 {
        match self.total {
            Some(total) if total > 0 => (self.loaded as f32 / total as f32).min(1.0),
            _ => 0.0,
        }
    }

    /// Vertical position of the preloader glyph inside a placeholder of the
    /// given height, matching the transfer fraction.
    #[must_use]
    pub fn glyph_offset(&self, box_height: f32) -> f32 {
        (box_height - metrics::PRELOADER_GLYPH).max(0.0) * self.fraction()
    }
}

/// View state for one image.
#[derive(Debug)]
pub struct MediaPane {
    spec: ImageSpec,
    zoomable: bool,
    phase: PanePhase,
    progress: LoadProgress,
    content: Option<ImageContent>,
    fit: FitSize,
    offset: (i32, i32),
    magnifier: Option<Magnifier>,
    cancel: CancellationToken,
    pointer: Option<(f32, f32)>,
}

impl MediaPane {
    /// Builds a pane for an image descriptor. `reduced_motion` disables
    /// zoomability regardless of the descriptor; `persisted_zoom` seeds the
    /// magnifier's one-time restore.
    #[must_use]
    pub fn new(spec: ImageSpec, reduced_motion: bool, persisted_zoom: Option<f32>) -> Self {
        let zoomable = spec.zoomable && !reduced_motion;
        let fit = FitSize {
            ratio: 1.0,
            width: spec.native_width,
            height: spec.native_height,
        };

        Self {
            spec,
            zoomable,
            phase: PanePhase::Idle,
            progress: LoadProgress::default(),
            content: None,
            fit,
            offset: (0, 0),
            magnifier: zoomable.then(|| Magnifier::new(persisted_zoom)),
            cancel: CancellationToken::default(),
            pointer: None,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.spec.url
    }

    #[must_use]
    pub fn phase(&self) -> PanePhase {
        self.phase
    }

    #[must_use]
    pub fn is_zoomable(&self) -> bool {
        self.zoomable
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.content.is_some()
    }

    #[must_use]
    pub fn progress(&self) -> LoadProgress {
        self.progress
    }

    /// Current scaled box.
    #[must_use]
    pub fn fit(&self) -> FitSize {
        self.fit
    }

    #[must_use]
    pub fn content(&self) -> Option<&ImageContent> {
        self.content.as_ref()
    }

    #[must_use]
    pub fn magnifier(&self) -> Option<&Magnifier> {
        self.magnifier.as_ref()
    }

    #[must_use]
    pub fn pointer(&self) -> Option<(f32, f32)> {
        self.pointer
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        std::sync::Arc::clone(&self.cancel)
    }

    /// Whether the fetch was aborted (diagnostic for tests and teardown).
    #[must_use]
    pub fn is_fetch_aborted(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Requests loading. Returns the transfer to start (url plus
    /// cancellation token), or `None` when a transfer is already running or
    /// done, collapsing concurrent calls into one in-flight fetch.
    pub fn load(&mut self) -> Option<(String, CancellationToken)> {
        match self.phase {
            PanePhase::Idle => {
                self.phase = PanePhase::Preloading;
                Some((self.spec.url.clone(), self.cancellation_token()))
            }
            _ => None,
        }
    }

    /// Records transfer progress for the placeholder glyph.
    pub fn on_progress(&mut self, loaded: u64, total: Option<u64>) {
        if self.phase == PanePhase::Preloading {
            self.progress = LoadProgress { loaded, total };
        }
    }

    /// Handles transfer completion: decodes the bytes and arms the fade.
    /// A decode failure degrades the pane to `Failed` (the leaf renders
    /// without media) and logs a warning.
    pub fn on_complete(&mut self, bytes: &[u8]) {
        if self.phase != PanePhase::Preloading {
            return;
        }

        match ImageContent::decode(bytes) {
            Ok(content) => {
                if content.decoded_width() != self.spec.native_width
                    || content.decoded_height() != self.spec.native_height
                {
                    eprintln!(
                        "image {} decodes to {}x{}, map declares {}x{}",
                        self.spec.url,
                        content.decoded_width(),
                        content.decoded_height(),
                        self.spec.native_width,
                        self.spec.native_height,
                    );
                }

                self.content = Some(content);
                if let Some(magnifier) = &mut self.magnifier {
                    magnifier.set_content();
                }
                self.phase = PanePhase::AwaitingFade;
            }
            Err(message) => {
                eprintln!("image {} failed to decode: {message}", self.spec.url);
                self.phase = PanePhase::Failed;
            }
        }
    }

    /// Handles a transfer failure: the media area fails silently.
    pub fn on_failed(&mut self, error: &FetchError) {
        if matches!(error, FetchError::Aborted) {
            return;
        }
        eprintln!("image {} failed to load: {error}", self.spec.url);
        self.phase = PanePhase::Failed;
    }

    /// Starts the placeholder fade-out if the pane is armed and the pointer
    /// guard is free. `done` fires when the fade-out transition completes.
    /// Returns whether the fade began.
    pub fn try_begin_fade_out<A>(
        &mut self,
        guard: &mut PointerGuard,
        sequencer: &mut Sequencer<A>,
        duration: std::time::Duration,
        done: A,
    ) -> bool {
        if self.phase != PanePhase::AwaitingFade || !guard.acquire(GuardHolder::MediaFade) {
            return false;
        }

        let key = sequencer.begin(duration);
        sequencer.on_complete(key, done);
        self.phase = PanePhase::FadingOutPlaceholder(key);
        true
    }

    /// Completes the fade-out: the placeholder subtree is replaced by the
    /// image, which starts fading in. `done` fires when the fade-in ends.
    pub fn finish_fade_out<A>(
        &mut self,
        sequencer: &mut Sequencer<A>,
        duration: std::time::Duration,
        done: A,
    ) {
        if !matches!(self.phase, PanePhase::FadingOutPlaceholder(_)) {
            return;
        }

        let key = sequencer.begin(duration);
        sequencer.on_complete(key, done);
        self.phase = PanePhase::FadingInImage(key);
    }

    /// Completes the fade-in and releases the pointer guard.
    pub fn finish_fade_in(&mut self, guard: &mut PointerGuard) {
        if matches!(self.phase, PanePhase::FadingInImage(_)) {
            self.phase = PanePhase::Ready;
            guard.release(GuardHolder::MediaFade);
        }
    }

    /// Responsive resize against the available box. Recomputes the
    /// proportional fit, updates the magnifier's minimum zoom, and records
    /// the viewport offset of the image box for pointer mapping. While the
    /// image is not loaded the placeholder outline simply redraws at the
    /// new box on the next view pass.
    #[allow(clippy::cast_possible_truncation)]
    pub fn resize(
        &mut self,
        max_width: f32,
        max_height: f32,
        min_width: f32,
        offset_x: f32,
        offset_y: f32,
    ) {
        self.fit = resize_math::scale_to_fit(
            self.spec.native_width,
            self.spec.native_height,
            max_width,
            max_height,
            min_width,
        );

        self.offset = (offset_x.round() as i32, offset_y.round() as i32);

        if let Some(magnifier) = &mut self.magnifier {
            magnifier.set_minimum_zoom(self.fit.ratio);
        }
    }

    /// Maps a viewport pointer position into image-box coordinates.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_box_coordinates(&self, viewport_x: f32, viewport_y: f32) -> (f32, f32) {
        (
            viewport_x - self.offset.0 as f32,
            viewport_y - self.offset.1 as f32,
        )
    }

    /// Pointer entered the image.
    pub fn pointer_entered(&mut self) {
        if self.pointer.is_none() {
            self.pointer = Some((0.0, 0.0));
        }
    }

    /// Pointer moved over the image (box coordinates). Re-pans the loupe.
    pub fn pointer_moved(&mut self, x: f32, y: f32, lens: LensGeometry) -> Option<RenderTransform> {
        self.pointer = Some((x, y));

        let (width, height) = self.box_size();
        self.magnifier
            .as_mut()
            .map(|magnifier| magnifier.update_position(x, y, width, height, lens))
    }

    /// Pointer left the image; the loupe hides.
    pub fn pointer_left(&mut self) {
        self.pointer = None;
    }

    /// Applies one zoom step at the last pointer position. No-op while the
    /// pointer is outside the image or the pane is not zoomable.
    pub fn apply_zoom(
        &mut self,
        direction: ZoomDirection,
        accelerated: bool,
        lens: LensGeometry,
    ) -> Option<RenderTransform> {
        let (x, y) = self.pointer?;
        let (width, height) = self.box_size();

        self.magnifier
            .as_mut()
            .map(|magnifier| magnifier.update_zoom(direction, x, y, width, height, accelerated, lens))
    }

    #[allow(clippy::cast_precision_loss)]
    fn box_size(&self) -> (f32, f32) {
        (self.fit.width as f32, self.fit.height as f32)
    }

    /// Crops and scales the image region visible through the lens into a
    /// square tile of `lens_size` pixels, for the loupe content.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn lens_tile(&self, lens_size: f32) -> Option<iced_image::Handle> {
        let content = self.content.as_ref()?;
        let magnifier = self.magnifier.as_ref()?;
        let (x, y) = self.pointer?;

        let (box_w, box_h) = self.box_size();
        if box_w <= 0.0 || box_h <= 0.0 {
            return None;
        }

        let (fraction_x, fraction_y) = resize_math::pointer_fraction(x, y, box_w, box_h);
        let (win_x, win_y, side) = resize_math::lens_source_window(
            fraction_x,
            fraction_y,
            box_w,
            box_h,
            magnifier.zoom_level(),
            lens_size,
        );

        // Displayed-box coordinates to decoded-pixel coordinates.
        let scale_x = content.decoded_width() as f32 / box_w;
        let scale_y = content.decoded_height() as f32 / box_h;

        let src_x = (win_x * scale_x).clamp(0.0, content.decoded_width() as f32 - 1.0);
        let src_y = (win_y * scale_y).clamp(0.0, content.decoded_height() as f32 - 1.0);
        let src_w = (side * scale_x)
            .min(content.decoded_width() as f32 - src_x)
            .max(1.0);
        let src_h = (side * scale_y)
            .min(content.decoded_height() as f32 - src_y)
            .max(1.0);

        let tile = image_rs::imageops::crop_imm(
            &content.rgba,
            src_x as u32,
            src_y as u32,
            src_w as u32,
            src_h as u32,
        )
        .to_image();

        let lens_px = lens_size.max(1.0) as u32;
        let scaled = image_rs::imageops::resize(
            &tile,
            lens_px,
            lens_px,
            image_rs::imageops::FilterType::Nearest,
        );

        Some(iced_image::Handle::from_rgba(
            lens_px,
            lens_px,
            scaled.into_vec(),
        ))
    }

    /// Releases the pane: aborts an in-flight transfer (partial data is
    /// discarded), cancels a live fade, releases the pointer guard when this
    /// pane held it, drops the content, and yields the final zoom level for
    /// persistence. Idempotent; later calls return `None`.
    pub fn dispose<A>(
        &mut self,
        guard: &mut PointerGuard,
        sequencer: &mut Sequencer<A>,
    ) -> Option<f32> {
        if self.phase == PanePhase::Disposed {
            return None;
        }

        self.cancel.store(true, Ordering::SeqCst);

        match self.phase {
            PanePhase::FadingOutPlaceholder(key) | PanePhase::FadingInImage(key) => {
                sequencer.cancel(key);
                guard.release(GuardHolder::MediaFade);
            }
            PanePhase::AwaitingFade => {
                // Never acquired the guard; nothing to release.
            }
            _ => {}
        }

        self.phase = PanePhase::Disposed;
        self.content = None;
        self.pointer = None;

        self.magnifier.as_mut().map(Magnifier::dispose)
    }
}

/// Default lens geometry for the built-in lens skin: half the lens size and
/// no mask offset (the mask sits at the lens origin in this rendition).
#[must_use]
pub fn default_lens_geometry() -> LensGeometry {
    LensGeometry {
        half_size: metrics::LENS_SIZE / 2.0,
        mask_offset: (0.0, 0.0),
    }
}
