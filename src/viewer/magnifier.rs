// SPDX-License-Identifier: MPL-2.0
//! Loupe zoom engine: zoom level plus pointer-relative pan mapping over a
//! fixed-size lens.
//!
//! The engine consumes pointer, wheel and keyboard input already reduced to
//! `(direction, position, box size, accelerated)` and produces a
//! [`RenderTransform`] for the view. It holds no widget state; the lens
//! geometry is handed in by the view and cached on first interaction.

use crate::config::defaults::zoom;
use crate::viewer::resize_math;

/// Direction of one zoom step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    #[must_use]
    pub fn signum(self) -> f32 {
        match self {
            ZoomDirection::In => 1.0,
            ZoomDirection::Out => -1.0,
        }
    }
}

/// Lens measurements supplied by the view: half the lens skin size and the
/// transform offset of the content mask inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensGeometry {
    pub half_size: f32,
    pub mask_offset: (f32, f32),
}

/// Output of the engine: where to put the lens and how to place the content
/// inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTransform {
    /// Translation of the lens container (pointer minus lens half-size).
    pub lens_translation: (f32, f32),
    /// Scale applied to the lens content.
    pub content_scale: f32,
    /// Pre-scale translation of the lens content.
    pub content_translation: (f32, f32),
}

/// Stateful loupe engine, one per media pane.
#[derive(Debug)]
pub struct Magnifier {
    zoom_level: f32,
    minimum_zoom: Option<f32>,
    // Cached on first pointer interaction and never invalidated; stale if
    // the lens is resized afterwards (see DESIGN.md, open questions).
    lens_reference: Option<LensGeometry>,
    persisted: Option<f32>,
    restored: bool,
    has_content: bool,
    transform: Option<RenderTransform>,
}

impl Magnifier {
    /// Builds the engine with the session's persisted zoom level, if any.
    /// The persisted value is applied once, the first time a minimum zoom
    /// becomes known after content is set.
    #[must_use]
    pub fn new(persisted: Option<f32>) -> Self {
        Self {
            zoom_level: zoom::DEFAULT,
            minimum_zoom: None,
            lens_reference: None,
            persisted,
            restored: false,
            has_content: false,
            transform: None,
        }
    }

    #[must_use]
    pub fn zoom_level(&self) -> f32 {
        self.zoom_level
    }

    #[must_use]
    pub fn minimum_zoom(&self) -> Option<f32> {
        self.minimum_zoom
    }

    /// The zoom readout shown in the lens, two decimals.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{:.2}", self.zoom_level)
    }

    /// Last computed transform, if any interaction happened yet.
    #[must_use]
    pub fn transform(&self) -> Option<RenderTransform> {
        self.transform
    }

    /// Marks that the lens content is set. Restores the persisted zoom if
    /// the minimum is already known.
    pub fn set_content(&mut self) {
        self.has_content = true;
        if self.minimum_zoom.is_some() && !self.restored {
            self.restore();
        }
    }

    /// Updates the minimum zoom to the current scale-to-fit ratio. Called on
    /// every resize. Restores the persisted zoom on the first call after
    /// content is set; afterwards only clamps the level up when the new
    /// minimum exceeds it.
    pub fn set_minimum_zoom(&mut self, ratio: f32) {
        self.minimum_zoom = Some(ratio);

        if self.has_content && !self.restored {
            self.restore();
        } else if self.zoom_level < ratio {
            self.zoom_level = ratio;
        }
    }

    fn restore(&mut self) {
        let level = self.persisted.unwrap_or(zoom::DEFAULT);
        self.zoom_level = level.clamp(self.floor(), zoom::MAX);
        self.restored = true;
    }

    fn floor(&self) -> f32 {
        self.minimum_zoom.unwrap_or(1.0)
    }

    /// Applies one zoom step at the given pointer position and recomputes
    /// the pan. `accelerated` selects the large step (modifier held).
    pub fn update_zoom(
        &mut self,
        direction: ZoomDirection,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        accelerated: bool,
        lens: LensGeometry,
    ) -> RenderTransform {
        let step = if accelerated {
            zoom::STEP_ACCELERATED
        } else {
            zoom::STEP
        };

        self.zoom_level =
            (self.zoom_level + step * direction.signum()).clamp(self.floor(), zoom::MAX);

        self.update_position(x, y, width, height, lens)
    }

    /// Recomputes the lens and content placement for a pointer position
    /// relative to the image's visible box.
    pub fn update_position(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        lens: LensGeometry,
    ) -> RenderTransform {
        let lens = *self.lens_reference.get_or_insert(lens);

        let (fraction_x, fraction_y) = resize_math::pointer_fraction(x, y, width, height);
        let content_translation = resize_math::lens_content_offset(
            width,
            height,
            fraction_x,
            fraction_y,
            self.zoom_level,
            lens.mask_offset,
            lens.half_size,
        );

        let transform = RenderTransform {
            lens_translation: (x - lens.half_size, y - lens.half_size),
            content_scale: self.zoom_level,
            content_translation,
        };
        self.transform = Some(transform);
        transform
    }

    /// Releases the engine, yielding the final zoom level for persistence.
    pub fn dispose(&mut self) -> f32 {
        self.transform = None;
        self.zoom_level
    }
}
