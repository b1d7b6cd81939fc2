// SPDX-License-Identifier: MPL-2.0
//! Pure scale-to-fit and lens coordinate math.
//!
//! Everything here is stateless; the magnifier and media pane own the state
//! and call through for the numbers.

/// Result of fitting a native image size into an available box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSize {
    /// Applied proportional scale. `1.0` when the box holds the native size.
    pub ratio: f32,
    /// Output width in whole pixels.
    pub width: u32,
    /// Output height in whole pixels.
    pub height: u32,
}

/// Computes the proportional scale of a `native_width`×`native_height` image
/// inside a `max_width`×`max_height` box, never narrower than `min_width`.
///
/// When the box holds the native size in both dimensions the image is not
/// scaled. Otherwise the ratio is the smaller of the two axis ratios,
/// floored at `min_width / native_width`, and the output dimensions are
/// floored to whole pixels.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scale_to_fit(
    native_width: u32,
    native_height: u32,
    max_width: f32,
    max_height: f32,
    min_width: f32,
) -> FitSize {
    let native_w = native_width as f32;
    let native_h = native_height as f32;

    if max_width < native_w || max_height < native_h {
        let ratio_width = max_width / native_w;
        let ratio_height = max_height / native_h;
        let ratio = (min_width / native_w).max(ratio_width.min(ratio_height));

        FitSize {
            ratio,
            width: (native_w * ratio).floor() as u32,
            height: (native_h * ratio).floor() as u32,
        }
    } else {
        FitSize {
            ratio: 1.0,
            width: native_width,
            height: native_height,
        }
    }
}

/// Fraction of the box the pointer sits at, per axis. Not clamped; callers
/// feeding coordinates from outside the box get fractions outside `[0, 1]`.
#[must_use]
pub fn pointer_fraction(x: f32, y: f32, width: f32, height: f32) -> (f32, f32) {
    (x / width, y / height)
}

/// Translation applied to the lens content so the magnified point under the
/// pointer stays centered in the lens.
///
/// The translation runs in pre-scale content coordinates: the content is
/// shifted by the pointer-fraction-weighted content offset, corrected by the
/// lens mask's own transform offset and re-centered by the lens half-size
/// (both divided by the zoom since the scale multiplies them back up).
#[must_use]
pub fn lens_content_offset(
    content_width: f32,
    content_height: f32,
    fraction_x: f32,
    fraction_y: f32,
    zoom: f32,
    mask_offset: (f32, f32),
    lens_half: f32,
) -> (f32, f32) {
    let content_x = -(content_width * fraction_x) - mask_offset.0 / zoom + lens_half / zoom;
    let content_y = -(content_height * fraction_y) - mask_offset.1 / zoom + lens_half / zoom;
    (content_x, content_y)
}

/// Square window of the displayed image visible through the lens, centered
/// on the pointer: side `lens_size / zoom`, in displayed-image coordinates.
/// Not clamped to the image bounds.
#[must_use]
pub fn lens_source_window(
    fraction_x: f32,
    fraction_y: f32,
    content_width: f32,
    content_height: f32,
    zoom: f32,
    lens_size: f32,
) -> (f32, f32, f32) {
    let side = lens_size / zoom;
    let center_x = content_width * fraction_x;
    let center_y = content_height * fraction_y;
    (center_x - side / 2.0, center_y - side / 2.0, side)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_larger_than_native_keeps_native_size() {
        let fit = scale_to_fit(800, 600, 1920.0, 1080.0, 100.0);
        assert_eq!(fit.ratio, 1.0);
        assert_eq!((fit.width, fit.height), (800, 600));
    }

    #[test]
    fn box_equal_to_native_keeps_native_size() {
        let fit = scale_to_fit(800, 600, 800.0, 600.0, 100.0);
        assert_eq!(fit.ratio, 1.0);
        assert_eq!((fit.width, fit.height), (800, 600));
    }

    #[test]
    fn constrained_box_scales_by_smaller_axis_ratio() {
        // 800x600 into 400x400, min width 100:
        // width ratio 0.5, height ratio 0.667 -> 0.5 -> 400x300.
        let fit = scale_to_fit(800, 600, 400.0, 400.0, 100.0);
        assert!((fit.ratio - 0.5).abs() < f32::EPSILON);
        assert_eq!((fit.width, fit.height), (400, 300));
    }

    #[test]
    fn minimum_width_floors_the_ratio() {
        // Width ratio would be 0.05; the 200px minimum forces 0.25.
        let fit = scale_to_fit(800, 600, 40.0, 600.0, 200.0);
        assert!((fit.ratio - 0.25).abs() < f32::EPSILON);
        assert_eq!(fit.width, 200);
        assert_eq!(fit.height, 150);
    }

    #[test]
    fn output_dimensions_are_floored() {
        // 333/500 = 0.666 -> height 0.666 * 333 = 221.7 -> 221.
        let fit = scale_to_fit(500, 333, 333.0, 1000.0, 10.0);
        assert_eq!(fit.width, 333);
        assert_eq!(fit.height, 221);
    }

    #[test]
    fn one_small_axis_is_enough_to_scale() {
        let fit = scale_to_fit(800, 600, 1000.0, 300.0, 100.0);
        assert!((fit.ratio - 0.5).abs() < f32::EPSILON);
        assert_eq!((fit.width, fit.height), (400, 300));
    }

    #[test]
    fn pointer_fraction_is_linear() {
        assert_eq!(pointer_fraction(200.0, 150.0, 400.0, 300.0), (0.5, 0.5));
        assert_eq!(pointer_fraction(0.0, 300.0, 400.0, 300.0), (0.0, 1.0));
    }

    #[test]
    fn lens_offset_centers_pointer_without_mask_shift() {
        // Pointer at the middle, zoom 2, lens half 100: the content shifts
        // by half its size, re-centered by 100/2.
        let (x, y) = lens_content_offset(400.0, 300.0, 0.5, 0.5, 2.0, (0.0, 0.0), 100.0);
        assert!((x - (-200.0 + 50.0)).abs() < 1e-4);
        assert!((y - (-150.0 + 50.0)).abs() < 1e-4);
    }

    #[test]
    fn lens_offset_applies_mask_correction() {
        let without = lens_content_offset(400.0, 300.0, 0.25, 0.25, 2.0, (0.0, 0.0), 100.0);
        let with = lens_content_offset(400.0, 300.0, 0.25, 0.25, 2.0, (20.0, -10.0), 100.0);
        assert!((with.0 - (without.0 - 10.0)).abs() < 1e-4);
        assert!((with.1 - (without.1 + 5.0)).abs() < 1e-4);
    }

    #[test]
    fn source_window_shrinks_with_zoom() {
        let (_, _, side_1x) = lens_source_window(0.5, 0.5, 400.0, 300.0, 1.0, 200.0);
        let (_, _, side_4x) = lens_source_window(0.5, 0.5, 400.0, 300.0, 4.0, 200.0);
        assert_eq!(side_1x, 200.0);
        assert_eq!(side_4x, 50.0);
    }

    #[test]
    fn source_window_centers_on_pointer() {
        let (x, y, side) = lens_source_window(0.5, 0.5, 400.0, 300.0, 2.0, 200.0);
        assert_eq!(side, 100.0);
        assert_eq!((x, y), (200.0 - 50.0, 150.0 - 50.0));
    }
}
