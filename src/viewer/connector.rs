// SPDX-License-Identifier: MPL-2.0
//! Branch connector: the bracket drawn between a node and the link that
//! opened it.
//!
//! The bracket is a vertical clasp hugging the node's left edge plus a
//! horizontal stem reaching back to the vertical center of the originating
//! link. Geometry lives in [`BracketSpec`]; drawing is a canvas program.

use iced::widget::canvas::{self, Cache, Canvas, Geometry, Path, Stroke};
use iced::{mouse, Color, Length, Point, Rectangle, Renderer, Theme};

/// Widest stroke inset so the 1px line lands on pixel centers.
const LINE_TRANSLATION: f32 = 0.5;
const LINE_WIDTH: f32 = 1.0;

/// Clasp margin around the node.
pub const MARGIN: f32 = 7.0;

/// Stem length added so even a zero-delta link keeps a visible stem.
pub const MINIMUM_STEM_WIDTH: f32 = 16.0;

/// Theme stroke color, `#48BBEE`.
const THEME: Color = Color {
    r: 0x48 as f32 / 255.0,
    g: 0xBB as f32 / 255.0,
    b: 0xEE as f32 / 255.0,
    a: 1.0,
};

/// Connector measurements, derived from the originating link's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BracketSpec {
    stem_width: f32,
    stem_height: f32,
}

impl BracketSpec {
    /// Builds the spec from the raw stem deltas: the parent-to-link width
    /// delta and the distance down to the link's vertical center.
    #[must_use]
    pub fn new(stem_width: f32, stem_height: f32) -> Self {
        Self {
            stem_width: stem_width + MINIMUM_STEM_WIDTH,
            stem_height: stem_height.floor() + MARGIN,
        }
    }

    #[must_use]
    pub fn stem_width(&self) -> f32 {
        self.stem_width
    }

    #[must_use]
    pub fn stem_height(&self) -> f32 {
        self.stem_height
    }

    /// Canvas width needed to draw this bracket.
    #[must_use]
    pub fn canvas_width(&self) -> f32 {
        self.stem_width + MARGIN + LINE_TRANSLATION.ceil()
    }
}

/// Canvas program rendering one bracket at a given node height.
#[derive(Debug)]
pub struct Bracket {
    cache: Cache,
    spec: BracketSpec,
    node_height: f32,
}

impl Bracket {
    #[must_use]
    pub fn new(spec: BracketSpec, node_height: f32) -> Self {
        Self {
            cache: Cache::default(),
            spec,
            node_height,
        }
    }

    /// Redraws at a new node height, invalidating the cache.
    #[must_use]
    pub fn with_node_height(mut self, node_height: f32) -> Self {
        self.node_height = node_height;
        self.cache.clear();
        self
    }

    /// Creates a Canvas widget from this bracket.
    pub fn into_element<Message: 'static>(self) -> iced::Element<'static, Message> {
        let width = self.spec.canvas_width();
        let height = (self.node_height + MARGIN * 2.0).max(self.spec.stem_height + MARGIN);
        Canvas::new(self)
            .width(Length::Fixed(width))
            .height(Length::Fixed(height))
            .into()
    }
}

impl<Message> canvas::Program<Message> for Bracket {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let spec = self.spec;
        let node_height = self.node_height;

        let geometry = self.cache.draw(renderer, bounds.size(), move |frame| {
            frame.translate(iced::Vector::new(LINE_TRANSLATION, LINE_TRANSLATION));

            let width = frame.width() - LINE_TRANSLATION.ceil();
            let clasp_bottom = node_height + MARGIN * 2.0;

            let path = Path::new(|builder| {
                // Clasp along the node's left edge.
                builder.move_to(Point::new(width, 0.0));
                builder.line_to(Point::new(width - MARGIN, 0.0));
                builder.line_to(Point::new(width - MARGIN, clasp_bottom));
                builder.line_to(Point::new(width, clasp_bottom));

                // Stem back to the originating link's center.
                builder.move_to(Point::new(0.0, spec.stem_height));
                builder.line_to(Point::new(spec.stem_width, spec.stem_height));

                // A link below the node folds the stem down to meet it.
                if spec.stem_height > node_height {
                    builder.line_to(Point::new(spec.stem_width, clasp_bottom));
                }
            });

            frame.stroke(&path, Stroke::default().with_width(LINE_WIDTH).with_color(THEME));
        });

        vec![geometry]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_pads_the_raw_deltas() {
        let spec = BracketSpec::new(40.0, 56.7);
        assert_eq!(spec.stem_width(), 40.0 + MINIMUM_STEM_WIDTH);
        assert_eq!(spec.stem_height(), 56.0 + MARGIN);
    }

    #[test]
    fn zero_delta_still_has_a_stem() {
        let spec = BracketSpec::new(0.0, 0.0);
        assert_eq!(spec.stem_width(), MINIMUM_STEM_WIDTH);
        assert_eq!(spec.stem_height(), MARGIN);
    }

    #[test]
    fn canvas_width_covers_stem_and_clasp() {
        let spec = BracketSpec::new(24.0, 14.0);
        assert_eq!(spec.canvas_width(), 24.0 + MINIMUM_STEM_WIDTH + MARGIN + 1.0);
    }
}
