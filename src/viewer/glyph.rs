// SPDX-License-Identifier: MPL-2.0
//! Decorative canvas glyphs: the preload outline and the open-book mark.

use iced::widget::canvas::{self, Cache, Canvas, Geometry, Path, Stroke};
use iced::{mouse, Color, Length, Point, Rectangle, Renderer, Theme, Vector};

const LINE_TRANSLATION: f32 = 0.5;
const LINE_WIDTH: f32 = 1.0;

const GRAY: Color = Color {
    r: 190.0 / 255.0,
    g: 190.0 / 255.0,
    b: 190.0 / 255.0,
    a: 1.0,
};

/// Placeholder outline drawn at the scaled image box while loading.
#[derive(Debug)]
pub struct Outline {
    cache: Cache,
    width: f32,
    height: f32,
}

impl Outline {
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            cache: Cache::default(),
            width,
            height,
        }
    }

    pub fn into_element<Message: 'static>(self) -> iced::Element<'static, Message> {
        let (width, height) = (self.width, self.height);
        Canvas::new(self)
            .width(Length::Fixed(width))
            .height(Length::Fixed(height))
            .into()
    }
}

impl<Message> canvas::Program<Message> for Outline {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let (width, height) = (self.width - LINE_WIDTH, self.height - LINE_WIDTH);

        let geometry = self.cache.draw(renderer, bounds.size(), move |frame| {
            frame.translate(Vector::new(LINE_TRANSLATION, LINE_TRANSLATION));

            let path = Path::new(|builder| {
                builder.move_to(Point::ORIGIN);
                builder.line_to(Point::new(width, 0.0));
                builder.line_to(Point::new(width, height));
                builder.line_to(Point::new(0.0, height));
                builder.close();
            });

            frame.stroke(&path, Stroke::default().with_width(LINE_WIDTH).with_color(GRAY));
        });

        vec![geometry]
    }
}

/// The open-book mark: two skewed pages around a spine. `turn` animates the
/// right page across the spine for the launch sequence (0 = closed right,
/// 1 = fully turned).
#[derive(Debug)]
pub struct BookGlyph {
    cache: Cache,
    size: f32,
    color: Color,
    turn: f32,
}

impl BookGlyph {
    const PAGE_ASPECT: f32 = 76.0 / 100.0;
    const SKEW: f32 = 0.66;

    #[must_use]
    pub fn new(size: f32, color: Color) -> Self {
        Self {
            cache: Cache::default(),
            size,
            color,
            turn: 0.0,
        }
    }

    /// Sets the page-turn progress and invalidates the cache.
    #[must_use]
    pub fn with_turn(mut self, turn: f32) -> Self {
        self.turn = turn.clamp(0.0, 1.0);
        self.cache.clear();
        self
    }

    pub fn into_element<Message: 'static>(self) -> iced::Element<'static, Message> {
        let size = self.size;
        Canvas::new(self)
            .width(Length::Fixed(size))
            .height(Length::Fixed(size))
            .into()
    }
}

impl<Message> canvas::Program<Message> for BookGlyph {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let color = self.color;
        let turn = self.turn;

        let geometry = self.cache.draw(renderer, bounds.size(), move |frame| {
            let center = frame.center();
            let height = frame.height() * 0.8;
            let page_width = height * Self::PAGE_ASPECT * 0.5;
            let skew = height * (1.0 - Self::SKEW) * 0.5;
            let top = center.y - height / 2.0;
            let bottom = center.y + height / 2.0;

            let stroke = Stroke::default().with_width(LINE_WIDTH).with_color(color);

            // Spine.
            frame.stroke(
                &Path::line(Point::new(center.x, top), Point::new(center.x, bottom)),
                stroke.clone(),
            );

            // Left page.
            let left = Path::new(|builder| {
                builder.move_to(Point::new(center.x, top));
                builder.line_to(Point::new(center.x - page_width, top + skew));
                builder.line_to(Point::new(center.x - page_width, bottom - skew));
                builder.line_to(Point::new(center.x, bottom));
            });
            frame.stroke(&left, stroke.clone());

            // Right page; its outer edge sweeps across the spine as it
            // turns.
            let edge_x = center.x + page_width * (1.0 - 2.0 * turn);
            let edge_skew = skew * (1.0 - turn);
            let right = Path::new(|builder| {
                builder.move_to(Point::new(center.x, top));
                builder.line_to(Point::new(edge_x, top + edge_skew));
                builder.line_to(Point::new(edge_x, bottom - edge_skew));
                builder.line_to(Point::new(center.x, bottom));
            });
            frame.stroke(&right, stroke);
        });

        vec![geometry]
    }
}
