// SPDX-License-Identifier: MPL-2.0
//! Widget tree for the viewer: the chain of nodes, their text rows, media
//! panes with placeholder/fade rendering, the loupe overlay, and the launch
//! sequence.
//!
//! Everything here is a pure projection of controller state; interactions
//! surface as [`Interaction`] values for the application to route.

use crate::config::defaults::metrics;
use crate::content::NodeId;
use crate::viewer::connector::Bracket;
use crate::viewer::glyph::{BookGlyph, Outline};
use crate::viewer::media_pane::{MediaPane, PanePhase};
use crate::viewer::navigation::{LaunchPhase, NavigationController, APPEND_SLIDE};
use crate::viewer::text_link::{LinkPhase, TextLink};
use crate::viewer::tree_node::{NodePhase, TreeNode};
use iced::widget::{column, container, image as iced_image, mouse_area, row, stack, text, Space};
use iced::{Border, Color, Element, Length, Padding, Point};

/// Theme accent, `#48BBEE`.
const ACCENT: Color = Color {
    r: 0x48 as f32 / 255.0,
    g: 0xBB as f32 / 255.0,
    b: 0xEE as f32 / 255.0,
    a: 1.0,
};

const SELECTED: Color = Color {
    r: 0.96,
    g: 0.96,
    b: 0.96,
    a: 1.0,
};

const MUTED: Color = Color {
    r: 190.0 / 255.0,
    g: 190.0 / 255.0,
    b: 190.0 / 255.0,
    a: 1.0,
};

const LINK_TEXT_SIZE: f32 = 15.0;
const FOOTNOTE_TEXT_SIZE: f32 = 11.0;
const TITLE_TEXT_SIZE: f32 = 34.0;
const LAUNCH_GLYPH_SIZE: f32 = 140.0;

/// User interactions surfaced by the viewer widgets.
#[derive(Debug, Clone)]
pub enum Interaction {
    /// A navigable link was clicked.
    LinkClicked(NodeId),
    /// An anchor row was clicked; open it outside the viewer.
    OpenExternal { href: String, download: bool },
    /// Pointer entered the active image.
    PointerEntered,
    /// Pointer moved over the active image (image-box coordinates).
    PointerMoved(Point),
    /// Pointer left the active image.
    PointerExited,
}

fn faded(color: Color, alpha: f32) -> Color {
    Color {
        a: color.a * alpha.clamp(0.0, 1.0),
        ..color
    }
}

/// Renders the whole content region.
pub fn content(controller: &NavigationController) -> Element<'_, Interaction> {
    let suspended = controller.is_pointer_suspended();

    let mut chain = row![].spacing(0.0);
    for node in controller.chain() {
        chain = chain.push(node_view(node, controller, suspended));
    }

    let body = container(chain).padding(Padding::new(metrics::MAIN_MARGIN));

    match launch_view(controller) {
        Some(overlay) => stack![body, overlay].into(),
        None => body.into(),
    }
}

/// One chain node: its connector, text rows and media pane, with entrance
/// and exit fades applied.
fn node_view<'a>(
    node: &'a TreeNode,
    controller: &'a NavigationController,
    suspended: bool,
) -> Element<'a, Interaction> {
    let (alpha, slide) = match node.phase() {
        NodePhase::Appending(key) => {
            let progress = controller.transition_progress(key).unwrap_or(1.0);
            (progress, APPEND_SLIDE * (1.0 - progress))
        }
        NodePhase::Steady => (1.0, 0.0),
        NodePhase::Removing(key) => {
            let progress = controller.transition_progress(key).unwrap_or(1.0);
            (1.0 - progress, 0.0)
        }
    };

    let mut rows = column![].spacing(0.0);
    for link in node.links() {
        rows = rows.push(link_view(link, alpha, suspended));
    }

    if let Some(pane) = node.pane() {
        rows = rows.push(pane_view(pane, controller, alpha));
    }

    let mut body = row![].spacing(0.0);
    if let Some(bracket) = node.bracket() {
        body = body.push(Bracket::new(*bracket, node.text_height()).into_element());
    }
    body = body.push(rows);

    container(body)
        .padding(Padding {
            left: slide.max(0.0),
            ..Padding::ZERO
        })
        .into()
}

/// One text row. Navigable rows are clickable unless pointer input is
/// suspended; anchors always open externally.
fn link_view<'a>(link: &'a TextLink, node_alpha: f32, suspended: bool) -> Element<'a, Interaction> {
    if link.spec().is_whitespace() {
        return Space::new(
            Length::Fixed(link.width()),
            Length::Fixed(metrics::ROW_HEIGHT),
        )
        .into();
    }

    let (color, size) = if link.spec().footnote {
        (MUTED, FOOTNOTE_TEXT_SIZE)
    } else {
        match link.phase() {
            LinkPhase::Static => (MUTED, LINK_TEXT_SIZE),
            LinkPhase::Active => (ACCENT, LINK_TEXT_SIZE),
            LinkPhase::Selecting(_) | LinkPhase::Selected => (SELECTED, LINK_TEXT_SIZE),
            LinkPhase::Deselecting(_) => (ACCENT, LINK_TEXT_SIZE),
        }
    };

    let color = faded(color, node_alpha);
    let label = text(link.label())
        .size(size)
        .style(move |_theme| text::Style { color: Some(color) });

    let body = container(label)
        .height(Length::Fixed(metrics::ROW_HEIGHT))
        .padding(Padding {
            left: metrics::LINK_PADDING / 2.0,
            right: metrics::LINK_PADDING / 2.0,
            top: 4.0,
            bottom: 4.0,
        });

    if suspended {
        return body.into();
    }

    if let Some(target) = link.target().filter(|_| link.is_navigable()) {
        let target = target.clone();
        return mouse_area(body)
            .on_press(Interaction::LinkClicked(target))
            .into();
    }

    if let Some(href) = &link.spec().href {
        return mouse_area(body)
            .on_press(Interaction::OpenExternal {
                href: href.clone(),
                download: link.spec().download,
            })
            .into();
    }

    body.into()
}

/// The media area of a leaf: placeholder while loading, then the image,
/// cross-faded by the pane's state machine, with the loupe overlaid once
/// ready.
#[allow(clippy::cast_precision_loss)]
fn pane_view<'a>(
    pane: &'a MediaPane,
    controller: &'a NavigationController,
    node_alpha: f32,
) -> Element<'a, Interaction> {
    let fit = pane.fit();
    let (width, height) = (fit.width as f32, fit.height as f32);

    match pane.phase() {
        PanePhase::Idle | PanePhase::Preloading | PanePhase::AwaitingFade => {
            placeholder_view(pane, width, height, node_alpha)
        }
        PanePhase::FadingOutPlaceholder(key) => {
            let progress = controller.transition_progress(key).unwrap_or(1.0);
            placeholder_view(pane, width, height, node_alpha * (1.0 - progress))
        }
        PanePhase::FadingInImage(key) => {
            let progress = controller.transition_progress(key).unwrap_or(1.0);
            image_view(pane, width, height, node_alpha * progress)
        }
        PanePhase::Ready => image_view(pane, width, height, node_alpha),
        PanePhase::Failed | PanePhase::Disposed => Space::new(
            Length::Fixed(width.max(1.0)),
            Length::Fixed(1.0),
        )
        .into(),
    }
}

/// Preload placeholder: the outline of the scaled box with the book glyph
/// descending as the transfer progresses.
fn placeholder_view(
    pane: &MediaPane,
    width: f32,
    height: f32,
    _alpha: f32,
) -> Element<'_, Interaction> {
    let glyph = container(
        BookGlyph::new(metrics::PRELOADER_GLYPH, MUTED).into_element(),
    )
    .padding(Padding {
        top: pane.progress().glyph_offset(height),
        left: (width - metrics::PRELOADER_GLYPH).max(0.0) / 2.0,
        ..Padding::ZERO
    });

    stack![Outline::new(width, height).into_element(), glyph]
        .width(Length::Fixed(width))
        .height(Length::Fixed(height))
        .into()
}

/// The loaded image with pointer tracking and the loupe overlay.
fn image_view(
    pane: &MediaPane,
    width: f32,
    height: f32,
    alpha: f32,
) -> Element<'_, Interaction> {
    let Some(content) = pane.content() else {
        return Space::new(Length::Fixed(width), Length::Fixed(height)).into();
    };

    let picture = iced_image(content.handle.clone())
        .width(Length::Fixed(width))
        .height(Length::Fixed(height))
        .opacity(alpha);

    let mut layers = stack![picture]
        .width(Length::Fixed(width))
        .height(Length::Fixed(height));

    if let Some(lens) = loupe_view(pane) {
        layers = layers.push(lens);
    }

    if pane.is_zoomable() && pane.phase() == PanePhase::Ready {
        mouse_area(layers)
            .on_enter(Interaction::PointerEntered)
            .on_move(Interaction::PointerMoved)
            .on_exit(Interaction::PointerExited)
            .into()
    } else {
        layers.into()
    }
}

/// The lens: the cropped, scaled tile under a circular rim with the zoom
/// readout, translated so it centers on the pointer.
fn loupe_view(pane: &MediaPane) -> Option<Element<'_, Interaction>> {
    if !pane.is_zoomable() || pane.pointer().is_none() {
        return None;
    }

    let magnifier = pane.magnifier()?;
    let transform = magnifier.transform()?;
    let tile = pane.lens_tile(metrics::LENS_SIZE)?;

    let (lens_x, lens_y) = transform.lens_translation;
    let readout = magnifier.label();

    let rim = container(
        column![
            Space::new(Length::Fill, Length::Fill),
            container(
                text(readout)
                    .size(FOOTNOTE_TEXT_SIZE)
                    .style(|_theme| text::Style {
                        color: Some(SELECTED),
                    })
            )
            .center_x(Length::Fill)
            .padding(Padding {
                bottom: 14.0,
                ..Padding::ZERO
            }),
        ]
        .width(Length::Fixed(metrics::LENS_SIZE))
        .height(Length::Fixed(metrics::LENS_SIZE)),
    )
    .style(|_theme| container::Style {
        border: Border {
            color: ACCENT,
            width: 2.0,
            radius: (metrics::LENS_SIZE / 2.0).into(),
        },
        ..container::Style::default()
    });

    let lens = stack![
        iced_image(tile)
            .width(Length::Fixed(metrics::LENS_SIZE))
            .height(Length::Fixed(metrics::LENS_SIZE)),
        rim,
    ]
    .width(Length::Fixed(metrics::LENS_SIZE))
    .height(Length::Fixed(metrics::LENS_SIZE));

    Some(
        container(lens)
            .padding(Padding {
                left: lens_x.max(0.0),
                top: lens_y.max(0.0),
                ..Padding::ZERO
            })
            .into(),
    )
}

/// The one-time launch overlay: the opening book and the title reveal.
fn launch_view(controller: &NavigationController) -> Option<Element<'_, Interaction>> {
    let (turn, title_alpha) = match controller.launch_phase() {
        LaunchPhase::PageRight(key) => {
            let progress = controller.transition_progress(key).unwrap_or(1.0);
            (progress * 0.5, progress * 0.5)
        }
        LaunchPhase::PageLeft(key) => {
            let progress = controller.transition_progress(key).unwrap_or(1.0);
            (0.5 + progress * 0.5, 0.5 + progress * 0.5)
        }
        LaunchPhase::Done => return None,
    };

    let title_color = faded(SELECTED, title_alpha);
    let overlay = column![
        BookGlyph::new(LAUNCH_GLYPH_SIZE, ACCENT)
            .with_turn(turn)
            .into_element(),
        text("folio")
            .size(TITLE_TEXT_SIZE)
            .style(move |_theme| text::Style {
                color: Some(title_color),
            }),
    ]
    .spacing(12.0);

    Some(
        container(overlay)
            .center_x(Length::Fill)
            .padding(Padding {
                top: metrics::MAIN_MARGIN * 3.0,
                ..Padding::ZERO
            })
            .into(),
    )
}
