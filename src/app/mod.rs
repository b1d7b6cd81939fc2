// SPDX-License-Identifier: MPL-2.0
//! Application shell: wires the navigation controller, the content-map
//! transfer, subscriptions and window events together.

pub mod message;
pub mod session;

pub use message::{Flags, Message};

use crate::config::{self, defaults};
use crate::content::parser;
use crate::error::{Error, FetchError};
use crate::support::fetcher::{self, FetchEvent, FetchPayload, Fetcher, ResponseKind};
use crate::viewer::magnifier::ZoomDirection;
use crate::viewer::media_pane::{default_lens_geometry, PanePhase};
use crate::viewer::navigation::{NavigationController, TransferRequest};
use crate::viewer::view::{self, Interaction};
use iced::widget::{container, text};
use iced::{keyboard, Element, Length, Padding, Size, Subscription, Task, Theme};
use rust_embed::RustEmbed;
use session::SessionStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Bundled assets: the default content map.
#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

const DEFAULT_MAP_ASSET: &str = "content_map.xml";

/// Largest believable gap between animation ticks; longer pauses (the tick
/// subscription was off) advance by one nominal frame instead.
const MAX_TICK_DELTA: Duration = Duration::from_millis(100);

pub struct App {
    flags: Flags,
    controller: Option<NavigationController>,
    fatal: Option<String>,
    modifiers: keyboard::Modifiers,
    window_size: Size,
    last_tick: Option<iced::time::Instant>,
}

impl App {
    /// Builds the application and kicks off the content-map transfer.
    pub fn new(flags: Flags) -> (Self, Task<Message>) {
        let config = config::load().unwrap_or_else(|error| {
            eprintln!("config: {error}");
            config::Config::default()
        });

        let reduced_motion = flags.reduced_motion || config.reduced_motion.unwrap_or(false);
        let source = flags.map.clone().or(config.content_map);

        let app = Self {
            flags: Flags {
                reduced_motion,
                ..flags
            },
            controller: None,
            fatal: None,
            modifiers: keyboard::Modifiers::default(),
            window_size: Size::new(defaults::window::WIDTH, defaults::window::HEIGHT),
            last_tick: None,
        };

        let task = match source {
            Some(source) => Task::perform(load_map(source), Message::MapLoaded),
            None => Task::done(Message::MapLoaded(embedded_map())),
        };

        (app, task)
    }

    pub fn title(&self) -> String {
        String::from("folio")
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::MapLoaded(Ok(xml)) => match parser::parse(&xml) {
                Ok(tree) => {
                    let store = match &self.flags.data_dir {
                        Some(dir) => SessionStore::at(dir.clone()),
                        None => SessionStore::new(),
                    };
                    let mut controller = NavigationController::new(
                        tree,
                        self.flags.reduced_motion,
                        store,
                        (self.window_size.width, self.window_size.height),
                    );

                    match controller.start() {
                        Ok(transfers) => {
                            self.controller = Some(controller);
                            spawn_transfers(transfers)
                        }
                        Err(error) => {
                            self.fatal = Some(error.to_string());
                            Task::none()
                        }
                    }
                }
                Err(error) => {
                    self.fatal = Some(error.to_string());
                    Task::none()
                }
            },
            Message::MapLoaded(Err(error)) => {
                // The content map is the one transfer nothing can outlive.
                self.fatal = Some(error.to_string());
                Task::none()
            }
            Message::Interaction(interaction) => self.on_interaction(interaction),
            Message::Media { node, event } => {
                if let Some(controller) = &mut self.controller {
                    controller.on_media_event(&node, &event);
                }
                Task::none()
            }
            Message::Tick(now) => {
                let dt = match self.last_tick {
                    Some(last) => (now - last).min(MAX_TICK_DELTA),
                    None => Duration::from_millis(defaults::duration_ms::TICK),
                };
                self.last_tick = Some(now);

                match &mut self.controller {
                    Some(controller) => spawn_transfers(controller.tick(dt)),
                    None => Task::none(),
                }
            }
            Message::WindowResized(size) => {
                self.window_size = size;
                if let Some(controller) = &mut self.controller {
                    controller.on_viewport_resized(size.width, size.height);
                }
                Task::none()
            }
            Message::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers;
                Task::none()
            }
            Message::KeyPressed(key) => {
                if let Some(direction) = zoom_direction_for_key(&key) {
                    self.zoom(direction);
                }
                Task::none()
            }
            Message::WheelScrolled(delta) => {
                let y = match delta {
                    iced::mouse::ScrollDelta::Lines { y, .. }
                    | iced::mouse::ScrollDelta::Pixels { y, .. } => y,
                };
                if y != 0.0 {
                    let direction = if y > 0.0 {
                        ZoomDirection::In
                    } else {
                        ZoomDirection::Out
                    };
                    self.zoom(direction);
                }
                Task::none()
            }
            Message::CloseRequested(id) => {
                if let Some(controller) = &mut self.controller {
                    controller.shutdown();
                }
                iced::window::close(id)
            }
        }
    }

    fn on_interaction(&mut self, interaction: Interaction) -> Task<Message> {
        let Some(controller) = &mut self.controller else {
            return Task::none();
        };

        match interaction {
            Interaction::LinkClicked(target) => match controller.navigate(&target) {
                Ok(transfers) => spawn_transfers(transfers),
                Err(error) => {
                    // Precondition violation: a click resolved to an id the
                    // content tree cannot satisfy. Surface it, loudly.
                    self.fatal = Some(error.to_string());
                    Task::none()
                }
            },
            Interaction::OpenExternal { href, download } => {
                open_external(&href, download);
                Task::none()
            }
            Interaction::PointerEntered => {
                if let Some(pane) = controller.active_pane_mut() {
                    pane.pointer_entered();
                }
                Task::none()
            }
            Interaction::PointerMoved(position) => {
                if let Some(pane) = controller.active_pane_mut() {
                    if pane.phase() == PanePhase::Ready {
                        pane.pointer_moved(position.x, position.y, default_lens_geometry());
                    }
                }
                Task::none()
            }
            Interaction::PointerExited => {
                if let Some(pane) = controller.active_pane_mut() {
                    pane.pointer_left();
                }
                Task::none()
            }
        }
    }

    fn zoom(&mut self, direction: ZoomDirection) {
        let accelerated = self.modifiers.shift();
        if let Some(controller) = &mut self.controller {
            controller.zoom_active_pane(direction, accelerated);
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        if let Some(fatal) = &self.fatal {
            return container(text(format!("folio cannot continue: {fatal}")).size(16.0))
                .center_x(Length::Fill)
                .padding(Padding::new(defaults::metrics::MAIN_MARGIN * 2.0))
                .into();
        }

        match &self.controller {
            Some(controller) => view::content(controller).map(Message::Interaction),
            // The closed book stands in while the content map transfers.
            None => container(
                crate::viewer::glyph::BookGlyph::new(96.0, iced::Color::WHITE).into_element(),
            )
            .center_x(Length::Fill)
            .padding(Padding::new(defaults::metrics::MAIN_MARGIN * 2.0))
            .into(),
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![iced::event::listen_with(route_event)];

        let animating = self
            .controller
            .as_ref()
            .is_some_and(NavigationController::is_animating);
        if animating {
            subscriptions.push(
                iced::time::every(Duration::from_millis(defaults::duration_ms::TICK))
                    .map(Message::Tick),
            );
        }

        Subscription::batch(subscriptions)
    }
}

/// Routes native events into messages. Window events are always handled;
/// keyboard and wheel input is forwarded for zoom routing.
fn route_event(
    event: iced::Event,
    status: iced::event::Status,
    window: iced::window::Id,
) -> Option<Message> {
    match event {
        iced::Event::Window(iced::window::Event::CloseRequested) => {
            Some(Message::CloseRequested(window))
        }
        iced::Event::Window(iced::window::Event::Resized(size)) => {
            Some(Message::WindowResized(size))
        }
        iced::Event::Mouse(iced::mouse::Event::WheelScrolled { delta }) => {
            Some(Message::WheelScrolled(delta))
        }
        iced::Event::Keyboard(keyboard::Event::ModifiersChanged(modifiers)) => {
            Some(Message::ModifiersChanged(modifiers))
        }
        iced::Event::Keyboard(keyboard::Event::KeyPressed { key, .. }) => match status {
            iced::event::Status::Ignored => Some(Message::KeyPressed(key)),
            iced::event::Status::Captured => None,
        },
        _ => None,
    }
}

/// Arrow keys zoom the hovered image, matching the wheel direction.
fn zoom_direction_for_key(key: &keyboard::Key) -> Option<ZoomDirection> {
    use keyboard::key::Named;

    match key {
        keyboard::Key::Named(Named::ArrowUp | Named::ArrowRight) => Some(ZoomDirection::In),
        keyboard::Key::Named(Named::ArrowDown | Named::ArrowLeft) => Some(ZoomDirection::Out),
        _ => None,
    }
}

/// Spawns one message stream per requested image transfer.
fn spawn_transfers(transfers: Vec<TransferRequest>) -> Task<Message> {
    let tasks = transfers.into_iter().map(|transfer| {
        let node = transfer.node.clone();
        Task::run(
            fetcher::stream(transfer.url, ResponseKind::Binary, transfer.cancel),
            move |event| Message::Media {
                node: node.clone(),
                event,
            },
        )
    });

    Task::batch(tasks)
}

/// Loads the content map from a path or URL as text.
async fn load_map(source: String) -> Result<String, Error> {
    let mut fetcher = Fetcher::new(source, ResponseKind::Document);

    let payload: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&payload);
    fetcher
        .events()
        .subscribe(fetcher::EVENT_COMPLETE, move |event: &FetchEvent| {
            if let FetchEvent::Complete(FetchPayload::Text(xml)) = event {
                *sink.lock().unwrap() = Some(xml.clone());
            }
        });

    fetcher.load().await.map_err(Error::Fetch)?;

    let xml = payload.lock().unwrap().take();
    xml.ok_or_else(|| Error::Fetch(FetchError::Transport("empty content map".to_string())))
}

/// The bundled default content map.
fn embedded_map() -> Result<String, Error> {
    Assets::get(DEFAULT_MAP_ASSET)
        .map(|file| String::from_utf8_lossy(&file.data).into_owned())
        .ok_or_else(|| Error::Io(format!("missing bundled asset {DEFAULT_MAP_ASSET}")))
}

/// Opens an anchor outside the viewer with the platform opener.
fn open_external(href: &str, download: bool) {
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(target_os = "windows")]
    let opener = "explorer";
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let opener = "xdg-open";

    if download {
        eprintln!("download requested: {href}");
    }

    if let Err(error) = std::process::Command::new(opener).arg(href).spawn() {
        eprintln!("cannot open {href}: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::NodeId;

    #[test]
    fn embedded_map_parses() {
        let xml = embedded_map().expect("bundled map present");
        let tree = parser::parse(&xml).expect("bundled map parses");
        assert!(!tree.is_empty());
        assert_eq!(tree.root_id(), &NodeId::from("root"));
    }

    #[test]
    fn arrow_keys_map_to_zoom_directions() {
        use keyboard::key::Named;

        assert_eq!(
            zoom_direction_for_key(&keyboard::Key::Named(Named::ArrowUp)),
            Some(ZoomDirection::In)
        );
        assert_eq!(
            zoom_direction_for_key(&keyboard::Key::Named(Named::ArrowLeft)),
            Some(ZoomDirection::Out)
        );
        assert_eq!(
            zoom_direction_for_key(&keyboard::Key::Named(Named::Space)),
            None
        );
    }
}
