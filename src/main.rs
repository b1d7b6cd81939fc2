// SPDX-License-Identifier: MPL-2.0
use folio::app::{App, Flags};
use folio::config::defaults;
use iced::Size;

fn main() -> iced::Result {
    let mut args = pico_args::Arguments::from_env();

    let flags = Flags {
        map: args.opt_value_from_str("--map").unwrap_or(None),
        reduced_motion: args.contains("--reduced-motion"),
        data_dir: args.opt_value_from_str("--data-dir").unwrap_or(None),
    };

    iced::application(App::title, App::update, App::view)
        .subscription(App::subscription)
        .theme(App::theme)
        .window(iced::window::Settings {
            size: Size::new(defaults::window::WIDTH, defaults::window::HEIGHT),
            exit_on_close_request: false,
            ..iced::window::Settings::default()
        })
        .antialiasing(true)
        .run_with(move || App::new(flags))
}
