//! The salon binary's building blocks: configuration, logging, the event bus
//! feeding the browser page, browser-backed audio devices and the web server.

pub mod bus;
pub mod config;
pub mod console;
pub mod devices;
pub mod logging;
pub mod web;

pub use bus::EventBus;
pub use config::{Cli, default_roster, load_roster};
pub use console::{ConsoleInput, forward_stdin, parse_line};
pub use devices::{BrowserKeyboard, BrowserMic, BrowserSpeaker};
pub use logging::init_logging;
pub use web::{AppState, WsRequest, app, index, serve};
