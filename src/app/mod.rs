mod app_events;
mod app_render;
mod app_state;

pub use app_state::{App, Modal};
