//! Transient status messages
//!
//! Import, export and suggestion outcomes are reported here and fade out on
//! their own. Blocking messages use the alert popup instead.

mod render;
mod state;

pub use render::render_notification;
pub use state::{Notification, NotificationKind, NotificationState};
