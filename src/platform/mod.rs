//! In-process stand-ins for the operating-system services the controller talks to

pub mod focus;
pub mod notification;
pub mod widget;

pub use focus::{FocusHandle, FocusKind, FocusManager};
pub use notification::{Notification, NowPlayingNotifier};
pub use widget::WidgetHub;
