//! Keep an overlay surface glued to a foreign target window.
//!
//! [`AttachmentController`] consumes target lifecycle events from a
//! [`HookSource`] and drives an [`OverlaySurface`]: bounds, visibility,
//! click-through, z-order and fullscreen, with pause/resume on top.

#![forbid(unsafe_code)]

pub mod config;
pub mod constants;
pub mod controller;
pub mod corrector;
pub mod error;
pub mod events;
pub mod fullscreen;
pub mod hook;
pub mod logging;
pub mod notify;
pub mod platform;
pub mod replay;
pub mod surface;
pub mod throttle;
pub mod types;

#[cfg(target_os = "linux")]
pub mod x11;
#[cfg(target_os = "linux")]
pub mod x11_utils;

#[cfg(test)]
mod test_support;

pub use controller::{AttachmentController, FocusIntent};
pub use error::{AttachError, AttachResult};
pub use events::{HookEvent, Inbound, Notification, SurfaceFocus};
pub use hook::{EventSink, HookSource};
pub use platform::Platform;
pub use surface::{OverlaySurface, ZOrderTier};
pub use types::{AttachmentOptions, MarginPercent, MonitorScale, Rect};
