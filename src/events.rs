//! Event types flowing into and out of the attachment controller
//!
//! Inbound: [`HookEvent`] from the native hook, [`SurfaceFocus`] from the
//! host window. Outbound: [`Notification`] to registered observers.

use serde::{Deserialize, Serialize};

use crate::constants::tags;
use crate::types::Rect;

/// Target window was found and is now tracked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachEvent {
    /// Whether we may interact with the target (reported on Windows only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_access: Option<bool>,
    /// Fullscreen state at attach time, when the backend knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fullscreen: Option<bool>,
    #[serde(flatten)]
    pub bounds: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullscreenEvent {
    pub is_fullscreen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResizeEvent {
    #[serde(flatten)]
    pub bounds: Rect,
}

/// Target window lifecycle transition reported by the hook source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HookEvent {
    Attach(AttachEvent),
    Focus,
    Blur,
    Detach,
    Fullscreen(FullscreenEvent),
    MoveResize(MoveResizeEvent),
    /// Tag this version does not know about; dropped on dispatch
    #[serde(other)]
    Unknown,
}

/// Discriminant of a [`HookEvent`], numbered like the native layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Attach,
    Focus,
    Blur,
    Detach,
    Fullscreen,
    MoveResize,
}

impl EventKind {
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            tags::ATTACH => Some(EventKind::Attach),
            tags::FOCUS => Some(EventKind::Focus),
            tags::BLUR => Some(EventKind::Blur),
            tags::DETACH => Some(EventKind::Detach),
            tags::FULLSCREEN => Some(EventKind::Fullscreen),
            tags::MOVERESIZE => Some(EventKind::MoveResize),
            _ => None,
        }
    }

    pub fn tag(self) -> u32 {
        match self {
            EventKind::Attach => tags::ATTACH,
            EventKind::Focus => tags::FOCUS,
            EventKind::Blur => tags::BLUR,
            EventKind::Detach => tags::DETACH,
            EventKind::Fullscreen => tags::FULLSCREEN,
            EventKind::MoveResize => tags::MOVERESIZE,
        }
    }
}

impl HookEvent {
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            HookEvent::Attach(_) => Some(EventKind::Attach),
            HookEvent::Focus => Some(EventKind::Focus),
            HookEvent::Blur => Some(EventKind::Blur),
            HookEvent::Detach => Some(EventKind::Detach),
            HookEvent::Fullscreen(_) => Some(EventKind::Fullscreen),
            HookEvent::MoveResize(_) => Some(EventKind::MoveResize),
            HookEvent::Unknown => None,
        }
    }

    /// Build an event from a native numeric tag and its payload fields.
    /// Unknown tags decode to [`HookEvent::Unknown`].
    pub fn from_native(
        tag: u32,
        bounds: Rect,
        is_fullscreen: Option<bool>,
        has_access: Option<bool>,
    ) -> Self {
        match EventKind::from_tag(tag) {
            Some(EventKind::Attach) => HookEvent::Attach(AttachEvent {
                has_access,
                is_fullscreen,
                bounds,
            }),
            Some(EventKind::Focus) => HookEvent::Focus,
            Some(EventKind::Blur) => HookEvent::Blur,
            Some(EventKind::Detach) => HookEvent::Detach,
            Some(EventKind::Fullscreen) => HookEvent::Fullscreen(FullscreenEvent {
                is_fullscreen: is_fullscreen.unwrap_or(false),
            }),
            Some(EventKind::MoveResize) => HookEvent::MoveResize(MoveResizeEvent { bounds }),
            None => HookEvent::Unknown,
        }
    }
}

/// Focus change of the overlay surface itself, reported by the host window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceFocus {
    Focused,
    Blurred,
}

/// Everything that can arrive on the controller's hand-off queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    Hook(HookEvent),
    Surface(SurfaceFocus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PauseEvent {
    pub is_paused: bool,
}

/// Named notification delivered to observers after the controller handled it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Notification {
    Attach(AttachEvent),
    Focus,
    Blur,
    Detach,
    Fullscreen(FullscreenEvent),
    MoveResize(MoveResizeEvent),
    Pause(PauseEvent),
    Resume(PauseEvent),
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Notification::Attach(_) => "attach",
            Notification::Focus => "focus",
            Notification::Blur => "blur",
            Notification::Detach => "detach",
            Notification::Fullscreen(_) => "fullscreen",
            Notification::MoveResize(_) => "moveresize",
            Notification::Pause(_) => "pause",
            Notification::Resume(_) => "resume",
        }
    }

    /// Notification mirroring a hook event; `None` for unknown events
    pub fn from_hook(event: &HookEvent) -> Option<Self> {
        Some(match *event {
            HookEvent::Attach(e) => Notification::Attach(e),
            HookEvent::Focus => Notification::Focus,
            HookEvent::Blur => Notification::Blur,
            HookEvent::Detach => Notification::Detach,
            HookEvent::Fullscreen(e) => Notification::Fullscreen(e),
            HookEvent::MoveResize(e) => Notification::MoveResize(e),
            HookEvent::Unknown => return None,
        })
    }
}
