//! Foreground tracking without any X11 I/O
//!
//! The hook thread feeds window-manager observations in; the tracker decides
//! which [`HookEvent`]s they mean for the target.

use tracing::debug;

use crate::events::{AttachEvent, FullscreenEvent, HookEvent, MoveResizeEvent};
use crate::types::Rect;

pub type WindowId = u32;

/// What the hook thread could read about a freshly matched window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSnapshot {
    pub bounds: Rect,
    pub is_fullscreen: bool,
}

#[derive(Debug)]
pub struct TargetTracker {
    title: String,
    target: Option<WindowId>,
    focused: bool,
    destroyed: bool,
    last_bounds: Option<Rect>,
    last_fullscreen: Option<bool>,
}

impl TargetTracker {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            target: None,
            focused: false,
            destroyed: false,
            last_bounds: None,
            last_fullscreen: None,
        }
    }

    pub fn target(&self) -> Option<WindowId> {
        self.target
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// A new window became active (or none, e.g. the desktop).
    ///
    /// `snapshot` is only asked for when the window's title matches; returning
    /// `None` means the window vanished before it could be read and no attach
    /// happens.
    pub fn on_foreground(
        &mut self,
        window: Option<WindowId>,
        title: Option<&str>,
        snapshot: impl FnOnce(WindowId) -> Option<TargetSnapshot>,
    ) -> Vec<HookEvent> {
        let mut events = Vec::new();

        if let Some(target) = self.target {
            if Some(target) == window {
                if !self.focused {
                    self.focused = true;
                    events.push(HookEvent::Focus);
                }
                return events;
            }

            if self.focused {
                self.focused = false;
                events.push(HookEvent::Blur);
            }
            if self.destroyed {
                self.clear();
                events.push(HookEvent::Detach);
            }
        }

        let Some(window) = window else {
            return events;
        };
        if title != Some(self.title.as_str()) {
            return events;
        }

        match snapshot(window) {
            Some(snap) => {
                debug!(window, bounds = ?snap.bounds, "attaching to target window");
                self.target = Some(window);
                self.destroyed = false;
                self.focused = true;
                self.last_bounds = Some(snap.bounds);
                self.last_fullscreen = Some(snap.is_fullscreen);
                events.push(HookEvent::Attach(AttachEvent {
                    has_access: None,
                    is_fullscreen: Some(snap.is_fullscreen),
                    bounds: snap.bounds,
                }));
                events.push(HookEvent::Focus);
            }
            None => {
                debug!(window, "matched window disappeared before attach");
                self.clear();
            }
        }
        events
    }

    /// The target was destroyed
    pub fn on_destroyed(&mut self, window: WindowId) -> Vec<HookEvent> {
        if self.target != Some(window) {
            return Vec::new();
        }
        self.destroyed = true;
        self.on_foreground(None, None, |_| None)
    }

    /// Geometry change of a window; duplicates of the last reported bounds are dropped
    pub fn on_configure(&mut self, window: WindowId, bounds: Rect) -> Option<HookEvent> {
        if self.target != Some(window) || self.last_bounds == Some(bounds) {
            return None;
        }
        self.last_bounds = Some(bounds);
        Some(HookEvent::MoveResize(MoveResizeEvent { bounds }))
    }

    /// `_NET_WM_STATE` change; only flips of the fullscreen flag are reported
    pub fn on_state(&mut self, window: WindowId, is_fullscreen: bool) -> Option<HookEvent> {
        if self.target != Some(window) || self.last_fullscreen == Some(is_fullscreen) {
            return None;
        }
        self.last_fullscreen = Some(is_fullscreen);
        Some(HookEvent::Fullscreen(FullscreenEvent { is_fullscreen }))
    }

    fn clear(&mut self) {
        self.target = None;
        self.focused = false;
        self.destroyed = false;
        self.last_bounds = None;
        self.last_fullscreen = None;
    }
}
