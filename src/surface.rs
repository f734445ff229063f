//! Overlay surface capability: the host's own window object

use anyhow::Result;

use crate::hook::{EventSink, SurfaceHandle};
use crate::types::{MonitorScale, Rect};

/// Always-on-top level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrderTier {
    Normal,
    /// Above fullscreen apps and panels; used while glued to the target
    ScreenSaver,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkspaceOptions {
    /// Also show on the desktop of a fullscreen app (macOS)
    pub visible_on_fullscreen: bool,
}

/// Commands and queries the controller issues against the overlay window.
///
/// All calls happen on the controlling thread.
pub trait OverlaySurface {
    /// Native id handed to the hook source
    fn handle(&self) -> SurfaceHandle;

    fn set_bounds(&mut self, bounds: Rect) -> Result<()>;

    /// Show and take focus
    fn show(&mut self) -> Result<()>;

    /// Show without stealing focus
    fn show_inactive(&mut self) -> Result<()>;

    fn hide(&mut self) -> Result<()>;

    fn is_visible(&self) -> Result<bool>;

    fn focus(&mut self) -> Result<()>;

    fn is_focused(&self) -> Result<bool>;

    /// Click-through on/off
    fn set_ignore_mouse_events(&mut self, ignore: bool) -> Result<()>;

    fn set_always_on_top(&mut self, on_top: bool, tier: ZOrderTier) -> Result<()>;

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()>;

    fn set_visible_on_all_workspaces(&mut self, visible: bool, options: WorkspaceOptions) -> Result<()>;

    /// Scale context of the monitor under the surface's current position
    fn monitor_scale(&self) -> Result<MonitorScale>;

    fn primary_display_bounds(&self) -> Result<Rect>;

    /// Full minus content height of a standard decorated window.
    /// Only asked for on macOS; measured once per attachment.
    fn measure_title_bar_height(&mut self) -> Result<u32>;

    /// Report the surface's own focus/blur through `sink`
    fn observe_focus(&mut self, sink: EventSink) -> Result<()>;
}
