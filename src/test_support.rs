//! Recording doubles for the surface and hook contracts (tests only)

use anyhow::Result;

use crate::hook::{Bitmap, ControlsResult, EventSink, HookSource, SurfaceHandle};
use crate::surface::{OverlaySurface, WorkspaceOptions, ZOrderTier};
use crate::types::{MonitorScale, Rect};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetBounds(Rect),
    Show,
    ShowInactive,
    Hide,
    Focus,
    SetIgnoreMouseEvents(bool),
    SetAlwaysOnTop(bool, ZOrderTier),
    SetFullscreen(bool),
    SetVisibleOnAllWorkspaces(bool),
}

#[derive(Debug)]
pub struct FakeSurface {
    pub visible: bool,
    pub focused: bool,
    pub primary_display: Rect,
    pub monitor: MonitorScale,
    /// Monitor the surface lands on after the next `set_bounds`
    pub monitor_after_move: Option<MonitorScale>,
    pub title_bar_height: u32,
    pub title_bar_measurements: usize,
    pub focus_sink: Option<EventSink>,
    log: Vec<Command>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            visible: false,
            focused: false,
            primary_display: Rect::new(0, 0, 1920, 1080),
            monitor: MonitorScale::IDENTITY,
            monitor_after_move: None,
            title_bar_height: 0,
            title_bar_measurements: 0,
            focus_sink: None,
            log: Vec::new(),
        }
    }

    pub fn commands(&self) -> Vec<Command> {
        self.log.clone()
    }

    pub fn last_bounds(&self) -> Option<Rect> {
        self.log.iter().rev().find_map(|command| match command {
            Command::SetBounds(bounds) => Some(*bounds),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.log.clear();
    }
}

impl OverlaySurface for FakeSurface {
    fn handle(&self) -> SurfaceHandle {
        0xC0FFEE
    }

    fn set_bounds(&mut self, bounds: Rect) -> Result<()> {
        self.log.push(Command::SetBounds(bounds));
        if let Some(monitor) = self.monitor_after_move.take() {
            self.monitor = monitor;
        }
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        self.log.push(Command::Show);
        self.visible = true;
        self.focused = true;
        Ok(())
    }

    fn show_inactive(&mut self) -> Result<()> {
        self.log.push(Command::ShowInactive);
        self.visible = true;
        Ok(())
    }

    fn hide(&mut self) -> Result<()> {
        self.log.push(Command::Hide);
        self.visible = false;
        self.focused = false;
        Ok(())
    }

    fn is_visible(&self) -> Result<bool> {
        Ok(self.visible)
    }

    fn focus(&mut self) -> Result<()> {
        self.log.push(Command::Focus);
        self.focused = true;
        Ok(())
    }

    fn is_focused(&self) -> Result<bool> {
        Ok(self.focused)
    }

    fn set_ignore_mouse_events(&mut self, ignore: bool) -> Result<()> {
        self.log.push(Command::SetIgnoreMouseEvents(ignore));
        Ok(())
    }

    fn set_always_on_top(&mut self, on_top: bool, tier: ZOrderTier) -> Result<()> {
        self.log.push(Command::SetAlwaysOnTop(on_top, tier));
        Ok(())
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        self.log.push(Command::SetFullscreen(fullscreen));
        Ok(())
    }

    fn set_visible_on_all_workspaces(&mut self, visible: bool, _options: WorkspaceOptions) -> Result<()> {
        self.log.push(Command::SetVisibleOnAllWorkspaces(visible));
        Ok(())
    }

    fn monitor_scale(&self) -> Result<MonitorScale> {
        Ok(self.monitor)
    }

    fn primary_display_bounds(&self) -> Result<Rect> {
        Ok(self.primary_display)
    }

    fn measure_title_bar_height(&mut self) -> Result<u32> {
        self.title_bar_measurements += 1;
        Ok(self.title_bar_height)
    }

    fn observe_focus(&mut self, sink: EventSink) -> Result<()> {
        self.focus_sink = Some(sink);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeHook {
    pub start_calls: usize,
    pub started_with: Option<(Option<SurfaceHandle>, String)>,
    pub sink: Option<EventSink>,
    pub focus_target_calls: usize,
    pub edit_controls: usize,
}

impl HookSource for FakeHook {
    fn start(
        &mut self,
        surface: Option<SurfaceHandle>,
        target_title: &str,
        sink: EventSink,
    ) -> Result<()> {
        self.start_calls += 1;
        self.started_with = Some((surface, target_title.to_string()));
        self.sink = Some(sink);
        Ok(())
    }

    fn focus_target(&mut self) -> Result<()> {
        self.focus_target_calls += 1;
        Ok(())
    }

    fn screenshot(&mut self) -> Result<Bitmap> {
        Ok(Bitmap {
            width: 1,
            height: 1,
            data: vec![0, 0, 0, 255],
        })
    }

    fn find_edit_controls(&mut self) -> Result<ControlsResult> {
        Ok(ControlsResult::with_count(self.edit_controls))
    }

    fn input_text_to_edit(&mut self, index: usize, _text: &str) -> Result<bool> {
        Ok(index < self.edit_controls)
    }

    fn get_text_from_edit(&mut self, index: usize) -> Result<Option<String>> {
        Ok((index < self.edit_controls).then(|| format!("edit-{index}")))
    }
}
