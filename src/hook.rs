//! Native hook source contract
//!
//! A hook source tracks the target window from its own OS-level context and
//! hands events to the controller through an [`EventSink`]. Everything it
//! sends is marshaled onto the controlling thread by the controller's queue.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::debug;

use crate::events::{HookEvent, Inbound, SurfaceFocus};

/// Native window identifier of the overlay surface (HWND, NSView*, X11 window id)
pub type SurfaceHandle = u64;

/// Sending half of the controller's hand-off queue
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: Sender<Inbound>,
}

impl EventSink {
    pub fn channel() -> (EventSink, Receiver<Inbound>) {
        let (sender, receiver) = mpsc::channel();
        (EventSink { sender }, receiver)
    }

    /// Returns false once the controller side is gone
    pub fn emit(&self, event: HookEvent) -> bool {
        self.send(Inbound::Hook(event))
    }

    pub fn surface_focus(&self, focus: SurfaceFocus) -> bool {
        self.send(Inbound::Surface(focus))
    }

    fn send(&self, inbound: Inbound) -> bool {
        match self.sender.send(inbound) {
            Ok(()) => true,
            Err(e) => {
                debug!(event = ?e.0, "event sink closed, dropping event");
                false
            }
        }
    }
}

/// Raw 32-bit BGRA bitmap, top-down rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Outcome of an accessibility control discovery.
/// Finding nothing is a normal result, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlsResult {
    pub found: bool,
    pub count: usize,
}

impl ControlsResult {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn with_count(count: usize) -> Self {
        Self {
            found: count > 0,
            count,
        }
    }
}

/// Native hook: window tracking plus the imperative calls it exposes.
///
/// Screenshot and accessibility operations address controls by 0-based index
/// into the most recent discovery result. Backends that cannot provide them
/// keep the default implementations.
pub trait HookSource {
    /// Begin tracking the window whose title equals `target_title`
    fn start(
        &mut self,
        surface: Option<SurfaceHandle>,
        target_title: &str,
        sink: EventSink,
    ) -> Result<()>;

    /// Move OS focus to the tracked window
    fn focus_target(&mut self) -> Result<()>;

    fn screenshot(&mut self) -> Result<Bitmap> {
        bail!("screenshot is not provided by this hook source")
    }

    fn find_edit_controls(&mut self) -> Result<ControlsResult> {
        bail!("accessibility is not provided by this hook source")
    }

    fn input_text_to_edit(&mut self, _index: usize, _text: &str) -> Result<bool> {
        bail!("accessibility is not provided by this hook source")
    }

    fn get_text_from_edit(&mut self, _index: usize) -> Result<Option<String>> {
        bail!("accessibility is not provided by this hook source")
    }

    fn find_button_controls(&mut self) -> Result<ControlsResult> {
        bail!("accessibility is not provided by this hook source")
    }

    fn click_button(&mut self, _index: usize) -> Result<bool> {
        bail!("accessibility is not provided by this hook source")
    }

    fn find_buttons_with_images(&mut self) -> Result<ControlsResult> {
        bail!("accessibility is not provided by this hook source")
    }

    fn click_first_button_with_image(&mut self) -> Result<bool> {
        bail!("accessibility is not provided by this hook source")
    }
}

impl<H: HookSource + ?Sized> HookSource for Box<H> {
    fn start(
        &mut self,
        surface: Option<SurfaceHandle>,
        target_title: &str,
        sink: EventSink,
    ) -> Result<()> {
        (**self).start(surface, target_title, sink)
    }

    fn focus_target(&mut self) -> Result<()> {
        (**self).focus_target()
    }

    fn screenshot(&mut self) -> Result<Bitmap> {
        (**self).screenshot()
    }

    fn find_edit_controls(&mut self) -> Result<ControlsResult> {
        (**self).find_edit_controls()
    }

    fn input_text_to_edit(&mut self, index: usize, text: &str) -> Result<bool> {
        (**self).input_text_to_edit(index, text)
    }

    fn get_text_from_edit(&mut self, index: usize) -> Result<Option<String>> {
        (**self).get_text_from_edit(index)
    }

    fn find_button_controls(&mut self) -> Result<ControlsResult> {
        (**self).find_button_controls()
    }

    fn click_button(&mut self, index: usize) -> Result<bool> {
        (**self).click_button(index)
    }

    fn find_buttons_with_images(&mut self) -> Result<ControlsResult> {
        (**self).find_buttons_with_images()
    }

    fn click_first_button_with_image(&mut self) -> Result<bool> {
        (**self).click_first_button_with_image()
    }
}
