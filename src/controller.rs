//! Attachment state machine
//!
//! Consumes target lifecycle events from the hook source and keeps the overlay
//! surface glued to the target: bounds, visibility, click-through, z-order and
//! fullscreen. Pause suspends all of that without dropping the subscription.
//!
//! Everything here runs on one thread. Hook and surface watchers push into the
//! [`EventSink`] queue from wherever they live; [`AttachmentController::pump`]
//! drains it on the controlling thread.

use anyhow::Result;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace};

use crate::constants::bounds::{DPI_PASSES, MOVERESIZE_THROTTLE_MS};
use crate::corrector::Corrector;
use crate::error::{AttachError, AttachResult};
use crate::events::{AttachEvent, HookEvent, Inbound, Notification, PauseEvent, SurfaceFocus};
use crate::fullscreen::{self, FollowUp, FullscreenState};
use crate::hook::{Bitmap, ControlsResult, EventSink, HookSource};
use crate::notify::{Notifier, SubscriptionId};
use crate::platform::Platform;
use crate::surface::{OverlaySurface, ZOrderTier};
use crate::throttle::Throttle;
use crate::types::{AttachmentOptions, MonitorScale, Rect};

/// Which window an imperative call just tried to focus.
/// Cleared once the matching native focus event arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FocusIntent {
    #[default]
    None,
    Overlay,
    Target,
}

const PAUSED: &str = "attachment is paused, resume it first";

pub struct AttachmentController<S: OverlaySurface, H: HookSource> {
    surface: S,
    hook: H,
    platform: Platform,

    initialized: bool,
    options: AttachmentOptions,
    corrector: Corrector,
    title_bar_height: u32,

    // NOTE: stores physical screen pixels on Windows
    target_bounds: Rect,
    target_has_focus: bool,
    is_paused: bool,
    focus_intent: FocusIntent,
    fullscreen: FullscreenState,

    throttle: Throttle,
    inbox: Option<Receiver<Inbound>>,
    notifier: Notifier,
}

impl<S: OverlaySurface, H: HookSource> AttachmentController<S, H> {
    pub fn new(surface: S, hook: H) -> Self {
        Self::with_platform(surface, hook, Platform::current())
    }

    pub fn with_platform(surface: S, hook: H, platform: Platform) -> Self {
        let options = AttachmentOptions::default();
        Self {
            surface,
            hook,
            platform,
            initialized: false,
            corrector: Corrector::new(platform, &options, 0),
            options,
            title_bar_height: 0,
            target_bounds: Rect::default(),
            target_has_focus: false,
            is_paused: false,
            focus_intent: FocusIntent::None,
            fullscreen: FullscreenState::Windowed,
            throttle: Throttle::new(Duration::from_millis(MOVERESIZE_THROTTLE_MS)),
            inbox: None,
            notifier: Notifier::new(),
        }
    }

    /// Override the move/resize throttle window. Only effective before events flow.
    pub fn with_throttle(mut self, interval: Duration) -> Self {
        self.throttle = Throttle::new(interval);
        self
    }

    /// Start tracking the window titled `target_title`. Allowed once per controller.
    pub fn attach(&mut self, target_title: &str, options: AttachmentOptions) -> AttachResult<()> {
        if self.initialized {
            return Err(AttachError::AlreadyInitialized);
        }
        self.initialized = true;

        let (sink, inbox) = EventSink::channel();
        self.inbox = Some(inbox);

        self.surface
            .observe_focus(sink.clone())
            .map_err(AttachError::Surface)?;

        self.options = AttachmentOptions {
            margin_percent: options.margin_percent.clamped(),
            ..options
        };
        if self.platform == Platform::MacOs {
            self.title_bar_height = self
                .surface
                .measure_title_bar_height()
                .map_err(AttachError::Surface)?;
            debug!(height = self.title_bar_height, "measured title bar height");
        }
        self.corrector = Corrector::new(self.platform, &self.options, self.title_bar_height);

        let handle = self.surface.handle();
        self.hook
            .start(Some(handle), target_title, sink)
            .map_err(AttachError::Hook)?;

        info!(title = %target_title, surface = handle, platform = %self.platform, options = ?self.options, "attachment started");
        Ok(())
    }

    // === Event dispatch ===

    pub fn dispatch(&mut self, event: HookEvent) -> AttachResult<()> {
        self.dispatch_at(event, Instant::now())
    }

    /// Route one hook event. Unknown events are dropped.
    pub fn dispatch_at(&mut self, event: HookEvent, now: Instant) -> AttachResult<()> {
        debug!(?event, paused = self.is_paused, "dispatch");
        let result = match event {
            HookEvent::Attach(e) => self.on_attach(e),
            HookEvent::Focus => self.on_focus(),
            HookEvent::Blur => self.on_blur(),
            HookEvent::Detach => self.on_detach(),
            HookEvent::Fullscreen(e) => self.on_fullscreen(e.is_fullscreen),
            HookEvent::MoveResize(e) => self.on_moveresize(e.bounds, now),
            HookEvent::Unknown => {
                debug!("ignoring unknown hook event");
                return Ok(());
            }
        };

        if let Some(notification) = Notification::from_hook(&event) {
            self.notifier.emit(&notification);
        }
        result.map_err(AttachError::Surface)
    }

    /// Host-window focus observer
    pub fn handle_surface_focus(&mut self, focus: SurfaceFocus) -> AttachResult<()> {
        match focus {
            SurfaceFocus::Focused => {
                self.focus_intent = FocusIntent::None;
                Ok(())
            }
            SurfaceFocus::Blurred => {
                if !self.target_has_focus
                    && self.focus_intent != FocusIntent::Target
                    && !self.is_paused
                {
                    debug!("overlay lost focus to another window, hiding");
                    self.surface.hide().map_err(AttachError::Surface)?;
                }
                Ok(())
            }
        }
    }

    fn handle_inbound(&mut self, inbound: Inbound, now: Instant) {
        let result = match inbound {
            Inbound::Hook(event) => self.dispatch_at(event, now),
            Inbound::Surface(focus) => self.handle_surface_focus(focus),
        };
        let _ = result.inspect_err(|err| error!(?inbound, "failed to handle event: err={err}"));
    }

    /// Drain queued events without blocking, then flush a due trailing bounds update.
    /// Returns the number of events handled.
    pub fn pump(&mut self, now: Instant) -> usize {
        let pending: Vec<Inbound> = match &self.inbox {
            Some(inbox) => inbox.try_iter().collect(),
            None => Vec::new(),
        };
        let handled = pending.len();
        for inbound in pending {
            self.handle_inbound(inbound, now);
        }
        let _ = self
            .tick(now)
            .inspect_err(|err| error!("failed to apply throttled bounds: err={err}"));
        handled
    }

    /// Wait up to `timeout` (or the throttle deadline, whichever is first)
    /// for an event, then pump.
    pub fn pump_blocking(&mut self, timeout: Duration) -> usize {
        let wait = match self.throttle.deadline() {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(timeout),
            None => timeout,
        };

        let first = match &self.inbox {
            Some(inbox) => match inbox.recv_timeout(wait) {
                Ok(inbound) => Some(inbound),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => {
                    std::thread::sleep(wait);
                    None
                }
            },
            None => {
                std::thread::sleep(wait);
                None
            }
        };

        let mut handled = 0;
        if let Some(inbound) = first {
            self.handle_inbound(inbound, Instant::now());
            handled += 1;
        }
        handled + self.pump(Instant::now())
    }

    /// Apply a pending trailing move/resize update if its time has come
    pub fn tick(&mut self, now: Instant) -> AttachResult<()> {
        if self.throttle.poll(now) {
            trace!("trailing bounds update");
            self.update_overlay_bounds().map_err(AttachError::Surface)?;
        }
        Ok(())
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.throttle.deadline()
    }

    // === Event handlers ===

    fn on_attach(&mut self, event: AttachEvent) -> Result<()> {
        self.target_has_focus = true;
        self.target_bounds = event.bounds;
        if self.is_paused {
            return Ok(());
        }

        self.glue_surface()?;
        if let Some(is_fullscreen) = event.is_fullscreen {
            self.handle_fullscreen(is_fullscreen)?;
        }
        self.update_overlay_bounds()
    }

    fn on_focus(&mut self) -> Result<()> {
        self.focus_intent = FocusIntent::None;
        self.target_has_focus = true;
        if self.is_paused {
            return Ok(());
        }

        self.set_click_through(true)?;
        if !self.surface.is_visible()? {
            self.surface.show_inactive()?;
            self.surface.set_always_on_top(true, ZOrderTier::ScreenSaver)?;
        }
        Ok(())
    }

    fn on_blur(&mut self) -> Result<()> {
        self.target_has_focus = false;
        if self.is_paused {
            return Ok(());
        }

        // macOS hides unconditionally; elsewhere keep the overlay if focus
        // went to it on purpose or it already holds focus itself
        if self.platform == Platform::MacOs
            || (self.focus_intent != FocusIntent::Overlay && !self.surface.is_focused()?)
        {
            self.surface.hide()?;
        }
        Ok(())
    }

    fn on_detach(&mut self) -> Result<()> {
        self.target_has_focus = false;
        if !self.is_paused {
            self.surface.hide()?;
        }
        Ok(())
    }

    fn on_fullscreen(&mut self, is_fullscreen: bool) -> Result<()> {
        if self.is_paused {
            return Ok(());
        }
        self.handle_fullscreen(is_fullscreen)
    }

    fn on_moveresize(&mut self, bounds: Rect, now: Instant) -> Result<()> {
        self.target_bounds = bounds;
        if !self.is_paused && self.throttle.call(now) {
            self.update_overlay_bounds()?;
        }
        Ok(())
    }

    // === Surface commands ===

    /// Show without focus, pin above the target, restore click-through
    fn glue_surface(&mut self) -> Result<()> {
        self.set_click_through(true)?;
        self.surface.show_inactive()?;
        self.surface.set_always_on_top(true, ZOrderTier::ScreenSaver)
    }

    fn set_click_through(&mut self, ignore: bool) -> Result<()> {
        if self.options.self_handle_clickable {
            return Ok(());
        }
        self.surface.set_ignore_mouse_events(ignore)
    }

    fn handle_fullscreen(&mut self, is_fullscreen: bool) -> Result<()> {
        self.fullscreen = FullscreenState::from_flag(is_fullscreen);
        match fullscreen::apply(&mut self.surface, self.platform, self.fullscreen)? {
            FollowUp::RecomputeBounds => self.update_overlay_bounds(),
            FollowUp::Nothing => Ok(()),
        }
    }

    fn update_overlay_bounds(&mut self) -> Result<()> {
        if self.is_paused {
            return Ok(());
        }
        if self.corrector.trim_title_bar(self.target_bounds).is_empty() {
            trace!(bounds = ?self.target_bounds, "target bounds unknown, not applying");
            return Ok(());
        }

        // Moving can land the surface on a monitor with another scale factor;
        // the second pass converts again with that monitor's context.
        let passes = if self.platform.uses_physical_pixels() {
            DPI_PASSES
        } else {
            1
        };
        for _ in 0..passes {
            let monitor = if self.platform.uses_physical_pixels() {
                self.surface.monitor_scale()?
            } else {
                MonitorScale::IDENTITY
            };
            let bounds = self.corrector.correct(self.target_bounds, &monitor);
            if bounds.is_empty() {
                trace!(raw = ?self.target_bounds, ?bounds, "corrected bounds empty, not applying");
                return Ok(());
            }
            trace!(raw = ?self.target_bounds, ?bounds, "set overlay bounds");
            self.surface.set_bounds(bounds)?;
        }
        Ok(())
    }

    // === Imperative operations ===

    fn require_initialized(&self, operation: &'static str) -> AttachResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(AttachError::NotInitialized { operation })
        }
    }

    fn require_running(&self, operation: &'static str) -> AttachResult<()> {
        self.require_initialized(operation)?;
        if self.is_paused {
            return Err(AttachError::InvalidState {
                operation,
                reason: PAUSED,
            });
        }
        Ok(())
    }

    /// Make the overlay clickable and give it OS focus
    pub fn activate_overlay(&mut self) -> AttachResult<()> {
        self.require_running("activate overlay")?;
        self.focus_intent = FocusIntent::Overlay;
        self.set_click_through(false).map_err(AttachError::Surface)?;
        self.surface.focus().map_err(AttachError::Surface)
    }

    /// Hand OS focus back to the target, overlay becomes click-through again
    pub fn focus_target(&mut self) -> AttachResult<()> {
        self.require_running("focus target")?;
        self.focus_intent = FocusIntent::Target;
        self.set_click_through(true).map_err(AttachError::Surface)?;
        self.hook.focus_target().map_err(AttachError::Hook)
    }

    /// Detach the overlay from the target's movements and focus. The surface
    /// stays visible and becomes independently usable.
    pub fn pause(&mut self) -> AttachResult<()> {
        self.require_initialized("pause")?;
        if self.is_paused {
            return Ok(());
        }
        self.is_paused = true;
        info!("attachment paused");

        let result = self
            .surface
            .set_ignore_mouse_events(false)
            .and_then(|_| self.surface.set_always_on_top(false, ZOrderTier::Normal));

        self.notifier
            .emit(&Notification::Pause(PauseEvent { is_paused: true }));
        result.map_err(AttachError::Surface)
    }

    /// Re-glue the overlay. Surface state is restored right away only if the
    /// target has focus; otherwise the next focus event does it.
    pub fn resume(&mut self) -> AttachResult<()> {
        self.require_initialized("resume")?;
        if !self.is_paused {
            return Ok(());
        }
        self.is_paused = false;
        info!(target_has_focus = self.target_has_focus, "attachment resumed");

        let result = if self.target_has_focus {
            self.glue_surface().and_then(|_| self.update_overlay_bounds())
        } else {
            Ok(())
        };

        self.notifier
            .emit(&Notification::Resume(PauseEvent { is_paused: false }));
        result.map_err(AttachError::Surface)
    }

    // === Windows-only passthroughs ===

    fn require_automation(&self, operation: &'static str) -> AttachResult<()> {
        if self.platform.supports_automation() {
            Ok(())
        } else {
            Err(AttachError::UnsupportedPlatform {
                operation,
                platform: self.platform,
            })
        }
    }

    /// Raw bitmap of the target's client area
    pub fn screenshot(&mut self) -> AttachResult<Bitmap> {
        self.require_automation("screenshot")?;
        self.hook.screenshot().map_err(AttachError::Hook)
    }

    pub fn find_edit_controls(&mut self) -> AttachResult<ControlsResult> {
        self.require_automation("find edit controls")?;
        self.hook.find_edit_controls().map_err(AttachError::Hook)
    }

    pub fn input_text_to_edit(&mut self, index: usize, text: &str) -> AttachResult<bool> {
        self.require_automation("input text to edit")?;
        self.hook.input_text_to_edit(index, text).map_err(AttachError::Hook)
    }

    pub fn get_text_from_edit(&mut self, index: usize) -> AttachResult<Option<String>> {
        self.require_automation("get text from edit")?;
        self.hook.get_text_from_edit(index).map_err(AttachError::Hook)
    }

    pub fn find_button_controls(&mut self) -> AttachResult<ControlsResult> {
        self.require_automation("find button controls")?;
        self.hook.find_button_controls().map_err(AttachError::Hook)
    }

    pub fn click_button(&mut self, index: usize) -> AttachResult<bool> {
        self.require_automation("click button")?;
        self.hook.click_button(index).map_err(AttachError::Hook)
    }

    pub fn find_buttons_with_images(&mut self) -> AttachResult<ControlsResult> {
        self.require_automation("find buttons with images")?;
        self.hook.find_buttons_with_images().map_err(AttachError::Hook)
    }

    pub fn click_first_button_with_image(&mut self) -> AttachResult<bool> {
        self.require_automation("click first button with image")?;
        self.hook
            .click_first_button_with_image()
            .map_err(AttachError::Hook)
    }

    // === Observers ===

    pub fn subscribe(&mut self, callback: impl FnMut(&Notification) + 'static) -> SubscriptionId {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // === Queries ===

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn target_bounds(&self) -> Rect {
        self.target_bounds
    }

    pub fn target_has_focus(&self) -> bool {
        self.target_has_focus
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_fullscreen()
    }

    pub fn focus_intent(&self) -> FocusIntent {
        self.focus_intent
    }

    pub fn title_bar_height(&self) -> u32 {
        self.title_bar_height
    }

    pub fn options(&self) -> &AttachmentOptions {
        &self.options
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub fn hook_mut(&mut self) -> &mut H {
        &mut self.hook
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{FullscreenEvent, MoveResizeEvent};
    use crate::test_support::{Command, FakeHook, FakeSurface};
    use crate::types::MarginPercent;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Controller = AttachmentController<FakeSurface, FakeHook>;

    const TARGET: Rect = Rect::new(100, 100, 800, 600);

    fn attached(platform: Platform, options: AttachmentOptions) -> Controller {
        let mut controller = Controller::with_platform(FakeSurface::new(), FakeHook::default(), platform);
        controller.attach("Target", options).unwrap();
        controller
    }

    fn attach_event(bounds: Rect) -> HookEvent {
        HookEvent::Attach(AttachEvent {
            has_access: None,
            is_fullscreen: None,
            bounds,
        })
    }

    fn moveresize(bounds: Rect) -> HookEvent {
        HookEvent::MoveResize(MoveResizeEvent { bounds })
    }

    fn record_notifications(controller: &mut Controller) -> Rc<RefCell<Vec<&'static str>>> {
        let names = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&names);
        controller.subscribe(move |n| sink.borrow_mut().push(n.name()));
        names
    }

    #[test]
    fn test_attach_starts_hook_once() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        assert_eq!(controller.hook().start_calls, 1);
        assert_eq!(
            controller.hook().started_with,
            Some((Some(0xC0FFEE), "Target".to_string()))
        );

        let err = controller
            .attach("Other", AttachmentOptions::default())
            .unwrap_err();
        assert!(matches!(err, AttachError::AlreadyInitialized));
        assert_eq!(controller.hook().start_calls, 1);

        // first subscription keeps working
        controller.dispatch(attach_event(TARGET)).unwrap();
        assert_eq!(controller.surface().last_bounds(), Some(TARGET));
    }

    #[test]
    fn test_attach_event_glues_surface() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        controller.dispatch(attach_event(TARGET)).unwrap();

        assert!(controller.target_has_focus());
        assert_eq!(
            controller.surface().commands(),
            vec![
                Command::SetIgnoreMouseEvents(true),
                Command::ShowInactive,
                Command::SetAlwaysOnTop(true, ZOrderTier::ScreenSaver),
                Command::SetBounds(TARGET),
            ]
        );
    }

    #[test]
    fn test_self_handle_clickable_leaves_click_through_alone() {
        let options = AttachmentOptions {
            self_handle_clickable: true,
            ..Default::default()
        };
        let mut controller = attached(Platform::Linux, options);
        controller.dispatch(attach_event(TARGET)).unwrap();
        controller.dispatch(HookEvent::Focus).unwrap();
        controller.activate_overlay().unwrap();
        controller.focus_target().unwrap();

        assert!(
            !controller
                .surface()
                .commands()
                .iter()
                .any(|c| matches!(c, Command::SetIgnoreMouseEvents(_)))
        );
    }

    #[test]
    fn test_sentinel_bounds_not_applied() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        controller.dispatch(attach_event(Rect::default())).unwrap();
        assert_eq!(controller.surface().last_bounds(), None);
        assert!(controller.surface().visible);
    }

    #[test]
    fn test_empty_corrected_bounds_not_applied() {
        let options = AttachmentOptions {
            margin_percent: MarginPercent { top: 60.0, bottom: 50.0, ..Default::default() },
            ..Default::default()
        };
        let mut controller = attached(Platform::Linux, options);
        let t0 = Instant::now();
        controller.dispatch_at(attach_event(TARGET), t0).unwrap();
        controller
            .dispatch_at(moveresize(Rect::new(0, 0, 800, 600)), t0 + Duration::from_millis(100))
            .unwrap();

        assert!(controller.surface().visible);
        assert!(
            !controller
                .surface()
                .commands()
                .iter()
                .any(|c| matches!(c, Command::SetBounds(b) if b.is_empty())),
            "empty bounds reached the surface: {:?}",
            controller.surface().commands()
        );
        assert_eq!(controller.surface().last_bounds(), None);
    }

    #[test]
    fn test_sliver_rounded_away_by_dpi_not_applied() {
        let mut controller = attached(Platform::Windows, AttachmentOptions::default());
        controller.surface_mut().monitor = MonitorScale {
            scale_factor: 4.0,
            ..MonitorScale::IDENTITY
        };
        controller.dispatch(attach_event(Rect::new(0, 0, 1, 600))).unwrap();
        assert_eq!(controller.surface().last_bounds(), None);
    }

    #[test]
    fn test_last_bounds_follow_last_moveresize() {
        let options = AttachmentOptions {
            margin_percent: MarginPercent { top: 10.0, left: 5.0, ..Default::default() },
            ..Default::default()
        };
        let mut controller = attached(Platform::Linux, options);
        let t0 = Instant::now();
        controller.dispatch_at(attach_event(TARGET), t0).unwrap();
        controller
            .dispatch_at(moveresize(Rect::new(0, 0, 500, 500)), t0)
            .unwrap();
        controller
            .dispatch_at(moveresize(Rect::new(0, 0, 1000, 1000)), t0 + Duration::from_millis(100))
            .unwrap();
        controller.dispatch_at(HookEvent::Detach, t0 + Duration::from_millis(110)).unwrap();

        assert_eq!(controller.surface().last_bounds(), Some(Rect::new(50, 100, 950, 900)));
        assert_eq!(controller.surface().commands().last(), Some(&Command::Hide));
    }

    #[test]
    fn test_moveresize_burst_is_throttled() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        let t0 = Instant::now();
        controller.dispatch_at(attach_event(TARGET), t0).unwrap();
        controller.surface_mut().clear();

        let t1 = t0 + Duration::from_millis(100);
        for step in 0..5 {
            let bounds = Rect::new(step * 10, 0, 800, 600);
            controller
                .dispatch_at(moveresize(bounds), t1 + Duration::from_millis(step as u64 * 5))
                .unwrap();
        }
        // leading update only
        assert_eq!(
            controller.surface().commands(),
            vec![Command::SetBounds(Rect::new(0, 0, 800, 600))]
        );

        let deadline = controller.next_deadline().unwrap();
        assert_eq!(deadline, t1 + Duration::from_millis(MOVERESIZE_THROTTLE_MS));
        controller.tick(deadline).unwrap();
        assert_eq!(
            controller.surface().commands(),
            vec![
                Command::SetBounds(Rect::new(0, 0, 800, 600)),
                Command::SetBounds(Rect::new(40, 0, 800, 600)),
            ]
        );
        assert_eq!(controller.next_deadline(), None);
    }

    #[test]
    fn test_paused_events_issue_no_surface_commands() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        let t0 = Instant::now();
        controller.dispatch_at(attach_event(TARGET), t0).unwrap();
        controller.pause().unwrap();
        controller.surface_mut().clear();

        let events = [
            attach_event(Rect::new(5, 5, 50, 50)),
            HookEvent::Focus,
            HookEvent::Blur,
            HookEvent::Detach,
            HookEvent::Fullscreen(FullscreenEvent { is_fullscreen: true }),
            moveresize(Rect::new(1, 2, 3, 4)),
            moveresize(Rect::new(1, 2, 30, 40)),
        ];
        for (i, event) in events.into_iter().enumerate() {
            controller
                .dispatch_at(event, t0 + Duration::from_millis(i as u64))
                .unwrap();
        }
        controller.tick(t0 + Duration::from_secs(1)).unwrap();
        controller
            .handle_surface_focus(SurfaceFocus::Blurred)
            .unwrap();

        assert!(controller.surface().commands().is_empty());
        // state still tracked
        assert_eq!(controller.target_bounds(), Rect::new(1, 2, 30, 40));
        assert!(!controller.is_fullscreen());
    }

    #[test]
    fn test_pause_resume_with_focused_target_restores_glue() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        controller.dispatch(attach_event(TARGET)).unwrap();
        controller.surface_mut().clear();

        controller.pause().unwrap();
        assert!(controller.is_paused());
        assert_eq!(
            controller.surface().commands(),
            vec![
                Command::SetIgnoreMouseEvents(false),
                Command::SetAlwaysOnTop(false, ZOrderTier::Normal),
            ]
        );
        assert!(controller.surface().visible);

        controller.surface_mut().clear();
        controller.resume().unwrap();
        assert!(!controller.is_paused());
        assert_eq!(
            controller.surface().commands(),
            vec![
                Command::SetIgnoreMouseEvents(true),
                Command::ShowInactive,
                Command::SetAlwaysOnTop(true, ZOrderTier::ScreenSaver),
                Command::SetBounds(TARGET),
            ]
        );
    }

    #[test]
    fn test_resume_without_target_focus_issues_nothing() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        controller.dispatch(attach_event(TARGET)).unwrap();
        controller.dispatch(HookEvent::Blur).unwrap();
        controller.pause().unwrap();
        controller.surface_mut().clear();

        controller.resume().unwrap();
        assert!(controller.surface().commands().is_empty());
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        let names = record_notifications(&mut controller);

        controller.pause().unwrap();
        controller.surface_mut().clear();
        controller.pause().unwrap();

        assert!(controller.surface().commands().is_empty());
        assert_eq!(*names.borrow(), vec!["pause"]);

        controller.resume().unwrap();
        controller.resume().unwrap();
        assert_eq!(*names.borrow(), vec!["pause", "resume"]);
    }

    #[test]
    fn test_operations_before_attach_fail() {
        let mut controller = Controller::with_platform(FakeSurface::new(), FakeHook::default(), Platform::Linux);
        assert!(matches!(controller.pause(), Err(AttachError::NotInitialized { .. })));
        assert!(matches!(controller.resume(), Err(AttachError::NotInitialized { .. })));
        assert!(matches!(
            controller.activate_overlay(),
            Err(AttachError::NotInitialized { .. })
        ));
        assert!(matches!(
            controller.focus_target(),
            Err(AttachError::NotInitialized { .. })
        ));
        assert!(!controller.is_paused());
    }

    #[test]
    fn test_activate_and_focus_target_fail_while_paused() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        controller.pause().unwrap();

        let err = controller.activate_overlay().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE");
        let err = controller.focus_target().unwrap_err();
        assert!(matches!(err, AttachError::InvalidState { operation: "focus target", .. }));
        assert_eq!(controller.hook().focus_target_calls, 0);
    }

    #[test]
    fn test_activate_overlay() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        controller.dispatch(attach_event(TARGET)).unwrap();
        controller.surface_mut().clear();

        controller.activate_overlay().unwrap();
        assert_eq!(controller.focus_intent(), FocusIntent::Overlay);
        assert_eq!(
            controller.surface().commands(),
            vec![Command::SetIgnoreMouseEvents(false), Command::Focus]
        );
    }

    #[test]
    fn test_focus_target_calls_hook() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        controller.focus_target().unwrap();
        assert_eq!(controller.focus_intent(), FocusIntent::Target);
        assert_eq!(controller.hook().focus_target_calls, 1);
        assert_eq!(
            controller.surface().commands(),
            vec![Command::SetIgnoreMouseEvents(true)]
        );

        controller.dispatch(HookEvent::Focus).unwrap();
        assert_eq!(controller.focus_intent(), FocusIntent::None);
    }

    #[test]
    fn test_blur_keeps_overlay_after_activate() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        controller.dispatch(attach_event(TARGET)).unwrap();
        controller.activate_overlay().unwrap();
        controller.surface_mut().clear();

        controller.dispatch(HookEvent::Blur).unwrap();
        assert!(!controller.target_has_focus());
        assert!(controller.surface().commands().is_empty());
        assert!(controller.surface().visible);
    }

    #[test]
    fn test_blur_hides_when_user_switches_away() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        controller.dispatch(attach_event(TARGET)).unwrap();
        controller.surface_mut().clear();

        controller.dispatch(HookEvent::Blur).unwrap();
        assert_eq!(controller.surface().commands(), vec![Command::Hide]);
    }

    #[test]
    fn test_blur_keeps_overlay_that_holds_focus() {
        let mut controller = attached(Platform::Windows, AttachmentOptions::default());
        controller.dispatch(attach_event(TARGET)).unwrap();
        controller.surface_mut().focused = true;
        controller.surface_mut().clear();

        controller.dispatch(HookEvent::Blur).unwrap();
        assert!(controller.surface().commands().is_empty());
    }

    #[test]
    fn test_blur_always_hides_on_mac() {
        let mut controller = attached(Platform::MacOs, AttachmentOptions::default());
        controller.dispatch(attach_event(TARGET)).unwrap();
        controller.activate_overlay().unwrap();
        controller.surface_mut().clear();

        controller.dispatch(HookEvent::Blur).unwrap();
        assert_eq!(controller.surface().commands(), vec![Command::Hide]);
    }

    #[test]
    fn test_focus_reshows_hidden_overlay() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        controller.dispatch(attach_event(TARGET)).unwrap();
        controller.dispatch(HookEvent::Blur).unwrap();
        controller.surface_mut().clear();

        controller.dispatch(HookEvent::Focus).unwrap();
        assert_eq!(
            controller.surface().commands(),
            vec![
                Command::SetIgnoreMouseEvents(true),
                Command::ShowInactive,
                Command::SetAlwaysOnTop(true, ZOrderTier::ScreenSaver),
            ]
        );

        // already visible: only click-through is refreshed
        controller.surface_mut().clear();
        controller.dispatch(HookEvent::Focus).unwrap();
        assert_eq!(
            controller.surface().commands(),
            vec![Command::SetIgnoreMouseEvents(true)]
        );
    }

    #[test]
    fn test_surface_blur_observer() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        controller.dispatch(attach_event(TARGET)).unwrap();
        controller.activate_overlay().unwrap();
        controller.dispatch(HookEvent::Blur).unwrap();
        controller.handle_surface_focus(SurfaceFocus::Focused).unwrap();
        assert_eq!(controller.focus_intent(), FocusIntent::None);
        controller.surface_mut().clear();

        // overlay loses focus to some third window
        controller.handle_surface_focus(SurfaceFocus::Blurred).unwrap();
        assert_eq!(controller.surface().commands(), vec![Command::Hide]);
    }

    #[test]
    fn test_surface_blur_towards_target_keeps_overlay() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        controller.dispatch(attach_event(TARGET)).unwrap();
        controller.activate_overlay().unwrap();
        controller.dispatch(HookEvent::Blur).unwrap();
        controller.focus_target().unwrap();
        controller.surface_mut().clear();

        controller.handle_surface_focus(SurfaceFocus::Blurred).unwrap();
        assert!(controller.surface().commands().is_empty());
    }

    #[test]
    fn test_windows_dpi_two_pass() {
        let mut controller = attached(Platform::Windows, AttachmentOptions::default());
        controller.surface_mut().monitor = MonitorScale::IDENTITY;
        controller.surface_mut().monitor_after_move = Some(MonitorScale {
            scale_factor: 2.0,
            ..MonitorScale::IDENTITY
        });
        controller.surface_mut().clear();

        controller
            .dispatch(moveresize(Rect::new(200, 100, 1600, 1200)))
            .unwrap();
        assert_eq!(
            controller.surface().commands(),
            vec![
                Command::SetBounds(Rect::new(200, 100, 1600, 1200)),
                Command::SetBounds(Rect::new(100, 50, 800, 600)),
            ]
        );
    }

    #[test]
    fn test_mac_title_bar_measured_and_trimmed() {
        let mut surface = FakeSurface::new();
        surface.title_bar_height = 28;
        let mut controller = Controller::with_platform(surface, FakeHook::default(), Platform::MacOs);
        let options = AttachmentOptions {
            has_title_bar_on_mac: true,
            ..Default::default()
        };
        controller.attach("Untitled", options).unwrap();
        assert_eq!(controller.title_bar_height(), 28);
        assert_eq!(controller.surface().title_bar_measurements, 1);

        controller.dispatch(attach_event(Rect::new(0, 0, 800, 600))).unwrap();
        assert_eq!(controller.surface().last_bounds(), Some(Rect::new(0, 28, 800, 572)));
    }

    #[test]
    fn test_title_bar_not_measured_off_mac() {
        let controller = attached(Platform::Linux, AttachmentOptions::default());
        assert_eq!(controller.surface().title_bar_measurements, 0);
    }

    #[test]
    fn test_fullscreen_mirrors_target() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        controller
            .dispatch(HookEvent::Fullscreen(FullscreenEvent { is_fullscreen: true }))
            .unwrap();
        assert!(controller.is_fullscreen());
        assert_eq!(controller.surface().commands(), vec![Command::SetFullscreen(true)]);
    }

    #[test]
    fn test_mac_fullscreen_exit_restores_bounds() {
        let mut controller = attached(Platform::MacOs, AttachmentOptions::default());
        let event = AttachEvent {
            has_access: None,
            is_fullscreen: Some(true),
            bounds: TARGET,
        };
        controller.dispatch(HookEvent::Attach(event)).unwrap();
        controller.surface_mut().clear();

        controller
            .dispatch(HookEvent::Fullscreen(FullscreenEvent { is_fullscreen: false }))
            .unwrap();
        assert!(!controller.is_fullscreen());
        assert_eq!(
            controller.surface().commands(),
            vec![
                Command::SetVisibleOnAllWorkspaces(false),
                Command::SetBounds(TARGET),
            ]
        );
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        let names = record_notifications(&mut controller);
        controller.dispatch(HookEvent::Unknown).unwrap();
        assert!(controller.surface().commands().is_empty());
        assert!(names.borrow().is_empty());
    }

    #[test]
    fn test_notifications_follow_event_stream() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        let names = record_notifications(&mut controller);
        let t0 = Instant::now();

        controller.dispatch_at(attach_event(TARGET), t0).unwrap();
        controller.dispatch_at(moveresize(TARGET), t0).unwrap();
        controller.pause().unwrap();
        controller.dispatch_at(HookEvent::Blur, t0).unwrap();
        controller.resume().unwrap();
        controller.dispatch_at(HookEvent::Detach, t0).unwrap();

        assert_eq!(
            *names.borrow(),
            vec!["attach", "moveresize", "pause", "blur", "resume", "detach"]
        );
    }

    #[test]
    fn test_pump_drains_hook_and_surface_queue() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        let hook_sink = controller.hook().sink.clone().unwrap();
        let surface_sink = controller.surface().focus_sink.clone().unwrap();

        hook_sink.emit(attach_event(TARGET));
        hook_sink.emit(HookEvent::Blur);
        surface_sink.surface_focus(SurfaceFocus::Focused);

        assert_eq!(controller.pump(Instant::now()), 3);
        assert!(!controller.target_has_focus());
        assert_eq!(controller.target_bounds(), TARGET);
        assert_eq!(controller.pump(Instant::now()), 0);
    }

    #[test]
    fn test_pump_blocking_times_out_without_events() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        assert_eq!(controller.pump_blocking(Duration::from_millis(1)), 0);
    }

    #[test]
    fn test_automation_is_windows_only() {
        let mut controller = attached(Platform::Linux, AttachmentOptions::default());
        let err = controller.screenshot().unwrap_err();
        assert!(matches!(
            err,
            AttachError::UnsupportedPlatform { operation: "screenshot", platform: Platform::Linux }
        ));
        assert!(matches!(
            controller.find_edit_controls(),
            Err(AttachError::UnsupportedPlatform { .. })
        ));
        assert!(matches!(
            controller.click_first_button_with_image(),
            Err(AttachError::UnsupportedPlatform { .. })
        ));
    }

    #[test]
    fn test_automation_not_found_is_data() {
        let mut controller = attached(Platform::Windows, AttachmentOptions::default());
        assert_eq!(controller.find_edit_controls().unwrap(), ControlsResult::not_found());
        assert_eq!(controller.get_text_from_edit(0).unwrap(), None);

        controller.hook_mut().edit_controls = 2;
        assert_eq!(
            controller.find_edit_controls().unwrap(),
            ControlsResult { found: true, count: 2 }
        );
        assert!(controller.input_text_to_edit(1, "hello").unwrap());
        assert_eq!(controller.get_text_from_edit(1).unwrap(), Some("edit-1".to_string()));
        assert_eq!(controller.screenshot().unwrap().width, 1);

        // FakeHook keeps the default button implementations
        assert!(matches!(
            controller.find_button_controls(),
            Err(AttachError::Hook(_))
        ));
    }
}
