//! X11 hook source
//!
//! Runs on its own connection and thread. Foreground changes come from root
//! `_NET_ACTIVE_WINDOW` property notifications; the target and the current
//! foreground window get `STRUCTURE_NOTIFY | PROPERTY_CHANGE` selected so
//! geometry, destruction, state and title changes reach us too.

use anyhow::{Context, Result, bail};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use tracing::{debug, error, info, trace, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::events::HookEvent;
use crate::hook::{EventSink, HookSource, SurfaceHandle};
use crate::x11::tracker::{TargetSnapshot, TargetTracker};
use crate::x11_utils::{self, CachedAtoms};

struct Shared {
    conn: RustConnection,
    screen_num: usize,
    atoms: CachedAtoms,
}

impl Shared {
    fn screen(&self) -> &Screen {
        &self.conn.setup().roots[self.screen_num]
    }
}

pub struct X11HookSource {
    shared: Option<Arc<Shared>>,
    target: Arc<AtomicU32>,
    worker: Option<thread::JoinHandle<()>>,
}

impl X11HookSource {
    pub fn new() -> Self {
        Self {
            shared: None,
            target: Arc::new(AtomicU32::new(x11rb::NONE)),
            worker: None,
        }
    }

    /// False once the watcher thread exited (connection loss or closed queue)
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }
}

impl Default for X11HookSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HookSource for X11HookSource {
    fn start(
        &mut self,
        surface: Option<SurfaceHandle>,
        target_title: &str,
        sink: EventSink,
    ) -> Result<()> {
        if self.shared.is_some() {
            bail!("X11 hook source already started");
        }

        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X11 server")?;
        let atoms = CachedAtoms::new(&conn)?;
        let shared = Arc::new(Shared {
            conn,
            screen_num,
            atoms,
        });

        let root = shared.screen().root;
        shared
            .conn
            .change_window_attributes(
                root,
                &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
            )
            .context("Failed to select root window events")?;
        shared.conn.flush().context("Failed to flush X11 connection")?;

        info!(title = %target_title, surface = ?surface, screen = screen_num, "X11 hook started");

        let mut watcher = Watcher {
            shared: Arc::clone(&shared),
            tracker: TargetTracker::new(target_title),
            target: Arc::clone(&self.target),
            sink,
        };
        let handle = thread::Builder::new()
            .name("x11-hook".into())
            .spawn(move || {
                if let Err(e) = watcher.run() {
                    error!(error = ?e, "X11 hook stopped");
                }
            })
            .context("Failed to spawn X11 hook thread")?;

        self.shared = Some(shared);
        self.worker = Some(handle);
        Ok(())
    }

    fn focus_target(&mut self) -> Result<()> {
        let Some(shared) = &self.shared else {
            bail!("X11 hook source not started");
        };
        let target = self.target.load(Ordering::Acquire);
        if target == x11rb::NONE {
            warn!("No target window to focus");
            return Ok(());
        }
        debug!(window = target, "focusing target");
        x11_utils::activate_window(&shared.conn, shared.screen(), &shared.atoms, target)
    }
}

struct Watcher {
    shared: Arc<Shared>,
    tracker: TargetTracker,
    target: Arc<AtomicU32>,
    sink: EventSink,
}

impl Watcher {
    fn run(&mut self) -> Result<()> {
        let initial = self.check_foreground()?;
        if !self.emit_all(initial) {
            return Ok(());
        }

        loop {
            let event = self
                .shared
                .conn
                .wait_for_event()
                .context("Failed to wait for X11 event")?;
            let events = self
                .handle_event(event)
                .inspect_err(|err| error!("encountered error in X11 hook: err={err:#}"))
                .unwrap_or_default();

            if !self.emit_all(events) {
                return Ok(());
            }
        }
    }

    fn emit_all(&self, events: Vec<HookEvent>) -> bool {
        for event in events {
            if !self.sink.emit(event) {
                info!("Controller queue closed, stopping X11 hook");
                return false;
            }
        }
        true
    }

    fn handle_event(&mut self, event: Event) -> Result<Vec<HookEvent>> {
        let atoms = self.shared.atoms;
        let root = self.shared.screen().root;

        match event {
            Event::PropertyNotify(ev) if ev.window == root && ev.atom == atoms.net_active_window => {
                self.check_foreground()
            }
            Event::PropertyNotify(ev) if atoms.is_title(ev.atom) => {
                // the foreground window may have been renamed to the target title
                let active = x11_utils::active_window(&self.shared.conn, self.shared.screen(), &atoms)?;
                if active == Some(ev.window) && self.tracker.target() != Some(ev.window) {
                    self.check_foreground()
                } else {
                    Ok(Vec::new())
                }
            }
            Event::PropertyNotify(ev) if ev.atom == atoms.net_wm_state => {
                if self.tracker.target() != Some(ev.window) {
                    return Ok(Vec::new());
                }
                let fullscreen = x11_utils::is_fullscreen(&self.shared.conn, &atoms, ev.window)?;
                Ok(self.tracker.on_state(ev.window, fullscreen).into_iter().collect())
            }
            Event::ConfigureNotify(ev) => {
                if self.tracker.target() != Some(ev.window) {
                    return Ok(Vec::new());
                }
                let bounds = x11_utils::root_geometry(&self.shared.conn, self.shared.screen(), ev.window)?;
                Ok(self.tracker.on_configure(ev.window, bounds).into_iter().collect())
            }
            Event::DestroyNotify(ev) => {
                let events = self.tracker.on_destroyed(ev.window);
                self.publish_target();
                Ok(events)
            }
            other => {
                trace!(event = ?other, "ignored X11 event");
                Ok(Vec::new())
            }
        }
    }

    fn check_foreground(&mut self) -> Result<Vec<HookEvent>> {
        let conn = &self.shared.conn;
        let screen = self.shared.screen();
        let atoms = self.shared.atoms;

        let active = x11_utils::active_window(conn, screen, &atoms)?;
        let title = match active {
            Some(window) => {
                if self.tracker.target() != Some(window) {
                    select_window_events(conn, window);
                }
                x11_utils::window_title(conn, &atoms, window).unwrap_or_else(|e| {
                    debug!(window, error = %e, "could not read window title");
                    None
                })
            }
            None => None,
        };
        trace!(active = ?active, title = ?title, "foreground changed");

        let events = self.tracker.on_foreground(active, title.as_deref(), |window| {
            let bounds = x11_utils::root_geometry(conn, screen, window).ok()?;
            let is_fullscreen = x11_utils::is_fullscreen(conn, &atoms, window).unwrap_or(false);
            Some(TargetSnapshot {
                bounds,
                is_fullscreen,
            })
        });
        self.publish_target();
        Ok(events)
    }

    fn publish_target(&self) {
        self.target
            .store(self.tracker.target().unwrap_or(x11rb::NONE), Ordering::Release);
    }
}

/// Best effort: the window may already be gone
fn select_window_events(conn: &RustConnection, window: Window) {
    let result = conn.change_window_attributes(
        window,
        &ChangeWindowAttributesAux::new()
            .event_mask(EventMask::STRUCTURE_NOTIFY | EventMask::PROPERTY_CHANGE),
    );
    if let Err(e) = result.map(|cookie| cookie.ignore_error()) {
        debug!(window, error = %e, "failed to select window events");
    }
}
