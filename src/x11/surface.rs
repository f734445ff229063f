//! X11 overlay surface
//!
//! An undecorated top-level window managed through EWMH client messages.
//! Click-through is an empty SHAPE input region. Focus changes are read on a
//! watcher thread that shares the connection.

use anyhow::{Context, Result, bail};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, trace};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::Event;
use x11rb::protocol::shape::{self, ConnectionExt as ShapeExt, SK, SO};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperExt;

use crate::constants::x11;
use crate::events::SurfaceFocus;
use crate::hook::{EventSink, SurfaceHandle};
use crate::surface::{OverlaySurface, WorkspaceOptions, ZOrderTier};
use crate::types::{MonitorScale, Rect};
use crate::x11_utils::{self, CachedAtoms};

pub struct X11Surface {
    conn: Arc<RustConnection>,
    screen_num: usize,
    atoms: CachedAtoms,
    window: Window,
}

impl X11Surface {
    /// Create the overlay window (unmapped)
    pub fn new(title: &str) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X11 server")?;
        if conn
            .extension_information(shape::X11_EXTENSION_NAME)
            .context("Failed to query SHAPE extension")?
            .is_none()
        {
            bail!("X server lacks the SHAPE extension required for click-through");
        }
        let atoms = CachedAtoms::new(&conn)?;
        let screen = &conn.setup().roots[screen_num];

        let window = conn.generate_id()
            .context("Failed to generate X11 window ID")?;
        conn.create_window(
            screen.root_depth,
            window,
            screen.root,
            0,
            0,
            1,
            1,
            0,
            WindowClass::INPUT_OUTPUT,
            screen.root_visual,
            &CreateWindowAux::new()
                .background_pixel(screen.black_pixel)
                .event_mask(EventMask::FOCUS_CHANGE | EventMask::STRUCTURE_NOTIFY),
        )
        .context("Failed to create overlay window")?;

        conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_CLASS,
            AtomEnum::STRING,
            x11::WM_CLASS,
        )
        .context("Failed to set WM_CLASS on overlay window")?;
        conn.change_property8(
            PropMode::REPLACE,
            window,
            atoms.net_wm_name,
            atoms.utf8_string,
            title.as_bytes(),
        )
        .context("Failed to set _NET_WM_NAME on overlay window")?;

        // flags, functions, decorations, input mode, status
        conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms.motif_wm_hints,
            atoms.motif_wm_hints,
            &[x11::MOTIF_HINTS_DECORATIONS, 0, 0, 0, 0],
        )
        .context("Failed to remove overlay window decorations")?;
        conn.flush().context("Failed to flush X11 connection")?;

        info!(window, screen = screen_num, "created overlay window");
        Ok(Self {
            conn: Arc::new(conn),
            screen_num,
            atoms,
            window,
        })
    }

    fn screen(&self) -> &Screen {
        &self.conn.setup().roots[self.screen_num]
    }

    fn wm_state(&self, add: bool, state: Atom) -> Result<()> {
        x11_utils::send_wm_state(&self.conn, self.screen(), &self.atoms, self.window, add, state)
    }
}

impl OverlaySurface for X11Surface {
    fn handle(&self) -> SurfaceHandle {
        SurfaceHandle::from(self.window)
    }

    fn set_bounds(&mut self, bounds: Rect) -> Result<()> {
        trace!(window = self.window, ?bounds, "configure overlay");
        self.conn
            .configure_window(
                self.window,
                &ConfigureWindowAux::new()
                    .x(bounds.x)
                    .y(bounds.y)
                    .width(bounds.width.max(1))
                    .height(bounds.height.max(1)),
            )
            .context(format!("Failed to move overlay window {}", self.window))?;
        self.conn.flush().context("Failed to flush X11 connection")?;
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        self.conn
            .map_window(self.window)
            .context("Failed to map overlay window")?;
        self.focus()
    }

    fn show_inactive(&mut self) -> Result<()> {
        x11_utils::set_user_time(&self.conn, &self.atoms, self.window, x11::USER_TIME_NO_FOCUS)?;
        self.conn
            .map_window(self.window)
            .inspect_err(|e| error!("Failed to map overlay window {}: {:?}", self.window, e))
            .context("Failed to map overlay window")?;
        self.conn.flush().context("Failed to flush X11 connection")?;
        Ok(())
    }

    fn hide(&mut self) -> Result<()> {
        self.conn
            .unmap_window(self.window)
            .context("Failed to unmap overlay window")?;
        self.conn.flush().context("Failed to flush X11 connection")?;
        Ok(())
    }

    fn is_visible(&self) -> Result<bool> {
        let attributes = self
            .conn
            .get_window_attributes(self.window)
            .context("Failed to query overlay window attributes")?
            .reply()
            .context("Failed to get overlay window attributes reply")?;
        Ok(attributes.map_state == MapState::VIEWABLE)
    }

    fn focus(&mut self) -> Result<()> {
        x11_utils::activate_window(&self.conn, self.screen(), &self.atoms, self.window)
    }

    fn is_focused(&self) -> Result<bool> {
        let focus = self
            .conn
            .get_input_focus()
            .context("Failed to query input focus")?
            .reply()
            .context("Failed to get input focus reply")?;
        Ok(focus.focus == self.window)
    }

    fn set_ignore_mouse_events(&mut self, ignore: bool) -> Result<()> {
        debug!(window = self.window, ignore, "set click-through");
        if ignore {
            self.conn
                .shape_rectangles(
                    SO::SET,
                    SK::INPUT,
                    ClipOrdering::UNSORTED,
                    self.window,
                    0,
                    0,
                    &[],
                )
                .context("Failed to clear overlay input region")?;
        } else {
            // no mask restores the default (whole window) input region
            self.conn
                .shape_mask(SO::SET, SK::INPUT, self.window, 0, 0, x11rb::NONE)
                .context("Failed to restore overlay input region")?;
        }
        self.conn.flush().context("Failed to flush X11 connection")?;
        Ok(())
    }

    fn set_always_on_top(&mut self, on_top: bool, tier: ZOrderTier) -> Result<()> {
        trace!(on_top, ?tier, "set always on top");
        self.wm_state(keeps_above(on_top, tier), self.atoms.net_wm_state_above)
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        self.wm_state(fullscreen, self.atoms.net_wm_state_fullscreen)
    }

    fn set_visible_on_all_workspaces(&mut self, visible: bool, _options: WorkspaceOptions) -> Result<()> {
        self.wm_state(visible, self.atoms.net_wm_state_sticky)?;
        if visible {
            x11_utils::send_desktop(&self.conn, self.screen(), &self.atoms, self.window, x11::ALL_DESKTOPS)?;
        }
        Ok(())
    }

    fn monitor_scale(&self) -> Result<MonitorScale> {
        Ok(MonitorScale::IDENTITY)
    }

    fn primary_display_bounds(&self) -> Result<Rect> {
        let screen = self.screen();
        Ok(Rect::new(
            0,
            0,
            u32::from(screen.width_in_pixels),
            u32::from(screen.height_in_pixels),
        ))
    }

    fn measure_title_bar_height(&mut self) -> Result<u32> {
        Ok(0)
    }

    fn observe_focus(&mut self, sink: EventSink) -> Result<()> {
        let conn = Arc::clone(&self.conn);
        let window = self.window;
        thread::Builder::new()
            .name("x11-surface-focus".into())
            .spawn(move || {
                if let Err(e) = watch_focus(&conn, window, &sink) {
                    error!(error = ?e, "Overlay focus watcher stopped");
                }
            })
            .context("Failed to spawn overlay focus watcher")?;
        Ok(())
    }
}

fn watch_focus(conn: &RustConnection, window: Window, sink: &EventSink) -> Result<()> {
    loop {
        let event = conn.wait_for_event().context("Failed to wait for X11 event")?;
        let focus = match event {
            Event::FocusIn(ev) if is_real_focus_change(ev.event, window, ev.mode, ev.detail) => {
                SurfaceFocus::Focused
            }
            Event::FocusOut(ev) if is_real_focus_change(ev.event, window, ev.mode, ev.detail) => {
                SurfaceFocus::Blurred
            }
            _ => continue,
        };
        debug!(?focus, "overlay focus changed");
        if !sink.surface_focus(focus) {
            return Ok(());
        }
    }
}

/// EWMH has a single "above" layer; the normal tier means leaving it
fn keeps_above(on_top: bool, tier: ZOrderTier) -> bool {
    on_top && tier != ZOrderTier::Normal
}

/// Ignore grabs and focus moving between our own subwindows
fn is_real_focus_change(event_window: Window, window: Window, mode: NotifyMode, detail: NotifyDetail) -> bool {
    event_window == window && mode == NotifyMode::NORMAL && detail != NotifyDetail::INFERIOR
}
