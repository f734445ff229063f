use anyhow::{Context, Result};
use tracing::trace;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperExt;

use crate::constants::x11;
use crate::types::Rect;

/// Pre-cached X11 atoms to avoid repeated roundtrips
#[derive(Debug, Clone, Copy)]
pub struct CachedAtoms {
    pub wm_name: Atom,
    pub net_wm_name: Atom,
    pub utf8_string: Atom,
    pub net_active_window: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_fullscreen: Atom,
    pub net_wm_state_above: Atom,
    pub net_wm_state_sticky: Atom,
    pub net_wm_desktop: Atom,
    pub net_wm_user_time: Atom,
    pub motif_wm_hints: Atom,
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .context(format!("Failed to intern {name} atom"))?
        .reply()
        .context(format!("Failed to get reply for {name} atom"))?
        .atom)
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        // Do all intern_atom roundtrips once at startup
        Ok(Self {
            wm_name: intern(conn, "WM_NAME")?,
            net_wm_name: intern(conn, "_NET_WM_NAME")?,
            utf8_string: intern(conn, "UTF8_STRING")?,
            net_active_window: intern(conn, "_NET_ACTIVE_WINDOW")?,
            net_wm_state: intern(conn, "_NET_WM_STATE")?,
            net_wm_state_fullscreen: intern(conn, "_NET_WM_STATE_FULLSCREEN")?,
            net_wm_state_above: intern(conn, "_NET_WM_STATE_ABOVE")?,
            net_wm_state_sticky: intern(conn, "_NET_WM_STATE_STICKY")?,
            net_wm_desktop: intern(conn, "_NET_WM_DESKTOP")?,
            net_wm_user_time: intern(conn, "_NET_WM_USER_TIME")?,
            motif_wm_hints: intern(conn, "_MOTIF_WM_HINTS")?,
        })
    }

    /// Property atoms that carry a window title
    pub fn is_title(&self, atom: Atom) -> bool {
        atom == self.wm_name || atom == self.net_wm_name
    }
}

/// Window title, preferring the EWMH UTF-8 name over legacy WM_NAME
pub fn window_title(conn: &RustConnection, atoms: &CachedAtoms, window: Window) -> Result<Option<String>> {
    let net_name = conn
        .get_property(false, window, atoms.net_wm_name, atoms.utf8_string, 0, x11::TITLE_PROPERTY_LENGTH)
        .context(format!("Failed to query _NET_WM_NAME property for window {}", window))?
        .reply()
        .context(format!("Failed to get _NET_WM_NAME reply for window {}", window))?;
    if !net_name.value.is_empty() {
        return Ok(Some(String::from_utf8_lossy(&net_name.value).into_owned()));
    }

    let name_prop = conn
        .get_property(false, window, atoms.wm_name, AtomEnum::STRING, 0, x11::TITLE_PROPERTY_LENGTH)
        .context(format!("Failed to query WM_NAME property for window {}", window))?
        .reply()
        .context(format!("Failed to get WM_NAME reply for window {}", window))?;
    if name_prop.value.is_empty() {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&name_prop.value).into_owned()))
}

/// Currently active window according to the window manager
pub fn active_window(conn: &RustConnection, screen: &Screen, atoms: &CachedAtoms) -> Result<Option<Window>> {
    let active_window_prop = conn
        .get_property(
            false,
            screen.root,
            atoms.net_active_window,
            AtomEnum::WINDOW,
            0,
            1,
        )
        .context("Failed to query _NET_ACTIVE_WINDOW property")?
        .reply()
        .context("Failed to get reply for _NET_ACTIVE_WINDOW query")?;

    if active_window_prop.value.len() < x11::WINDOW_PROPERTY_SIZE {
        return Ok(None);
    }
    let active_window = u32::from_ne_bytes(
        active_window_prop.value[0..x11::WINDOW_PROPERTY_SIZE]
            .try_into()
            .context("Invalid _NET_ACTIVE_WINDOW property format")?,
    );
    Ok((active_window != x11rb::NONE).then_some(active_window))
}

/// Content area of `window` in root coordinates
pub fn root_geometry(conn: &RustConnection, screen: &Screen, window: Window) -> Result<Rect> {
    let geometry = conn
        .get_geometry(window)
        .context(format!("Failed to query geometry for window {}", window))?
        .reply()
        .context(format!("Failed to get geometry reply for window {}", window))?;
    let translated = conn
        .translate_coordinates(window, screen.root, 0, 0)
        .context(format!("Failed to translate coordinates for window {}", window))?
        .reply()
        .context(format!("Failed to get translate_coordinates reply for window {}", window))?;

    Ok(Rect::new(
        i32::from(translated.dst_x),
        i32::from(translated.dst_y),
        u32::from(geometry.width),
        u32::from(geometry.height),
    ))
}

/// Whether `_NET_WM_STATE` of `window` contains `_NET_WM_STATE_FULLSCREEN`
pub fn is_fullscreen(conn: &RustConnection, atoms: &CachedAtoms, window: Window) -> Result<bool> {
    let state = conn
        .get_property(false, window, atoms.net_wm_state, AtomEnum::ATOM, 0, x11::TITLE_PROPERTY_LENGTH)
        .context(format!("Failed to query _NET_WM_STATE for window {}", window))?
        .reply()
        .context(format!("Failed to get _NET_WM_STATE reply for window {}", window))?;

    Ok(state
        .value32()
        .is_some_and(|mut atoms_iter| atoms_iter.any(|atom| atom == atoms.net_wm_state_fullscreen)))
}

/// Activate (focus) an X11 window using _NET_ACTIVE_WINDOW
pub fn activate_window(
    conn: &RustConnection,
    screen: &Screen,
    atoms: &CachedAtoms,
    window: Window,
) -> Result<()> {
    // First, raise the window to top of stack
    conn.configure_window(
        window,
        &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
    )
    .context(format!("Failed to raise window {} to top of stack", window))?;

    let event = ClientMessageEvent {
        response_type: CLIENT_MESSAGE_EVENT,
        format: 32,
        sequence: 0,
        window,
        type_: atoms.net_active_window,
        data: ClientMessageData::from([
            x11::ACTIVE_WINDOW_SOURCE_PAGER,
            x11rb::CURRENT_TIME,
            0,
            0,
            0,
        ]),
    };
    send_to_root(conn, screen, &event)
        .context(format!("Failed to send _NET_ACTIVE_WINDOW event for window {}", window))?;

    conn.flush()
        .context("Failed to flush X11 connection after window activation")?;
    Ok(())
}

/// Ask the window manager to add or remove a `_NET_WM_STATE` atom
pub fn send_wm_state(
    conn: &RustConnection,
    screen: &Screen,
    atoms: &CachedAtoms,
    window: Window,
    add: bool,
    state: Atom,
) -> Result<()> {
    trace!(window, add, state, "sending _NET_WM_STATE");
    let action = if add {
        x11::NET_WM_STATE_ADD
    } else {
        x11::NET_WM_STATE_REMOVE
    };
    let event = ClientMessageEvent {
        response_type: CLIENT_MESSAGE_EVENT,
        format: 32,
        sequence: 0,
        window,
        type_: atoms.net_wm_state,
        data: ClientMessageData::from([action, state, 0, x11::ACTIVE_WINDOW_SOURCE_PAGER, 0]),
    };
    send_to_root(conn, screen, &event)
        .context(format!("Failed to send _NET_WM_STATE event for window {}", window))?;
    conn.flush().context("Failed to flush X11 connection after state change")?;
    Ok(())
}

/// Set `_NET_WM_USER_TIME`; 0 asks the window manager not to focus the window when mapped
pub fn set_user_time(conn: &RustConnection, atoms: &CachedAtoms, window: Window, time: u32) -> Result<()> {
    conn.change_property32(PropMode::REPLACE, window, atoms.net_wm_user_time, AtomEnum::CARDINAL, &[time])
        .context(format!("Failed to set _NET_WM_USER_TIME on window {}", window))?;
    Ok(())
}

/// Move `window` to a desktop (`x11::ALL_DESKTOPS` for every desktop)
pub fn send_desktop(
    conn: &RustConnection,
    screen: &Screen,
    atoms: &CachedAtoms,
    window: Window,
    desktop: u32,
) -> Result<()> {
    let event = ClientMessageEvent {
        response_type: CLIENT_MESSAGE_EVENT,
        format: 32,
        sequence: 0,
        window,
        type_: atoms.net_wm_desktop,
        data: ClientMessageData::from([desktop, x11::ACTIVE_WINDOW_SOURCE_PAGER, 0, 0, 0]),
    };
    send_to_root(conn, screen, &event)
        .context(format!("Failed to send _NET_WM_DESKTOP event for window {}", window))?;
    conn.flush().context("Failed to flush X11 connection after desktop change")?;
    Ok(())
}

fn send_to_root(conn: &RustConnection, screen: &Screen, event: &ClientMessageEvent) -> Result<()> {
    conn.send_event(
        false,
        screen.root,
        EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
        event,
    )?;
    Ok(())
}
