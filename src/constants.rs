//! Application-wide constants
//!
//! Magic numbers and string literals used throughout the crate, kept in one place.

/// Overlay bounds propagation
pub mod bounds {
    /// Throttle window for move/resize bounds updates (~30 updates per second)
    pub const MOVERESIZE_THROTTLE_MS: u64 = 34;

    /// Number of bounds passes on platforms with per-monitor DPI
    /// (second pass picks up the monitor the first pass moved us to)
    pub const DPI_PASSES: usize = 2;
}

/// Native event tags as emitted by the hook layer
pub mod tags {
    pub const ATTACH: u32 = 1;
    pub const FOCUS: u32 = 2;
    pub const BLUR: u32 = 3;
    pub const DETACH: u32 = 4;
    pub const FULLSCREEN: u32 = 5;
    pub const MOVERESIZE: u32 = 6;
}

/// X11 protocol constants
pub mod x11 {
    /// Source indication for _NET_ACTIVE_WINDOW (2 = pager/direct user action)
    pub const ACTIVE_WINDOW_SOURCE_PAGER: u32 = 2;

    /// _NET_WM_STATE client message actions
    pub const NET_WM_STATE_REMOVE: u32 = 0;
    pub const NET_WM_STATE_ADD: u32 = 1;

    /// _NET_WM_DESKTOP value meaning "all desktops"
    pub const ALL_DESKTOPS: u32 = 0xFFFF_FFFF;

    /// _MOTIF_WM_HINTS flag: decorations field is valid
    pub const MOTIF_HINTS_DECORATIONS: u32 = 1 << 1;

    /// Size of a 32-bit window property value in bytes
    pub const WINDOW_PROPERTY_SIZE: usize = 4;

    /// Max length (in 32-bit units) read from string properties
    pub const TITLE_PROPERTY_LENGTH: u32 = 1024;

    /// _NET_WM_USER_TIME value telling the window manager not to focus on map
    pub const USER_TIME_NO_FOCUS: u32 = 0;

    /// WM_CLASS for the overlay window (instance\0class\0)
    pub const WM_CLASS: &[u8] = b"overlay-attach\0overlay-attach\0";
}

/// Event loop timing
pub mod event_loop {
    /// Upper bound on how long the binary sleeps waiting for inbound events
    pub const IDLE_WAIT_MS: u64 = 250;
}

/// Configuration file location
pub mod config {
    pub const APP_DIR: &str = "overlay-attach";
    pub const FILENAME: &str = "config.toml";
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

/// Config validation limits
pub mod validation {
    pub const MAX_MARGIN_PERCENT: f64 = 100.0;
    pub const MIN_THROTTLE_MS: u64 = 1;
    pub const MAX_THROTTLE_MS: u64 = 1000;
}
