use std::fmt;

/// Host operating system family, as far as overlay behavior is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Bounds from the hook are physical pixels and need per-monitor DPI conversion
    pub fn uses_physical_pixels(self) -> bool {
        self == Platform::Windows
    }

    /// Only one app may own OS fullscreen; fullscreen is emulated instead
    pub fn emulates_fullscreen(self) -> bool {
        self == Platform::MacOs
    }

    /// Screenshot and UI Automation are only wired up on Windows
    pub fn supports_automation(self) -> bool {
        self == Platform::Windows
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Windows => "windows",
            Platform::MacOs => "macos",
            Platform::Linux => "linux",
        };
        f.write_str(name)
    }
}
