use serde::{Deserialize, Serialize};

use crate::constants::validation;

/// Window rectangle in screen coordinates
///
/// Layout matches what native hooks report: signed origin, unsigned size.
/// Physical pixels on Windows, point space elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Zero width or height. `Rect::default()` is the "unknown" sentinel.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Per-side shrink of the mirrored bounds, as a percentage of that axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginPercent {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl MarginPercent {
    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.bottom == 0.0 && self.left == 0.0 && self.right == 0.0
    }

    /// Clamp every side into 0..=100 (NaN becomes 0)
    pub fn clamped(self) -> Self {
        let clamp = |v: f64| {
            if v.is_nan() {
                0.0
            } else {
                v.clamp(0.0, validation::MAX_MARGIN_PERCENT)
            }
        };
        Self {
            top: clamp(self.top),
            bottom: clamp(self.bottom),
            left: clamp(self.left),
            right: clamp(self.right),
        }
    }
}

/// Scale context of the monitor a surface currently sits on
///
/// Maps physical screen pixels into the logical units the host window
/// system expects for that monitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorScale {
    pub physical_origin: (i32, i32),
    pub logical_origin: (i32, i32),
    pub scale_factor: f64,
}

impl MonitorScale {
    pub const IDENTITY: MonitorScale = MonitorScale {
        physical_origin: (0, 0),
        logical_origin: (0, 0),
        scale_factor: 1.0,
    };
}

impl Default for MonitorScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Immutable configuration captured once at attach time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentOptions {
    /// The target has a native title bar on macOS; keep the overlay off it
    pub has_title_bar_on_mac: bool,
    pub margin_percent: MarginPercent,
    /// The caller manages click-through itself
    pub self_handle_clickable: bool,
}
