//! Coordinate correction: raw target bounds → overlay bounds
//!
//! Applied in a fixed order before every bounds command:
//! 1. macOS title-bar trim
//! 2. physical → logical conversion (Windows, per-monitor DPI)
//! 3. percentage margins

use crate::platform::Platform;
use crate::types::{AttachmentOptions, MarginPercent, MonitorScale, Rect};

/// Stateless transform chain, parameterized once per attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corrector {
    pub platform: Platform,
    pub has_title_bar_on_mac: bool,
    pub title_bar_height: u32,
    pub margins: MarginPercent,
}

impl Corrector {
    pub fn new(platform: Platform, options: &AttachmentOptions, title_bar_height: u32) -> Self {
        Self {
            platform,
            has_title_bar_on_mac: options.has_title_bar_on_mac,
            title_bar_height,
            margins: options.margin_percent,
        }
    }

    /// Keep the overlay off the native title bar on macOS
    pub fn trim_title_bar(&self, bounds: Rect) -> Rect {
        if self.platform != Platform::MacOs || !self.has_title_bar_on_mac {
            return bounds;
        }
        Rect {
            y: bounds.y.saturating_add(self.title_bar_height as i32),
            height: bounds.height.saturating_sub(self.title_bar_height),
            ..bounds
        }
    }

    /// Physical pixels → logical units for the given monitor (identity elsewhere)
    pub fn to_logical(&self, bounds: Rect, monitor: &MonitorScale) -> Rect {
        if !self.platform.uses_physical_pixels() {
            return bounds;
        }
        physical_to_logical(bounds, monitor)
    }

    /// Shrink each configured side independently. Every reduction is a share
    /// of the incoming rectangle, so the four sides never interact.
    pub fn apply_margins(&self, bounds: Rect) -> Rect {
        apply_margins(bounds, &self.margins)
    }

    /// Full chain for one monitor context
    pub fn correct(&self, raw: Rect, monitor: &MonitorScale) -> Rect {
        let trimmed = self.trim_title_bar(raw);
        let logical = self.to_logical(trimmed, monitor);
        self.apply_margins(logical)
    }
}

pub fn physical_to_logical(bounds: Rect, monitor: &MonitorScale) -> Rect {
    let scale = if monitor.scale_factor > 0.0 {
        monitor.scale_factor
    } else {
        1.0
    };
    let (px, py) = monitor.physical_origin;
    let (lx, ly) = monitor.logical_origin;
    Rect {
        x: lx + (f64::from(bounds.x - px) / scale).round() as i32,
        y: ly + (f64::from(bounds.y - py) / scale).round() as i32,
        width: (f64::from(bounds.width) / scale).round() as u32,
        height: (f64::from(bounds.height) / scale).round() as u32,
    }
}

pub fn apply_margins(bounds: Rect, margins: &MarginPercent) -> Rect {
    let mut out = bounds;

    if margins.top > 0.0 {
        let reduce = percent_of(bounds.height, margins.top);
        out.y = out.y.saturating_add(reduce as i32);
        out.height = out.height.saturating_sub(reduce);
    }
    if margins.bottom > 0.0 {
        let reduce = percent_of(bounds.height, margins.bottom);
        out.height = out.height.saturating_sub(reduce);
    }
    if margins.left > 0.0 {
        let reduce = percent_of(bounds.width, margins.left);
        out.x = out.x.saturating_add(reduce as i32);
        out.width = out.width.saturating_sub(reduce);
    }
    if margins.right > 0.0 {
        let reduce = percent_of(bounds.width, margins.right);
        out.width = out.width.saturating_sub(reduce);
    }

    out
}

fn percent_of(dimension: u32, percent: f64) -> u32 {
    // Half-up rounding; inputs are non-negative
    (f64::from(dimension) / 100.0 * percent + 0.5).floor() as u32
}
