//! Fullscreen mirroring
//!
//! macOS cannot give the overlay real fullscreen (one app owns it), so there
//! the surface is made visible on every desktop, including the fullscreen
//! one, and stretched over the primary display instead.

use anyhow::{Context, Result};
use tracing::debug;

use crate::platform::Platform;
use crate::surface::{OverlaySurface, WorkspaceOptions};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FullscreenState {
    #[default]
    Windowed,
    Fullscreen,
}

impl FullscreenState {
    pub fn from_flag(is_fullscreen: bool) -> Self {
        if is_fullscreen {
            FullscreenState::Fullscreen
        } else {
            FullscreenState::Windowed
        }
    }

    pub fn is_fullscreen(self) -> bool {
        self == FullscreenState::Fullscreen
    }
}

/// What the caller still has to do after [`apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    Nothing,
    /// Restore the regular corrected bounds
    RecomputeBounds,
}

pub fn apply<S: OverlaySurface + ?Sized>(
    surface: &mut S,
    platform: Platform,
    target: FullscreenState,
) -> Result<FollowUp> {
    debug!(?target, %platform, "applying fullscreen state");

    if !platform.emulates_fullscreen() {
        surface
            .set_fullscreen(target.is_fullscreen())
            .context("Failed to toggle surface fullscreen")?;
        return Ok(FollowUp::Nothing);
    }

    surface
        .set_visible_on_all_workspaces(
            target.is_fullscreen(),
            WorkspaceOptions {
                visible_on_fullscreen: true,
            },
        )
        .context("Failed to change all-workspaces visibility")?;

    match target {
        FullscreenState::Fullscreen => {
            let display = surface
                .primary_display_bounds()
                .context("Failed to query primary display bounds")?;
            surface
                .set_bounds(display)
                .context("Failed to cover primary display")?;
            Ok(FollowUp::Nothing)
        }
        FullscreenState::Windowed => Ok(FollowUp::RecomputeBounds),
    }
}
