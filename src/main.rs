#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use overlay_attach::config::Settings;
use overlay_attach::constants::config::DEFAULT_LOG_LEVEL;

#[derive(Debug, Parser)]
#[command(name = "overlay-attach", version, about = "Glue an overlay window to another application's window")]
struct Cli {
    /// Exact title of the window to attach to
    #[arg(long)]
    title: Option<String>,

    /// Config file (defaults to $XDG_CONFIG_HOME/overlay-attach/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Play back a JSON-lines event script instead of watching the X server
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Leave click-through handling to the overlay content
    #[arg(long)]
    self_handle_clickable: bool,

    #[arg(long, value_name = "PERCENT")]
    margin_top: Option<f64>,

    #[arg(long, value_name = "PERCENT")]
    margin_bottom: Option<f64>,

    #[arg(long, value_name = "PERCENT")]
    margin_left: Option<f64>,

    #[arg(long, value_name = "PERCENT")]
    margin_right: Option<f64>,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(title) = &self.title {
            settings.target_title = title.clone();
        }
        if self.self_handle_clickable {
            settings.self_handle_clickable = true;
        }
        let margins = &mut settings.margin_percent;
        if let Some(top) = self.margin_top {
            margins.top = top;
        }
        if let Some(bottom) = self.margin_bottom {
            margins.bottom = bottom;
        }
        if let Some(left) = self.margin_left {
            margins.left = left;
        }
        if let Some(right) = self.margin_right {
            margins.right = right;
        }
        *margins = margins.clamped();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Subscriber first so config loading warnings are visible
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    let logging = overlay_attach::logging::init_logging(&log_level)?;

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    cli.apply(&mut settings);
    logging.set_level(&settings.log_level)?;

    run(cli, settings)
}

#[cfg(target_os = "linux")]
fn run(cli: Cli, settings: Settings) -> Result<()> {
    use anyhow::Context;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tracing::{debug, error, info};

    use overlay_attach::constants::event_loop::IDLE_WAIT_MS;
    use overlay_attach::replay::ReplayHookSource;
    use overlay_attach::x11::{X11HookSource, X11Surface};
    use overlay_attach::{AttachmentController, HookSource, OverlaySurface};

    info!(settings = ?settings, "starting overlay-attach");

    let shutdown = Arc::new(AtomicBool::new(false));
    let toggle_pause = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&shutdown))
            .context(format!("Failed to register handler for signal {signal}"))?;
    }
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&toggle_pause))
        .context("Failed to register SIGUSR1 handler")?;

    let surface = X11Surface::new("overlay-attach")?;
    let hook: Box<dyn HookSource> = match &cli.replay {
        Some(path) => {
            info!(path = %path.display(), "using replay hook source");
            Box::new(ReplayHookSource::from_path(path))
        }
        None => Box::new(X11HookSource::new()),
    };

    let mut controller = AttachmentController::new(surface, hook).with_throttle(settings.throttle_interval());
    controller.subscribe(|notification| debug!(event = notification.name(), "notification"));
    controller.attach(&settings.target_title, settings.attachment_options())?;

    info!("Send SIGUSR1 to pause/resume, SIGINT or SIGTERM to quit");
    while !shutdown.load(Ordering::Relaxed) {
        if toggle_pause.swap(false, Ordering::Relaxed) {
            let result = if controller.is_paused() {
                controller.resume()
            } else {
                controller.pause()
            };
            let _ = result.inspect_err(|err| error!("failed to toggle pause: err={err}"));
        }
        controller.pump_blocking(Duration::from_millis(IDLE_WAIT_MS));
    }

    info!("shutting down");
    let _ = controller
        .surface_mut()
        .hide()
        .inspect_err(|err| error!("failed to hide overlay on exit: err={err:#}"));
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn run(_cli: Cli, _settings: Settings) -> Result<()> {
    anyhow::bail!(
        "no native backend for {}; embed the overlay_attach library with your own surface and hook source",
        overlay_attach::Platform::current()
    )
}
