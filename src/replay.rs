//! Scripted hook source
//!
//! Feeds a recorded event stream into the controller instead of a live OS
//! hook. One JSON object per line, same shape as [`HookEvent`] plus an
//! optional `delay_ms` to wait before emitting it:
//!
//! ```text
//! {"type":"attach","x":0,"y":0,"width":800,"height":600,"is_fullscreen":false}
//! {"type":"moveresize","x":10,"y":0,"width":800,"height":600,"delay_ms":50}
//! {"type":"blur","delay_ms":500}
//! ```

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::events::HookEvent;
use crate::hook::{EventSink, HookSource, SurfaceHandle};

/// One scheduled event of a replay script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStep {
    pub delay: Duration,
    pub event: HookEvent,
}

/// Parse a replay script. Blank lines and `#` comments are skipped,
/// malformed lines are logged and dropped.
pub fn parse_script(reader: impl BufRead) -> Result<Vec<ReplayStep>> {
    let mut steps = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read replay line {}", index + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match parse_line(trimmed) {
            Ok(step) => steps.push(step),
            Err(e) => warn!(line = index + 1, error = %e, "Skipping malformed replay line"),
        }
    }

    Ok(steps)
}

fn parse_line(line: &str) -> Result<ReplayStep> {
    let mut value: serde_json::Value = serde_json::from_str(line).context("Invalid JSON")?;

    let delay_ms = match value.as_object_mut().and_then(|obj| obj.remove("delay_ms")) {
        Some(delay) => delay
            .as_u64()
            .context("delay_ms must be a non-negative integer")?,
        None => 0,
    };
    let event: HookEvent = serde_json::from_value(value).context("Invalid hook event")?;

    Ok(ReplayStep {
        delay: Duration::from_millis(delay_ms),
        event,
    })
}

enum Script {
    File(PathBuf),
    Steps(Vec<ReplayStep>),
}

/// Hook source that plays back a script on a background thread
pub struct ReplayHookSource {
    script: Option<Script>,
    worker: Option<thread::JoinHandle<()>>,
}

impl ReplayHookSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            script: Some(Script::File(path.into())),
            worker: None,
        }
    }

    pub fn from_steps(steps: Vec<ReplayStep>) -> Self {
        Self {
            script: Some(Script::Steps(steps)),
            worker: None,
        }
    }

    /// True once the playback thread has emitted everything
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| w.is_finished())
    }

    fn load(path: &Path) -> Result<Vec<ReplayStep>> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open replay script: {}", path.display()))?;
        parse_script(BufReader::new(file))
    }
}

impl HookSource for ReplayHookSource {
    fn start(
        &mut self,
        surface: Option<SurfaceHandle>,
        target_title: &str,
        sink: EventSink,
    ) -> Result<()> {
        let steps = match self.script.take() {
            Some(Script::File(path)) => Self::load(&path)?,
            Some(Script::Steps(steps)) => steps,
            None => anyhow::bail!("Replay hook source already started"),
        };

        info!(
            steps = steps.len(),
            title = %target_title,
            surface = ?surface,
            "Starting replay"
        );

        let handle = thread::Builder::new()
            .name("replay-hook".into())
            .spawn(move || {
                for step in steps {
                    if !step.delay.is_zero() {
                        thread::sleep(step.delay);
                    }
                    debug!(event = ?step.event, "Replaying event");
                    if !sink.emit(step.event) {
                        error!("Controller queue closed, stopping replay");
                        return;
                    }
                }
                info!("Replay finished");
            })
            .context("Failed to spawn replay thread")?;

        self.worker = Some(handle);
        Ok(())
    }

    fn focus_target(&mut self) -> Result<()> {
        debug!("focus_target has no effect during replay");
        Ok(())
    }
}
