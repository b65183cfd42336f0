//! Batch progress reporting.
//!
//! Emits per-title progress during `ecfr process` so long runs show what
//! is in flight. Progress goes to **stderr** so stdout remains parseable
//! for scripts; format is either human lines or one JSON object per line.

use std::io::Write;

use crate::error::Stage;

/// A single progress event for one title in the batch.
#[derive(Clone, Debug)]
pub enum TitleEvent {
    /// Title entered a pipeline stage.
    Stage { title: u32, stage: Stage },
    /// Title finished successfully (`cached` when no network call was made).
    Done { title: u32, cached: bool },
    /// Title failed at a stage; the rest of the batch continues.
    Failed { title: u32, stage: Stage },
}

/// Reports batch progress. Implementations write to stderr.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: TitleEvent);
}

/// Human-friendly lines: "title 7  parsing".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: TitleEvent) {
        let line = match &event {
            TitleEvent::Stage { title, stage } => format!("title {}  {}\n", title, stage),
            TitleEvent::Done { title, cached } => {
                if *cached {
                    format!("title {}  done (cached)\n", title)
                } else {
                    format!("title {}  done\n", title)
                }
            }
            TitleEvent::Failed { title, stage } => {
                format!("title {}  FAILED while {}\n", title, stage)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: TitleEvent) {
        let obj = match &event {
            TitleEvent::Stage { title, stage } => serde_json::json!({
                "event": "stage",
                "title": title,
                "stage": stage.to_string(),
            }),
            TitleEvent::Done { title, cached } => serde_json::json!({
                "event": "done",
                "title": title,
                "cached": cached,
            }),
            TitleEvent::Failed { title, stage } => serde_json::json!({
                "event": "failed",
                "title": title,
                "stage": stage.to_string(),
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: TitleEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "off" => Some(ProgressMode::Off),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            _ => None,
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> std::sync::Arc<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => std::sync::Arc::new(NoProgress),
            ProgressMode::Human => std::sync::Arc::new(StderrProgress),
            ProgressMode::Json => std::sync::Arc::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_modes() {
        assert_eq!(ProgressMode::parse("off"), Some(ProgressMode::Off));
        assert_eq!(ProgressMode::parse("human"), Some(ProgressMode::Human));
        assert_eq!(ProgressMode::parse("json"), Some(ProgressMode::Json));
        assert_eq!(ProgressMode::parse("verbose"), None);
    }
}
