use chrono::{DateTime, Utc};

use crate::fetch::fmt_timestamp;

/// Counts for one completed load cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub requested: usize,
    pub loaded: usize,
    pub failed: usize,
}

impl LoadSummary {
    /// Every request produced an outcome
    pub fn is_settled(&self) -> bool {
        self.loaded + self.failed == self.requested
    }
}

/// Things the status reporter hears about
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    LoadStarted { requested: usize },
    FrameLoaded { timestamp: DateTime<Utc> },
    FrameFailed { timestamp: DateTime<Utc>, reason: String },
    LoadFinished(LoadSummary),
    PlaybackStarted { frames: usize },
    PlaybackStopped { index: usize },
    /// Play requested with nothing cached
    PlaybackIgnored,
}

/// One display-only log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
}

/// Receives progress and playback events. Observers have no control over
/// the components that emit them.
pub trait StatusObserver {
    fn notify(&mut self, event: &StatusEvent);
}

/// Append-only status log
#[derive(Debug, Default)]
pub struct StatusReporter {
    messages: Vec<StatusMessage>,
    progress: LoadSummary,
}

impl StatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[StatusMessage] {
        &self.messages
    }

    pub fn latest(&self) -> Option<&str> {
        self.messages.last().map(|m| m.text.as_str())
    }

    /// Progress of the current or most recent load
    pub fn progress(&self) -> LoadSummary {
        self.progress
    }

    /// One-line summary for a title bar or footer
    pub fn line(&self, cached: usize, playing: bool, index: usize) -> String {
        let state = if playing { "playing" } else { "paused" };
        if cached == 0 {
            return format!("no frames loaded · {state}");
        }

        let mut line = format!("{cached} frames loaded · {state} · frame {}/{cached}", index + 1);
        if self.progress.failed > 0 {
            line.push_str(&format!(" · {} failed", self.progress.failed));
        }
        line
    }

    fn push(&mut self, text: String) {
        log::info!("{text}");
        self.messages.push(StatusMessage { text });
    }
}

impl StatusObserver for StatusReporter {
    fn notify(&mut self, event: &StatusEvent) {
        match event {
            StatusEvent::LoadStarted { requested } => {
                self.progress = LoadSummary {
                    requested: *requested,
                    ..LoadSummary::default()
                };
                self.push(format!("Loading {requested} frames..."));
            }
            StatusEvent::FrameLoaded { .. } => {
                self.progress.loaded += 1;
                let p = self.progress;
                self.push(format!("Loaded {}/{} frames", p.loaded + p.failed, p.requested));
            }
            StatusEvent::FrameFailed { timestamp, reason } => {
                self.progress.failed += 1;
                self.push(format!(
                    "Frame {} failed: {reason}",
                    fmt_timestamp(timestamp)
                ));
            }
            StatusEvent::LoadFinished(summary) => {
                self.progress = *summary;
                self.push(format!(
                    "Load complete: {} loaded, {} failed",
                    summary.loaded, summary.failed
                ));
            }
            StatusEvent::PlaybackStarted { frames } => {
                self.push(format!("Playing {frames} frames"));
            }
            StatusEvent::PlaybackStopped { index } => {
                self.push(format!("Paused at frame {}", index + 1));
            }
            StatusEvent::PlaybackIgnored => {
                self.push("Nothing to play".to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn counts_follow_events() {
        let mut reporter = StatusReporter::new();
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        reporter.notify(&StatusEvent::LoadStarted { requested: 3 });
        reporter.notify(&StatusEvent::FrameLoaded { timestamp: ts });
        reporter.notify(&StatusEvent::FrameFailed {
            timestamp: ts,
            reason: "network error: refused".into(),
        });

        let progress = reporter.progress();
        assert_eq!(progress.loaded, 1);
        assert_eq!(progress.failed, 1);
        assert!(!progress.is_settled());
        assert_eq!(
            reporter.latest(),
            Some("Frame 2024-06-01 00:00 UTC failed: network error: refused")
        );
    }

    #[test]
    fn log_is_append_only() {
        let mut reporter = StatusReporter::new();
        reporter.notify(&StatusEvent::PlaybackIgnored);
        reporter.notify(&StatusEvent::PlaybackStarted { frames: 4 });

        assert_eq!(reporter.messages().len(), 2);
        assert_eq!(reporter.messages()[0].text, "Nothing to play");
        assert_eq!(reporter.latest(), Some("Playing 4 frames"));
    }

    #[test]
    fn summary_line() {
        let mut reporter = StatusReporter::new();
        assert_eq!(reporter.line(0, false, 0), "no frames loaded · paused");

        reporter.notify(&StatusEvent::LoadFinished(LoadSummary {
            requested: 5,
            loaded: 4,
            failed: 1,
        }));
        assert_eq!(
            reporter.line(4, true, 2),
            "4 frames loaded · playing · frame 3/4 · 1 failed"
        );
    }
}
