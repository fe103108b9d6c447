use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::{Result, ViewerError};
use crate::fetch::{FetchOptions, TimeWindow, MAX_FRAMES, MAX_HOURS_BACK};
use crate::types::GlobeStyle;

/// Viewer settings: JSON file first, then command-line overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub proxy_base: String,
    pub hours_back: u32,
    pub cadence_minutes: u32,
    pub concurrency: usize,
    pub fetch_timeout_ms: u64,
    pub playback_interval_ms: u64,
    /// Ask the proxy for its catalog instead of planning timestamps locally
    pub use_catalog: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub globe: GlobeStyle,
    /// Globe rotation, radians per second
    pub globe_spin: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            proxy_base: "http://localhost:8000".to_string(),
            hours_back: 3,
            cadence_minutes: 60,
            concurrency: 4,
            fetch_timeout_ms: 10_000,
            playback_interval_ms: 100,
            use_catalog: false,
            window_width: 1024,
            window_height: 768,
            globe: GlobeStyle::default(),
            globe_spin: 0.0,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ViewerError::config(format!("invalid config: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ViewerError::config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Defaults (or `--config`) with command-line flags applied, validated
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let base = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        let config = base.with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(proxy) = &cli.proxy {
            self.proxy_base = proxy.clone();
        }
        if let Some(hours) = cli.hours_back {
            self.hours_back = hours;
        }
        if let Some(cadence) = cli.cadence {
            self.cadence_minutes = cadence;
        }
        if let Some(concurrency) = cli.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(timeout) = cli.timeout_ms {
            self.fetch_timeout_ms = timeout;
        }
        if let Some(interval) = cli.interval_ms {
            self.playback_interval_ms = interval;
        }
        if cli.catalog {
            self.use_catalog = true;
        }
        if cli.flat_globe {
            self.globe = GlobeStyle::flat([0.25, 0.45, 0.9, self.globe.tint[3]]);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.proxy_base.trim().is_empty() {
            return Err(ViewerError::config("proxy_base must be non-empty"));
        }
        if self.cadence_minutes == 0 {
            return Err(ViewerError::config("cadence_minutes must be > 0"));
        }
        if self.hours_back > MAX_HOURS_BACK {
            return Err(ViewerError::config(format!(
                "hours_back must be <= {MAX_HOURS_BACK}"
            )));
        }
        if TimeWindow::new(self.hours_back, self.cadence_minutes).sample_count() > MAX_FRAMES as u64 {
            return Err(ViewerError::config(format!(
                "hours_back at this cadence plans more than {MAX_FRAMES} frames"
            )));
        }
        if self.concurrency == 0 {
            return Err(ViewerError::config("concurrency must be > 0"));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ViewerError::config("fetch_timeout_ms must be > 0"));
        }
        if self.playback_interval_ms == 0 {
            return Err(ViewerError::config("playback_interval_ms must be > 0"));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ViewerError::config("window width/height must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.globe.tint[3]) {
            return Err(ViewerError::config("globe opacity must be within [0, 1]"));
        }
        Ok(())
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            cadence_minutes: self.cadence_minutes,
            concurrency: self.concurrency,
            timeout: Duration::from_millis(self.fetch_timeout_ms),
        }
    }

    pub fn playback_interval(&self) -> Duration {
        Duration::from_millis(self.playback_interval_ms)
    }
}
