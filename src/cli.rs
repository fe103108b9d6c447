// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sat-viewer")]
#[command(about = "Satellite imagery animation viewer with a GPU globe overlay", long_about = None)]
pub struct Cli {
    /// JSON configuration file; flags below override it
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Base URL of the imagery proxy
    #[arg(long)]
    pub proxy: Option<String>,

    /// Hours of imagery to load
    #[arg(long = "hours-back", short = 'H')]
    pub hours_back: Option<u32>,

    /// Minutes between frames
    #[arg(long)]
    pub cadence: Option<u32>,

    /// Maximum fetches in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-frame fetch timeout in milliseconds
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// Playback tick interval in milliseconds
    #[arg(long = "interval-ms")]
    pub interval_ms: Option<u64>,

    /// Ask the proxy for its frame catalog instead of computing timestamps
    #[arg(long, default_value = "false")]
    pub catalog: bool,

    /// Draw the globe as a flat tinted overlay instead of texturing it
    #[arg(long = "flat-globe", default_value = "false")]
    pub flat_globe: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_everything_unset() {
        let cli = Cli::try_parse_from(["sat-viewer"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.hours_back.is_none());
        assert!(!cli.catalog);
        assert!(!cli.flat_globe);
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::try_parse_from([
            "sat-viewer",
            "--proxy",
            "http://proxy:9000",
            "-H",
            "6",
            "--cadence",
            "15",
            "--timeout-ms",
            "2500",
            "--catalog",
        ])
        .unwrap();

        assert_eq!(cli.proxy.as_deref(), Some("http://proxy:9000"));
        assert_eq!(cli.hours_back, Some(6));
        assert_eq!(cli.cadence, Some(15));
        assert_eq!(cli.timeout_ms, Some(2500));
        assert!(cli.catalog);
    }

    #[test]
    fn rejects_negative_hours() {
        assert!(Cli::try_parse_from(["sat-viewer", "--hours-back", "-1"]).is_err());
    }
}
