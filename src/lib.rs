pub mod cache;
pub mod camera;
pub mod cli;
pub mod config;
pub mod core;
pub mod display;
pub mod error;
pub mod fetch;
pub mod playback;
pub mod renderer;
pub mod session;
pub mod status;
pub mod traits;
pub mod types;
pub mod viewer;

pub use cache::{Frame, FrameCache};
pub use config::ViewerConfig;
pub use error::{Result, ViewerError};
pub use fetch::{FetchOptions, FrameFetcher, FrameOutcome, FrameRequest, FrameSource, HttpFrameSource};
pub use playback::PlaybackScheduler;
pub use session::{ViewerSession, ViewerState};
pub use status::{LoadSummary, StatusEvent, StatusObserver, StatusReporter};
pub use viewer::Viewer;
