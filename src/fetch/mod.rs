pub mod catalog;
pub mod fetcher;
pub mod request;
pub mod source;

pub use catalog::parse_catalog;
pub use fetcher::{decode_frame, FetchOptions, FrameFetcher, FrameOutcome, LoadCycle};
pub use request::{
    archive_key, fmt_timestamp, FrameRequest, TimeWindow, MAX_FRAMES, MAX_HOURS_BACK,
};
pub use source::{FrameSource, HttpFrameSource, DEFAULT_CATALOG_TIMEOUT};
