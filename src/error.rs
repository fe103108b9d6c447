/// Convenience result type used across the viewer.
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Error taxonomy for the viewer core.
///
/// `Network`, `Decode` and `Timeout` are per-frame and never abort a load
/// cycle. `DeviceUnavailable` is fatal at startup.
#[derive(thiserror::Error, Debug)]
pub enum ViewerError {
    /// Fetch failed: transport error or non-2xx proxy response.
    #[error("network error: {0}")]
    Network(String),

    /// Bytes were not a decodable image.
    #[error("decode error: {0}")]
    Decode(String),

    /// Fetch did not finish within the configured timeout.
    #[error("fetch timed out after {0} ms")]
    Timeout(u64),

    /// Index access past the end of the frame cache.
    #[error("frame index {index} out of range (cache holds {len})")]
    OutOfRange { index: usize, len: usize },

    /// GPU adapter or device could not be acquired.
    #[error("GPU device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A load cycle is already in flight.
    #[error("a load is already in progress")]
    Busy,

    /// The cache cannot be reset while playback reads from it.
    #[error("playback must be stopped before loading")]
    PlaybackActive,

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Surface or render submission failure.
    #[error("render error: {0}")]
    Render(String),
}

impl ViewerError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn device(msg: impl Into<String>) -> Self {
        Self::DeviceUnavailable(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Per-frame failures degrade a load but never abort it.
    pub fn is_per_frame(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Decode(_) | Self::Timeout(_))
    }
}

impl From<reqwest::Error> for ViewerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<image::ImageError> for ViewerError {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<wgpu::SurfaceError> for ViewerError {
    fn from(err: wgpu::SurfaceError) -> Self {
        Self::Render(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_frame_errors_are_classified() {
        assert!(ViewerError::network("reset").is_per_frame());
        assert!(ViewerError::decode("bad magic").is_per_frame());
        assert!(ViewerError::Timeout(500).is_per_frame());
        assert!(!ViewerError::Busy.is_per_frame());
        assert!(!ViewerError::device("no adapter").is_per_frame());
        assert!(!ViewerError::OutOfRange { index: 3, len: 2 }.is_per_frame());
    }

    #[test]
    fn out_of_range_message_names_bounds() {
        let err = ViewerError::OutOfRange { index: 7, len: 4 };
        assert_eq!(err.to_string(), "frame index 7 out of range (cache holds 4)");
    }
}
