use std::borrow::Cow;

use chrono::{DateTime, Utc};
use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::{Result, ViewerError};

/// One decoded satellite image and the instant it shows
///
/// Immutable after decode. Once appended the cache owns it; readers borrow.
#[derive(Debug, Clone)]
pub struct Frame {
    timestamp: DateTime<Utc>,
    pixels: RgbaImage,
}

impl Frame {
    pub fn new(timestamp: DateTime<Utc>, pixels: RgbaImage) -> Self {
        Self { timestamp, pixels }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Pixels scaled down, aspect kept, so neither side exceeds `max_side`.
    /// Borrowed when the frame already fits.
    pub fn fit_within(&self, max_side: u32) -> Cow<'_, RgbaImage> {
        let (width, height) = self.dimensions();
        let longest = width.max(height);
        if longest <= max_side || max_side == 0 {
            return Cow::Borrowed(&self.pixels);
        }

        let scale = f64::from(max_side) / f64::from(longest);
        let fit = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, max_side);
        Cow::Owned(imageops::resize(
            &self.pixels,
            fit(width),
            fit(height),
            FilterType::Triangle,
        ))
    }

    /// Raw RGBA8 bytes, row-major
    pub fn as_rgba(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// Chronologically ordered frame buffer
///
/// Frames are placed by binary search on timestamp, so the committed order
/// is chronological whatever order fetches complete in.
#[derive(Debug, Default)]
pub struct FrameCache {
    frames: Vec<Frame>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a frame at its chronological position.
    ///
    /// Returns false (and drops the frame) if a frame with the same
    /// timestamp is already cached; inserted frames are never replaced.
    pub fn append(&mut self, frame: Frame) -> bool {
        match self
            .frames
            .binary_search_by(|f| f.timestamp.cmp(&frame.timestamp))
        {
            Ok(_) => false,
            Err(pos) => {
                self.frames.insert(pos, frame);
                true
            }
        }
    }

    /// Drop every frame. Start of each load cycle.
    pub fn reset(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Frame> {
        self.frames.get(index).ok_or(ViewerError::OutOfRange {
            index,
            len: self.frames.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.iter().map(Frame::timestamp).collect()
    }

    /// Position of the frame captured at `timestamp`, if cached
    pub fn position(&self, timestamp: DateTime<Utc>) -> Option<usize> {
        self.frames
            .binary_search_by(|f| f.timestamp.cmp(&timestamp))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn frame_at(minutes: i64) -> Frame {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        Frame::new(base + Duration::minutes(minutes), RgbaImage::new(2, 2))
    }

    #[test]
    fn append_orders_by_timestamp() {
        let mut cache = FrameCache::new();
        for minutes in [120, 0, 60, 180, 30] {
            assert!(cache.append(frame_at(minutes)));
        }

        let ts = cache.timestamps();
        assert_eq!(ts.len(), 5);
        assert!(ts.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(cache.get(0).unwrap().timestamp(), frame_at(0).timestamp());
        assert_eq!(cache.get(4).unwrap().timestamp(), frame_at(180).timestamp());
    }

    #[test]
    fn duplicate_timestamp_rejected() {
        let mut cache = FrameCache::new();
        assert!(cache.append(frame_at(10)));
        assert!(!cache.append(frame_at(10)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn get_past_end_is_out_of_range() {
        let mut cache = FrameCache::new();
        cache.append(frame_at(0));

        match cache.get(1) {
            Err(ViewerError::OutOfRange { index, len }) => {
                assert_eq!(index, 1);
                assert_eq!(len, 1);
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn reset_clears_everything() {
        let mut cache = FrameCache::new();
        cache.append(frame_at(0));
        cache.append(frame_at(60));

        cache.reset();
        assert!(cache.is_empty());
        assert!(cache.get(0).is_err());
    }

    #[test]
    fn position_finds_cached_frame() {
        let mut cache = FrameCache::new();
        cache.append(frame_at(60));
        cache.append(frame_at(0));

        assert_eq!(cache.position(frame_at(60).timestamp()), Some(1));
        assert_eq!(cache.position(frame_at(30).timestamp()), None);
    }

    #[test]
    fn oversized_frame_is_scaled_to_fit() {
        let frame = Frame::new(frame_at(0).timestamp(), RgbaImage::new(200, 100));

        let fitted = frame.fit_within(64);
        assert!(matches!(fitted, Cow::Owned(_)));
        assert_eq!(fitted.dimensions(), (64, 32));

        let small = frame_at(0);
        let kept = small.fit_within(4096);
        assert!(matches!(kept, Cow::Borrowed(_)));
        assert_eq!(kept.dimensions(), small.dimensions());
    }

    #[test]
    fn frame_exposes_rgba_bytes() {
        let frame = frame_at(0);
        assert_eq!(frame.dimensions(), (2, 2));
        assert_eq!(frame.as_rgba().len(), 2 * 2 * 4);
    }
}
