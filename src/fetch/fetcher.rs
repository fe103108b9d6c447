use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, LocalBoxStream, Stream, StreamExt};

use super::request::{fmt_timestamp, FrameRequest, TimeWindow};
use super::source::FrameSource;
use crate::cache::Frame;
use crate::error::{Result, ViewerError};

/// Result of fetching one requested frame
#[derive(Debug)]
pub enum FrameOutcome {
    Success(Frame),
    Failure {
        timestamp: DateTime<Utc>,
        reason: ViewerError,
    },
}

impl FrameOutcome {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            FrameOutcome::Success(frame) => frame.timestamp(),
            FrameOutcome::Failure { timestamp, .. } => *timestamp,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FrameOutcome::Success(_))
    }
}

/// Fetch tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Minutes between consecutive frames
    pub cadence_minutes: u32,
    /// Maximum fetches in flight at once
    pub concurrency: usize,
    /// Per-fetch deadline
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            cadence_minutes: 60,
            concurrency: 4,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Resolves a time window into frame requests and fetches them concurrently
///
/// Only one load cycle per fetcher may be alive; a second `load` while one
/// is in flight is rejected with `Busy`.
pub struct FrameFetcher<S> {
    source: Arc<S>,
    options: FetchOptions,
    in_flight: Arc<AtomicBool>,
}

impl<S: FrameSource + 'static> FrameFetcher<S> {
    pub fn new(source: S, options: FetchOptions) -> Self {
        Self {
            source: Arc::new(source),
            options,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> FetchOptions {
        self.options
    }

    /// True while a `LoadCycle` from this fetcher is alive
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Requests for the last `hours_back` hours relative to `now`, oldest first
    pub fn plan(&self, hours_back: u32, now: DateTime<Utc>) -> Vec<FrameRequest> {
        TimeWindow::new(hours_back, self.options.cadence_minutes)
            .timestamps(now)
            .into_iter()
            .map(|ts| FrameRequest::new(ts, self.source.url_for(&ts)))
            .collect()
    }

    /// Start a load cycle for the last `hours_back` hours
    pub fn load(&self, hours_back: u32) -> Result<LoadCycle> {
        self.load_at(hours_back, Utc::now())
    }

    pub fn load_at(&self, hours_back: u32, now: DateTime<Utc>) -> Result<LoadCycle> {
        let requests = self.plan(hours_back, now);
        self.load_requests(requests)
    }

    /// Start a load cycle over an explicit request list
    pub fn load_requests(&self, requests: Vec<FrameRequest>) -> Result<LoadCycle> {
        let guard = LoadGuard::acquire(&self.in_flight)?;
        let requested = requests.len();
        let source = Arc::clone(&self.source);
        let timeout = self.options.timeout;

        log::debug!(
            "load cycle: {} requests, concurrency {}",
            requested,
            self.options.concurrency
        );

        let inner = stream::iter(requests)
            .map(move |request| fetch_frame(Arc::clone(&source), request, timeout))
            .buffer_unordered(self.options.concurrency.max(1))
            .boxed_local();

        Ok(LoadCycle {
            requested,
            inner,
            _guard: guard,
        })
    }
}

/// Stream of outcomes for one load cycle, in completion order
///
/// Yields exactly one outcome per request. Dropping the cycle cancels the
/// remaining fetches and frees the fetcher for the next load.
pub struct LoadCycle {
    requested: usize,
    inner: LocalBoxStream<'static, FrameOutcome>,
    _guard: LoadGuard,
}

impl LoadCycle {
    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn is_empty(&self) -> bool {
        self.requested == 0
    }
}

impl Stream for LoadCycle {
    type Item = FrameOutcome;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<FrameOutcome>> {
        self.inner.poll_next_unpin(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

struct LoadGuard {
    flag: Arc<AtomicBool>,
}

impl LoadGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ViewerError::Busy)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

async fn fetch_frame<S: FrameSource>(
    source: Arc<S>,
    request: FrameRequest,
    limit: Duration,
) -> FrameOutcome {
    let timestamp = request.timestamp;

    let result = match tokio::time::timeout(limit, source.fetch(&request)).await {
        Ok(Ok(bytes)) => decode_frame(timestamp, &bytes),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(ViewerError::Timeout(limit.as_millis() as u64)),
    };

    match result {
        Ok(frame) => {
            log::debug!(
                "frame {} decoded ({}x{})",
                fmt_timestamp(&timestamp),
                frame.width(),
                frame.height()
            );
            FrameOutcome::Success(frame)
        }
        Err(reason) => {
            log::warn!("frame {} failed: {}", fmt_timestamp(&timestamp), reason);
            FrameOutcome::Failure { timestamp, reason }
        }
    }
}

/// Decode encoded image bytes into an RGBA8 frame
pub fn decode_frame(timestamp: DateTime<Utc>, bytes: &[u8]) -> Result<Frame> {
    let image = image::load_from_memory(bytes)?;
    Ok(Frame::new(timestamp, image.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let err = decode_frame(ts, b"definitely not an image").unwrap_err();
        assert!(matches!(err, ViewerError::Decode(_)));
    }

    #[test]
    fn load_guard_is_exclusive() {
        let flag = Arc::new(AtomicBool::new(false));

        let first = LoadGuard::acquire(&flag).unwrap();
        assert!(matches!(LoadGuard::acquire(&flag), Err(ViewerError::Busy)));

        drop(first);
        assert!(LoadGuard::acquire(&flag).is_ok());
    }

    #[test]
    fn default_options() {
        let options = FetchOptions::default();
        assert_eq!(options.cadence_minutes, 60);
        assert_eq!(options.concurrency, 4);
        assert_eq!(options.timeout, Duration::from_secs(10));
    }
}
