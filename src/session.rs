use std::time::Duration;

use futures::StreamExt;

use crate::cache::{Frame, FrameCache};
use crate::core::Clock;
use crate::error::{Result, ViewerError};
use crate::fetch::{FrameFetcher, FrameOutcome, FrameRequest, FrameSource, LoadCycle};
use crate::playback::PlaybackScheduler;
use crate::status::{LoadSummary, StatusEvent, StatusObserver, StatusReporter};

/// Snapshot of what the user surface shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerState {
    pub cache_len: usize,
    pub is_playing: bool,
    pub current_index: usize,
    pub status: Option<String>,
}

/// Everything one viewing session owns: the frame cache, the playback
/// cursor and the status log
///
/// All cache mutation goes through `&mut self`, so appends and resets are
/// serialized by the borrow checker. The scheduler and renderers only ever
/// read the cache.
pub struct ViewerSession<C: Clock> {
    cache: FrameCache,
    playback: PlaybackScheduler<C>,
    status: StatusReporter,
    observers: Vec<Box<dyn StatusObserver>>,
}

impl<C: Clock> ViewerSession<C> {
    pub fn new(clock: C, interval: Duration) -> Self {
        Self {
            cache: FrameCache::new(),
            playback: PlaybackScheduler::new(clock, interval),
            status: StatusReporter::new(),
            observers: Vec::new(),
        }
    }

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    pub fn playback(&self) -> &PlaybackScheduler<C> {
        &self.playback
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    /// Register an extra observer. Observers only hear events.
    pub fn subscribe(&mut self, observer: Box<dyn StatusObserver>) {
        self.observers.push(observer);
    }

    /// Load the last `hours_back` hours through `fetcher`
    ///
    /// Playback must be stopped first (`PlaybackActive`). A concurrent load
    /// on the same fetcher is rejected with `Busy`. An empty window leaves
    /// the cache untouched.
    pub async fn load<S: FrameSource + 'static>(
        &mut self,
        fetcher: &FrameFetcher<S>,
        hours_back: u32,
    ) -> Result<LoadSummary> {
        self.ensure_stopped()?;
        let cycle = fetcher.load(hours_back)?;
        Ok(self.run_cycle(cycle).await)
    }

    /// `load` against a fixed "now"
    pub async fn load_at<S: FrameSource + 'static>(
        &mut self,
        fetcher: &FrameFetcher<S>,
        hours_back: u32,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<LoadSummary> {
        self.ensure_stopped()?;
        let cycle = fetcher.load_at(hours_back, now)?;
        Ok(self.run_cycle(cycle).await)
    }

    /// Load an explicit request list, e.g. from the proxy catalog
    pub async fn load_requests<S: FrameSource + 'static>(
        &mut self,
        fetcher: &FrameFetcher<S>,
        requests: Vec<FrameRequest>,
    ) -> Result<LoadSummary> {
        self.ensure_stopped()?;
        let cycle = fetcher.load_requests(requests)?;
        Ok(self.run_cycle(cycle).await)
    }

    /// Drain a load cycle into the cache
    ///
    /// The cache is reset before the first outcome is consumed. Every
    /// outcome is counted, so the returned summary is always settled.
    pub async fn run_cycle(&mut self, mut cycle: LoadCycle) -> LoadSummary {
        if cycle.is_empty() {
            log::debug!("empty load window, cache left as is");
            return LoadSummary::default();
        }

        self.cache.reset();
        self.playback.clamp_to(0);

        let mut summary = LoadSummary {
            requested: cycle.requested(),
            ..LoadSummary::default()
        };
        self.emit(StatusEvent::LoadStarted {
            requested: summary.requested,
        });

        while let Some(outcome) = cycle.next().await {
            match outcome {
                FrameOutcome::Success(frame) => {
                    let timestamp = frame.timestamp();
                    if self.cache.append(frame) {
                        summary.loaded += 1;
                        self.emit(StatusEvent::FrameLoaded { timestamp });
                    } else {
                        summary.failed += 1;
                        self.emit(StatusEvent::FrameFailed {
                            timestamp,
                            reason: "duplicate timestamp".to_string(),
                        });
                    }
                }
                FrameOutcome::Failure { timestamp, reason } => {
                    summary.failed += 1;
                    self.emit(StatusEvent::FrameFailed {
                        timestamp,
                        reason: reason.to_string(),
                    });
                }
            }
        }

        self.emit(StatusEvent::LoadFinished(summary));
        summary
    }

    /// Start playback. With an empty cache this is a visible no-op.
    pub fn play(&mut self) -> bool {
        let was_playing = self.playback.is_playing();
        if !self.playback.start(self.cache.len()) {
            self.emit(StatusEvent::PlaybackIgnored);
            return false;
        }
        if !was_playing {
            self.emit(StatusEvent::PlaybackStarted {
                frames: self.cache.len(),
            });
        }
        true
    }

    /// Stop playback in place
    pub fn pause(&mut self) {
        if self.playback.is_playing() {
            self.playback.stop();
            self.emit(StatusEvent::PlaybackStopped {
                index: self.playback.current_index(),
            });
        }
    }

    /// Play/pause toggle; returns the new playing state
    pub fn toggle(&mut self) -> bool {
        if self.playback.is_playing() {
            self.pause();
            false
        } else {
            self.play()
        }
    }

    /// Advance the cursor by every interval elapsed since the last tick
    pub fn tick(&mut self) -> u32 {
        self.playback.advance(self.cache.len())
    }

    pub fn step_to(&mut self, index: usize) {
        self.playback.step_to(index, self.cache.len());
    }

    pub fn step_by(&mut self, delta: isize) {
        self.playback.step_by(delta, self.cache.len());
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn current_index(&self) -> usize {
        self.playback.current_index()
    }

    /// Frame under the cursor; `None` while the cache is empty
    pub fn current_frame(&self) -> Option<&Frame> {
        self.cache.get(self.playback.current_index()).ok()
    }

    pub fn state(&self) -> ViewerState {
        ViewerState {
            cache_len: self.cache.len(),
            is_playing: self.playback.is_playing(),
            current_index: self.playback.current_index(),
            status: self.status.latest().map(str::to_string),
        }
    }

    pub fn status_line(&self) -> String {
        self.status.line(
            self.cache.len(),
            self.playback.is_playing(),
            self.playback.current_index(),
        )
    }

    fn ensure_stopped(&self) -> Result<()> {
        if self.playback.is_playing() {
            return Err(ViewerError::PlaybackActive);
        }
        Ok(())
    }

    fn emit(&mut self, event: StatusEvent) {
        self.status.notify(&event);
        for observer in &mut self.observers {
            observer.notify(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::playback::DEFAULT_INTERVAL;
    use chrono::{TimeZone, Utc};
    use image::RgbaImage;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn session_with(frames: u32) -> (ViewerSession<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let mut session = ViewerSession::new(clock.clone(), DEFAULT_INTERVAL);
        for hour in 0..frames {
            let ts = Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap();
            session.cache.append(Frame::new(ts, RgbaImage::new(1, 1)));
        }
        (session, clock)
    }

    struct Recorder(Rc<RefCell<Vec<StatusEvent>>>);

    impl StatusObserver for Recorder {
        fn notify(&mut self, event: &StatusEvent) {
            self.0.borrow_mut().push(event.clone());
        }
    }

    #[test]
    fn play_on_empty_cache_is_inert() {
        let (mut session, _) = session_with(0);

        assert!(!session.play());
        assert!(!session.is_playing());
        assert!(session.playback().timer().is_none());
        assert_eq!(session.status().latest(), Some("Nothing to play"));
        assert!(session.current_frame().is_none());
    }

    #[test]
    fn tick_follows_clock() {
        let (mut session, clock) = session_with(3);
        session.play();

        clock.advance(DEFAULT_INTERVAL);
        assert_eq!(session.tick(), 1);
        assert_eq!(session.current_index(), 1);
        let expected = Utc.with_ymd_and_hms(2024, 6, 1, 1, 0, 0).unwrap();
        assert_eq!(session.current_frame().unwrap().timestamp(), expected);
    }

    #[test]
    fn pause_reports_position() {
        let (mut session, clock) = session_with(4);
        session.play();
        clock.advance(DEFAULT_INTERVAL * 2);
        session.tick();

        session.pause();
        assert_eq!(session.status().latest(), Some("Paused at frame 3"));
        assert!(session.toggle());
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn observers_hear_every_event() {
        let (mut session, _) = session_with(2);
        let events = Rc::new(RefCell::new(Vec::new()));
        session.subscribe(Box::new(Recorder(Rc::clone(&events))));

        session.play();
        session.play();
        session.pause();

        assert_eq!(
            *events.borrow(),
            vec![
                StatusEvent::PlaybackStarted { frames: 2 },
                StatusEvent::PlaybackStopped { index: 0 },
            ]
        );
    }

    #[test]
    fn state_snapshot() {
        let (mut session, _) = session_with(5);
        session.step_to(3);

        let state = session.state();
        assert_eq!(state.cache_len, 5);
        assert_eq!(state.current_index, 3);
        assert!(!state.is_playing);
        assert_eq!(session.status_line(), "5 frames loaded · paused · frame 4/5");
    }
}
