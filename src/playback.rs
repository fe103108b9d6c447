use std::time::Duration;

use crate::core::{Clock, IntervalTimer};

/// Default time between playback ticks
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Timer-driven cursor over the frame cache
///
/// Two states: stopped (no timer) and playing (live timer). `is_playing` is
/// derived from the timer handle, so the flag and the handle can never
/// disagree. The scheduler never touches frames; callers pass the current
/// cache length on every call.
#[derive(Debug)]
pub struct PlaybackScheduler<C: Clock> {
    clock: C,
    interval: Duration,
    current: usize,
    timer: Option<IntervalTimer>,
}

impl<C: Clock> PlaybackScheduler<C> {
    pub fn new(clock: C, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            current: 0,
            timer: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_playing(&self) -> bool {
        self.timer.is_some()
    }

    /// Live timer handle; `Some` exactly while playing
    pub fn timer(&self) -> Option<&IntervalTimer> {
        self.timer.as_ref()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Begin playback. No-op returning false when there is nothing to play.
    pub fn start(&mut self, frame_count: usize) -> bool {
        if frame_count == 0 {
            return false;
        }
        if self.timer.is_some() {
            return true;
        }
        if self.current >= frame_count {
            self.current = 0;
        }
        self.timer = Some(IntervalTimer::starting_at(self.clock.now(), self.interval));
        true
    }

    /// Halt playback in place. The timer is dropped before returning, so no
    /// further advancement can happen.
    pub fn stop(&mut self) {
        self.timer = None;
    }

    /// Flip between playing and stopped; returns the new playing state
    pub fn toggle(&mut self, frame_count: usize) -> bool {
        if self.is_playing() {
            self.stop();
            false
        } else {
            self.start(frame_count)
        }
    }

    /// Fire every interval elapsed since the last call, wrapping past the
    /// last frame. Returns the number of ticks fired.
    pub fn advance(&mut self, frame_count: usize) -> u32 {
        let now = self.clock.now();
        let Some(timer) = self.timer.as_mut() else {
            return 0;
        };

        let fired = timer.poll(now);
        self.clamp_to(frame_count);
        if frame_count == 0 || fired == 0 {
            return fired;
        }

        self.current = (self.current + fired as usize % frame_count) % frame_count;
        fired
    }

    /// Jump to `index`, clamped into the cache. Playing state is untouched.
    pub fn step_to(&mut self, index: usize, frame_count: usize) {
        self.current = index.min(frame_count.saturating_sub(1));
    }

    /// Step one frame forward or back, wrapping at the ends
    pub fn step_by(&mut self, delta: isize, frame_count: usize) {
        if frame_count == 0 {
            self.current = 0;
            return;
        }
        let len = frame_count as isize;
        let current = self.current.min(frame_count - 1) as isize;
        self.current = (current + delta).rem_euclid(len) as usize;
    }

    /// Keep the cursor inside a cache of `frame_count` frames
    pub fn clamp_to(&mut self, frame_count: usize) {
        if self.current >= frame_count {
            self.current = frame_count.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;

    fn scheduler() -> (PlaybackScheduler<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (PlaybackScheduler::new(clock.clone(), DEFAULT_INTERVAL), clock)
    }

    #[test]
    fn start_on_empty_cache_is_noop() {
        let (mut playback, _) = scheduler();

        assert!(!playback.start(0));
        assert!(!playback.is_playing());
        assert!(playback.timer().is_none());
    }

    #[test]
    fn start_sets_flag_and_timer_together() {
        let (mut playback, _) = scheduler();

        assert!(playback.start(3));
        assert!(playback.is_playing());
        assert!(playback.timer().is_some());
    }

    #[test]
    fn ticks_wrap_around() {
        let (mut playback, clock) = scheduler();
        playback.start(3);

        let mut seen = Vec::new();
        for _ in 0..4 {
            clock.advance(DEFAULT_INTERVAL);
            assert_eq!(playback.advance(3), 1);
            seen.push(playback.current_index());
        }
        assert_eq!(seen, vec![1, 2, 0, 1]);
    }

    #[test]
    fn catch_up_applies_all_elapsed_ticks() {
        let (mut playback, clock) = scheduler();
        playback.start(4);

        clock.advance(DEFAULT_INTERVAL * 6);
        assert_eq!(playback.advance(4), 6);
        assert_eq!(playback.current_index(), 2);
    }

    #[test]
    fn stop_halts_in_place() {
        let (mut playback, clock) = scheduler();
        playback.start(5);
        clock.advance(DEFAULT_INTERVAL * 2);
        playback.advance(5);

        playback.stop();
        assert!(!playback.is_playing());
        assert!(playback.timer().is_none());
        let before = playback.current_index();

        clock.advance(Duration::from_secs(5));
        assert_eq!(playback.advance(5), 0);
        assert_eq!(playback.current_index(), before);
    }

    #[test]
    fn shrinking_cache_clamps_before_advancing() {
        let (mut playback, clock) = scheduler();
        playback.start(10);
        playback.step_to(9, 10);

        clock.advance(DEFAULT_INTERVAL);
        playback.advance(4);
        assert_eq!(playback.current_index(), 0);

        clock.advance(DEFAULT_INTERVAL);
        playback.advance(0);
        assert_eq!(playback.current_index(), 0);
    }

    #[test]
    fn step_to_clamps_and_keeps_state() {
        let (mut playback, _) = scheduler();

        playback.step_to(42, 5);
        assert_eq!(playback.current_index(), 4);
        assert!(!playback.is_playing());

        playback.start(5);
        playback.step_to(1, 5);
        assert_eq!(playback.current_index(), 1);
        assert!(playback.is_playing());
    }

    #[test]
    fn step_by_wraps_both_ways() {
        let (mut playback, _) = scheduler();

        playback.step_by(-1, 4);
        assert_eq!(playback.current_index(), 3);
        playback.step_by(2, 4);
        assert_eq!(playback.current_index(), 1);
    }

    #[test]
    fn start_resets_out_of_range_cursor() {
        let (mut playback, _) = scheduler();
        playback.step_to(7, 8);

        playback.start(3);
        assert_eq!(playback.current_index(), 0);
    }

    #[test]
    fn toggle_round_trip() {
        let (mut playback, _) = scheduler();

        assert!(playback.toggle(2));
        assert!(!playback.toggle(2));
        assert!(!playback.toggle(0));
        assert!(!playback.is_playing());
    }
}
