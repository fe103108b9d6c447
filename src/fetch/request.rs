use chrono::{DateTime, Duration, Utc};

/// One frame to fetch: when it was captured and where to get it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRequest {
    pub timestamp: DateTime<Utc>,
    pub source_url: String,
}

impl FrameRequest {
    pub fn new(timestamp: DateTime<Utc>, source_url: impl Into<String>) -> Self {
        Self {
            timestamp,
            source_url: source_url.into(),
        }
    }
}

/// Longest window a load may cover
pub const MAX_HOURS_BACK: u32 = 24 * 30;

/// Most sampling points a single window may plan
pub const MAX_FRAMES: usize = 10_000;

/// Time span to load, counted back from now, and the spacing between frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub hours_back: u32,
    pub cadence_minutes: u32,
}

impl TimeWindow {
    pub fn new(hours_back: u32, cadence_minutes: u32) -> Self {
        Self {
            hours_back,
            cadence_minutes,
        }
    }

    /// Number of sampling points in the window before capping
    pub fn sample_count(&self) -> u64 {
        if self.cadence_minutes == 0 {
            return 0;
        }
        u64::from(self.hours_back) * 60 / u64::from(self.cadence_minutes)
    }

    /// Number of sampling points planned, at most `MAX_FRAMES`
    pub fn frame_count(&self) -> usize {
        self.sample_count().min(MAX_FRAMES as u64) as usize
    }

    pub fn cadence(&self) -> Duration {
        Duration::minutes(self.cadence_minutes as i64)
    }

    /// `now` rounded down to the cadence grid
    pub fn anchor(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let step = self.cadence().num_seconds();
        if step <= 0 {
            return now;
        }
        let secs = now.timestamp();
        DateTime::from_timestamp(secs - secs.rem_euclid(step), 0).unwrap_or(now)
    }

    /// Sampling instants covering `(anchor - hours_back, anchor]`, oldest
    /// first. Stops at the first instant chrono cannot represent.
    pub fn timestamps(&self, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let anchor = self.anchor(now);
        let cadence = self.cadence();

        let mut stamps: Vec<_> = (0..self.frame_count())
            .map_while(|k| {
                let back = cadence.checked_mul(i32::try_from(k).ok()?)?;
                anchor.checked_sub_signed(back)
            })
            .collect();
        stamps.reverse();
        stamps
    }
}

/// Key the imagery proxy uses to address one archived frame
pub fn archive_key(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d-%H%M").to_string()
}

/// Timestamp as shown in status lines and logs
pub fn fmt_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, 0).unwrap()
    }

    #[test]
    fn zero_hours_is_empty() {
        let window = TimeWindow::new(0, 60);
        assert_eq!(window.frame_count(), 0);
        assert!(window.timestamps(at(12, 0)).is_empty());
    }

    #[test]
    fn one_hour_hourly_cadence_is_single_frame() {
        let window = TimeWindow::new(1, 60);
        assert_eq!(window.timestamps(at(12, 37)), vec![at(12, 0)]);
    }

    #[test]
    fn timestamps_are_oldest_first_on_cadence_grid() {
        let window = TimeWindow::new(1, 15);
        let ts = window.timestamps(at(12, 37));

        assert_eq!(ts, vec![at(11, 45), at(12, 0), at(12, 15), at(12, 30)]);
    }

    #[test]
    fn zero_cadence_plans_nothing() {
        let window = TimeWindow::new(3, 0);
        assert_eq!(window.frame_count(), 0);
        assert!(window.timestamps(at(1, 0)).is_empty());
    }

    #[test]
    fn huge_window_is_capped_without_overflow() {
        let window = TimeWindow::new(u32::MAX, 1_000_000);
        assert_eq!(window.frame_count(), MAX_FRAMES);

        let ts = window.timestamps(at(12, 0));
        assert!(ts.len() <= MAX_FRAMES);
        assert!(ts.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ts.last(), Some(&window.anchor(at(12, 0))));
    }

    #[test]
    fn archive_key_matches_proxy_format() {
        assert_eq!(archive_key(&at(9, 5)), "2024-06-01-0905");
        assert_eq!(fmt_timestamp(&at(9, 5)), "2024-06-01 09:05 UTC");
    }
}
