#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::Cursor;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use image::{ImageFormat, Rgba, RgbaImage};
use sat_viewer::fetch::archive_key;
use sat_viewer::{FrameRequest, FrameSource, Result, ViewerError};

/// What the mock proxy does for one timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Serve,
    Refuse,
    Garbage,
    Hang,
}

/// Counters shared between a test and the source it handed to a fetcher
#[derive(Debug, Default)]
pub struct MockStats {
    pub calls: Cell<usize>,
    pub in_flight: Cell<usize>,
    pub max_in_flight: Cell<usize>,
    pub completed: RefCell<Vec<DateTime<Utc>>>,
}

/// In-memory stand-in for the imagery proxy
pub struct MockSource {
    default: Behavior,
    overrides: HashMap<DateTime<Utc>, Behavior>,
    delays: HashMap<DateTime<Utc>, Duration>,
    default_delay: Duration,
    stats: Rc<MockStats>,
}

impl MockSource {
    pub fn serving() -> Self {
        Self::with_default(Behavior::Serve)
    }

    pub fn refusing() -> Self {
        Self::with_default(Behavior::Refuse)
    }

    pub fn with_default(default: Behavior) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
            delays: HashMap::new(),
            default_delay: Duration::ZERO,
            stats: Rc::new(MockStats::default()),
        }
    }

    pub fn behave(mut self, timestamp: DateTime<Utc>, behavior: Behavior) -> Self {
        self.overrides.insert(timestamp, behavior);
        self
    }

    pub fn delay(mut self, timestamp: DateTime<Utc>, delay: Duration) -> Self {
        self.delays.insert(timestamp, delay);
        self
    }

    pub fn delay_all(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn stats(&self) -> Rc<MockStats> {
        Rc::clone(&self.stats)
    }
}

impl FrameSource for MockSource {
    fn url_for(&self, timestamp: &DateTime<Utc>) -> String {
        format!("mock://frames/{}", archive_key(timestamp))
    }

    async fn fetch(&self, request: &FrameRequest) -> Result<Vec<u8>> {
        let stats = &self.stats;
        stats.calls.set(stats.calls.get() + 1);
        stats.in_flight.set(stats.in_flight.get() + 1);
        stats
            .max_in_flight
            .set(stats.max_in_flight.get().max(stats.in_flight.get()));

        let behavior = self
            .overrides
            .get(&request.timestamp)
            .copied()
            .unwrap_or(self.default);
        let delay = self
            .delays
            .get(&request.timestamp)
            .copied()
            .unwrap_or(self.default_delay);

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if behavior == Behavior::Hang {
            std::future::pending::<()>().await;
        }

        stats.in_flight.set(stats.in_flight.get() - 1);
        stats.completed.borrow_mut().push(request.timestamp);

        match behavior {
            Behavior::Serve => Ok(png_bytes(4, 2)),
            Behavior::Refuse => Err(ViewerError::network("connection refused")),
            Behavior::Garbage => Ok(b"<html>502 Bad Gateway</html>".to_vec()),
            Behavior::Hang => unreachable!(),
        }
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([20, 60, 140, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("png encode");
    bytes
}

/// 2024-06-01 at `h:m` UTC
pub fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, h, m, 0).unwrap()
}

/// Fixed "now" used across tests: 2024-06-01 12:37 UTC
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 37, 0).unwrap()
}
