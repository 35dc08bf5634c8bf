//! Countdown-driven auto refresh.
//!
//! The scheduler is a two-state machine (counting, refreshing) that knows
//! nothing about fetching: callers tick it once per second and dispatch a
//! fetch whenever it answers [`Tick::Refresh`]. Time is read through
//! [`Clock`] so tests can drive it without sleeping.

use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_INTERVAL_SECONDS: u32 = 60;
/// Minimum time the refreshing indicator stays up, avoids spinner flicker.
pub const DEFAULT_MIN_VISIBLE: Duration = Duration::from_millis(500);

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Virtual clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshState {
    Counting,
    Refreshing,
}

/// What the caller should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Idle,
    Refresh,
}

pub struct RefreshScheduler {
    interval_seconds: u32,
    seconds_left: u32,
    running: bool,
    min_visible: Duration,
    in_flight: u32,
    last_started: Option<Instant>,
    clock: Arc<dyn Clock>,
}

impl RefreshScheduler {
    pub fn new(interval_seconds: u32, clock: Arc<dyn Clock>) -> Self {
        let interval_seconds = interval_seconds.max(1);
        RefreshScheduler {
            interval_seconds,
            seconds_left: interval_seconds,
            running: false,
            min_visible: DEFAULT_MIN_VISIBLE,
            in_flight: 0,
            last_started: None,
            clock,
        }
    }

    pub fn with_min_visible(mut self, min_visible: Duration) -> Self {
        self.min_visible = min_visible;
        self
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// A stopped scheduler ignores ticks but still honours `refresh_now`.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn interval_seconds(&self) -> u32 {
        self.interval_seconds
    }

    pub fn seconds_left(&self) -> u32 {
        self.seconds_left
    }

    /// Advances the countdown by one second. At 1 the countdown wraps back to
    /// the full interval and a refresh is due.
    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        if self.seconds_left <= 1 {
            self.seconds_left = self.interval_seconds;
            self.begin_refresh();
            Tick::Refresh
        } else {
            self.seconds_left -= 1;
            Tick::Idle
        }
    }

    /// Manual refresh: resets the countdown and always asks for a fetch, even
    /// if one is already in flight.
    pub fn refresh_now(&mut self) -> Tick {
        self.seconds_left = self.interval_seconds;
        self.begin_refresh();
        Tick::Refresh
    }

    /// Marks one dispatched fetch as resolved, successfully or not.
    pub fn finish_refresh(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub fn state(&self) -> RefreshState {
        if self.is_refreshing() {
            RefreshState::Refreshing
        } else {
            RefreshState::Counting
        }
    }

    pub fn is_refreshing(&self) -> bool {
        if self.in_flight > 0 {
            return true;
        }
        match self.last_started {
            Some(started) => self.clock.now() < started + self.min_visible,
            None => false,
        }
    }

    fn begin_refresh(&mut self) {
        self.in_flight += 1;
        self.last_started = Some(self.clock.now());
    }
}
