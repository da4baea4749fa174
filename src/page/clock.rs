use std::cell::Cell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, NaiveDate};

/// Source of page time.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;

    /// The user's current calendar date.
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock that only moves when told to. Clones share the same time, so a
/// test can keep one handle and give another to the tracker.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
    today: Rc<Cell<NaiveDate>>,
}

impl ManualClock {
    pub fn new(start_ms: u64, today: NaiveDate) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
            today: Rc::new(Cell::new(today)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn set_today(&self, today: NaiveDate) {
        self.today.set(today);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn today(&self) -> NaiveDate {
        self.today.get()
    }
}
