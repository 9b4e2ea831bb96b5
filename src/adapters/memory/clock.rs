//! Deterministic clock for tests and dry runs.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::ports::clock::Clock;

/// Clock that starts at a fixed instant and advances by a fixed step on
/// every read. A zero step pins time entirely.
pub struct SteppingClock {
    current: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    /// Creates a clock that always returns `at`.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::stepping(at, Duration::zero())
    }

    /// Creates a clock that returns `start`, then `start + step`, and so on.
    #[must_use]
    pub fn stepping(start: DateTime<Utc>, step: Duration) -> Self {
        Self { current: Mutex::new(start), step }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let now = *current;
        *current = now + self.step;
        now
    }
}
