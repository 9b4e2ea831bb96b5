//! System clock adapter.

use chrono::{DateTime, Utc};

use crate::ports::clock::Clock;

/// Reads wall-clock time for block records and plan stamps.
pub struct LiveClock;

impl Clock for LiveClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successive_stamps_never_go_backwards() {
        let first = LiveClock.now();
        let second = LiveClock.now();
        assert!(second >= first);
        assert!((second - first).num_seconds() < 5);
    }
}
