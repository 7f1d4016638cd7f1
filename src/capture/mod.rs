//! Capture timing.
//!
//! The host loop polls the gate in a tight loop with a short sleep between
//! polls; a frame is taken only once the configured interval has passed.

use std::time::{Duration, Instant};

/// Sleep between two polls of a closed gate.
pub const POLL_SLEEP: Duration = Duration::from_millis(1);

/// Fixed-interval frame gate
#[derive(Debug, Clone)]
pub struct FrameGate {
    interval: Duration,
    last_capture: Option<Instant>,
}

impl FrameGate {
    /// Create a gate that opens at most once per `interval`
    pub fn new(interval: Duration) -> Self {
        FrameGate {
            interval,
            last_capture: None,
        }
    }

    /// Returns true and records `now` when strictly more than one interval
    /// has passed since the last capture. The first poll always opens.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_capture {
            Some(last) if now.saturating_duration_since(last) <= self.interval => false,
            _ => {
                self.last_capture = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_poll_opens() {
        let mut gate = FrameGate::new(Duration::from_millis(33));
        assert!(gate.poll(Instant::now()));
    }

    #[test]
    fn gate_holds_until_interval_elapsed() {
        let mut gate = FrameGate::new(Duration::from_millis(33));
        let t0 = Instant::now();
        assert!(gate.poll(t0));
        assert!(!gate.poll(t0 + Duration::from_millis(10)));
        assert!(!gate.poll(t0 + Duration::from_millis(33)));
        assert!(gate.poll(t0 + Duration::from_millis(34)));
        // interval restarts from the last capture
        assert!(!gate.poll(t0 + Duration::from_millis(60)));
        assert!(gate.poll(t0 + Duration::from_millis(68)));
    }
}
