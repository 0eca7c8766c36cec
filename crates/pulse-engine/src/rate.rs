//! Rolling one-second packet arrival rate

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Arrival-rate meter over a sliding window
#[derive(Debug, Clone)]
pub struct ArrivalRateMeter {
    arrivals: VecDeque<Instant>,
    window: Duration,
}

impl Default for ArrivalRateMeter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl ArrivalRateMeter {
    /// Create a meter with the given window length
    pub fn new(window: Duration) -> Self {
        Self {
            arrivals: VecDeque::new(),
            window,
        }
    }

    /// Record one arrival and return the rate including it
    pub fn record(&mut self, now: Instant) -> f64 {
        self.arrivals.push_back(now);
        self.prune(now);
        self.rate(now)
    }

    /// Arrivals per second within the window ending at `now`
    pub fn rate(&self, now: Instant) -> f64 {
        let secs = self.window.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        let in_window = match now.checked_sub(self.window) {
            Some(cutoff) => self.arrivals.iter().filter(|t| **t > cutoff).count(),
            None => self.arrivals.len(),
        };
        in_window as f64 / secs
    }

    fn prune(&mut self, now: Instant) {
        let Some(cutoff) = now.checked_sub(self.window) else {
            return;
        };
        while let Some(t) = self.arrivals.front() {
            if *t <= cutoff {
                self.arrivals.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_meter() {
        let meter = ArrivalRateMeter::default();
        assert_eq!(meter.rate(Instant::now()), 0.0);
    }

    #[test]
    fn test_burst_within_window() {
        let mut meter = ArrivalRateMeter::default();
        let start = Instant::now();
        let mut rate = 0.0;
        for i in 0..5 {
            rate = meter.record(start + Duration::from_millis(i * 100));
        }
        assert_eq!(rate, 5.0);
    }

    #[test]
    fn test_old_arrivals_leave_window() {
        let mut meter = ArrivalRateMeter::default();
        let start = Instant::now();
        meter.record(start);
        meter.record(start + Duration::from_millis(500));

        let later = start + Duration::from_millis(1200);
        assert_eq!(meter.record(later), 2.0);
        assert_eq!(meter.rate(start + Duration::from_secs(5)), 0.0);
    }
}
