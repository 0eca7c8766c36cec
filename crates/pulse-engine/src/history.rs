//! Fixed-length traffic history for the activity chart

use std::collections::VecDeque;

/// Number of samples kept
pub const HISTORY_LEN: usize = 20;

/// One bar of the traffic chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficBar {
    /// Sample value (packets per second)
    pub value: f64,
    /// Height relative to the window maximum, 0..=100
    pub height_percent: f64,
}

/// Exactly [`HISTORY_LEN`] samples, oldest first
#[derive(Debug, Clone)]
pub struct TrafficHistory {
    samples: VecDeque<f64>,
}

impl Default for TrafficHistory {
    fn default() -> Self {
        Self {
            samples: std::iter::repeat(0.0).take(HISTORY_LEN).collect(),
        }
    }
}

impl TrafficHistory {
    /// Create a window of zero samples
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the oldest sample and append `sample`
    pub fn push(&mut self, sample: f64) {
        self.samples.pop_front();
        self.samples.push_back(if sample.is_finite() { sample.max(0.0) } else { 0.0 });
    }

    /// Back to all zeros
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Samples, oldest first
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// Chart bars scaled to the window maximum
    pub fn bars(&self) -> Vec<TrafficBar> {
        let max = self.samples.iter().copied().fold(0.0, f64::max);
        self.samples
            .iter()
            .map(|&value| TrafficBar {
                value,
                height_percent: if max > 0.0 { value / max * 100.0 } else { 0.0 },
            })
            .collect()
    }
}
