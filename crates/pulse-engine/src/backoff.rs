//! Reconnect delay policy

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long to wait before reconnect attempt `n`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// The same delay every time
    Fixed {
        /// Delay in milliseconds
        delay_ms: u64,
    },
    /// Doubling delay, capped
    Exponential {
        /// First delay in milliseconds
        initial_ms: u64,
        /// Upper bound in milliseconds
        max_ms: u64,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Fixed { delay_ms: 3000 }
    }
}

impl Backoff {
    /// Delay before the given attempt (1 is the first retry)
    pub fn next_delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Backoff::Exponential { initial_ms, max_ms } => {
                let shift = attempt.saturating_sub(1).min(32);
                let ms = initial_ms.saturating_mul(1u64 << shift).min(max_ms);
                Duration::from_millis(ms)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_default() {
        let backoff = Backoff::default();
        assert_eq!(backoff.next_delay(1), Duration::from_secs(3));
        assert_eq!(backoff.next_delay(50), Duration::from_secs(3));
    }

    #[test]
    fn test_exponential_caps() {
        let backoff = Backoff::Exponential {
            initial_ms: 500,
            max_ms: 4000,
        };
        assert_eq!(backoff.next_delay(1), Duration::from_millis(500));
        assert_eq!(backoff.next_delay(2), Duration::from_millis(1000));
        assert_eq!(backoff.next_delay(4), Duration::from_millis(4000));
        assert_eq!(backoff.next_delay(u32::MAX), Duration::from_millis(4000));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&Backoff::default()).unwrap();
        assert_eq!(json, r#"{"kind":"fixed","delay_ms":3000}"#);
        let parsed: Backoff =
            serde_json::from_str(r#"{"kind":"exponential","initial_ms":250,"max_ms":8000}"#)
                .unwrap();
        assert_eq!(
            parsed,
            Backoff::Exponential {
                initial_ms: 250,
                max_ms: 8000
            }
        );
    }
}
