//! Fixed-cadence movement-intent limiter

use crate::game::constants::movement::INTENT_INTERVAL_MS;

/// Lets at most one intent through per interval, independent of key repeat
/// or render rate.
#[derive(Debug, Clone)]
pub struct InputThrottle {
    interval_ms: u64,
    last_sent_ms: Option<u64>,
}

impl InputThrottle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_sent_ms: None,
        }
    }

    /// Returns true and records `now_ms` if the interval has elapsed
    pub fn allow(&mut self, now_ms: u64) -> bool {
        match self.last_sent_ms {
            Some(last) if now_ms.saturating_sub(last) < self.interval_ms => false,
            _ => {
                self.last_sent_ms = Some(now_ms);
                true
            }
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Forget the last send, so the next intent passes immediately
    pub fn reset(&mut self) {
        self.last_sent_ms = None;
    }
}

impl Default for InputThrottle {
    fn default() -> Self {
        Self::new(INTENT_INTERVAL_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twenty_hz_cadence() {
        let mut throttle = InputThrottle::default();
        assert!(throttle.allow(0));
        assert!(!throttle.allow(16));
        assert!(!throttle.allow(49));
        assert!(throttle.allow(50));
        assert!(!throttle.allow(66));
        assert!(throttle.allow(120));
    }

    #[test]
    fn test_key_repeat_bounded() {
        let mut throttle = InputThrottle::default();
        // Key repeat at ~60 Hz for one second
        let passed = (0..60u64).filter(|i| throttle.allow(i * 1000 / 60)).count();
        assert!(passed <= 20);
        assert!(passed >= 15);
    }

    #[test]
    fn test_reset() {
        let mut throttle = InputThrottle::new(100);
        assert!(throttle.allow(10));
        throttle.reset();
        assert!(throttle.allow(20));
    }
}
