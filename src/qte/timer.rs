//! Challenge Timer
//!
//! Bounds one challenge's active window. Expiry is polled once per tick by
//! the engine; there is no cancellation because the timer lives inside the
//! challenge state and is dropped with it.

use crate::core::time::Tick;

/// Active window of one challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChallengeTimer {
    armed_at: Tick,
    duration: u32,
}

impl ChallengeTimer {
    /// Start a window of `duration` ticks at `now`.
    pub fn arm(now: Tick, duration: u32) -> Self {
        Self {
            armed_at: now,
            duration,
        }
    }

    /// Window length in ticks.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Ticks since arming.
    #[inline]
    pub fn elapsed(&self, now: Tick) -> Tick {
        now.saturating_sub(self.armed_at)
    }

    /// Window has run out.
    #[inline]
    pub fn is_expired(&self, now: Tick) -> bool {
        self.elapsed(now) >= Tick::from(self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_expiry() {
        let timer = ChallengeTimer::arm(100, 30);

        assert!(!timer.is_expired(100));
        assert!(!timer.is_expired(129));
        assert!(timer.is_expired(130));
        assert!(timer.is_expired(500));
    }

    #[test]
    fn test_timer_elapsed() {
        let timer = ChallengeTimer::arm(10, 20);

        assert_eq!(timer.elapsed(10), 0);
        assert_eq!(timer.elapsed(25), 15);
        assert_eq!(timer.duration(), 20);
    }

    #[test]
    fn test_timer_past_u32_range() {
        let start = u32::MAX as Tick - 5;
        let timer = ChallengeTimer::arm(start, 30);

        assert!(!timer.is_expired(start + 29));
        assert!(timer.is_expired(start + 30));
    }

    #[test]
    fn test_clock_before_arming() {
        // A stale `now` never underflows
        let timer = ChallengeTimer::arm(50, 10);
        assert_eq!(timer.elapsed(40), 0);
        assert!(!timer.is_expired(40));
    }
}
