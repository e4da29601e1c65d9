//! Tick clock helpers.
//!
//! The engine advances once per host frame. All timing is expressed in
//! ticks so the timer check is a plain integer comparison.

/// Simulation tick counter.
///
/// 64-bit so a host ticking at 60 Hz never wraps.
pub type Tick = u64;

/// Convert a millisecond duration to ticks at `tick_rate` Hz.
///
/// Rounds up and never returns less than one tick, so a configured window
/// always gets at least one poll.
pub fn ticks_from_millis(millis: u32, tick_rate: u32) -> u32 {
    let ticks = (millis as u64 * tick_rate as u64).div_ceil(1000);
    ticks.clamp(1, u32::MAX as u64) as u32
}

/// Convert ticks back to milliseconds (for logging).
pub fn millis_from_ticks(ticks: u32, tick_rate: u32) -> u64 {
    if tick_rate == 0 {
        return 0;
    }
    ticks as u64 * 1000 / tick_rate as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_from_millis() {
        assert_eq!(ticks_from_millis(1000, 60), 60);
        assert_eq!(ticks_from_millis(2500, 60), 150);
        // 10ms at 60Hz is 0.6 ticks -> rounds up
        assert_eq!(ticks_from_millis(10, 60), 1);
        assert_eq!(ticks_from_millis(0, 60), 1);
    }

    #[test]
    fn test_millis_from_ticks() {
        assert_eq!(millis_from_ticks(60, 60), 1000);
        assert_eq!(millis_from_ticks(30, 60), 500);
        assert_eq!(millis_from_ticks(30, 0), 0);
    }
}
