//! Rate governor.
//!
//! Decouples the ~600 Hz instruction clock from the fixed 60 Hz timer
//! clock using a wall-clock accumulator, rather than the frame-counter
//! scheme this is grounded on (which assumed an external ~60 FPS render
//! loop calling `step()` once per frame). This core has no render loop of
//! its own, so pacing is driven by the elapsed duration the caller
//! reports, not by a call count — that also keeps it deterministic and
//! testable with synthetic durations instead of real sleeps.

use std::time::Duration;

/// Instruction clock rate.
pub const CPU_HZ: u64 = 600;
/// Timer clock rate, fixed by the CHIP-8 spec.
pub const TIMER_HZ: u64 = 60;

/// Tracks elapsed wall-clock time against the CPU and timer clocks and
/// reports, on each `step`, whether each clock should fire.
///
/// Does not sleep: the caller decides how to pace itself between calls
/// (a real sleep in the CLI, nothing at all in a test harness driving
/// synthetic durations).
///
pub struct RateGovernor {
    cpu_period: Duration,
    timer_period: Duration,
    cpu_accumulator: Duration,
    timer_accumulator: Duration,
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new()
    }
}

impl RateGovernor {
    /// Create a governor running the CPU at `CPU_HZ` and timers at `TIMER_HZ`.
    pub fn new() -> Self {
        Self::with_rates(CPU_HZ, TIMER_HZ)
    }

    /// Create a governor with explicit rates, mostly for tests.
    pub fn with_rates(cpu_hz: u64, timer_hz: u64) -> Self {
        RateGovernor {
            cpu_period: Duration::from_secs_f64(1.0 / cpu_hz as f64),
            timer_period: Duration::from_secs_f64(1.0 / timer_hz as f64),
            cpu_accumulator: Duration::ZERO,
            timer_accumulator: Duration::ZERO,
        }
    }

    /// Advance both accumulators by `elapsed` and report which clocks
    /// have accrued a full period. Each clock fires at most once per
    /// call: a caller that lets `elapsed` grow past several periods
    /// should call `step` repeatedly with smaller slices, or accept that
    /// catch-up cycles collapse into one. The CHIP-8 core calls this
    /// once per step-loop iteration with a small elapsed slice, so this
    /// is not a practical concern.
    ///
    /// # Returns
    ///
    /// `(execute_now, tick_timer_now)`.
    ///
    pub fn step(&mut self, elapsed: Duration) -> (bool, bool) {
        self.cpu_accumulator += elapsed;
        self.timer_accumulator += elapsed;

        let execute_now = self.cpu_accumulator >= self.cpu_period;
        if execute_now {
            self.cpu_accumulator -= self.cpu_period;
        }

        let tick_timer_now = self.timer_accumulator >= self.timer_period;
        if tick_timer_now {
            self.timer_accumulator -= self.timer_period;
        }

        (execute_now, tick_timer_now)
    }

    /// Reset both accumulators to zero.
    pub fn reset(&mut self) {
        self.cpu_accumulator = Duration::ZERO;
        self.timer_accumulator = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_at_period_boundary() {
        let mut gov = RateGovernor::with_rates(10, 5);
        assert_eq!(gov.step(Duration::from_millis(50)), (false, false));
        assert_eq!(gov.step(Duration::from_millis(50)), (true, false));
        assert_eq!(gov.step(Duration::from_millis(100)), (true, true));
    }

    #[test]
    fn test_reset_clears_accumulators() {
        let mut gov = RateGovernor::with_rates(10, 5);
        gov.step(Duration::from_millis(50));
        gov.reset();
        assert_eq!(gov.step(Duration::from_millis(50)), (false, false));
    }
}
