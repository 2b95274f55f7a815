use std::time::Duration;

/// Fixed-timestep accumulator.
///
/// Feed it frame deltas; it reports how many whole ticks of `period` have
/// elapsed and carries the remainder to the next frame.
#[derive(Debug, Clone)]
pub struct FixedStep {
    period: Duration,
    accumulated: Duration,
    ticks: u64,
}

impl FixedStep {
    /// `period` must be non-zero; a zero period is raised to one microsecond.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_micros(1)),
            accumulated: Duration::ZERO,
            ticks: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks run since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Adds `dt` and returns the number of ticks now due.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.accumulated += dt;
        let mut due = 0u32;
        while self.accumulated >= self.period {
            self.accumulated -= self.period;
            due += 1;
        }
        self.ticks += due as u64;
        due
    }
}

impl Default for FixedStep {
    /// 15 ms ticks (about 66.7 Hz).
    fn default() -> Self {
        Self::new(Duration::from_millis(15))
    }
}
