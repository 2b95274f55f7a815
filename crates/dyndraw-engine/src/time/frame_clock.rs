use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

/// Timing of one rendered frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Elapsed since the previous frame, clamped to the clock's range.
    pub dt: Duration,
    pub now: Instant,
    /// 0 for the first frame.
    pub frame_index: u64,
}

impl FrameTime {
    pub fn dt_secs(&self) -> f32 {
        self.dt.as_secs_f32()
    }
}

/// Measures frame deltas for the render loop.
///
/// Deltas are clamped: a stalled loop (debugger, window drag, minimize)
/// produces one bounded step instead of a jump.
#[derive(Debug, Clone)]
pub struct FrameClock {
    previous: Instant,
    frames: u64,
    dt_range: RangeInclusive<Duration>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_range(Duration::from_micros(100)..=Duration::from_millis(250))
    }

    pub fn with_range(dt_range: RangeInclusive<Duration>) -> Self {
        debug_assert!(dt_range.start() <= dt_range.end());
        Self {
            previous: Instant::now(),
            frames: 0,
            dt_range,
        }
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.previous)
            .clamp(*self.dt_range.start(), *self.dt_range.end());
        self.previous = now;

        let frame_index = self.frames;
        self.frames = self.frames.wrapping_add(1);

        FrameTime {
            dt,
            now,
            frame_index,
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_and_counts() {
        let start = Instant::now();
        let mut clock = FrameClock::with_range(Duration::from_millis(1)..=Duration::from_millis(100));
        clock.previous = start;

        let a = clock.tick_at(start);
        assert_eq!(a.dt, Duration::from_millis(1));
        assert_eq!(a.frame_index, 0);

        let b = clock.tick_at(start + Duration::from_secs(5));
        assert_eq!(b.dt, Duration::from_millis(100));
        assert_eq!(b.frame_index, 1);

        let c = clock.tick_at(start + Duration::from_secs(5) + Duration::from_millis(16));
        assert_eq!(c.dt, Duration::from_millis(16));
        assert!((c.dt_secs() - 0.016).abs() < 1e-6);
    }

    #[test]
    fn time_going_backwards_is_clamped_to_minimum() {
        let start = Instant::now();
        let mut clock = FrameClock::with_range(Duration::from_millis(2)..=Duration::from_millis(50));
        clock.previous = start + Duration::from_secs(1);

        assert_eq!(clock.tick_at(start).dt, Duration::from_millis(2));
    }
}
