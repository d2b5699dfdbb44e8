use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds. Never negative.
    pub dt: f32,

    /// Time elapsed since the clock was created (or last reset), in seconds.
    pub elapsed: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// One clock per render loop. By default delta time is passed through unclamped so
/// animation follows wall time; [`FrameClock::with_clamps`] bounds it for loops that
/// must survive debugger pauses or long stalls.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    clamps: Option<(Duration, Duration)>,
}

impl FrameClock {
    /// Creates an unclamped clock whose baseline is the current instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Creates an unclamped clock with an explicit baseline.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            last: start,
            frame_index: 0,
            clamps: None,
        }
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            clamps: Some((dt_min, dt_max)),
            ..Self::new()
        }
    }

    /// Resets the clock baseline.
    ///
    /// Useful after surface reconfigure events or when resuming from suspension.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last = now;
    }

    /// Advances the clock to `Instant::now()`.
    pub fn tick(&mut self) -> FrameTime {
        self.advance(Instant::now())
    }

    /// Advances the clock to `now` and returns a new `FrameTime`.
    ///
    /// A `now` earlier than the previous tick yields a zero delta.
    pub fn advance(&mut self, now: Instant) -> FrameTime {
        let mut dt = now.saturating_duration_since(self.last);

        if let Some((dt_min, dt_max)) = self.clamps {
            dt = dt.clamp(dt_min, dt_max);
        }

        self.last = self.last.max(now);

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: self.last.saturating_duration_since(self.start).as_secs_f32(),
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
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

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn first_tick_measures_from_baseline() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let ft = clock.advance(t0 + ms(16));
        assert!((ft.dt - 0.016).abs() < 1e-6);
        assert!((ft.elapsed - 0.016).abs() < 1e-6);
        assert_eq!(ft.frame_index, 0);
    }

    #[test]
    fn consecutive_ticks_are_non_negative() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let mut now = t0;
        for step in [0, 1, 7, 0, 33, 250, 0] {
            now += ms(step);
            let ft = clock.advance(now);
            assert!(ft.dt >= 0.0);
            assert!((ft.dt - step as f32 / 1000.0).abs() < 1e-6);
        }
    }

    #[test]
    fn backwards_timestamp_yields_zero_delta() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        clock.advance(t0 + ms(100));
        let ft = clock.advance(t0 + ms(50));
        assert_eq!(ft.dt, 0.0);

        // The baseline stays at the latest timestamp seen.
        let ft = clock.advance(t0 + ms(110));
        assert!((ft.dt - 0.010).abs() < 1e-6);
    }

    #[test]
    fn frame_index_increments() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let indices: Vec<u64> = (1..=4).map(|i| clock.advance(t0 + ms(i)).frame_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn clamps_bound_delta() {
        let mut clock = FrameClock::with_clamps(ms(1), ms(250));
        let base = clock.last;

        let ft = clock.advance(base);
        assert!((ft.dt - 0.001).abs() < 1e-6);

        let ft = clock.advance(base + ms(5_000));
        assert!((ft.dt - 0.250).abs() < 1e-6);
    }
}
