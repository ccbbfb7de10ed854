use std::time::Instant;

/// Tracks the timestamp of the previous frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    last_frame: Instant,
}

impl FrameClock {
    pub fn new(start: Instant) -> Self {
        Self { last_frame: start }
    }

    /// Advances the clock to `now` and returns the elapsed seconds.
    /// A timestamp older than the previous one yields zero.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let delta = now.saturating_duration_since(self.last_frame).as_secs_f32();
        if now > self.last_frame {
            self.last_frame = now;
        }
        delta
    }
}

/// Angle in degrees advanced by `speed * dt` and kept inside [0, 360).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationAngle {
    degrees: f32,
    speed: f32,
}

impl RotationAngle {
    pub fn new(speed: f32) -> Self {
        Self { degrees: 0.0, speed }
    }

    pub fn advance(&mut self, delta_time: f32) -> f32 {
        let wrapped = (self.degrees + self.speed * delta_time).rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        self.degrees = if wrapped >= 360.0 { 0.0 } else { wrapped };
        self.degrees
    }

    pub fn degrees(&self) -> f32 {
        self.degrees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    #[test]
    fn test_clock_measures_delta() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);

        let dt = clock.tick(start + Duration::from_millis(16));
        assert_relative_eq!(dt, 0.016, epsilon = 1e-6);

        let dt = clock.tick(start + Duration::from_millis(50));
        assert_relative_eq!(dt, 0.034, epsilon = 1e-6);
    }

    #[test]
    fn test_clock_never_goes_negative() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut clock = FrameClock::new(start);
        assert_eq!(clock.tick(start - Duration::from_millis(500)), 0.0);
        assert_eq!(clock.tick(start), 0.0);
    }

    #[test]
    fn test_rotation_advances_with_time() {
        let mut angle = RotationAngle::new(32.0);
        assert_relative_eq!(angle.advance(0.5), 16.0, epsilon = 1e-4);
        assert_relative_eq!(angle.advance(1.0), 48.0, epsilon = 1e-4);
    }

    #[test]
    fn test_rotation_zero_delta_is_unchanged() {
        let mut angle = RotationAngle::new(32.0);
        angle.advance(2.0);
        let before = angle.degrees();
        assert_eq!(angle.advance(0.0), before);
    }

    #[test]
    fn test_rotation_wraps_into_one_turn() {
        let mut angle = RotationAngle::new(32.0);
        let steps = [0.016, 11.25, 3.3, 1000.0, 0.0, 7.77, 1.0e6, 12.0];
        for dt in steps.iter().cycle().take(500) {
            let degrees = angle.advance(*dt);
            assert!((0.0..360.0).contains(&degrees), "angle {} escaped [0, 360)", degrees);
        }
    }

    #[test]
    fn test_rotation_exact_turn_wraps_to_zero() {
        let mut angle = RotationAngle::new(36.0);
        assert_eq!(angle.advance(10.0), 0.0);
    }
}
