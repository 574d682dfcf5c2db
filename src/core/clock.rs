//! Wall-clock sampling and hand angle mapping.

use std::f32::consts::PI;

use chrono::Timelike;

/// A sampled time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl ClockTime {
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    /// Sample the local wall clock.
    pub fn now() -> Self {
        let now = chrono::Local::now();
        Self::new(now.hour(), now.minute(), now.second())
    }

    /// `HH:MM:SS` on a twelve hour dial.
    pub fn display(&self) -> String {
        format!(
            "{:02}:{:02}:{:02}",
            self.hours % 12,
            self.minutes,
            self.seconds
        )
    }
}

/// Rotation of each hand in radians, measured clockwise from twelve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandAngles {
    pub hour: f32,
    pub minute: f32,
    pub second: f32,
}

impl HandAngles {
    /// Twelve hours per turn.
    const HOUR_STEP: f32 = PI / 6.0;
    /// Sixty minutes (or seconds) per turn.
    const MINUTE_STEP: f32 = PI / 30.0;

    pub fn from_time(time: ClockTime) -> Self {
        let hours = (time.hours % 12) as f32;
        let minutes = time.minutes as f32;
        let seconds = time.seconds as f32;

        Self {
            // The hour hand creeps forward as the minutes pass.
            hour: hours * Self::HOUR_STEP + (minutes / 60.0) * Self::HOUR_STEP,
            minute: minutes * Self::MINUTE_STEP,
            second: seconds * Self::MINUTE_STEP,
        }
    }
}

/// Which hand a scene node drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Hour,
    Minute,
    Second,
}

impl HandAngles {
    pub fn get(&self, hand: Hand) -> f32 {
        match hand {
            Hand::Hour => self.hour,
            Hand::Minute => self.minute,
            Hand::Second => self.second,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn test_three_oclock() {
        let angles = HandAngles::from_time(ClockTime::new(3, 0, 0));
        assert!((angles.hour - PI / 2.0).abs() < EPS);
        assert!(angles.minute.abs() < EPS);
        assert!(angles.second.abs() < EPS);
    }

    #[test]
    fn test_half_hour_advances_hour_hand() {
        let whole = HandAngles::from_time(ClockTime::new(7, 0, 0));
        let half = HandAngles::from_time(ClockTime::new(7, 30, 0));
        assert!((half.hour - whole.hour - PI / 12.0).abs() < EPS);
        assert!((half.minute - PI).abs() < EPS);
    }

    #[test]
    fn test_afternoon_wraps_to_dial() {
        let morning = HandAngles::from_time(ClockTime::new(3, 15, 40));
        let afternoon = HandAngles::from_time(ClockTime::new(15, 15, 40));
        assert_eq!(morning, afternoon);
        assert!((afternoon.second - 40.0 * PI / 30.0).abs() < EPS);
    }

    #[test]
    fn test_display_is_padded_twelve_hour() {
        assert_eq!(ClockTime::new(14, 5, 9).display(), "02:05:09");
        assert_eq!(ClockTime::new(12, 0, 0).display(), "00:00:00");
        assert_eq!(ClockTime::new(11, 59, 59).display(), "11:59:59");
    }
}
