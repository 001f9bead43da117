//! Playback volume as chosen by users.

use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

use crate::error::UserError;

/// A volume percentage, always within [Volume::MIN]..=[Volume::MAX].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Volume(u8);

impl Volume {
    /// Quietest selectable volume.
    pub const MIN: u8 = 1;
    /// Loudest selectable volume, plays tracks at their original level.
    pub const MAX: u8 = 100;

    /// Validates a user supplied level.
    pub fn new(level: i64) -> Result<Self, UserError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&level) {
            // In range, so the cast is lossless.
            Ok(Self(level as u8))
        } else {
            Err(UserError::VolumeOutOfRange { level })
        }
    }

    /// The percentage.
    pub fn percent(self) -> u8 {
        self.0
    }

    /// The gain handed to the audio driver, `1.0` being the original level.
    pub fn gain(self) -> f32 {
        f32::from(self.percent()) / 100.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl TryFrom<i64> for Volume {
    type Error = UserError;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<Volume> for u8 {
    fn from(volume: Volume) -> Self {
        volume.percent()
    }
}

impl Display for Volume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_levels_outside_range() {
        for level in [i64::MIN, -5, 0, 101, 255, 256, i64::MAX] {
            assert!(
                matches!(Volume::new(level), Err(UserError::VolumeOutOfRange { level: l }) if l == level),
                "{level} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_bounds() {
        assert_eq!(Volume::new(1).map(Volume::percent).ok(), Some(1));
        assert_eq!(Volume::new(100).map(Volume::percent).ok(), Some(100));
    }

    #[test]
    fn gain_is_a_fraction_of_full_volume() {
        let half = Volume::new(50).expect("in range");
        assert!((half.gain() - 0.5).abs() < f32::EPSILON);
        assert!((Volume::default().gain() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn displays_as_percentage() {
        let volume = Volume::new(42).expect("in range");
        assert_eq!(volume.to_string(), "42%");
    }
}
