//! Volume policy shared by every session

use crate::{Result, SeanceError};

/// Target volumes for each stage of a session
///
/// Background music is the only channel with more than one target: full
/// `rest` while idle, `ducked` under narration, silent otherwise. The
/// ducked level doubles as the audible floor: a channel at or below it
/// counts as silent.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumePolicy {
    /// Background music at rest
    pub rest: f32,
    /// Background music under narration
    pub ducked: f32,
    /// Chaos stinger while the archive is consulted
    pub chaos: f32,
    /// Laugh clip during the sting
    pub laugh: f32,
}

impl Default for VolumePolicy {
    fn default() -> Self {
        Self {
            rest: 0.3,
            ducked: 0.1,
            chaos: 0.7,
            laugh: 1.0,
        }
    }
}

impl VolumePolicy {
    /// Highest volume that still counts as inaudible
    pub fn audible_floor(&self) -> f32 {
        self.ducked
    }

    /// Whether `volume` is above the audible floor
    pub fn is_audible(&self, volume: f32) -> bool {
        volume > self.audible_floor()
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("rest", self.rest),
            ("ducked", self.ducked),
            ("chaos", self.chaos),
            ("laugh", self.laugh),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SeanceError::ConfigError(format!(
                    "{} volume must be within 0..=1, got {}",
                    name, value
                )));
            }
        }

        if self.ducked >= self.rest {
            return Err(SeanceError::ConfigError(format!(
                "ducked volume ({}) must be below rest volume ({})",
                self.ducked, self.rest
            )));
        }

        if self.chaos <= self.ducked {
            return Err(SeanceError::ConfigError(
                "chaos volume must be audible above the ducked floor".into(),
            ));
        }

        Ok(())
    }
}
