// SPDX-License-Identifier: LGPL-3.0-or-later

//! Host-supplied meter configuration.
//!
//! The host keeps these values in its own settings store; this crate only
//! validates them. With the `serde` feature enabled the types can be
//! (de)serialized directly.

use std::time::Duration;

use crate::consts::{
    DEFAULT_BLOCK_SIZE, DEFAULT_DB_RANGE, DEFAULT_FALLOFF_DB_PER_SEC, DEFAULT_PEAK_HOLD_SECS,
};
use crate::error::{Error, Result};

/// Which true peak meter output drives the level bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MeterSource {
    /// Maximum inter-sample peak of each block.
    #[default]
    TruePeak,
    /// Smoothed peak envelope of the oversampled signal.
    Level,
}

/// Configuration of a [`VuMeter`](crate::meters::VuMeter).
///
/// # Example
/// ```
/// use vumeter_dsp::settings::MeterSettings;
/// use std::time::Duration;
///
/// let settings = MeterSettings {
///     peak_hold: Duration::from_millis(800),
///     ..Default::default()
/// };
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeterSettings {
    /// How fast the level bar falls, in dB per second.
    pub falloff_db_per_sec: f32,

    /// How long a peak marker sticks before it may drop.
    pub peak_hold: Duration,

    /// Display range in dB. Levels are clamped to `[-db_range, 0]`.
    pub db_range: f32,

    /// Expected frames per channel per tick. Per-channel buffers are
    /// allocated for this many frames up front.
    pub block_size: usize,

    /// Which meter output drives the level bar.
    pub source: MeterSource,
}

impl MeterSettings {
    /// Checks if the settings are usable.
    ///
    /// See [`Error::InvalidSettings`] for the reported problems.
    pub fn validate(&self) -> Result<()> {
        if !self.falloff_db_per_sec.is_finite() || self.falloff_db_per_sec < 0.0 {
            return Err(Error::InvalidSettings(format!(
                "fall-off must be a non-negative number of dB/s, got {}",
                self.falloff_db_per_sec
            )));
        }

        if !self.db_range.is_finite() || self.db_range <= 0.0 {
            return Err(Error::InvalidSettings(format!(
                "dB range must be positive, got {}",
                self.db_range
            )));
        }

        if self.block_size == 0 {
            return Err(Error::InvalidSettings(
                "block size can't be zero".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for MeterSettings {
    fn default() -> Self {
        Self {
            falloff_db_per_sec: DEFAULT_FALLOFF_DB_PER_SEC,
            peak_hold: Duration::from_secs_f32(DEFAULT_PEAK_HOLD_SECS),
            db_range: DEFAULT_DB_RANGE,
            block_size: DEFAULT_BLOCK_SIZE,
            source: MeterSource::default(),
        }
    }
}
