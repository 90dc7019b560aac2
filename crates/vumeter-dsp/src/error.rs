// SPDX-License-Identifier: LGPL-3.0-or-later

//! Errors reported by meter configuration and checked interpolation.
//!
//! Nothing on the per-sample path returns an error: out-of-range numbers
//! are clamped where they occur. Only configuration (sample rate, channel
//! count, settings) and the `checked` interpolation helpers can fail.

/// All errors which can occur while configuring a meter or interpolating.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The sample rate is zero, negative or not a finite number.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f32),

    /// The channel count is zero or exceeds the supported maximum.
    #[error("invalid channel count {channels}, expected 1..={max}")]
    InvalidChannelCount { channels: usize, max: usize },

    /// A [`MeterSettings`](crate::settings::MeterSettings) field is out of range.
    #[error("invalid meter settings: {0}")]
    InvalidSettings(String),

    /// The requested time position lacks the context samples the
    /// interpolator needs.
    #[error("time {time} needs {lookahead} sample(s) of lookahead in a buffer of {len}")]
    OutOfBounds {
        time: f64,
        len: usize,
        lookahead: usize,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Check that a sample rate is usable, returning it unchanged.
pub(crate) fn check_sample_rate(sample_rate: f32) -> Result<f32> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(sample_rate)
    } else {
        Err(Error::InvalidSampleRate(sample_rate))
    }
}
