// SPDX-License-Identifier: LGPL-3.0-or-later

//! Fractional-position sample interpolation.
//!
//! Each kernel maps a real-valued time position into a discrete sample
//! buffer to an amplitude. Three kernels are provided:
//!
//! - **Linear**: weighted average of the two bracketing samples.
//! - **Cosine**: raised-cosine crossfade between the bracketing samples,
//!   read from a shared [`COSINE_LUT_SIZE`]-entry table.
//! - **Sharp**: a monotonicity-preserving kernel that keeps local extrema
//!   intact and never overshoots the two central samples.
//!
//! All kernels return `0.0` for negative time. The caller provides the
//! lookahead (and, for [`sharp`], two samples of context either side);
//! the plain functions panic on a buffer that is too short, the
//! [`InterpolationMode::checked_interpolate`] path reports
//! [`Error::OutOfBounds`] instead.
//!
//! # Examples
//!
//! ```
//! use vumeter_dsp::interpolation::InterpolationMode;
//!
//! let data = [0.0f32, 1.0, 0.0, -1.0, 0.0];
//! let mid = InterpolationMode::Linear.interpolate(&data, 0.5);
//! assert_eq!(mid, 0.5);
//!
//! // Sharp keeps the extremum at index 1 instead of smoothing it away.
//! assert_eq!(InterpolationMode::Sharp.interpolate(&data, 1.5), 1.0);
//! ```

use once_cell::sync::Lazy;

use crate::consts::COSINE_LUT_SIZE;
use crate::error::{Error, Result};

/// Raised-cosine weights, `(1 - cos(pi * i / N)) / 2` for `i` in `0..N`.
static COSINE_LUT: Lazy<Box<[f32]>> = Lazy::new(|| {
    (0..COSINE_LUT_SIZE)
        .map(|i| {
            let x = std::f64::consts::PI * i as f64 / COSINE_LUT_SIZE as f64;
            ((1.0 - x.cos()) * 0.5) as f32
        })
        .collect()
});

/// Interpolation kernel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterpolationMode {
    /// Straight line between the bracketing samples.
    #[default]
    Linear,
    /// Raised-cosine crossfade between the bracketing samples.
    Cosine,
    /// Monotonicity-preserving kernel with a five-sample window.
    Sharp,
}

impl InterpolationMode {
    /// All modes, in selector order.
    pub const ALL: [InterpolationMode; 3] = [Self::Linear, Self::Cosine, Self::Sharp];

    /// Interpolate `data` at `time`.
    ///
    /// # Panics
    ///
    /// Panics if the buffer does not hold the samples the kernel reads,
    /// see [`lookahead`](Self::lookahead).
    #[inline]
    pub fn interpolate(self, data: &[f32], time: f64) -> f32 {
        match self {
            Self::Linear => linear(data, time),
            Self::Cosine => cosine(data, time),
            Self::Sharp => sharp(data, time),
        }
    }

    /// Interpolate `data` at `time`, reporting a short buffer as an error
    /// instead of panicking.
    pub fn checked_interpolate(self, data: &[f32], time: f64) -> Result<f32> {
        if time < 0.0 {
            return Ok(0.0);
        }
        let index = time as usize;
        let lookahead = self.lookahead(index);
        if index.saturating_add(lookahead) >= data.len() {
            return Err(Error::OutOfBounds {
                time,
                len: data.len(),
                lookahead,
            });
        }
        Ok(self.interpolate(data, time))
    }

    /// Number of samples past `index` the kernel reads.
    ///
    /// The sharp kernel also reads two samples before `index` once
    /// `index >= 2`; below that it only looks one sample ahead.
    pub fn lookahead(self, index: usize) -> usize {
        match self {
            Self::Linear | Self::Cosine => 1,
            Self::Sharp if index >= 2 => 2,
            Self::Sharp => 1,
        }
    }
}

/// Split a non-negative time into integer index and fractional weight.
#[inline]
fn split(time: f64) -> (usize, f32) {
    let floor = time.floor();
    (floor as usize, (time - floor) as f32)
}

#[inline]
fn lerp(left: f32, right: f32, weight: f32) -> f32 {
    left * (1.0 - weight) + right * weight
}

/// Linear interpolation between `data[t]` and `data[t + 1]`.
///
/// At integer `time` the result is exactly `data[time]`.
///
/// # Panics
///
/// Panics if `floor(time) + 1` is out of bounds.
#[inline]
pub fn linear(data: &[f32], time: f64) -> f32 {
    if time < 0.0 {
        return 0.0;
    }
    let (index, weight) = split(time);
    lerp(data[index], data[index + 1], weight)
}

/// Raised-cosine interpolation between `data[t]` and `data[t + 1]`.
///
/// The crossfade weight comes from a lookup table built once on first use,
/// so no trigonometry runs per sample.
///
/// # Panics
///
/// Panics if `floor(time) + 1` is out of bounds.
#[inline]
pub fn cosine(data: &[f32], time: f64) -> f32 {
    if time < 0.0 {
        return 0.0;
    }
    let (index, weight) = split(time);
    let left = data[index];
    let right = data[index + 1];
    let slot = ((weight * COSINE_LUT_SIZE as f32) as usize).min(COSINE_LUT_SIZE - 1);
    left + COSINE_LUT[slot] * (right - left)
}

/// Monotonicity-preserving interpolation.
///
/// Rules, in order:
///
/// 1. Negative time yields `0.0`; an exact index yields the sample itself.
/// 2. At index 0 there is no left context: plain linear.
/// 3. A strict local extremum (relative to its immediate neighbours) is
///    returned unchanged for the whole interval.
/// 4. At index 1 the wide window is incomplete: linear.
/// 5. If the five-sample window `[t-2, t+2]` changes direction on either
///    side, the wide context disagrees with the narrow one: linear.
/// 6. Otherwise average three estimates: the left segment extended
///    forward, the right segment extended backward, and the straight line
///    from `t-1` to `t+1`. If that average falls outside the two central
///    samples, fall back to linear.
///
/// # Panics
///
/// Panics if `floor(time) + 1` is out of bounds, or `floor(time) + 2` once
/// `time >= 2`.
pub fn sharp(data: &[f32], time: f64) -> f32 {
    if time < 0.0 {
        return 0.0;
    }
    let (index, sub) = split(time);
    let sample = data[index];
    if sub == 0.0 {
        return sample;
    }
    let right = data[index + 1];
    if index == 0 {
        return lerp(sample, right, sub);
    }

    let left = data[index - 1];
    if (sample > left && sample > right) || (sample < left && sample < right) {
        return sample;
    }
    if index < 2 {
        return lerp(sample, right, sub);
    }

    let left2 = data[index - 2];
    let right2 = data[index + 2];
    if !is_monotonic(left2, left, sample) || !is_monotonic(sample, right, right2) {
        return lerp(sample, right, sub);
    }

    let from_left = sample + (sample - left) * sub;
    let from_right = right - (right2 - right) * (1.0 - sub);
    let wide = lerp(left, right, (1.0 + sub) * 0.5);
    let result = (from_left + from_right + wide) / 3.0;

    if result < sample.min(right) || result > sample.max(right) {
        return lerp(sample, right, sub);
    }
    result
}

#[inline]
fn is_monotonic(a: f32, b: f32, c: f32) -> bool {
    (a <= b && b <= c) || (a >= b && b >= c)
}
