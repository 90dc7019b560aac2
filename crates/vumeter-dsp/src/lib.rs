// SPDX-License-Identifier: LGPL-3.0-or-later

//! # vumeter-dsp
//!
//! The signal-processing core of a level meter: true peak measurement,
//! display ballistics and fractional-position sample interpolation.
//!
//! - **Meters**: oversampled true peak meter, bar fall-off and peak hold,
//!   a multi-channel pipeline from interleaved PCM to dB readings
//! - **Interpolation**: linear, cosine and monotonicity-preserving kernels
//! - **Units**: dB conversion, display clamping and deflection scale
//!
//! Everything runs synchronously on the caller's thread. Per-channel state
//! is owned by its meter; the only shared data is the read-only cosine
//! lookup table.

pub mod consts;
pub mod error;
pub mod interpolation;
pub mod meters;
pub mod settings;
pub mod units;

pub use error::{Error, Result};
