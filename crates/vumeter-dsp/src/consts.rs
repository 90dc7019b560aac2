// SPDX-License-Identifier: LGPL-3.0-or-later

//! Metering and interpolation constants.
//!
//! Defaults mirror the values a media-player host ships in its preference
//! store; every one of them can be overridden through
//! [`MeterSettings`](crate::settings::MeterSettings).

// Channel layout

/// Maximum number of channels a [`VuMeter`](crate::meters::VuMeter) accepts.
pub const MAX_CHANNELS: usize = 11;

/// Default number of frames per channel in a rendering tick.
pub const DEFAULT_BLOCK_SIZE: usize = 512;

// Display range

/// Default display range in dB. Levels are clamped to `[-96, 0]`.
pub const DEFAULT_DB_RANGE: f32 = 96.0;

/// Default fall-off rate of the level bar (dB per second).
pub const DEFAULT_FALLOFF_DB_PER_SEC: f32 = 13.3;

/// Default peak hold time in seconds.
pub const DEFAULT_PEAK_HOLD_SECS: f32 = 1.6;

/// Levels above this value (dBFS) are in the clip zone.
pub const ZONE_CLIP_DB: f32 = -3.0;

/// Levels at or above this value (dBFS) are in the warning zone.
pub const ZONE_WARNING_DB: f32 = -9.0;

// Interpolation

/// Number of entries in the cosine interpolation lookup table.
pub const COSINE_LUT_SIZE: usize = 8192;

// Sample rate thresholds for the true peak oversampler

/// Below this rate (Hz) the true peak meter oversamples 4x.
pub const OVERSAMPLE_4X_BELOW_HZ: f32 = 96000.0;

/// Below this rate (Hz) the true peak meter oversamples 2x; at or above it
/// the input is already dense enough and is measured as-is.
pub const OVERSAMPLE_2X_BELOW_HZ: f32 = 192000.0;
