// SPDX-License-Identifier: LGPL-3.0-or-later

//! Unit conversion functions.
//!
//! Conversions between linear amplitude and decibels, plus the clamping
//! and display-scale helpers that turn a meter reading into something a
//! drawing layer can use without further checks.

use crate::consts::DEFAULT_DB_RANGE;

/// Convert decibels to linear gain (amplitude ratio).
///
/// # Arguments
/// * `db` - Level in decibels
///
/// # Returns
/// Linear gain (amplitude ratio)
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    (db * (std::f32::consts::LN_10 / 20.0)).exp()
}

/// Convert linear gain (amplitude ratio) to decibels.
///
/// This is the raw conversion: a gain of `0.0` yields negative infinity.
/// Use [`gain_to_display_db`] for anything handed to a consumer.
///
/// # Arguments
/// * `gain` - Linear gain (amplitude ratio)
///
/// # Returns
/// Level in decibels
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.log10()
}

/// Turn a caller-supplied display range into a usable one.
///
/// Negative ranges are taken by magnitude; zero, NaN and infinite ranges
/// fall back to [`DEFAULT_DB_RANGE`].
#[inline]
pub fn display_range(range: f32) -> f32 {
    let range = range.abs();
    if range.is_finite() && range > 0.0 {
        range
    } else {
        DEFAULT_DB_RANGE
    }
}

/// Clamp a decibel value to the display range `[-range, 0]`.
///
/// NaN collapses to the floor so that no consumer ever observes it. The
/// range goes through [`display_range`] first, so this never panics.
#[inline]
pub fn clamp_db(db: f32, range: f32) -> f32 {
    let range = display_range(range);
    if db.is_nan() {
        return -range;
    }
    db.clamp(-range, 0.0)
}

/// Convert a linear magnitude to a clamped display level in dB.
///
/// Silence (and any non-positive or NaN magnitude) maps to `-range`.
///
/// # Examples
/// ```
/// # use vumeter_dsp::units::gain_to_display_db;
/// assert_eq!(gain_to_display_db(1.0, 96.0), 0.0);
/// assert_eq!(gain_to_display_db(0.0, 96.0), -96.0);
/// assert_eq!(gain_to_display_db(2.0, 96.0), 0.0);
/// ```
#[inline]
pub fn gain_to_display_db(gain: f32, range: f32) -> f32 {
    if gain.is_nan() || gain <= 0.0 {
        return -display_range(range);
    }
    clamp_db(gain_to_db(gain), range)
}

/// Map a level in dB to a bar deflection in `[0, 1]`.
///
/// The scale is piecewise linear and expands the upper part of the range,
/// the way analog-styled meter scales do:
///
/// | dB range      | deflection   |
/// |---------------|--------------|
/// | `-range..-60` | 0 .. 2.5 %   |
/// | `-60..-50`    | 2.5 .. 7.5 % |
/// | `-50..-40`    | 7.5 .. 15 %  |
/// | `-40..-30`    | 15 .. 30 %   |
/// | `-30..-20`    | 30 .. 50 %   |
/// | `-20..0`      | 50 .. 100 %  |
///
/// For ranges of 60 dB or less the visible part of the table is rescaled so
/// that `-range` still maps to zero.
pub fn deflection(db: f32, range: f32) -> f32 {
    let range = display_range(range);
    if db.is_nan() || db < -range {
        return 0.0;
    }

    let percent = if range > 60.0 {
        if db < -60.0 {
            (db + range) * 2.5 / (range - 60.0)
        } else {
            scale_percent(db)
        }
    } else {
        let floor = scale_percent(-range);
        (scale_percent(db) - floor) * 100.0 / (100.0 - floor)
    };

    (percent / 100.0).clamp(0.0, 1.0)
}

/// Upper part of the deflection table, for levels from -60 dB up.
fn scale_percent(db: f32) -> f32 {
    if db < -50.0 {
        (db.max(-60.0) + 60.0) * 0.5 + 2.5
    } else if db < -40.0 {
        (db + 50.0) * 0.75 + 7.5
    } else if db < -30.0 {
        (db + 40.0) * 1.5 + 15.0
    } else if db < -20.0 {
        (db + 30.0) * 2.0 + 30.0
    } else if db < 0.0 {
        (db + 20.0) * 2.5 + 50.0
    } else {
        100.0
    }
}
