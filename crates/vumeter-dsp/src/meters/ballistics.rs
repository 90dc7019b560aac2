// SPDX-License-Identifier: LGPL-3.0-or-later

//! Display ballistics: level bar fall-off and peak hold.
//!
//! Turns a stream of instantaneous dB readings, one per rendering tick,
//! into the two values a level meter draws:
//!
//! - a **bar** that jumps up to any higher reading and otherwise falls
//!   toward the floor at a fixed rate in dB per second;
//! - a **peak marker** that rises immediately and stays put until the hold
//!   time has passed since it was last raised, after which the next reading
//!   replaces it whatever its value.
//!
//! Ticks are timestamped with [`Instant`], so irregular tick intervals are
//! handled by scaling the fall-off with the real elapsed time.
//!
//! # Examples
//!
//! ```
//! use std::time::{Duration, Instant};
//! use vumeter_dsp::meters::Ballistics;
//!
//! let mut b = Ballistics::new(96.0);
//! b.set_falloff(10.0).set_peak_hold(Duration::from_secs(1));
//!
//! let t0 = Instant::now();
//! b.update(-6.0, t0);
//! b.update(-40.0, t0 + Duration::from_millis(500));
//!
//! assert!((b.level() - -11.0).abs() < 1e-4);
//! assert_eq!(b.peak(), -6.0);
//! ```

use std::time::{Duration, Instant};

use crate::consts::{
    DEFAULT_DB_RANGE, DEFAULT_FALLOFF_DB_PER_SEC, DEFAULT_PEAK_HOLD_SECS, ZONE_CLIP_DB,
    ZONE_WARNING_DB,
};
use crate::units::{clamp_db, display_range};

/// Colour zone of a level, as drawn by a typical meter skin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Below the warning threshold.
    Normal,
    /// Within a few dB of full scale.
    Warning,
    /// At or near clipping.
    Clip,
}

impl Zone {
    /// Classify a dB level.
    pub fn of(db: f32) -> Self {
        if db > ZONE_CLIP_DB {
            Zone::Clip
        } else if db >= ZONE_WARNING_DB {
            Zone::Warning
        } else {
            Zone::Normal
        }
    }
}

/// Bar fall-off and peak hold state for one channel.
#[derive(Debug, Clone)]
pub struct Ballistics {
    /// Fall-off rate in dB per second.
    falloff: f32,
    /// How long a raised peak is held.
    hold: Duration,
    /// Display range in dB.
    range: f32,
    /// Current bar level (dB, clamped).
    level: f32,
    /// Current held peak (dB, clamped).
    peak: f32,
    /// When the peak was last latched; `None` after a reset.
    peak_time: Option<Instant>,
    /// Timestamp of the previous update.
    last_tick: Option<Instant>,
}

impl Default for Ballistics {
    fn default() -> Self {
        Self::new(DEFAULT_DB_RANGE)
    }
}

impl Ballistics {
    /// Create ballistics for a display range of `range` dB, with the
    /// default fall-off and hold time. Bar and peak start at the floor.
    ///
    /// The range is normalized with [`display_range`].
    pub fn new(range: f32) -> Self {
        let range = display_range(range);
        Self {
            falloff: DEFAULT_FALLOFF_DB_PER_SEC,
            hold: Duration::from_secs_f32(DEFAULT_PEAK_HOLD_SECS),
            range,
            level: -range,
            peak: -range,
            peak_time: None,
            last_tick: None,
        }
    }

    /// Set the fall-off rate in dB per second.
    pub fn set_falloff(&mut self, db_per_sec: f32) -> &mut Self {
        self.falloff = db_per_sec.max(0.0);
        self
    }

    /// Set the peak hold time.
    pub fn set_peak_hold(&mut self, hold: Duration) -> &mut Self {
        self.hold = hold;
        self
    }

    /// Set the display range in dB. Current values are re-clamped.
    ///
    /// The range is normalized with [`display_range`].
    pub fn set_db_range(&mut self, range: f32) -> &mut Self {
        let range = display_range(range);
        self.range = range;
        self.level = clamp_db(self.level, range);
        self.peak = clamp_db(self.peak, range);
        self
    }

    /// Feed the reading of one tick taken at `now`.
    ///
    /// The reading is clamped to the display range first, so NaN and
    /// negative infinity land on the floor.
    pub fn update(&mut self, reading_db: f32, now: Instant) {
        let reading = clamp_db(reading_db, self.range);

        let elapsed = self
            .last_tick
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_tick = Some(now);

        let fallen = self.level - self.falloff * elapsed.as_secs_f32();
        self.level = clamp_db(fallen, self.range).max(reading);

        let expired = match self.peak_time {
            Some(t) => now.saturating_duration_since(t) >= self.hold,
            None => true,
        };
        if reading > self.peak || expired {
            self.peak = reading;
            self.peak_time = Some(now);
        }
    }

    /// Drop bar and peak to the floor and forget all timestamps.
    pub fn reset(&mut self) {
        self.level = -self.range;
        self.peak = -self.range;
        self.peak_time = None;
        self.last_tick = None;
    }

    /// Current bar level in dB.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Current held peak in dB.
    pub fn peak(&self) -> f32 {
        self.peak
    }

    /// Display range in dB.
    pub fn db_range(&self) -> f32 {
        self.range
    }
}
