// SPDX-License-Identifier: LGPL-3.0-or-later

//! Multi-channel VU meter pipeline.
//!
//! Ties the pieces together for one stream: interleaved PCM in, one
//! [`ChannelReading`] per channel out.
//!
//! # Algorithm
//!
//! Per rendering tick:
//!
//! 1. De-interleave the block into per-channel buffers.
//! 2. Run each channel's [`TruePeakMeter`] over its buffer.
//! 3. Convert the selected meter output to dB, clamped to the display range.
//! 4. Advance the channel's [`Ballistics`] with the tick timestamp.
//!
//! A change of channel count rebuilds all channel state; a change of
//! sample rate retunes the meters in place.
//!
//! # Examples
//!
//! ```
//! use std::time::Instant;
//! use vumeter_dsp::meters::VuMeter;
//! use vumeter_dsp::settings::MeterSettings;
//!
//! let mut vu = VuMeter::new(MeterSettings::default(), 44100.0, 2)?;
//!
//! // Full-scale left, silent right.
//! let block: Vec<f32> = (0..512)
//!     .flat_map(|i| [(i as f32 * 0.05).sin(), 0.0])
//!     .collect();
//! vu.render(&block, 2, 44100.0, Instant::now())?;
//!
//! assert!(vu.channel(0).unwrap().level_db > -1.0);
//! assert_eq!(vu.channel(1).unwrap().level_db, -96.0);
//! # Ok::<(), vumeter_dsp::Error>(())
//! ```

use std::time::Instant;

use tracing::{debug, warn};

use crate::consts::MAX_CHANNELS;
use crate::error::{Error, Result, check_sample_rate};
use crate::meters::ballistics::{Ballistics, Zone};
use crate::meters::true_peak::TruePeakMeter;
use crate::settings::{MeterSettings, MeterSource};
use crate::units::{clamp_db, gain_to_display_db};

/// Display-ready values for one channel after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelReading {
    /// Bar level in dB, after fall-off, within `[-range, 0]`.
    pub level_db: f32,
    /// Held peak marker in dB, within `[-range, 0]`.
    pub peak_db: f32,
    /// Instantaneous reading of this tick in dB, within `[-range, 0]`.
    pub instant_db: f32,
    /// True peak of the last block (linear).
    pub true_peak: f32,
    /// Smoothed level of the last block (linear).
    pub level: f32,
    /// Largest discrete sample of the last block (linear).
    pub sample_peak: f32,
    /// Colour zone of the held peak.
    pub zone: Zone,
}

impl ChannelReading {
    fn silent(range: f32) -> Self {
        Self {
            level_db: -range,
            peak_db: -range,
            instant_db: -range,
            true_peak: 0.0,
            level: 0.0,
            sample_peak: 0.0,
            zone: Zone::Normal,
        }
    }
}

#[derive(Debug, Clone)]
struct Channel {
    meter: TruePeakMeter,
    ballistics: Ballistics,
    buffer: Vec<f32>,
    reading: ChannelReading,
}

/// Per-stream meter state for up to [`MAX_CHANNELS`] channels.
#[derive(Debug, Clone)]
pub struct VuMeter {
    settings: MeterSettings,
    sample_rate: f32,
    channels: Vec<Channel>,
}

fn check_channels(channels: usize) -> Result<usize> {
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(Error::InvalidChannelCount {
            channels,
            max: MAX_CHANNELS,
        });
    }
    Ok(channels)
}

impl VuMeter {
    /// Create the meter state for a stream.
    ///
    /// # Errors
    ///
    /// Fails on invalid settings, an invalid sample rate, or a channel count
    /// outside `1..=MAX_CHANNELS`.
    pub fn new(settings: MeterSettings, sample_rate: f32, channels: usize) -> Result<Self> {
        settings.validate()?;
        let sample_rate = check_sample_rate(sample_rate)?;
        let channels = check_channels(channels)?;

        let mut vu = Self {
            settings,
            sample_rate,
            channels: Vec::with_capacity(MAX_CHANNELS),
        };
        vu.build_channels(channels)?;
        Ok(vu)
    }

    fn build_channels(&mut self, count: usize) -> Result<()> {
        self.channels.clear();
        for _ in 0..count {
            let mut ballistics = Ballistics::new(self.settings.db_range);
            ballistics
                .set_falloff(self.settings.falloff_db_per_sec)
                .set_peak_hold(self.settings.peak_hold);

            self.channels.push(Channel {
                meter: TruePeakMeter::new(self.sample_rate)?,
                ballistics,
                buffer: Vec::with_capacity(self.settings.block_size),
                reading: ChannelReading::silent(self.settings.db_range),
            });
        }
        debug!(
            channels = count,
            sample_rate = self.sample_rate,
            "vu meter channels configured"
        );
        Ok(())
    }

    /// Replace the settings. Meter history is kept; ballistics pick up the
    /// new fall-off and hold time on the next tick. A new range applies at
    /// once, to the ballistics and to the readings already published.
    pub fn set_settings(&mut self, settings: MeterSettings) -> Result<&mut Self> {
        settings.validate()?;
        for ch in &mut self.channels {
            ch.ballistics
                .set_falloff(settings.falloff_db_per_sec)
                .set_peak_hold(settings.peak_hold)
                .set_db_range(settings.db_range);
            ch.buffer
                .reserve(settings.block_size.saturating_sub(ch.buffer.len()));

            let reading = &mut ch.reading;
            reading.level_db = ch.ballistics.level();
            reading.peak_db = ch.ballistics.peak();
            reading.instant_db = clamp_db(reading.instant_db, settings.db_range);
            reading.zone = Zone::of(reading.peak_db);
        }
        self.settings = settings;
        Ok(self)
    }

    /// Process one tick of interleaved PCM.
    ///
    /// `pcm` holds `frames * channels` samples; a trailing partial frame is
    /// ignored. A new channel count rebuilds all channel state, a new
    /// sample rate retunes the meters in place.
    ///
    /// # Errors
    ///
    /// Fails on an invalid channel count or sample rate; state is left as
    /// it was.
    pub fn render(
        &mut self,
        pcm: &[f32],
        channels: usize,
        sample_rate: f32,
        now: Instant,
    ) -> Result<()> {
        let channels = check_channels(channels)?;
        let sample_rate = check_sample_rate(sample_rate)?;

        if channels != self.channels.len() {
            debug!(from = self.channels.len(), to = channels, "channel count changed");
            self.build_channels(channels)?;
        }
        if sample_rate != self.sample_rate {
            debug!(from = self.sample_rate, to = sample_rate, "sample rate changed");
            for ch in &mut self.channels {
                ch.meter.set_sample_rate(sample_rate)?;
            }
            self.sample_rate = sample_rate;
        }

        let frames = pcm.len() / channels;
        for (c, ch) in self.channels.iter_mut().enumerate() {
            if frames > ch.buffer.capacity() {
                warn!(
                    frames,
                    capacity = ch.buffer.capacity(),
                    "block larger than configured, growing channel buffer"
                );
            }
            ch.buffer.clear();
            ch.buffer
                .extend(pcm.chunks_exact(channels).map(|frame| frame[c]));
        }

        let range = self.settings.db_range;
        let source = self.settings.source;
        for ch in &mut self.channels {
            ch.meter.process(&ch.buffer);
            let (level, true_peak) = ch.meter.read();

            let magnitude = match source {
                MeterSource::TruePeak => true_peak,
                MeterSource::Level => level,
            };
            // A tick without frames carries no signal: the bar falls and the
            // hold runs out instead of re-latching the last block.
            let instant_db = if frames == 0 {
                -range
            } else {
                gain_to_display_db(magnitude, range)
            };
            ch.ballistics.update(instant_db, now);

            ch.reading = ChannelReading {
                level_db: ch.ballistics.level(),
                peak_db: ch.ballistics.peak(),
                instant_db,
                true_peak,
                level,
                sample_peak: ch.meter.sample_peak(),
                zone: Zone::of(ch.ballistics.peak()),
            };
        }

        Ok(())
    }

    /// Drop every bar and peak marker to the floor and discard meter history.
    pub fn clear(&mut self) {
        let range = self.settings.db_range;
        for ch in &mut self.channels {
            ch.meter.clear();
            ch.ballistics.reset();
            ch.reading = ChannelReading::silent(range);
        }
    }

    /// Reading of channel `index` after the last tick.
    pub fn channel(&self, index: usize) -> Option<&ChannelReading> {
        self.channels.get(index).map(|ch| &ch.reading)
    }

    /// Readings of all channels, in channel order.
    pub fn readings(&self) -> impl Iterator<Item = &ChannelReading> {
        self.channels.iter().map(|ch| &ch.reading)
    }

    /// Number of active channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Current sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Current settings.
    pub fn settings(&self) -> &MeterSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;
    use std::time::Duration;

    const SR: f32 = 48000.0;

    fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
        let frames = channels[0].len();
        (0..frames)
            .flat_map(|i| channels.iter().map(move |ch| ch[i]))
            .collect()
    }

    fn sine(amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * 1000.0 * i as f32 / SR).sin())
            .collect()
    }

    #[test]
    fn test_construction() {
        let vu = VuMeter::new(MeterSettings::default(), SR, 2).unwrap();
        assert_eq!(vu.channel_count(), 2);
        assert_eq!(vu.sample_rate(), SR);
        let r = vu.channel(0).unwrap();
        assert_eq!(r.level_db, -96.0);
        assert_eq!(r.peak_db, -96.0);
        assert!(vu.channel(2).is_none());
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(matches!(
            VuMeter::new(MeterSettings::default(), 0.0, 2),
            Err(Error::InvalidSampleRate(_))
        ));
        assert_eq!(
            VuMeter::new(MeterSettings::default(), SR, 0).unwrap_err(),
            Error::InvalidChannelCount {
                channels: 0,
                max: MAX_CHANNELS
            }
        );
        assert!(VuMeter::new(MeterSettings::default(), SR, MAX_CHANNELS + 1).is_err());
        assert!(VuMeter::new(MeterSettings::default(), SR, MAX_CHANNELS).is_ok());

        let bad = MeterSettings {
            db_range: -1.0,
            ..Default::default()
        };
        assert!(VuMeter::new(bad, SR, 2).is_err());
    }

    #[test]
    fn test_channels_are_independent() {
        let mut vu = VuMeter::new(MeterSettings::default(), SR, 3).unwrap();
        let pcm = interleave(&[sine(1.0, 512), vec![0.0; 512], sine(0.1, 512)]);
        vu.render(&pcm, 3, SR, Instant::now()).unwrap();

        let loud = vu.channel(0).unwrap();
        let silent = vu.channel(1).unwrap();
        let quiet = vu.channel(2).unwrap();

        assert!(loud.level_db > -1.0, "got {}", loud.level_db);
        assert_eq!(silent.level_db, -96.0);
        assert_eq!(silent.true_peak, 0.0);
        assert!(
            (quiet.level_db - -20.0).abs() < 1.0,
            "0.1 amplitude should read ~-20 dB, got {}",
            quiet.level_db
        );
        assert_eq!(loud.zone, Zone::Clip);
        assert_eq!(quiet.zone, Zone::Normal);
    }

    #[test]
    fn test_readings_always_clamped() {
        let mut vu = VuMeter::new(MeterSettings::default(), SR, 1).unwrap();
        let hot = vec![4.0f32; 512];
        vu.render(&hot, 1, SR, Instant::now()).unwrap();

        let r = vu.channel(0).unwrap();
        assert!(r.true_peak > 1.0);
        assert_eq!(r.level_db, 0.0);
        assert_eq!(r.peak_db, 0.0);
        assert_eq!(r.instant_db, 0.0);
    }

    #[test]
    fn test_level_source() {
        let settings = MeterSettings {
            source: MeterSource::Level,
            ..Default::default()
        };
        let mut vu = VuMeter::new(settings, SR, 1).unwrap();
        vu.render(&sine(0.5, 4800), 1, SR, Instant::now()).unwrap();

        let r = vu.channel(0).unwrap();
        let expected = gain_to_display_db(r.level, 96.0);
        assert_eq!(r.instant_db, expected);
    }

    #[test]
    fn test_falloff_between_ticks() {
        let settings = MeterSettings {
            falloff_db_per_sec: 20.0,
            ..Default::default()
        };
        let mut vu = VuMeter::new(settings, SR, 1).unwrap();
        let t0 = Instant::now();

        // Trailing zeros flush the filter history inside the loud block.
        let mut loud_block = sine(0.5, 512);
        loud_block.extend([0.0; 32]);
        vu.render(&loud_block, 1, SR, t0).unwrap();
        let loud = vu.channel(0).unwrap().level_db;

        vu.render(&vec![0.0; 512], 1, SR, t0 + Duration::from_millis(50))
            .unwrap();
        vu.render(&vec![0.0; 512], 1, SR, t0 + Duration::from_millis(100))
            .unwrap();

        let after = vu.channel(0).unwrap();
        assert!(
            (after.level_db - (loud - 2.0)).abs() < 0.05,
            "Bar should fall 2 dB in 100 ms: {loud} -> {}",
            after.level_db
        );
        assert_eq!(after.instant_db, -96.0);
        assert_eq!(after.peak_db, loud, "Peak should still be held");
    }

    #[test]
    fn test_channel_count_change_rebuilds() {
        let mut vu = VuMeter::new(MeterSettings::default(), SR, 2).unwrap();
        let now = Instant::now();
        vu.render(&interleave(&[sine(1.0, 512), sine(1.0, 512)]), 2, SR, now)
            .unwrap();

        vu.render(&vec![0.0; 6 * 512], 6, SR, now).unwrap();
        assert_eq!(vu.channel_count(), 6);
        assert!(vu.readings().all(|r| r.peak_db == -96.0));
    }

    #[test]
    fn test_invalid_render_leaves_state() {
        let mut vu = VuMeter::new(MeterSettings::default(), SR, 2).unwrap();
        let now = Instant::now();
        assert!(vu.render(&[0.0; 24], 12, SR, now).is_err());
        assert!(vu.render(&[0.0; 24], 2, -1.0, now).is_err());
        assert_eq!(vu.channel_count(), 2);
        assert_eq!(vu.sample_rate(), SR);
    }

    #[test]
    fn test_sample_rate_change_retunes() {
        let mut vu = VuMeter::new(MeterSettings::default(), 44100.0, 1).unwrap();
        vu.render(&vec![0.25; 512], 1, 96000.0, Instant::now()).unwrap();
        assert_eq!(vu.sample_rate(), 96000.0);
        assert_eq!(vu.channels[0].meter.oversampling(), 2);
    }

    #[test]
    fn test_partial_frame_ignored() {
        let mut vu = VuMeter::new(MeterSettings::default(), SR, 2).unwrap();
        let mut pcm = interleave(&[vec![0.5; 4], vec![0.25; 4]]);
        pcm.push(1.0);
        vu.render(&pcm, 2, SR, Instant::now()).unwrap();
        assert_eq!(vu.channel(0).unwrap().sample_peak, 0.5);
        assert_eq!(vu.channels[0].buffer.len(), 4);
    }

    #[test]
    fn test_block_growth_beyond_capacity() {
        let settings = MeterSettings {
            block_size: 64,
            ..Default::default()
        };
        let mut vu = VuMeter::new(settings, SR, 1).unwrap();
        vu.render(&vec![0.1; 1024], 1, SR, Instant::now()).unwrap();
        assert_eq!(vu.channels[0].buffer.len(), 1024);
    }

    #[test]
    fn test_clear() {
        let mut vu = VuMeter::new(MeterSettings::default(), SR, 1).unwrap();
        vu.render(&sine(1.0, 512), 1, SR, Instant::now()).unwrap();
        vu.clear();
        let r = vu.channel(0).unwrap();
        assert_eq!(r.level_db, -96.0);
        assert_eq!(r.peak_db, -96.0);
        assert_eq!(r.true_peak, 0.0);
    }

    #[test]
    fn test_set_settings() {
        let mut vu = VuMeter::new(MeterSettings::default(), SR, 1).unwrap();
        vu.render(&vec![0.001; 512], 1, SR, Instant::now()).unwrap();

        let narrow = MeterSettings {
            db_range: 40.0,
            ..Default::default()
        };
        vu.set_settings(narrow).unwrap();
        assert_eq!(vu.settings().db_range, 40.0);
        assert_eq!(vu.channels[0].ballistics.level(), -40.0);

        // Published readings follow the new floor before the next tick.
        let r = vu.channel(0).unwrap();
        assert_eq!(r.level_db, -40.0);
        assert_eq!(r.peak_db, -40.0);
        assert_eq!(r.instant_db, -40.0);
        assert_eq!(r.zone, Zone::Normal);

        let bad = MeterSettings {
            falloff_db_per_sec: f32::NAN,
            ..Default::default()
        };
        assert!(vu.set_settings(bad).is_err());
        assert_eq!(vu.settings().db_range, 40.0);
    }

    #[test]
    fn test_empty_block_keeps_meter_reading() {
        let mut vu = VuMeter::new(MeterSettings::default(), SR, 1).unwrap();
        let now = Instant::now();
        vu.render(&sine(0.5, 512), 1, SR, now).unwrap();
        let before = vu.channel(0).unwrap().true_peak;
        vu.render(&[], 1, SR, now).unwrap();
        assert_eq!(vu.channel(0).unwrap().true_peak, before);
    }

    #[test]
    fn test_empty_ticks_let_the_bar_fall() {
        let mut vu = VuMeter::new(MeterSettings::default(), SR, 1).unwrap();
        let t0 = Instant::now();
        vu.render(&vec![0.5; 512], 1, SR, t0).unwrap();
        let loud = vu.channel(0).unwrap().level_db;
        assert!(loud > -7.0, "got {loud}");

        for i in 1..=50u32 {
            vu.render(&[], 1, SR, t0 + Duration::from_millis(100) * i)
                .unwrap();
        }

        let r = vu.channel(0).unwrap();
        // 5 s at the default 13.3 dB/s.
        assert!(
            (r.level_db - (loud - 66.5)).abs() < 0.1,
            "Bar should fall 66.5 dB over 5 s of empty ticks: {loud} -> {}",
            r.level_db
        );
        assert_eq!(r.peak_db, -96.0, "Hold should have run out");
        assert_eq!(r.instant_db, -96.0);
        assert!(r.true_peak > 0.4, "Meter reading itself is kept");
    }
}
