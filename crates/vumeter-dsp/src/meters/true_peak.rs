// SPDX-License-Identifier: LGPL-3.0-or-later

//! True peak meter with oversampled inter-sample peak detection.
//!
//! Measures the peak of the reconstructed waveform, which can exceed the
//! largest discrete sample when the signal overshoots between samples.
//! Alongside the true peak, a smoothed peak envelope of the oversampled
//! signal is tracked as the meter's level reading.
//!
//! # Algorithm
//!
//! 1. Pick the oversampling factor from the sample rate: 4x below 96 kHz,
//!    2x below 192 kHz, none above.
//! 2. For each input sample, evaluate one polyphase FIR output per phase
//!    (windowed sinc, 12 taps per phase).
//! 3. Track the maximum absolute oversampled value of the block (peak).
//! 4. Feed every oversampled magnitude into two attack/release followers
//!    with different attack speeds; the largest scaled sum of the block is
//!    the level.
//!
//! Each [`process`](TruePeakMeter::process) call opens a new measurement
//! window. Filter history and follower state carry over between calls.
//!
//! # Examples
//!
//! ```
//! use vumeter_dsp::meters::TruePeakMeter;
//!
//! let mut meter = TruePeakMeter::new(48000.0)?;
//! let signal: Vec<f32> = (0..1000)
//!     .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 48000.0).sin())
//!     .collect();
//!
//! meter.process(&signal);
//! let (_level, peak) = meter.read();
//! assert!(peak > 0.9);
//! # Ok::<(), vumeter_dsp::Error>(())
//! ```

use std::f32::consts::PI;

use tracing::debug;

use crate::consts::{OVERSAMPLE_2X_BELOW_HZ, OVERSAMPLE_4X_BELOW_HZ};
use crate::error::{Result, check_sample_rate};

/// Maximum number of polyphase decomposition phases (4x oversampling).
const MAX_PHASES: usize = 4;

/// Number of FIR taps per polyphase phase.
const PHASE_TAPS: usize = 12;

/// Kaiser window shape parameter for the interpolation filter.
const KAISER_BETA: f64 = 8.0;

/// Attack rate of the slow envelope follower (Hz at the oversampled rate).
const SLOW_ATTACK_HZ: f32 = 4000.0;

/// Attack rate of the fast envelope follower.
const FAST_ATTACK_HZ: f32 = 17200.0;

/// Release rate shared by both followers.
const RELEASE_HZ: f32 = 7.0;

/// Scale applied to the sum of both followers.
const LEVEL_GAIN: f32 = 0.502;

/// Follower state is clamped to `[0, FOLLOWER_LIMIT]` between blocks.
const FOLLOWER_LIMIT: f32 = 20.0;

/// Added to follower state after each block to keep it out of denormals.
const DENORMAL_GUARD: f32 = 1e-20;

/// Oversampling factor used for a given input sample rate.
pub fn oversampling_for(sample_rate: f32) -> usize {
    if sample_rate < OVERSAMPLE_4X_BELOW_HZ {
        4
    } else if sample_rate < OVERSAMPLE_2X_BELOW_HZ {
        2
    } else {
        1
    }
}

/// Per-channel true peak meter.
///
/// All storage is fixed-size and owned by the meter; [`process`](Self::process)
/// never allocates.
#[derive(Debug, Clone)]
pub struct TruePeakMeter {
    /// Input sample rate in Hz.
    sample_rate: f32,
    /// Active oversampling factor (number of phases in use).
    factor: usize,
    /// Polyphase FIR coefficients: `[phase][tap]`.
    coeffs: [[f32; PHASE_TAPS]; MAX_PHASES],
    /// Circular buffer of recent input samples.
    history: [f32; PHASE_TAPS],
    /// Write position in the circular history buffer.
    write_pos: usize,
    /// Follower coefficients, per oversampled sample.
    slow_attack: f32,
    fast_attack: f32,
    release: f32,
    /// Follower state.
    slow: f32,
    fast: f32,
    /// Results of the last non-empty block.
    level: f32,
    peak: f32,
    sample_peak: f32,
}

impl TruePeakMeter {
    /// Create a meter for the given sample rate.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSampleRate`](crate::Error::InvalidSampleRate) if the
    /// rate is zero, negative or not finite.
    pub fn new(sample_rate: f32) -> Result<Self> {
        let mut meter = Self {
            sample_rate: 0.0,
            factor: 0,
            coeffs: [[0.0; PHASE_TAPS]; MAX_PHASES],
            history: [0.0; PHASE_TAPS],
            write_pos: 0,
            slow_attack: 0.0,
            fast_attack: 0.0,
            release: 1.0,
            slow: 0.0,
            fast: 0.0,
            level: 0.0,
            peak: 0.0,
            sample_peak: 0.0,
        };
        meter.init(sample_rate)?;
        Ok(meter)
    }

    /// Re-initialize for a sample rate, discarding all history.
    ///
    /// On error the meter is left untouched.
    pub fn init(&mut self, sample_rate: f32) -> Result<()> {
        let sample_rate = check_sample_rate(sample_rate)?;
        self.factor = 0;
        self.configure(sample_rate);
        self.clear();
        debug!(sample_rate, factor = self.factor, "true peak meter initialized");
        Ok(())
    }

    /// Change the sample rate mid-stream.
    ///
    /// Filter coefficients are redesigned only when the oversampling factor
    /// changes. The input history and follower state are kept, so a rate
    /// change produces at most a short transient.
    ///
    /// On error the meter is left untouched.
    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<()> {
        let sample_rate = check_sample_rate(sample_rate)?;
        if sample_rate != self.sample_rate {
            self.configure(sample_rate);
        }
        Ok(())
    }

    fn configure(&mut self, sample_rate: f32) {
        let factor = oversampling_for(sample_rate);
        if factor != self.factor {
            debug!(from = self.factor, to = factor, "oversampling factor changed");
            self.coeffs = design_interpolation_filter(factor);
            self.factor = factor;
        }

        let rate = sample_rate * factor as f32;
        self.slow_attack = SLOW_ATTACK_HZ / rate;
        self.fast_attack = FAST_ATTACK_HZ / rate;
        self.release = 1.0 - RELEASE_HZ / rate;
        self.sample_rate = sample_rate;
    }

    /// Discard filter history, follower state and the last reading.
    pub fn clear(&mut self) {
        self.history = [0.0; PHASE_TAPS];
        self.write_pos = 0;
        self.slow = 0.0;
        self.fast = 0.0;
        self.level = 0.0;
        self.peak = 0.0;
        self.sample_peak = 0.0;
    }

    /// Measure one block of samples for this channel.
    ///
    /// An empty block is a no-op and keeps the previous reading.
    pub fn process(&mut self, input: &[f32]) {
        if input.is_empty() {
            return;
        }

        let mut slow = self.slow.clamp(0.0, FOLLOWER_LIMIT);
        let mut fast = self.fast.clamp(0.0, FOLLOWER_LIMIT);
        let mut level = 0.0f32;
        let mut peak = 0.0f32;
        let mut sample_peak = 0.0f32;

        for &sample in input {
            sample_peak = sample_peak.max(sample.abs());

            self.history[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % PHASE_TAPS;

            for phase in &self.coeffs[..self.factor] {
                let mut sum = 0.0f32;
                for (tap, &c) in phase.iter().enumerate() {
                    // Newest sample first
                    let idx = (self.write_pos + PHASE_TAPS - 1 - tap) % PHASE_TAPS;
                    sum += c * self.history[idx];
                }
                let v = sum.abs();
                peak = peak.max(v);

                slow *= self.release;
                fast *= self.release;
                if v > slow {
                    slow += self.slow_attack * (v - slow);
                }
                if v > fast {
                    fast += self.fast_attack * (v - fast);
                }
                level = level.max(slow + fast);
            }
        }

        self.slow = slow + DENORMAL_GUARD;
        self.fast = fast + DENORMAL_GUARD;
        self.level = LEVEL_GAIN * level;
        self.peak = peak;
        self.sample_peak = sample_peak;
    }

    /// Return `(level, peak)` of the last processed block, both linear.
    ///
    /// Reading does not change any state.
    pub fn read(&self) -> (f32, f32) {
        (self.level, self.peak)
    }

    /// Largest absolute discrete sample of the last processed block.
    pub fn sample_peak(&self) -> f32 {
        self.sample_peak
    }

    /// Current input sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Current oversampling factor.
    pub fn oversampling(&self) -> usize {
        self.factor
    }
}

/// Design a polyphase FIR interpolation filter for `factor`x oversampling.
///
/// A `factor * 12`-tap windowed sinc (cutoff at the input Nyquist rate,
/// Kaiser window) is split into `factor` phases of 12 taps each. Every
/// phase is normalized to unity DC gain. A factor of 1 yields a plain
/// pass-through.
fn design_interpolation_filter(factor: usize) -> [[f32; PHASE_TAPS]; MAX_PHASES] {
    let mut coeffs = [[0.0f32; PHASE_TAPS]; MAX_PHASES];
    if factor <= 1 {
        coeffs[0][0] = 1.0;
        return coeffs;
    }

    let total = factor * PHASE_TAPS;
    let center = (total as f32 - 1.0) / 2.0;

    for i in 0..total {
        let n = i as f32 - center;

        let sinc = if n.abs() < 1e-10 {
            1.0
        } else {
            let x = n * PI / factor as f32;
            x.sin() / x
        };

        let window = kaiser_window(i, total, KAISER_BETA);
        coeffs[i % factor][i / factor] = sinc * window;
    }

    for phase in &mut coeffs[..factor] {
        let sum: f32 = phase.iter().sum();
        if sum.abs() > 1e-10 {
            for tap in phase.iter_mut() {
                *tap /= sum;
            }
        }
    }

    coeffs
}

/// Kaiser window value at position `n` of `length`, shape `beta`.
///
///   w(n) = I0(beta * sqrt(1 - ((2n / (N-1)) - 1)^2)) / I0(beta)
fn kaiser_window(n: usize, length: usize, beta: f64) -> f32 {
    let m = length as f64 - 1.0;
    let x = 2.0 * n as f64 / m - 1.0;
    let arg = beta * (1.0 - x * x).max(0.0).sqrt();
    (bessel_i0(arg) / bessel_i0(beta)) as f32
}

/// Zeroth-order modified Bessel function of the first kind, I0(x),
/// by power series.
fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0f64;
    let mut term = 1.0f64;
    let x_half = x / 2.0;

    for k in 1..=25 {
        term *= (x_half / k as f64) * (x_half / k as f64);
        sum += term;
        if term < 1e-20 * sum {
            break;
        }
    }

    sum
}
