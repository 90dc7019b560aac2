// SPDX-License-Identifier: LGPL-3.0-or-later

//! Audio metering.
//!
//! - **TruePeakMeter**: Per-channel oversampled true peak and level
//! - **Ballistics**: Bar fall-off and peak hold in the dB domain
//! - **VuMeter**: Multi-channel pipeline from interleaved PCM to readings

pub mod ballistics;
pub mod true_peak;
pub mod vu;

pub use ballistics::{Ballistics, Zone};
pub use true_peak::TruePeakMeter;
pub use vu::{ChannelReading, VuMeter};
