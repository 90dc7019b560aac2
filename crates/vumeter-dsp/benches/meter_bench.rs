// SPDX-License-Identifier: LGPL-3.0-or-later

//! Criterion benchmarks for the meters.

use std::time::{Duration, Instant};

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use vumeter_dsp::meters::{Ballistics, TruePeakMeter, VuMeter};
use vumeter_dsp::settings::MeterSettings;

const BUF_SIZE: usize = 512;

/// Generate a deterministic white noise buffer using a simple LCG.
fn white_noise(len: usize, seed: u64) -> Vec<f32> {
    let mut state: u64 = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((state >> 33) as i32) as f32 / (i32::MAX as f32)
        })
        .collect()
}

fn bench_true_peak(c: &mut Criterion) {
    let mut group = c.benchmark_group("meter_true_peak");
    let input = white_noise(BUF_SIZE, 0xDEAD_BEEF_CAFE_BABE);

    for (name, rate) in [("4x_48k", 48000.0), ("2x_96k", 96000.0), ("1x_192k", 192000.0)] {
        group.bench_function(name, |b| {
            let mut meter = TruePeakMeter::new(rate).unwrap();

            b.iter(|| {
                meter.process(black_box(&input));
                black_box(meter.read());
            });
        });
    }

    group.finish();
}

fn bench_vu_stereo(c: &mut Criterion) {
    let mut group = c.benchmark_group("meter_vu");
    let left = white_noise(BUF_SIZE, 0xDEAD_BEEF_CAFE_BABE);
    let right = white_noise(BUF_SIZE, 0xCAFE_BABE_DEAD_BEEF);
    let pcm: Vec<f32> = left
        .iter()
        .zip(&right)
        .flat_map(|(&l, &r)| [l, r])
        .collect();

    group.bench_function("stereo_512", |b| {
        let mut vu = VuMeter::new(MeterSettings::default(), 48000.0, 2).unwrap();
        let mut now = Instant::now();

        b.iter(|| {
            now += Duration::from_millis(10);
            vu.render(black_box(&pcm), 2, 48000.0, now).unwrap();
        });
    });

    group.finish();
}

fn bench_ballistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("meter_ballistics");

    group.bench_function("update", |b| {
        let mut ballistics = Ballistics::default();
        let mut now = Instant::now();
        let mut db = -40.0f32;

        b.iter(|| {
            now += Duration::from_millis(10);
            db = if db < -60.0 { -3.0 } else { db - 1.5 };
            ballistics.update(black_box(db), now);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_true_peak, bench_vu_stereo, bench_ballistics);
criterion_main!(benches);
