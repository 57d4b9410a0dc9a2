use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::{ArrayD, IxDyn};

use audiofeat::{
    compute_deltas, context_window, fbank, mfcc, FbankConfig, MfccConfig, PadMode,
};

fn make_sine(freq_hz: f64, n_samples: usize, sample_rate: usize) -> ArrayD<f32> {
    let data: Vec<f32> = (0..n_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (freq_hz * 2.0 * std::f64::consts::PI * t).sin() as f32
        })
        .collect();
    ArrayD::from_shape_vec(IxDyn(&[n_samples]), data).expect("shape matches data")
}

fn bench_fbank_1s(c: &mut Criterion) {
    let cfg = FbankConfig::default();
    let audio = make_sine(440.0, 16000, 16000);

    c.bench_function("fbank_1s", |b| {
        b.iter(|| {
            let _ = black_box(fbank(black_box(&audio), &cfg));
        });
    });
}

fn bench_mfcc_1s(c: &mut Criterion) {
    let cfg = MfccConfig::default();
    let audio = make_sine(440.0, 16000, 16000);

    c.bench_function("mfcc_1s_deltas_context", |b| {
        b.iter(|| {
            let _ = black_box(mfcc(black_box(&audio), &cfg));
        });
    });
}

fn bench_deltas(c: &mut Criterion) {
    let cfg = FbankConfig::default();
    let audio = make_sine(440.0, 16000, 16000);
    let feats = fbank(&audio, &cfg).expect("fbank succeeds on a sine");

    c.bench_function("compute_deltas_40x101", |b| {
        b.iter(|| {
            let _ = black_box(compute_deltas(black_box(&feats), 5, PadMode::Edge));
        });
    });
}

fn bench_context(c: &mut Criterion) {
    let cfg = FbankConfig::default();
    let audio = make_sine(440.0, 16000, 16000);
    let feats = fbank(&audio, &cfg).expect("fbank succeeds on a sine");

    c.bench_function("context_window_40x101_l5r5", |b| {
        b.iter(|| {
            let _ = black_box(context_window(black_box(&feats), 5, 5));
        });
    });
}

criterion_group!(
    benches,
    bench_fbank_1s,
    bench_mfcc_1s,
    bench_deltas,
    bench_context
);
criterion_main!(benches);
