use contact_core::tracker::{ContactTracker, TrackerConfig};
use contact_core::types::Measurement;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::DMatrix;

/// Synthetic walk: `n_contacts` 4x4 footfalls, staggered in time and laid
/// out along the plate, each pressed down for 20 frames.
fn make_measurement(n_contacts: usize) -> Measurement {
    let rows = 64;
    let cols = 256;
    let n_frames = n_contacts * 10 + 30;
    let mut frames = vec![DMatrix::zeros(rows, cols); n_frames];

    for i in 0..n_contacts {
        let start = i * 10;
        let row = 10 + (i % 4) * 10;
        let col = 8 + (i * 9) % (cols - 16);
        for frame in frames.iter_mut().skip(start).take(20) {
            for dr in 0..4 {
                for dc in 0..4 {
                    frame[(row + dr, col + dc)] = 2.0 + dr as f64;
                }
            }
        }
    }

    Measurement::new(frames, 125.0, true).unwrap()
}

fn bench_track(c: &mut Criterion) {
    let mut group = c.benchmark_group("track");

    for n in [4, 16, 64] {
        let measurement = make_measurement(n);
        group.bench_function(format!("{n}_contacts"), |b| {
            let tracker = ContactTracker::new(TrackerConfig::default());
            b.iter(|| black_box(tracker.track(&measurement)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_track);
criterion_main!(benches);
