use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use studyloop_core::analytics::aggregate;
use studyloop_core::model::TestResult;

const SUBJECTS: [&str; 4] = ["Physics", "Chemistry", "Math", "Biology"];

fn make_history(n: usize) -> Vec<TestResult> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| TestResult {
            result_id: None,
            // Cycle over 30 days so many rows share a date.
            test_date: base + Duration::days((i * 7 % 30) as i64),
            topic: format!("topic-{}", i % 10),
            subject: SUBJECTS[i % SUBJECTS.len()].to_string(),
            score: (i * 37 % 101) as f64,
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for n in [10, 1_000, 10_000] {
        let history = make_history(n);
        group.bench_function(format!("rows={n}"), |b| {
            b.iter(|| aggregate(black_box(&history)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_aggregate);
criterion_main!(benches);
