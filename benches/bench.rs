// Criterion benchmarks for HireMatch

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use hirematch::core::{combine_scores, cosine_similarity, Matcher};
use hirematch::models::{CandidateEntry, WeightParameters};
use hirematch::services::WeightStore;

fn embedding(dimension: usize, seed: usize) -> Vec<f32> {
    (0..dimension)
        .map(|i| ((i * 31 + seed * 17) % 101) as f32 / 101.0 - 0.5)
        .collect()
}

fn bench_cosine_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("cosine_similarity");

    for dimension in [128usize, 384, 768, 1536].iter() {
        let a = embedding(*dimension, 1);
        let b = embedding(*dimension, 2);

        group.bench_with_input(
            BenchmarkId::from_parameter(dimension),
            dimension,
            |bencher, _| {
                bencher.iter(|| cosine_similarity(black_box(&a), black_box(&b)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_combine_scores(c: &mut Criterion) {
    let weights = WeightParameters::default();

    c.bench_function("combine_scores", |b| {
        b.iter(|| combine_scores(black_box(0.82), black_box(7.4), black_box(&weights)).unwrap());
    });
}

fn bench_ranking(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let store = Arc::new(WeightStore::detached(WeightParameters::default()));
    let matcher = Matcher::new(store);
    let job = embedding(384, 0);

    let mut group = c.benchmark_group("ranking");

    for candidate_count in [10usize, 50, 100, 500].iter() {
        let candidates: Vec<CandidateEntry> = (0..*candidate_count)
            .map(|i| CandidateEntry {
                candidate_id: i.to_string(),
                embedding: embedding(384, i + 1),
                screening_score: (i % 11) as f64,
                profile: None,
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("rank_candidates", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| {
                    runtime.block_on(matcher.rank_candidates(
                        black_box(&job),
                        black_box(candidates.clone()),
                        None,
                        20,
                    ))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_cosine_similarity, bench_combine_scores, bench_ranking);
criterion_main!(benches);
