use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use cps_analyst::analysis::Analyst;
use cps_analyst::fixture::MatchBundle;
use cps_analyst::score::ScoreEngine;
use cps_analyst::stats::normalize_statistics;

const BUNDLE_JSON: &str = include_str!("../tests/fixtures/match_full_971362.json");

fn bundle() -> MatchBundle {
    serde_json::from_str(BUNDLE_JSON).expect("valid fixture json")
}

fn bench_bundle_parse(c: &mut Criterion) {
    c.bench_function("bundle_parse", |b| {
        b.iter(|| {
            let bundle: MatchBundle = serde_json::from_str(black_box(BUNDLE_JSON)).unwrap();
            black_box(bundle.fixture_id);
        })
    });
}

fn bench_normalize(c: &mut Criterion) {
    let blocks = bundle().stat_blocks();
    c.bench_function("normalize_statistics", |b| {
        b.iter(|| {
            let stats = normalize_statistics(black_box(&blocks));
            black_box(stats.home.values.len());
        })
    });
}

fn bench_score(c: &mut Criterion) {
    let stats = normalize_statistics(&bundle().stat_blocks());
    let engine = ScoreEngine::default();
    c.bench_function("score_team", |b| {
        b.iter(|| black_box(engine.score(black_box(&stats.home))))
    });
}

fn bench_analyze(c: &mut Criterion) {
    let bundle = bundle();
    let analyst = Analyst::default();
    c.bench_function("analyze_match", |b| {
        b.iter(|| {
            let analysis = analyst.analyze(black_box(&bundle));
            black_box(analysis.comparison.difference);
        })
    });
}

criterion_group!(
    benches,
    bench_bundle_parse,
    bench_normalize,
    bench_score,
    bench_analyze
);
criterion_main!(benches);
