use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use ah_patterns::backtest::{run_batch, summarize};
use ah_patterns::corpus::{MatchRecord, parse_corpus_json};
use ah_patterns::explorer::{ExploreFilters, explore_matches};
use ah_patterns::handicap::LineInput;
use ah_patterns::pattern_search::{FilterMode, PatternQuery, find_similar_patterns};

const LINES: &[f64] = &[-2.5, -1.75, -1.25, -1.0, -0.75, -0.5, -0.25, 0.0, 0.25, 0.5, 1.0];
const SCORES: &[&str] = &["2:1", "0:0", "1:1", "3:0", "0:2", "1:0", "2:2", "1:3"];

fn synthetic_corpus(size: usize) -> Vec<MatchRecord> {
    (0..size)
        .map(|idx| {
            let home = format!("Team {}", idx % 40);
            let away = format!("Team {}", (idx * 7 + 3) % 40);
            let kickoff = format!(
                "2023-{:02}-{:02} {:02}:00:00",
                idx % 12 + 1,
                idx % 28 + 1,
                12 + idx % 10
            );
            let score = if idx % 50 == 0 {
                "?:?"
            } else {
                SCORES[idx % SCORES.len()]
            };
            MatchRecord::new(&home, &away, &kickoff)
                .with_id(&idx.to_string())
                .with_score(score)
                .with_line(LINES[idx % LINES.len()])
                .with_goal_line(2.5)
        })
        .collect()
}

fn bench_pattern_search(c: &mut Criterion) {
    let corpus = synthetic_corpus(2_000);
    let mut query = PatternQuery::new(-0.75);
    query.goal_line = Some(LineInput::from(2.5));
    query.prev_home_line = Some(LineInput::from(-0.5));
    c.bench_function("pattern_search_global", |b| {
        b.iter(|| {
            let results = find_similar_patterns(black_box(&query), black_box(&corpus));
            black_box(results.len());
        })
    });

    let mut strict = query.clone();
    strict.filter_mode = FilterMode::HomeStrict;
    c.bench_function("pattern_search_home_strict", |b| {
        b.iter(|| {
            let results = find_similar_patterns(black_box(&strict), black_box(&corpus));
            black_box(summarize(&results).samples);
        })
    });
}

fn bench_explore(c: &mut Criterion) {
    let corpus = synthetic_corpus(2_000);
    let filters = ExploreFilters {
        require_prev: true,
        limit: Some(100),
        ..ExploreFilters::default()
    }
    .with_handicap(-1.0);
    c.bench_function("explore_handicap", |b| {
        b.iter(|| {
            let results = explore_matches(black_box(&corpus), black_box(&filters));
            black_box(results.len());
        })
    });
}

fn bench_batch(c: &mut Criterion) {
    let corpus = synthetic_corpus(1_000);
    c.bench_function("batch_pending", |b| {
        b.iter(|| {
            let entries = run_batch(black_box(&corpus), 20);
            black_box(entries.len());
        })
    });
}

fn bench_corpus_parse(c: &mut Criterion) {
    c.bench_function("corpus_parse", |b| {
        b.iter(|| {
            let corpus = parse_corpus_json(black_box(CORPUS_JSON)).unwrap();
            black_box(corpus.len());
        })
    });
}

criterion_group!(
    perf,
    bench_pattern_search,
    bench_explore,
    bench_batch,
    bench_corpus_parse
);
criterion_main!(perf);

static CORPUS_JSON: &str = include_str!("../tests/fixtures/corpus.json");
