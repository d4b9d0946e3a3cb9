use std::fs;
use std::path::PathBuf;

use ah_patterns::corpus::{MatchRecord, parse_corpus_json};
use ah_patterns::handicap::LineInput;
use ah_patterns::outcome::{GoalLineCategory, OutcomeCategory, Wdl};
use ah_patterns::pattern_search::{ContextSource, FilterMode, PatternQuery, find_similar_patterns};

fn fixture_corpus() -> Vec<MatchRecord> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures/corpus.json");
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    parse_corpus_json(&raw).expect("fixture should parse")
}

fn abc_corpus() -> Vec<MatchRecord> {
    vec![
        MatchRecord::new("A", "B", "2024-01-10")
            .with_score("2:0")
            .with_line(-1.0),
        MatchRecord::new("A", "C", "2024-01-01")
            .with_score("1:0")
            .with_line(-0.5),
    ]
}

#[test]
fn end_to_end_single_match() {
    let corpus = abc_corpus();
    let results = find_similar_patterns(&PatternQuery::new(-1.0), &corpus);
    assert_eq!(results.len(), 1);
    let hit = &results[0];
    assert_eq!(hit.candidate.home, "A");
    assert_eq!(hit.evaluation.home, OutcomeCategory::Cover);
    assert_eq!(hit.evaluation.away, OutcomeCategory::NoCover);
    let prev_home = hit.prev_home.as_ref().expect("prev home");
    assert_eq!(prev_home.score, "1:0");
    assert_eq!(prev_home.source, ContextSource::Resolved);
    assert!(hit.prev_away.is_none());
    assert_eq!(hit.similarity_score, Some(1));
}

#[test]
fn unparseable_target_yields_nothing() {
    let corpus = abc_corpus();
    let query: PatternQuery =
        serde_json::from_str(r#"{"ah_open_home": "N/A"}"#).expect("query json");
    assert!(find_similar_patterns(&query, &corpus).is_empty());
    assert!(find_similar_patterns(&PatternQuery::default(), &corpus).is_empty());
}

#[test]
fn evaluates_against_query_line_not_record_line() {
    let corpus = abc_corpus();
    // -0.75 shares the -0.5 bucket with the 1:0 record.
    let results = find_similar_patterns(&PatternQuery::new(-0.75), &corpus);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].candidate.line, -0.5);
    // 1:0 on -0.75: half won, half pushed.
    assert_eq!(results[0].evaluation.home, OutcomeCategory::Cover);
    assert_eq!(results[0].evaluation.home_margin, Some(0.5));
}

#[test]
fn heavy_tier_collects_all_big_lines() {
    let corpus = vec![
        MatchRecord::new("H1", "A1", "2024-01-01").with_score("4:0").with_line(-2.5),
        MatchRecord::new("H2", "A2", "2024-01-02").with_score("3:0").with_line(-3.25),
        MatchRecord::new("H3", "A3", "2024-01-03").with_score("2:0").with_line(-2.0),
        MatchRecord::new("H4", "A4", "2024-01-04").with_score("0:3").with_line(2.75),
    ];
    let results = find_similar_patterns(&PatternQuery::new(-2.75), &corpus);
    let homes = results.iter().map(|r| r.candidate.home.as_str()).collect::<Vec<_>>();
    assert_eq!(homes, vec!["H2", "H1"]);
}

#[test]
fn ranks_by_similarity_then_recency() {
    let corpus = fixture_corpus();
    let mut query = PatternQuery::new(-1.0);
    query.prev_home_line = Some(LineInput::from(-0.5));
    let results = find_similar_patterns(&query, &corpus);
    let ids = results
        .iter()
        .map(|r| r.match_id.as_deref().unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["3", "5"]);
    assert_eq!(results[0].similarity_score, Some(3));
    assert_eq!(results[1].similarity_score, Some(1));

    // Without prior lines every hit scores 1 and the newest comes first.
    let plain = find_similar_patterns(&PatternQuery::new(-1.0), &corpus);
    let ids = plain
        .iter()
        .map(|r| r.match_id.as_deref().unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["5", "3"]);
}

#[test]
fn undated_records_sort_after_dated_ones() {
    let corpus = vec![
        MatchRecord::new("Undated", "X", "").with_score("1:0").with_line(-1.0),
        MatchRecord::new("Old", "Y", "2023-05-01").with_score("1:0").with_line(-1.0),
    ];
    let results = find_similar_patterns(&PatternQuery::new(-1.0), &corpus);
    assert_eq!(results[0].candidate.home, "Old");
    assert_eq!(results[1].candidate.home, "Undated");
}

#[test]
fn previous_contexts_are_team_perspective() {
    let corpus = fixture_corpus();
    let results = find_similar_patterns(&PatternQuery::new(-1.0), &corpus);
    let hit = results
        .iter()
        .find(|r| r.match_id.as_deref() == Some("3"))
        .expect("match 3");

    let prev_away = hit.prev_away.as_ref().expect("prev away");
    assert_eq!(prev_away.match_id.as_deref(), Some("2"));
    assert_eq!(prev_away.rival.as_deref(), Some("Delta"));
    assert!(!prev_away.was_home);
    assert_eq!(prev_away.quoted_line, Some(0.25));
    assert_eq!(prev_away.line, Some(-0.25));
    assert_eq!(prev_away.bucket, Some(-0.5));
    assert_eq!(prev_away.wdl, Some(Wdl::W));
    // 2:0 away win re-settled on the away side of -1, i.e. +1.
    assert_eq!(prev_away.result, OutcomeCategory::Cover);
    assert!(hit.h2h.is_none());

    let pending = results
        .iter()
        .find(|r| r.match_id.as_deref() == Some("5"))
        .expect("match 5");
    assert_eq!(pending.evaluation.home, OutcomeCategory::Unknown);
    let cached = pending.prev_home.as_ref().expect("cached prev");
    assert_eq!(cached.source, ContextSource::Cached);
    assert_eq!(cached.rival.as_deref(), Some("Beta"));
    assert_eq!(cached.bucket, Some(-1.0));
}

#[test]
fn home_strict_keeps_only_matching_prior_lines() {
    let corpus = fixture_corpus();
    let mut query = PatternQuery::new(-1.0);
    query.prev_home_line = Some(LineInput::from(-1.0));
    query.filter_mode = FilterMode::HomeStrict;
    let results = find_similar_patterns(&query, &corpus);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].match_id.as_deref(), Some("5"));
    assert!(
        results
            .iter()
            .all(|r| r.prev_home.as_ref().is_some_and(|p| p.matches_pattern))
    );

    query.prev_home_wdl = Some(Wdl::L);
    assert!(find_similar_patterns(&query, &corpus).is_empty());

    query.prev_home_wdl = None;
    query.prev_home_score = Some("2:0".to_string());
    assert_eq!(find_similar_patterns(&query, &corpus).len(), 1);
}

#[test]
fn away_strict_mirrors_home_strict() {
    let corpus = fixture_corpus();
    let mut query = PatternQuery::new(-1.0);
    query.prev_away_line = Some(LineInput::Text("-0/0.5".to_string()));
    query.filter_mode = FilterMode::AwayStrict;
    let results = find_similar_patterns(&query, &corpus);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].match_id.as_deref(), Some("3"));
    assert_eq!(results[0].similarity_score, Some(3));
}

#[test]
fn goal_line_is_evaluated_when_requested() {
    let corpus = fixture_corpus();
    let query: PatternQuery =
        serde_json::from_str(r#"{"ah_open_home": "-1", "goals_open": 2.5}"#).expect("query");
    let results = find_similar_patterns(&query, &corpus);
    let settled = results
        .iter()
        .find(|r| r.match_id.as_deref() == Some("3"))
        .expect("match 3");
    assert_eq!(settled.evaluation.goals, Some(GoalLineCategory::Under));
    let pending = results
        .iter()
        .find(|r| r.match_id.as_deref() == Some("5"))
        .expect("match 5");
    assert_eq!(pending.evaluation.goals, None);
}

#[test]
fn results_serialize_for_the_web_layer() {
    let corpus = abc_corpus();
    let results = find_similar_patterns(&PatternQuery::new(-1.0), &corpus);
    let value = serde_json::to_value(&results).expect("serialize");
    let first = &value[0];
    assert_eq!(first["evaluation"]["home"], "COVER");
    assert_eq!(first["prev_home"]["score"], "1:0");
    assert_eq!(first["prev_home"]["source"], "resolved");
    assert_eq!(first["similarity_score"], 1);
    assert!(first.get("kickoff").is_none());
}
