use serde::Deserialize;
use tracing::debug;

use crate::corpus::MatchRecord;
use crate::handicap::{LineInput, Movement, bucket_matches, normalize_bucket};
use crate::outcome::{Wdl, get_wdl_result, would_cover_current_line};
use crate::pattern_search::{
    PrevContext, PrevLookup, SearchResult, candidate, goal_evaluation, movement_context,
    resolve_h2h, resolve_prev_context,
};
use crate::resolver::Venue;

pub const DEFAULT_EXPLORE_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExploreFilters {
    #[serde(default)]
    pub handicap: Option<LineInput>,
    #[serde(default)]
    pub result: Option<Wdl>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub prev_home_wdl: Option<Wdl>,
    #[serde(default)]
    pub prev_away_wdl: Option<Wdl>,
    #[serde(default)]
    pub prev_home_ah: Option<LineInput>,
    #[serde(default)]
    pub prev_away_ah: Option<LineInput>,
    #[serde(default)]
    pub h2h_movement: Option<Movement>,
    #[serde(default)]
    pub h2h_wdl: Option<Wdl>,
    #[serde(default, alias = "exclude_empty")]
    pub require_prev: bool,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ExploreFilters {
    pub fn with_handicap(mut self, line: f64) -> Self {
        self.handicap = Some(line.into());
        self
    }

    pub fn with_team(mut self, team: &str) -> Self {
        self.team = Some(team.to_string());
        self
    }

    fn team_needle(&self) -> Option<String> {
        self.team
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
    }
}

pub fn explore_matches(corpus: &[MatchRecord], filters: &ExploreFilters) -> Vec<SearchResult> {
    let limit = filters.limit.unwrap_or(DEFAULT_EXPLORE_LIMIT);
    let handicap_bucket = filters
        .handicap
        .as_ref()
        .and_then(LineInput::value)
        .map(normalize_bucket);
    let prev_home_bucket = filters
        .prev_home_ah
        .as_ref()
        .and_then(LineInput::value)
        .map(normalize_bucket);
    let prev_away_bucket = filters
        .prev_away_ah
        .as_ref()
        .and_then(LineInput::value)
        .map(normalize_bucket);
    let needle = filters.team_needle();

    let mut results = Vec::new();
    for record in corpus {
        if results.len() >= limit {
            break;
        }
        let Some(line) = record.line else {
            continue;
        };
        let Some(score) = record.score.as_deref().filter(|s| !s.trim().is_empty()) else {
            continue;
        };
        let bucket = normalize_bucket(line);

        if let Some(target) = handicap_bucket
            && !bucket_matches(target, bucket)
        {
            continue;
        }
        if let Some(wanted) = filters.result
            && get_wdl_result(score, true) != Some(wanted)
        {
            continue;
        }
        if let Some(needle) = &needle {
            let hit = record.home.to_lowercase().contains(needle.as_str())
                || record.away.to_lowercase().contains(needle.as_str());
            if !hit {
                continue;
            }
        }

        let home_lookup = PrevLookup {
            side: Venue::Home,
            reference_line: line,
            target_bucket: prev_home_bucket,
            venue_strict: false,
        };
        let away_lookup = PrevLookup {
            side: Venue::Away,
            target_bucket: prev_away_bucket,
            ..home_lookup
        };
        let prev_home = resolve_prev_context(record, corpus, home_lookup);
        let prev_away = resolve_prev_context(record, corpus, away_lookup);

        if filters.require_prev && (prev_home.is_none() || prev_away.is_none()) {
            continue;
        }
        if !prev_filters_pass(prev_home.as_ref(), filters.prev_home_wdl, prev_home_bucket) {
            continue;
        }
        if !prev_filters_pass(prev_away.as_ref(), filters.prev_away_wdl, prev_away_bucket) {
            continue;
        }

        let h2h_movement = movement_context(record);
        if let Some(direction) = filters.h2h_movement
            && h2h_movement.as_ref().and_then(|m| m.direction) != Some(direction)
        {
            continue;
        }
        if let Some(wdl) = filters.h2h_wdl
            && h2h_movement.as_ref().and_then(|m| m.wdl) != Some(wdl)
        {
            continue;
        }

        let mut evaluation = would_cover_current_line(record, line);
        evaluation.goals = goal_evaluation(record, record.goal_line);

        results.push(SearchResult {
            match_id: record.match_id.clone(),
            candidate: candidate(record, line, bucket),
            evaluation,
            prev_home,
            prev_away,
            h2h: resolve_h2h(record, corpus),
            h2h_movement,
            similarity_score: None,
            kickoff: record.kickoff,
        });
    }

    debug!(results = results.len(), limit, "explore complete");
    results
}

fn prev_filters_pass(
    context: Option<&PrevContext>,
    simulated_wdl: Option<Wdl>,
    bucket: Option<f64>,
) -> bool {
    if let Some(wanted) = simulated_wdl
        && context.and_then(|p| p.simulated_wdl) != Some(wanted)
    {
        return false;
    }
    bucket.is_none() || context.is_some_and(|p| p.matches_pattern)
}
