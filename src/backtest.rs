use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::corpus::MatchRecord;
use crate::favorite::{FavoriteContext, favorite_context};
use crate::outcome::{GoalLineCategory, OutcomeCategory, parse_score};
use crate::pattern_search::{SearchResult, find_similar_patterns};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SideTally {
    pub cover: usize,
    pub push: usize,
    pub no_cover: usize,
    pub unknown: usize,
}

impl SideTally {
    fn record(&mut self, category: OutcomeCategory) {
        match category {
            OutcomeCategory::Cover => self.cover += 1,
            OutcomeCategory::Push => self.push += 1,
            OutcomeCategory::NoCover => self.no_cover += 1,
            OutcomeCategory::Unknown => self.unknown += 1,
        }
    }

    pub fn settled(&self) -> usize {
        self.cover + self.push + self.no_cover
    }

    pub fn cover_rate(&self) -> Option<f64> {
        rate(self.cover, self.settled())
    }

    pub fn push_rate(&self) -> Option<f64> {
        rate(self.push, self.settled())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GoalTally {
    pub over: usize,
    pub push: usize,
    pub under: usize,
    pub unknown: usize,
}

impl GoalTally {
    fn record(&mut self, category: GoalLineCategory) {
        match category {
            GoalLineCategory::Over => self.over += 1,
            GoalLineCategory::Push => self.push += 1,
            GoalLineCategory::Under => self.under += 1,
            GoalLineCategory::Unknown => self.unknown += 1,
        }
    }

    pub fn settled(&self) -> usize {
        self.over + self.push + self.under
    }

    pub fn over_rate(&self) -> Option<f64> {
        rate(self.over, self.settled())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BacktestSummary {
    pub samples: usize,
    pub home: SideTally,
    pub away: SideTally,
    pub goals: Option<GoalTally>,
    pub home_cover_rate: Option<f64>,
    pub away_cover_rate: Option<f64>,
    pub over_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub context: FavoriteContext,
    pub summary: BacktestSummary,
    pub results: Vec<SearchResult>,
}

pub fn summarize(results: &[SearchResult]) -> BacktestSummary {
    let mut home = SideTally::default();
    let mut away = SideTally::default();
    let mut goals: Option<GoalTally> = None;
    for result in results {
        home.record(result.evaluation.home);
        away.record(result.evaluation.away);
        if let Some(category) = result.evaluation.goals {
            goals.get_or_insert_with(GoalTally::default).record(category);
        }
    }
    BacktestSummary {
        samples: results.len(),
        home,
        away,
        goals,
        home_cover_rate: home.cover_rate(),
        away_cover_rate: away.cover_rate(),
        over_rate: goals.and_then(|g| g.over_rate()),
    }
}

pub fn run_batch(corpus: &[MatchRecord], limit: usize) -> Vec<BatchEntry> {
    let pending: Vec<&MatchRecord> = corpus
        .iter()
        .filter(|record| record.score.as_deref().and_then(parse_score).is_none())
        .collect();
    debug!(pending = pending.len(), "batch backtest start");

    pending
        .par_iter()
        .filter_map(|record| {
            let context = favorite_context(record, corpus)?;
            let mut results = find_similar_patterns(&context.to_query(), corpus);
            let summary = summarize(&results);
            results.truncate(limit);
            Some(BatchEntry {
                context,
                summary,
                results,
            })
        })
        .collect()
}

fn rate(count: usize, settled: usize) -> Option<f64> {
    if settled == 0 {
        return None;
    }
    Some(count as f64 * 100.0 / settled as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_exclude_unknown() {
        let mut tally = SideTally::default();
        tally.record(OutcomeCategory::Cover);
        tally.record(OutcomeCategory::NoCover);
        tally.record(OutcomeCategory::Unknown);
        assert_eq!(tally.settled(), 2);
        assert_eq!(tally.cover_rate(), Some(50.0));
        assert_eq!(SideTally::default().cover_rate(), None);
    }

    #[test]
    fn empty_summary_has_no_rates() {
        let summary = summarize(&[]);
        assert_eq!(summary.samples, 0);
        assert!(summary.home_cover_rate.is_none());
        assert!(summary.goals.is_none());
    }
}
