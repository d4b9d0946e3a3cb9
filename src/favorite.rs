use serde::Serialize;

use crate::corpus::MatchRecord;
use crate::outcome::{OutcomeCategory, Wdl, asian_result, parse_score};
use crate::pattern_search::{FilterMode, PatternQuery, PrevLookup, resolve_prev_context};
use crate::resolver::Venue;

#[derive(Debug, Clone, Serialize)]
pub struct FavoriteContext {
    pub match_id: Option<String>,
    pub home: String,
    pub away: String,
    pub line: f64,
    pub goal_line: Option<f64>,
    pub is_home_favorite: bool,
    pub favorite: String,
    pub prev_score: Option<String>,
    pub prev_line: Option<f64>,
    pub prev_covered: Option<bool>,
    pub prev_wdl: Option<Wdl>,
}

/// A negative line means the home side gives goals; a level line counts as a
/// home favorite.
pub fn favorite_context(record: &MatchRecord, corpus: &[MatchRecord]) -> Option<FavoriteContext> {
    let line = record.line?;
    let is_home_favorite = line <= 0.0;
    let side = if is_home_favorite {
        Venue::Home
    } else {
        Venue::Away
    };
    let favorite = if is_home_favorite {
        record.home.clone()
    } else {
        record.away.clone()
    };

    let prev = resolve_prev_context(
        record,
        corpus,
        PrevLookup {
            side,
            reference_line: line,
            target_bucket: None,
            venue_strict: true,
        },
    );
    let prev_covered = prev.as_ref().and_then(|p| {
        let (home_goals, away_goals) = parse_score(&p.score)?;
        let (team, opp) = if p.was_home {
            (home_goals, away_goals)
        } else {
            (away_goals, home_goals)
        };
        match asian_result(team, opp, p.line?).category {
            OutcomeCategory::Cover => Some(true),
            OutcomeCategory::NoCover => Some(false),
            OutcomeCategory::Push | OutcomeCategory::Unknown => None,
        }
    });

    Some(FavoriteContext {
        match_id: record.match_id.clone(),
        home: record.home.clone(),
        away: record.away.clone(),
        line,
        goal_line: record.goal_line,
        is_home_favorite,
        favorite,
        prev_score: prev.as_ref().map(|p| p.score.clone()),
        prev_line: prev.as_ref().and_then(|p| p.line),
        prev_covered,
        prev_wdl: prev.as_ref().and_then(|p| p.wdl),
    })
}

impl FavoriteContext {
    pub fn to_query(&self) -> PatternQuery {
        let mut query = PatternQuery::new(self.line);
        query.goal_line = self.goal_line.map(Into::into);
        let strict = self.prev_line.is_some();
        if self.is_home_favorite {
            query.prev_home_line = self.prev_line.map(Into::into);
            query.prev_home_wdl = self.prev_wdl;
            if strict {
                query.filter_mode = FilterMode::HomeStrict;
            }
        } else {
            query.prev_away_line = self.prev_line.map(Into::into);
            query.prev_away_wdl = self.prev_wdl;
            if strict {
                query.filter_mode = FilterMode::AwayStrict;
            }
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_line_favours_away() {
        let corpus = vec![
            MatchRecord::new("Away", "X", "2024-01-01")
                .with_score("0:1")
                .with_line(-0.5),
            MatchRecord::new("Home", "Away", "2024-01-08")
                .with_score("?:?")
                .with_line(0.75),
        ];
        let ctx = favorite_context(&corpus[1], &corpus).expect("context");
        assert!(!ctx.is_home_favorite);
        assert_eq!(ctx.favorite, "Away");
        // Only away appearances count for the away favorite.
        assert!(ctx.prev_score.is_none());
        assert_eq!(ctx.to_query().filter_mode, FilterMode::Global);
    }

    #[test]
    fn level_line_is_home_favorite() {
        let record = MatchRecord::new("H", "A", "2024-01-08").with_line(0.0);
        let ctx = favorite_context(&record, &[]).expect("context");
        assert!(ctx.is_home_favorite);
        assert!(favorite_context(&MatchRecord::new("H", "A", "2024-01-08"), &[]).is_none());
    }
}
