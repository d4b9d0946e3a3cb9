use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::{H2hMatch, MatchRecord, PriorMatch};
use crate::handicap::{LineInput, Movement, bucket_matches, normalize_bucket, parse_movement};
use crate::outcome::{
    CoverStatus, GoalLineCategory, OutcomeCategory, Wdl, asian_result, get_wdl_result,
    goal_line_result, parse_score, would_cover_current_line,
};
use crate::resolver::{Venue, h2h_before, normalize_name, previous_match_before};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    Global,
    HomeStrict,
    AwayStrict,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternQuery {
    #[serde(alias = "ah_open_home")]
    pub target_line: Option<LineInput>,
    #[serde(default, alias = "goals_open")]
    pub goal_line: Option<LineInput>,
    #[serde(default, alias = "prev_home_ah")]
    pub prev_home_line: Option<LineInput>,
    #[serde(default, alias = "prev_away_ah")]
    pub prev_away_line: Option<LineInput>,
    #[serde(default)]
    pub prev_home_wdl: Option<Wdl>,
    #[serde(default)]
    pub prev_away_wdl: Option<Wdl>,
    #[serde(default)]
    pub prev_home_score: Option<String>,
    #[serde(default)]
    pub prev_away_score: Option<String>,
    #[serde(default)]
    pub filter_mode: FilterMode,
}

impl PatternQuery {
    pub fn new(target_line: f64) -> Self {
        Self {
            target_line: Some(target_line.into()),
            ..Self::default()
        }
    }

    pub fn target_prev_wdl(&self, side: Venue) -> Option<Wdl> {
        match side {
            Venue::Home => self.prev_home_wdl.or_else(|| {
                self.prev_home_score
                    .as_deref()
                    .and_then(|s| get_wdl_result(s, true))
            }),
            Venue::Away => self.prev_away_wdl.or_else(|| {
                self.prev_away_score
                    .as_deref()
                    .and_then(|s| get_wdl_result(s, false))
            }),
        }
    }

    fn target_prev_bucket(&self, side: Venue) -> Option<f64> {
        let line = match side {
            Venue::Home => self.prev_home_line.as_ref(),
            Venue::Away => self.prev_away_line.as_ref(),
        };
        line.and_then(LineInput::value).map(normalize_bucket)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextSource {
    Cached,
    Resolved,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrevContext {
    pub match_id: Option<String>,
    pub rival: Option<String>,
    pub date: Option<String>,
    pub score: String,
    pub was_home: bool,
    pub quoted_line: Option<f64>,
    pub line: Option<f64>,
    pub bucket: Option<f64>,
    pub wdl: Option<Wdl>,
    /// The previous score re-settled against the team's side of the reference line.
    pub result: OutcomeCategory,
    pub simulated_wdl: Option<Wdl>,
    pub matches_pattern: bool,
    pub source: ContextSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovementContext {
    pub movement: Option<String>,
    pub direction: Option<Movement>,
    pub score: Option<String>,
    pub wdl: Option<Wdl>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub date: Option<String>,
    pub league: Option<String>,
    pub home: String,
    pub away: String,
    pub score: Option<String>,
    pub line: f64,
    pub goal_line: Option<f64>,
    pub bucket: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub match_id: Option<String>,
    pub candidate: Candidate,
    pub evaluation: CoverStatus,
    pub prev_home: Option<PrevContext>,
    pub prev_away: Option<PrevContext>,
    pub h2h: Option<H2hMatch>,
    pub h2h_movement: Option<MovementContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<u8>,
    #[serde(skip)]
    pub kickoff: Option<NaiveDateTime>,
}

pub fn find_similar_patterns(query: &PatternQuery, corpus: &[MatchRecord]) -> Vec<SearchResult> {
    let Some(target_line) = query.target_line.as_ref().and_then(LineInput::value) else {
        debug!("pattern query has no parseable target line");
        return Vec::new();
    };
    let target_bucket = normalize_bucket(target_line);
    let target_goal_line = query.goal_line.as_ref().and_then(LineInput::value);
    let prev_home_bucket = query.target_prev_bucket(Venue::Home);
    let prev_away_bucket = query.target_prev_bucket(Venue::Away);
    let prev_home_wdl = query.target_prev_wdl(Venue::Home);
    let prev_away_wdl = query.target_prev_wdl(Venue::Away);

    let mut results = Vec::new();
    for record in corpus {
        let Some(line) = record.line else {
            continue;
        };
        let bucket = normalize_bucket(line);
        if !bucket_matches(target_bucket, bucket) {
            continue;
        }

        let mut evaluation = would_cover_current_line(record, target_line);
        evaluation.goals = goal_evaluation(record, target_goal_line);

        let home_lookup = PrevLookup {
            side: Venue::Home,
            reference_line: target_line,
            target_bucket: prev_home_bucket,
            venue_strict: true,
        };
        let away_lookup = PrevLookup {
            side: Venue::Away,
            target_bucket: prev_away_bucket,
            ..home_lookup
        };
        let prev_home = resolve_prev_context(record, corpus, home_lookup);
        let prev_away = resolve_prev_context(record, corpus, away_lookup);

        let home_matches = prev_home.as_ref().is_some_and(|p| p.matches_pattern);
        let away_matches = prev_away.as_ref().is_some_and(|p| p.matches_pattern);

        let keep = match query.filter_mode {
            FilterMode::Global => true,
            FilterMode::HomeStrict => {
                home_matches && wdl_satisfied(prev_home.as_ref(), prev_home_wdl)
            }
            FilterMode::AwayStrict => {
                away_matches && wdl_satisfied(prev_away.as_ref(), prev_away_wdl)
            }
        };
        if !keep {
            continue;
        }

        let mut similarity = 1u8;
        if home_matches {
            similarity += 2;
        }
        if away_matches {
            similarity += 2;
        }

        results.push(SearchResult {
            match_id: record.match_id.clone(),
            candidate: candidate(record, line, bucket),
            evaluation,
            prev_home,
            prev_away,
            h2h: resolve_h2h(record, corpus),
            h2h_movement: movement_context(record),
            similarity_score: Some(similarity),
            kickoff: record.kickoff,
        });
    }

    results.sort_by(|a, b| {
        b.similarity_score
            .cmp(&a.similarity_score)
            .then_with(|| b.kickoff.cmp(&a.kickoff))
    });
    debug!(
        target_line,
        target_bucket,
        results = results.len(),
        "pattern search complete"
    );
    results
}

fn wdl_satisfied(context: Option<&PrevContext>, target: Option<Wdl>) -> bool {
    match target {
        Some(wdl) => context.is_some_and(|p| p.wdl == Some(wdl)),
        None => true,
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PrevLookup {
    pub side: Venue,
    pub reference_line: f64,
    pub target_bucket: Option<f64>,
    pub venue_strict: bool,
}

pub(crate) fn resolve_prev_context(
    record: &MatchRecord,
    corpus: &[MatchRecord],
    lookup: PrevLookup,
) -> Option<PrevContext> {
    let (team, cached) = match lookup.side {
        Venue::Home => (&record.home, record.last_home_match.as_ref()),
        Venue::Away => (&record.away, record.last_away_match.as_ref()),
    };

    if let Some(prior) = cached.filter(|p| p.score.as_deref().and_then(parse_score).is_some()) {
        return cached_context(team, prior, lookup);
    }

    let reference = record.kickoff?;
    let venue = lookup.venue_strict.then_some(lookup.side);
    let prev = previous_match_before(team, reference, corpus, venue)?;
    let rival = if prev.is_home {
        &prev.record.away
    } else {
        &prev.record.home
    };
    build_context(
        PriorView {
            match_id: prev.record.match_id.clone(),
            rival: non_empty(rival),
            date: prev.record.display_date(),
            score: prev.record.score.as_deref()?,
            was_home: prev.is_home,
            quoted_line: prev.record.line,
        },
        lookup,
        ContextSource::Resolved,
    )
}

fn cached_context(team: &str, prior: &PriorMatch, lookup: PrevLookup) -> Option<PrevContext> {
    let team = normalize_name(team);
    let was_home = if normalize_name(&prior.away) == team {
        false
    } else if normalize_name(&prior.home) == team {
        true
    } else {
        lookup.side == Venue::Home
    };
    let rival = if was_home { &prior.away } else { &prior.home };
    build_context(
        PriorView {
            match_id: prior.match_id.clone(),
            rival: non_empty(rival),
            date: prior.date.clone(),
            score: prior.score.as_deref()?,
            was_home,
            quoted_line: prior.line,
        },
        lookup,
        ContextSource::Cached,
    )
}

struct PriorView<'a> {
    match_id: Option<String>,
    rival: Option<String>,
    date: Option<String>,
    score: &'a str,
    was_home: bool,
    quoted_line: Option<f64>,
}

fn build_context(
    prior: PriorView<'_>,
    lookup: PrevLookup,
    source: ContextSource,
) -> Option<PrevContext> {
    let (home_goals, away_goals) = parse_score(prior.score)?;
    let (team_goals, opp_goals) = if prior.was_home {
        (home_goals, away_goals)
    } else {
        (away_goals, home_goals)
    };

    let line = prior
        .quoted_line
        .map(|l| if prior.was_home { l } else { flip(l) });
    let bucket = line.map(normalize_bucket);
    let matches_pattern = matches!((bucket, lookup.target_bucket), (Some(b), Some(t)) if b == t);

    let team_reference = match lookup.side {
        Venue::Home => lookup.reference_line,
        Venue::Away => flip(lookup.reference_line),
    };
    let result = asian_result(team_goals, opp_goals, team_reference).category;

    Some(PrevContext {
        match_id: prior.match_id,
        rival: prior.rival,
        date: prior.date,
        score: prior.score.to_string(),
        was_home: prior.was_home,
        quoted_line: prior.quoted_line,
        line,
        bucket,
        wdl: get_wdl_result(prior.score, prior.was_home),
        result,
        simulated_wdl: Wdl::from_category(result),
        matches_pattern,
        source,
    })
}

pub(crate) fn resolve_h2h(record: &MatchRecord, corpus: &[MatchRecord]) -> Option<H2hMatch> {
    if let Some(cached) = &record.h2h_cached {
        return Some(cached.clone());
    }
    h2h_before(&record.home, &record.away, record.kickoff?, corpus)
}

pub(crate) fn movement_context(record: &MatchRecord) -> Option<MovementContext> {
    let precedent = record.line_precedent.as_ref()?;
    Some(MovementContext {
        movement: precedent.movement.clone(),
        direction: precedent.movement.as_deref().and_then(parse_movement),
        score: precedent.score.clone(),
        wdl: precedent
            .score
            .as_deref()
            .and_then(|s| get_wdl_result(s, true)),
    })
}

pub(crate) fn goal_evaluation(
    record: &MatchRecord,
    goal_line: Option<f64>,
) -> Option<GoalLineCategory> {
    let (home_goals, away_goals) = record.score.as_deref().and_then(parse_score)?;
    Some(goal_line_result(home_goals, away_goals, goal_line?).category)
}

pub(crate) fn candidate(record: &MatchRecord, line: f64, bucket: f64) -> Candidate {
    Candidate {
        date: record.display_date(),
        league: record.league.clone(),
        home: record.home.clone(),
        away: record.away.clone(),
        score: record.score.clone(),
        line,
        goal_line: record.goal_line,
        bucket,
    }
}

fn flip(line: f64) -> f64 {
    if line == 0.0 { 0.0 } else { -line }
}

fn non_empty(name: &str) -> Option<String> {
    let trimmed = name.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
