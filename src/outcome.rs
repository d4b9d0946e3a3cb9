use serde::{Deserialize, Serialize};

use crate::corpus::MatchRecord;
use crate::handicap::is_quarter_line;

pub use crate::handicap::parse_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeCategory {
    Cover,
    Push,
    NoCover,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutcomeResult {
    // +1 win, +0.5 half win, 0 push, -0.5 half loss, -1 loss.
    pub result_code: Option<f64>,
    pub category: OutcomeCategory,
}

impl OutcomeResult {
    pub fn unknown() -> Self {
        Self {
            result_code: None,
            category: OutcomeCategory::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wdl {
    #[serde(alias = "WIN", alias = "HOME_WIN")]
    W,
    #[serde(alias = "DRAW")]
    D,
    #[serde(alias = "LOSS", alias = "AWAY_WIN")]
    L,
}

impl Wdl {
    fn from_diff(diff: i64) -> Self {
        if diff > 0 {
            Wdl::W
        } else if diff < 0 {
            Wdl::L
        } else {
            Wdl::D
        }
    }

    pub fn from_category(category: OutcomeCategory) -> Option<Self> {
        match category {
            OutcomeCategory::Cover => Some(Wdl::W),
            OutcomeCategory::Push => Some(Wdl::D),
            OutcomeCategory::NoCover => Some(Wdl::L),
            OutcomeCategory::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalLineCategory {
    Over,
    Push,
    Under,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalLineResult {
    pub result_code: Option<f64>,
    pub category: GoalLineCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverStatus {
    pub home: OutcomeCategory,
    pub away: OutcomeCategory,
    pub home_margin: Option<f64>,
    pub away_margin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<GoalLineCategory>,
}

impl CoverStatus {
    pub fn unknown() -> Self {
        Self {
            home: OutcomeCategory::Unknown,
            away: OutcomeCategory::Unknown,
            home_margin: None,
            away_margin: None,
            goals: None,
        }
    }
}

pub fn parse_score(text: &str) -> Option<(u32, u32)> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.contains('?') {
        return None;
    }
    let (home, away) = trimmed
        .split_once(':')
        .or_else(|| trimmed.split_once('-'))?;
    let home = home.trim().parse::<u32>().ok()?;
    let away = away.trim().parse::<u32>().ok()?;
    Some((home, away))
}

// Quarter lines settle as two half stakes on `line ± 0.25`, ordered so the
// first sub-line sits closer to zero.
fn sub_lines(line: f64) -> Vec<f64> {
    if is_quarter_line(line) {
        if line > 0.0 {
            vec![line - 0.25, line + 0.25]
        } else {
            vec![line + 0.25, line - 0.25]
        }
    } else {
        vec![line]
    }
}

fn settle(value_for: impl Fn(f64) -> f64, line: f64) -> Option<f64> {
    if !line.is_finite() {
        return None;
    }
    let parts = sub_lines(line);
    let total: f64 = parts
        .iter()
        .map(|sub| {
            let val = value_for(*sub);
            if val > 0.0 {
                1.0
            } else if val < 0.0 {
                -1.0
            } else {
                0.0
            }
        })
        .sum();
    Some(total / parts.len() as f64)
}

/// Settles an Asian Handicap bet on the evaluated side: `line` is that side's
/// handicap and is added to its goal difference.
pub fn asian_result(team_goals: u32, opp_goals: u32, line: f64) -> OutcomeResult {
    let diff = team_goals as f64 - opp_goals as f64;
    let Some(code) = settle(|sub| diff + sub, line) else {
        return OutcomeResult::unknown();
    };
    let category = if code > 0.0 {
        OutcomeCategory::Cover
    } else if code < 0.0 {
        OutcomeCategory::NoCover
    } else {
        OutcomeCategory::Push
    };
    OutcomeResult {
        result_code: Some(code),
        category,
    }
}

pub fn goal_line_result(home_goals: u32, away_goals: u32, line: f64) -> GoalLineResult {
    let total = home_goals as f64 + away_goals as f64;
    let Some(code) = settle(|sub| total - sub, line) else {
        return GoalLineResult {
            result_code: None,
            category: GoalLineCategory::Unknown,
        };
    };
    let category = if code > 0.0 {
        GoalLineCategory::Over
    } else if code < 0.0 {
        GoalLineCategory::Under
    } else {
        GoalLineCategory::Push
    };
    GoalLineResult {
        result_code: Some(code),
        category,
    }
}

pub fn cover_status_for_score(score: &str, home_line: f64) -> CoverStatus {
    let Some((home_goals, away_goals)) = parse_score(score) else {
        return CoverStatus::unknown();
    };
    let home = asian_result(home_goals, away_goals, home_line);
    // Lines are quoted from the home side; the away side carries the inverse.
    let away = asian_result(away_goals, home_goals, -home_line);
    CoverStatus {
        home: home.category,
        away: away.category,
        home_margin: home.result_code,
        away_margin: away.result_code,
        goals: None,
    }
}

pub fn would_cover_current_line(record: &MatchRecord, target_home_line: f64) -> CoverStatus {
    match record.score.as_deref() {
        Some(score) => cover_status_for_score(score, target_home_line),
        None => CoverStatus::unknown(),
    }
}

pub fn get_wdl_result(score: &str, is_home_perspective: bool) -> Option<Wdl> {
    let (home, away) = parse_score(score)?;
    let mut diff = home as i64 - away as i64;
    if !is_home_perspective {
        diff = -diff;
    }
    Some(Wdl::from_diff(diff))
}
