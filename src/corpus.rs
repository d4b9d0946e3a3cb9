use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::handicap::parse_line;
use crate::resolver::parse_match_date;

const HOME_KEYS: &[&str] = &["home_name", "home_team", "home"];
const AWAY_KEYS: &[&str] = &["away_name", "away_team", "away"];
// "time" is a bare clock string in scraped records and is never a date.
const DATE_KEYS: &[&str] = &["match_date", "date", "cached_at", "time_obj"];
const SCORE_KEYS: &[&str] = &["final_score", "score"];
const ID_KEYS: &[&str] = &["match_id", "id"];

#[derive(Debug, Clone, Default)]
pub struct MatchRecord {
    pub match_id: Option<String>,
    pub league: Option<String>,
    pub home: String,
    pub away: String,
    pub kickoff_raw: Option<String>,
    pub kickoff: Option<NaiveDateTime>,
    pub score: Option<String>,
    pub line: Option<f64>,
    pub goal_line: Option<f64>,
    pub last_home_match: Option<PriorMatch>,
    pub last_away_match: Option<PriorMatch>,
    pub h2h_cached: Option<H2hMatch>,
    pub line_precedent: Option<LinePrecedent>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PriorMatch {
    pub match_id: Option<String>,
    pub date: Option<String>,
    pub home: String,
    pub away: String,
    pub score: Option<String>,
    pub line: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct H2hMatch {
    pub score: Option<String>,
    pub date: Option<String>,
    pub line: Option<f64>,
    pub home_team: String,
    pub away_team: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinePrecedent {
    pub movement: Option<String>,
    pub score: Option<String>,
}

impl MatchRecord {
    pub fn new(home: &str, away: &str, kickoff: &str) -> Self {
        Self {
            home: home.to_string(),
            away: away.to_string(),
            kickoff_raw: Some(kickoff.to_string()),
            kickoff: parse_match_date(kickoff),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.match_id = Some(id.to_string());
        self
    }

    pub fn with_score(mut self, score: &str) -> Self {
        self.score = Some(normalize_score_text(score));
        self
    }

    pub fn with_line(mut self, line: f64) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_goal_line(mut self, line: f64) -> Self {
        self.goal_line = Some(line);
        self
    }

    pub fn from_value(v: &Value) -> Option<Self> {
        let home = first_str(v, HOME_KEYS)?;
        let away = first_str(v, AWAY_KEYS)?;
        let (kickoff_raw, kickoff) = first_date(v);
        let odds = v.get("main_match_odds");

        let line = odds
            .and_then(|o| first_line(o, &["ah_linea"]))
            .or_else(|| first_line(v, &["handicap", "ah_open_home"]));
        let goal_line = odds
            .and_then(|o| first_line(o, &["goals_linea"]))
            .or_else(|| first_line(v, &["goal_line"]));

        Some(Self {
            match_id: first_str(v, ID_KEYS),
            league: first_str(v, &["league_name", "league"]),
            home,
            away,
            kickoff_raw,
            kickoff,
            score: first_str(v, SCORE_KEYS).map(|s| normalize_score_text(&s)),
            line,
            goal_line,
            last_home_match: v.get("last_home_match").and_then(parse_prior_match),
            last_away_match: v.get("last_away_match").and_then(parse_prior_match),
            h2h_cached: v.get("h2h_col3").and_then(parse_cached_h2h),
            line_precedent: parse_line_precedent(v),
        })
    }

    pub fn display_date(&self) -> Option<String> {
        if let Some(kickoff) = self.kickoff {
            return Some(kickoff.format("%Y-%m-%d").to_string());
        }
        self.kickoff_raw
            .as_deref()
            .and_then(|raw| raw.split_whitespace().next())
            .map(|s| s.to_string())
    }
}

pub fn parse_corpus_json(raw: &str) -> Result<Vec<MatchRecord>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(trimmed).context("invalid corpus json")?;
    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("corpus json must be an array of match objects"))?;

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match MatchRecord::from_value(item) {
            Some(record) => out.push(record),
            None => debug!(index = idx, "skipping corpus entry without team names"),
        }
    }
    Ok(out)
}

pub fn load_corpus(path: &Path) -> Result<Vec<MatchRecord>> {
    let files = if path.is_dir() {
        let mut files = fs::read_dir(path)
            .with_context(|| format!("read corpus dir {}", path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect::<Vec<PathBuf>>();
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut corpus = Vec::new();
    for file in &files {
        let raw = fs::read_to_string(file)
            .with_context(|| format!("read corpus file {}", file.display()))?;
        let records = parse_corpus_json(&raw)
            .with_context(|| format!("parse corpus file {}", file.display()))?;
        debug!(file = %file.display(), records = records.len(), "loaded corpus file");
        corpus.extend(records);
    }
    info!(files = files.len(), records = corpus.len(), "corpus loaded");
    Ok(corpus)
}

pub fn normalize_score_text(raw: &str) -> String {
    raw.trim().replace(" - ", ":").replace('-', ":")
}

fn parse_prior_match(v: &Value) -> Option<PriorMatch> {
    if !v.is_object() {
        return None;
    }
    Some(PriorMatch {
        match_id: first_str(v, ID_KEYS),
        date: first_date(v).0,
        home: first_str(v, HOME_KEYS).unwrap_or_default(),
        away: first_str(v, AWAY_KEYS).unwrap_or_default(),
        score: first_str(v, SCORE_KEYS).map(|s| normalize_score_text(&s)),
        line: first_line(v, &["handicap_line_raw", "handicap", "ah"]),
    })
}

fn parse_cached_h2h(v: &Value) -> Option<H2hMatch> {
    if v.get("status").and_then(|s| s.as_str()) != Some("found") {
        return None;
    }
    let home_goals = v.get("goles_home").and_then(str_any)?;
    let away_goals = v.get("goles_away").and_then(str_any)?;
    Some(H2hMatch {
        score: Some(format!("{home_goals}:{away_goals}")),
        date: first_str(v, &["date"]),
        line: first_line(v, &["handicap", "ah"]),
        home_team: first_str(v, &["h2h_home_team_name", "home_team"]).unwrap_or_default(),
        away_team: first_str(v, &["h2h_away_team_name", "away_team"]).unwrap_or_default(),
    })
}

fn parse_line_precedent(v: &Value) -> Option<LinePrecedent> {
    let analysis = v.get("market_analysis_data");
    let candidates = [
        v.get("h2h_stadium"),
        v.get("h2h_general"),
        analysis.and_then(|a| a.get("stadium")),
        analysis.and_then(|a| a.get("general")),
    ];
    candidates.into_iter().flatten().find_map(|c| {
        let movement = first_str(c, &["movement"]).filter(|m| m != "N/A");
        let score = first_str(c, &["score", "result", "res1_raw"])
            .filter(|s| s != "N/A")
            .map(|s| normalize_score_text(&s));
        if movement.is_none() && score.is_none() {
            return None;
        }
        Some(LinePrecedent { movement, score })
    })
}

// First date alias that parses wins; otherwise the first present one is kept
// for display only.
fn first_date(v: &Value) -> (Option<String>, Option<NaiveDateTime>) {
    let parsed = DATE_KEYS.iter().find_map(|key| {
        let raw = v.get(*key).and_then(str_any)?;
        let kickoff = parse_match_date(&raw)?;
        Some((raw, kickoff))
    });
    match parsed {
        Some((raw, kickoff)) => (Some(raw), Some(kickoff)),
        None => (first_str(v, DATE_KEYS), None),
    }
}

fn first_str(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| v.get(*key).and_then(str_any))
}

fn first_line(v: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| v.get(*key).and_then(line_any))
}

fn str_any(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn line_any(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return n.is_finite().then_some(n);
    }
    parse_line(v.as_str()?)
}
