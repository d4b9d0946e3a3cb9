use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::corpus::{H2hMatch, MatchRecord};

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Home,
    Away,
}

#[derive(Debug, Clone, Copy)]
pub struct PreviousMatch<'a> {
    pub record: &'a MatchRecord,
    pub date: NaiveDateTime,
    pub is_home: bool,
}

/// Tolerant kickoff parsing: date-only, "date time" and ISO "dateTtime"
/// forms, in that order. Date-only values are taken as midnight.
pub fn parse_match_date(text: &str) -> Option<NaiveDateTime> {
    let normalized = text.trim().replace('/', "-");
    if normalized.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(&normalized)
        .ok()
        .map(|dt| dt.naive_utc())
}

pub fn get_previous_match<'a>(
    team: &str,
    reference_date: &str,
    corpus: &'a [MatchRecord],
    required_venue: Option<Venue>,
) -> Option<PreviousMatch<'a>> {
    let reference = parse_match_date(reference_date)?;
    previous_match_before(team, reference, corpus, required_venue)
}

pub fn previous_match_before<'a>(
    team: &str,
    reference: NaiveDateTime,
    corpus: &'a [MatchRecord],
    required_venue: Option<Venue>,
) -> Option<PreviousMatch<'a>> {
    let team = normalize_name(team);
    if team.is_empty() {
        return None;
    }

    let mut best: Option<PreviousMatch<'a>> = None;
    for record in corpus {
        let Some(date) = record.kickoff else {
            continue;
        };
        if date >= reference {
            continue;
        }
        let is_home = normalize_name(&record.home) == team;
        let is_away = normalize_name(&record.away) == team;
        if !is_home && !is_away {
            continue;
        }
        match required_venue {
            Some(Venue::Home) if !is_home => continue,
            Some(Venue::Away) if !is_away => continue,
            _ => {}
        }
        if best
            .as_ref()
            .is_none_or(|b| is_newer(date, record, b.date, b.record))
        {
            best = Some(PreviousMatch {
                record,
                date,
                is_home,
            });
        }
    }
    best
}

pub fn get_h2h_history(
    home: &str,
    away: &str,
    reference_date: &str,
    corpus: &[MatchRecord],
) -> Option<H2hMatch> {
    let reference = parse_match_date(reference_date)?;
    h2h_before(home, away, reference, corpus)
}

pub fn h2h_before(
    home: &str,
    away: &str,
    reference: NaiveDateTime,
    corpus: &[MatchRecord],
) -> Option<H2hMatch> {
    let home = normalize_name(home);
    let away = normalize_name(away);
    if home.is_empty() || away.is_empty() {
        return None;
    }

    let mut best: Option<(NaiveDateTime, &MatchRecord)> = None;
    for record in corpus {
        let Some(date) = record.kickoff else {
            continue;
        };
        if date >= reference {
            continue;
        }
        let rh = normalize_name(&record.home);
        let ra = normalize_name(&record.away);
        let same_pair = (rh == home && ra == away) || (rh == away && ra == home);
        if !same_pair {
            continue;
        }
        if best
            .as_ref()
            .is_none_or(|(best_date, best_record)| is_newer(date, record, *best_date, best_record))
        {
            best = Some((date, record));
        }
    }

    best.map(|(date, record)| H2hMatch {
        score: record.score.clone(),
        date: Some(date.format("%Y-%m-%d").to_string()),
        line: record.line,
        home_team: record.home.clone(),
        away_team: record.away.clone(),
    })
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// Same-date ties: a larger numeric id wins, then any id over none; otherwise
// the earlier corpus entry is kept.
fn is_newer(
    date: NaiveDateTime,
    record: &MatchRecord,
    best_date: NaiveDateTime,
    best: &MatchRecord,
) -> bool {
    if date != best_date {
        return date > best_date;
    }
    id_rank(record) > id_rank(best)
}

fn id_rank(record: &MatchRecord) -> (u8, u64) {
    match record.match_id.as_deref() {
        Some(id) => match id.trim().parse::<u64>() {
            Ok(n) => (2, n),
            Err(_) => (1, 0),
        },
        None => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_date_forms() {
        let midnight = parse_match_date("2024-01-10").expect("date only");
        assert_eq!(midnight.format("%H:%M").to_string(), "00:00");
        assert!(parse_match_date("2024-01-10 18:45:00").is_some());
        assert!(parse_match_date("2024-01-10T18:45:00").is_some());
        assert!(parse_match_date("2024/01/10 18:45:00").is_some());
        assert!(parse_match_date("2024-01-10 18:45").is_some());
        assert!(parse_match_date("2024-01-10T18:45:00.250").is_some());
        assert!(parse_match_date("2024-01-10T18:45:00Z").is_some());
        assert!(parse_match_date("10 Jan 2024").is_none());
        assert!(parse_match_date("").is_none());
    }

    #[test]
    fn same_day_ties_prefer_larger_numeric_id() {
        let corpus = vec![
            MatchRecord::new("A", "B", "2024-01-05").with_id("900"),
            MatchRecord::new("A", "C", "2024-01-05").with_id("1200"),
            MatchRecord::new("D", "A", "2024-01-05"),
        ];
        let prev = get_previous_match("A", "2024-01-06", &corpus, None).expect("prev");
        assert_eq!(prev.record.match_id.as_deref(), Some("1200"));
    }

    #[test]
    fn same_day_ties_without_ids_keep_corpus_order() {
        let corpus = vec![
            MatchRecord::new("A", "B", "2024-01-05"),
            MatchRecord::new("C", "A", "2024-01-05"),
        ];
        let prev = get_previous_match("A", "2024-01-06", &corpus, None).expect("prev");
        assert_eq!(prev.record.away, "B");
        assert!(prev.is_home);
    }
}
