use serde::{Deserialize, Serialize};

/// Buckets at or beyond this magnitude are treated as one "heavy favourite" tier.
pub const HEAVY_TIER: f64 = 2.5;

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineInput {
    Number(f64),
    Text(String),
}

impl LineInput {
    pub fn value(&self) -> Option<f64> {
        match self {
            LineInput::Number(n) => n.is_finite().then_some(*n),
            LineInput::Text(text) => parse_line(text),
        }
    }
}

impl From<f64> for LineInput {
    fn from(line: f64) -> Self {
        LineInput::Number(line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Movement {
    Up,
    Down,
    Same,
}

/// Maps a line onto its half-line bucket: integers stay put, any fractional
/// part (.25/.5/.75) collapses to `.5` of the same integer, sign preserved.
pub fn normalize_bucket(line: f64) -> f64 {
    if line.fract().abs() < EPS {
        return line.trunc();
    }
    let sign = if line < 0.0 { -1.0 } else { 1.0 };
    sign * (line.abs().floor() + 0.5)
}

pub fn bucket_matches(target_bucket: f64, candidate_bucket: f64) -> bool {
    if target_bucket >= HEAVY_TIER {
        candidate_bucket >= HEAVY_TIER
    } else if target_bucket <= -HEAVY_TIER {
        candidate_bucket <= -HEAVY_TIER
    } else {
        (target_bucket - candidate_bucket).abs() < EPS
    }
}

pub fn is_quarter_line(line: f64) -> bool {
    ((line.abs() % 0.5) - 0.25).abs() < EPS
}

/// Parses a quoted handicap: plain decimals ("-0.75", "+1", "0,5") or split
/// notation ("0/0.5", "-1/1.5"). Split halves always share the sign of the
/// first half.
pub fn parse_line(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| match ch {
            '−' => '-',
            ',' => '.',
            other => other,
        })
        .collect();
    if cleaned.is_empty() || cleaned == "-" || cleaned == "?" || cleaned.eq_ignore_ascii_case("n/a")
    {
        return None;
    }

    let Some((first, second)) = cleaned.split_once('/') else {
        return parse_decimal(&cleaned);
    };
    if second.contains('/') {
        return None;
    }
    let a = parse_decimal(first)?;
    let mut b = parse_decimal(second)?;
    // "-0/0.5" is a negative split even though -0.0 == 0.0.
    if a.is_sign_negative() && b > 0.0 && !second.starts_with('-') {
        b = -b;
    }
    Some((a + b) / 2.0)
}

fn parse_decimal(raw: &str) -> Option<f64> {
    let body = raw.strip_prefix('+').unwrap_or(raw);
    let digits = body.strip_prefix('-').unwrap_or(body);
    if digits.is_empty()
        || digits.starts_with('.')
        || !digits.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
        || digits.matches('.').count() > 1
    {
        return None;
    }
    body.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn format_line(line: f64) -> String {
    let quarter = (line.abs() * 4.0).round() / 4.0;
    if quarter == 0.0 {
        return "0".to_string();
    }
    let sign = if line < 0.0 { "-" } else { "" };
    if quarter.fract() == 0.0 {
        return format!("{sign}{}", quarter as i64);
    }
    let body = format!("{quarter:.2}");
    let body = body.trim_end_matches('0').trim_end_matches('.');
    format!("{sign}{body}")
}

pub fn parse_movement(text: &str) -> Option<Movement> {
    let (from, to) = text
        .split_once("->")
        .or_else(|| text.split_once('→'))?;
    let from = parse_line(from)?;
    let to = parse_line(to)?;
    if (to - from).abs() < EPS {
        Some(Movement::Same)
    } else if to > from {
        Some(Movement::Up)
    } else {
        Some(Movement::Down)
    }
}
