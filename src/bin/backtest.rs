use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use ah_patterns::backtest::{SideTally, summarize};
use ah_patterns::config;
use ah_patterns::corpus::load_corpus;
use ah_patterns::handicap::format_line;
use ah_patterns::pattern_search::{PatternQuery, find_similar_patterns};

#[derive(Debug, serde::Deserialize)]
struct BacktestCase {
    #[serde(default)]
    name: Option<String>,
    data: PathBuf,
    query: PatternQuery,
    #[serde(default)]
    show: Option<usize>,
}

fn main() -> Result<()> {
    config::load_dotenv();
    config::init_logging();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/backtest_case.json"));

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let case: BacktestCase =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;

    let base = path.parent().unwrap_or(Path::new("."));
    let corpus = load_corpus(&base.join(&case.data))?;
    let results = find_similar_patterns(&case.query, &corpus);
    let summary = summarize(&results);

    println!("Case: {}", case.name.as_deref().unwrap_or("backtest"));
    if let Some(line) = case.query.target_line.as_ref().and_then(|l| l.value()) {
        println!("Target line: {}", format_line(line));
    }
    println!("Corpus: {} matches", corpus.len());
    println!("Samples: {}", summary.samples);
    print_side("Home", &summary.home);
    print_side("Away", &summary.away);
    if let Some(goals) = summary.goals {
        println!(
            "Goals: over {} / push {} / under {} ({})",
            goals.over,
            goals.push,
            goals.under,
            pct(summary.over_rate)
        );
    }

    for result in results.iter().take(case.show.unwrap_or(5)) {
        println!(
            "  [{}] {} {} vs {} {} (line {}) home={:?} away={:?}",
            result.similarity_score.unwrap_or_default(),
            result.candidate.date.as_deref().unwrap_or("n/a"),
            result.candidate.home,
            result.candidate.away,
            result.candidate.score.as_deref().unwrap_or("n/a"),
            format_line(result.candidate.line),
            result.evaluation.home,
            result.evaluation.away,
        );
    }

    Ok(())
}

fn print_side(label: &str, tally: &SideTally) {
    println!(
        "{label}: cover {} / push {} / no cover {} / unknown {} (cover {}, push {})",
        tally.cover,
        tally.push,
        tally.no_cover,
        tally.unknown,
        pct(tally.cover_rate()),
        pct(tally.push_rate()),
    );
}

fn pct(rate: Option<f64>) -> String {
    rate.map(|r| format!("{r:.1}%"))
        .unwrap_or_else(|| "n/a".to_string())
}
