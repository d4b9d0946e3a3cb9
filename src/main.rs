use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tracing::info;

use ah_patterns::backtest::{run_batch, summarize};
use ah_patterns::config::{self, Config};
use ah_patterns::corpus::{MatchRecord, load_corpus};
use ah_patterns::explorer::{ExploreFilters, explore_matches};
use ah_patterns::favorite::favorite_context;
use ah_patterns::pattern_search::{PatternQuery, SearchResult, find_similar_patterns};

const USAGE: &str = "usage:
  ah_patterns search --query <file> [--data <path>] [--limit N]
  ah_patterns explore [--filters <file>] [--data <path>] [--limit N]
  ah_patterns favorite --match-id <id> [--data <path>] [--limit N]
  ah_patterns batch [--data <path>] [--limit N]";

#[derive(Serialize)]
struct SearchOutput<'a, C: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<C>,
    summary: ah_patterns::backtest::BacktestSummary,
    results: &'a [SearchResult],
}

fn main() -> Result<()> {
    config::load_dotenv();
    config::init_logging();
    let config = Config::from_env();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some(command) = args.first() else {
        println!("{USAGE}");
        return Ok(());
    };
    let rest = &args[1..];
    let data_path = flag_value(rest, "--data")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data_path.clone());

    match command.as_str() {
        "search" => {
            let query_path = flag_value(rest, "--query").context("search needs --query <file>")?;
            let query: PatternQuery = read_json(Path::new(&query_path))?;
            let limit = limit_arg(rest)?.unwrap_or(config.search_limit);
            let corpus = load(&data_path)?;
            let results = find_similar_patterns(&query, &corpus);
            print_search(None::<()>, &results, limit)
        }
        "explore" => {
            let mut filters: ExploreFilters = match flag_value(rest, "--filters") {
                Some(path) => read_json(Path::new(&path))?,
                None => ExploreFilters::default(),
            };
            filters.limit = limit_arg(rest)?
                .or(filters.limit)
                .or(Some(config.explore_limit));
            let corpus = load(&data_path)?;
            let results = explore_matches(&corpus, &filters);
            print_json(&results)
        }
        "favorite" => {
            let match_id =
                flag_value(rest, "--match-id").context("favorite needs --match-id <id>")?;
            let limit = limit_arg(rest)?.unwrap_or(config.search_limit);
            let corpus = load(&data_path)?;
            let record = corpus
                .iter()
                .find(|r| r.match_id.as_deref() == Some(match_id.as_str()))
                .with_context(|| format!("match {match_id} not found in corpus"))?;
            let context = favorite_context(record, &corpus)
                .with_context(|| format!("match {match_id} has no handicap line"))?;
            let results = find_similar_patterns(&context.to_query(), &corpus);
            print_search(Some(context), &results, limit)
        }
        "batch" => {
            let limit = limit_arg(rest)?.unwrap_or(config.search_limit);
            let corpus = load(&data_path)?;
            let entries = run_batch(&corpus, limit);
            info!(fixtures = entries.len(), "batch complete");
            print_json(&entries)
        }
        "help" | "--help" | "-h" => {
            println!("{USAGE}");
            Ok(())
        }
        other => Err(anyhow!("unknown command {other:?}\n{USAGE}")),
    }
}

fn load(path: &Path) -> Result<Vec<MatchRecord>> {
    load_corpus(path).with_context(|| format!("load corpus from {}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

fn print_search<C: Serialize>(
    context: Option<C>,
    results: &[SearchResult],
    limit: usize,
) -> Result<()> {
    let output = SearchOutput {
        context,
        summary: summarize(results),
        results: &results[..results.len().min(limit)],
    };
    print_json(&output)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("render output json")?;
    println!("{rendered}");
    Ok(())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn limit_arg(args: &[String]) -> Result<Option<usize>> {
    let Some(raw) = flag_value(args, "--limit") else {
        return Ok(None);
    };
    let limit = raw
        .parse::<usize>()
        .with_context(|| format!("invalid --limit {raw:?}"))?;
    Ok(Some(limit.max(1)))
}
