use std::env;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::explorer::DEFAULT_EXPLORE_LIMIT;

pub const DEFAULT_SEARCH_LIMIT: usize = 100;
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_path: PathBuf,
    pub search_limit: usize,
    pub explore_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data"),
            search_limit: DEFAULT_SEARCH_LIMIT,
            explore_limit: DEFAULT_EXPLORE_LIMIT,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let data_path = lookup("AH_DATA_PATH")
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);
        let limit = |key: &str, default: usize| {
            lookup(key)
                .and_then(|val| val.trim().parse::<usize>().ok())
                .unwrap_or(default)
                .max(1)
        };
        Self {
            data_path,
            search_limit: limit("AH_SEARCH_LIMIT", defaults.search_limit),
            explore_limit: limit("AH_EXPLORE_LIMIT", defaults.explore_limit),
        }
    }
}

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

pub fn init_logging() {
    let fallback = env::var("AH_LOG")
        .ok()
        .filter(|val| !val.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
