use std::env;
use std::path::PathBuf;

use crate::catalog;
use crate::persist::app_cache_dir;
use crate::warehouse::is_table_key;

const DEFAULT_DB_FILE: &str = "warehouse.sqlite";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_MINUTES: u32 = 4200;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: Option<PathBuf>,
    pub leagues: Vec<String>,
    pub seasons: Vec<String>,
    pub min_minutes: u32,
    pub preload_threads: usize,
    pub llm: LlmConfig,
    pub summary_examples: Option<PathBuf>,
}

/// Load `.env.local` then `.env`; values already in the environment win.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let leagues = non_empty("VAEP_LEAGUES")
            .map(|raw| parse_key_list(&raw, catalog::league_key))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| {
                catalog::LEAGUES
                    .iter()
                    .map(|(_, k)| k.to_string())
                    .collect()
            });
        let seasons = non_empty("VAEP_SEASONS")
            .map(|raw| parse_key_list(&raw, catalog::season_key))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| {
                catalog::SEASONS
                    .iter()
                    .map(|(_, k)| k.to_string())
                    .collect()
            });

        let min_minutes = non_empty("VAEP_MIN_MINUTES")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0)
            .min(MAX_MINUTES);
        let preload_threads = non_empty("VAEP_PRELOAD_THREADS")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(4)
            .clamp(1, 16);

        Self {
            db_path: non_empty("VAEP_DB").map(PathBuf::from),
            leagues,
            seasons,
            min_minutes,
            preload_threads,
            llm: LlmConfig {
                api_key: non_empty("OPENAI_API_KEY"),
                model: non_empty("OPENAI_MODEL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                base_url: non_empty("OPENAI_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            },
            summary_examples: non_empty("SUMMARY_EXAMPLES").map(PathBuf::from),
        }
    }

    pub fn resolved_db_path(&self) -> Option<PathBuf> {
        self.db_path.clone().or_else(default_db_path)
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DEFAULT_DB_FILE))
}

/// Comma separated display names or keys. Entries that are neither a catalog
/// entry nor a valid table key are dropped.
fn parse_key_list(raw: &str, resolve: fn(&str) -> Option<&'static str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let key = match resolve(part) {
            Some(key) => key.to_string(),
            None if is_table_key(part) => part.to_string(),
            None => continue,
        };
        if !out.contains(&key) {
            out.push(key);
        }
    }
    out
}
