use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CACHE_DIR: &str = "vaep_scout";
const SUMMARY_FILE: &str = "summaries.json";
const CACHE_VERSION: u32 = 1;

/// `$XDG_CACHE_HOME/vaep_scout`, falling back to `~/.cache/vaep_scout`.
pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

pub fn default_summary_cache_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(SUMMARY_FILE))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub text: String,
    pub model: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SummaryCacheFile {
    version: u32,
    entries: HashMap<String, SummaryEntry>,
}

/// Generated player summaries keyed by request digest, persisted as one JSON file.
#[derive(Debug)]
pub struct SummaryCache {
    path: Option<PathBuf>,
    file: SummaryCacheFile,
}

impl SummaryCache {
    /// Cache that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            file: SummaryCacheFile {
                version: CACHE_VERSION,
                entries: HashMap::new(),
            },
        }
    }

    /// Load from `path`. A missing, unreadable or outdated file starts empty.
    pub fn open(path: PathBuf) -> Self {
        let file = load_cache_file(&path).unwrap_or_else(|| SummaryCacheFile {
            version: CACHE_VERSION,
            entries: HashMap::new(),
        });
        Self {
            path: Some(path),
            file,
        }
    }

    pub fn get(&self, key: &str) -> Option<&SummaryEntry> {
        self.file.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.file.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.entries.is_empty()
    }

    pub fn insert(&mut self, key: String, text: String, model: String) -> Result<()> {
        let created_at = system_time_to_secs(SystemTime::now()).unwrap_or_default();
        self.file.entries.insert(
            key,
            SummaryEntry {
                text,
                model,
                created_at,
            },
        );
        self.save()
    }

    fn save(&self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create cache dir {}", dir.display()))?;
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(&self.file).context("serialize summary cache")?;
        fs::write(&tmp, json).context("write summary cache")?;
        fs::rename(&tmp, path).context("swap summary cache")?;
        Ok(())
    }
}

fn load_cache_file(path: &Path) -> Option<SummaryCacheFile> {
    let raw = fs::read_to_string(path).ok()?;
    let cache = serde_json::from_str::<SummaryCacheFile>(&raw).ok()?;
    if cache.version != CACHE_VERSION {
        return None;
    }
    Some(cache)
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
