//! JSON data loader.
//!
//! Market data acquisition lives outside this crate. Collaborators drop
//! normalized JSON files on disk and this loader turns them into the type
//! system:
//! - `{data_dir}/history/{TICKER}.json`: array of daily bars
//! - snapshot files: one `MarketSnapshot` object
//! - chain files: array of `OptionContract` rows

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::types::{DailyBar, MarketSnapshot, OptionContract};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of daily bars for a ticker.
pub trait HistoryProvider: Send + Sync {
    /// Daily bars in ascending date order.
    fn daily_bars(&self, ticker: &str) -> Result<Vec<DailyBar>, LoaderError>;
}

/// File-backed loader for snapshots, chains and daily history.
#[derive(Debug, Clone)]
pub struct DataLoader {
    data_dir: PathBuf,
}

impl DataLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn history_path(&self, ticker: &str) -> PathBuf {
        self.data_dir
            .join("history")
            .join(format!("{}.json", ticker.to_uppercase()))
    }

    /// Tickers with a history file.
    pub fn available_tickers(&self) -> Result<Vec<String>, LoaderError> {
        let dir = self.data_dir.join("history");
        if !dir.exists() {
            return Ok(vec![]);
        }

        let mut tickers = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem() {
                    tickers.push(stem.to_string_lossy().to_string());
                }
            }
        }
        tickers.sort();
        Ok(tickers)
    }

    /// Load and sort the daily history for a ticker.
    pub fn load_history(&self, ticker: &str) -> Result<Vec<DailyBar>, LoaderError> {
        let path = self.history_path(ticker);
        normalize_history(ticker, read_json(&path)?)
    }
}

impl HistoryProvider for DataLoader {
    fn daily_bars(&self, ticker: &str) -> Result<Vec<DailyBar>, LoaderError> {
        self.load_history(ticker)
    }
}

/// Read a market snapshot file.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<MarketSnapshot, LoaderError> {
    let snapshot: MarketSnapshot = read_json(path.as_ref())?;
    if !snapshot.has_valid_price() {
        return Err(LoaderError::InvalidData(format!(
            "{}: spot price must be positive",
            snapshot.ticker
        )));
    }
    Ok(snapshot)
}

/// Read an option chain file. Row order is preserved.
pub fn load_chain(path: impl AsRef<Path>) -> Result<Vec<OptionContract>, LoaderError> {
    read_json(path.as_ref())
}

/// Read a bare history file (array of daily bars).
///
/// Bars are checked, sorted and deduplicated like directory history.
pub fn load_history_file(path: impl AsRef<Path>) -> Result<Vec<DailyBar>, LoaderError> {
    let path = path.as_ref();
    normalize_history(&path.display().to_string(), read_json(path)?)
}

/// Reject unusable closes, then sort by date keeping the first bar per date.
fn normalize_history(source: &str, mut bars: Vec<DailyBar>) -> Result<Vec<DailyBar>, LoaderError> {
    if bars.iter().any(|b| !b.close.is_finite() || b.close <= 0.0) {
        return Err(LoaderError::InvalidData(format!(
            "{}: non-positive close in history",
            source
        )));
    }

    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    debug!(source, bars = bars.len(), "Loaded history");
    Ok(bars)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoaderError> {
    if !path.exists() {
        return Err(LoaderError::FileNotFound(path.display().to_string()));
    }
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|source| LoaderError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// History held in memory, keyed by ticker.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    bars: HashMap<String, Vec<DailyBar>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticker(mut self, ticker: &str, bars: Vec<DailyBar>) -> Self {
        self.insert(ticker, bars);
        self
    }

    pub fn insert(&mut self, ticker: &str, mut bars: Vec<DailyBar>) {
        bars.sort_by_key(|b| b.date);
        self.bars.insert(ticker.to_uppercase(), bars);
    }
}

impl HistoryProvider for InMemoryHistory {
    fn daily_bars(&self, ticker: &str) -> Result<Vec<DailyBar>, LoaderError> {
        self.bars
            .get(&ticker.to_uppercase())
            .cloned()
            .ok_or_else(|| LoaderError::FileNotFound(format!("no history for {}", ticker)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("options-signals-{}-{}", name, std::process::id()));
        fs::create_dir_all(dir.join("history")).unwrap();
        dir
    }

    #[test]
    fn test_history_path() {
        let loader = DataLoader::new("data");
        assert_eq!(
            loader.history_path("petr4"),
            PathBuf::from("data/history/PETR4.json")
        );
    }

    #[test]
    fn test_load_history_sorts_and_dedups() {
        let dir = scratch_dir("history");
        fs::write(
            dir.join("history/PETR4.json"),
            r#"[
                {"date": "2024-01-03", "close": 37.9},
                {"date": "2024-01-02", "close": 37.5},
                {"date": "2024-01-03", "close": 37.9}
            ]"#,
        )
        .unwrap();

        let loader = DataLoader::new(&dir);
        let bars = loader.daily_bars("PETR4").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(loader.available_tickers().unwrap(), vec!["PETR4".to_string()]);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_history_file_is_normalized() {
        let dir = scratch_dir("history-file");
        let path = dir.join("bars.json");
        fs::write(
            &path,
            r#"[
                {"date": "2024-01-04", "close": 38.2},
                {"date": "2024-01-02", "close": 37.5},
                {"date": "2024-01-04", "close": 99.0},
                {"date": "2024-01-03", "close": 37.9}
            ]"#,
        )
        .unwrap();

        let bars = load_history_file(&path).unwrap();
        let dates: Vec<u32> = bars.iter().map(|b| b.date.day()).collect();
        assert_eq!(dates, vec![2, 3, 4]);
        assert_eq!(bars[2].close, 38.2);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_history_file_rejects_bad_close() {
        let dir = scratch_dir("history-bad");
        let path = dir.join("bars.json");
        for close in ["0.0", "-1.5"] {
            let json = format!(
                r#"[
                    {{"date": "2024-01-02", "close": 37.5}},
                    {{"date": "2024-01-03", "close": {}}}
                ]"#,
                close
            );
            fs::write(&path, json).unwrap();
            assert!(matches!(load_history_file(&path), Err(LoaderError::InvalidData(_))));
        }

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_history() {
        let loader = DataLoader::new("/nonexistent/options-signals");
        assert!(matches!(
            loader.daily_bars("VALE3"),
            Err(LoaderError::FileNotFound(_))
        ));
        assert!(loader.available_tickers().unwrap().is_empty());
    }

    #[test]
    fn test_load_snapshot_rejects_bad_price() {
        let dir = scratch_dir("snapshot");
        let path = dir.join("snapshot.json");
        fs::write(&path, r#"{"ticker": "PETR4", "price": 0.0, "rsi": 50.0}"#).unwrap();
        assert!(matches!(load_snapshot(&path), Err(LoaderError::InvalidData(_))));

        fs::write(&path, r#"{"ticker": "PETR4", "price": "abc"}"#).unwrap();
        assert!(matches!(load_snapshot(&path), Err(LoaderError::Json { .. })));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_in_memory_history() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let provider = InMemoryHistory::new().with_ticker("bbas3", vec![DailyBar::new(day, 27.4)]);
        assert_eq!(provider.daily_bars("BBAS3").unwrap().len(), 1);
        assert!(provider.daily_bars("ITUB4").is_err());
    }
}
