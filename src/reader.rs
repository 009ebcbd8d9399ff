//! Consumer side of the latest-snapshot file.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use serde_json::Value as Json;
use tracing::warn;

/// Floor applied to the configured freshness window.
pub const MIN_MAX_AGE_MS: i64 = 250;
const WARN_EVERY: Duration = Duration::from_secs(10);

/// Polls the snapshot file, re-reading only when its mtime changes, and hands
/// back the cached document while it is fresh.
#[derive(Debug)]
pub struct TelemetryReader {
    path: PathBuf,
    max_age_ms: i64,
    last_modified: Option<SystemTime>,
    cached: Option<Json>,
    last_warn: Option<Instant>,
}

impl TelemetryReader {
    pub fn new(path: impl Into<PathBuf>, max_age_ms: i64) -> Self {
        Self {
            path: path.into(),
            max_age_ms,
            last_modified: None,
            cached: None,
            last_warn: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Latest document, or `None` when missing, unparseable or older than
    /// the freshness window at `now_ms`.
    pub fn latest(&mut self, now_ms: i64) -> Option<Json> {
        let modified = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => {
                warn_throttled(&mut self.last_warn, &format!("telemetry file not found at {}", self.path.display()));
                return None;
            }
        };

        if self.last_modified != Some(modified) {
            match std::fs::read_to_string(&self.path) {
                Ok(text) => {
                    if let Some(doc) = parse_latest_document(&text) {
                        self.cached = Some(doc);
                        self.last_modified = Some(modified);
                    }
                }
                Err(_) => warn_throttled(&mut self.last_warn, &format!("failed to read {}", self.path.display())),
            }
        }

        let doc = self.cached.as_ref()?;
        if let Some(ts) = doc.get("timestampMs").and_then(Json::as_i64).filter(|ts| *ts > 0) {
            if now_ms.saturating_sub(ts) > self.max_age_ms.max(MIN_MAX_AGE_MS) {
                return None;
            }
        }
        Some(doc.clone())
    }
}

fn warn_throttled(last_warn: &mut Option<Instant>, message: &str) {
    if last_warn.is_some_and(|at| at.elapsed() < WARN_EVERY) {
        return;
    }
    *last_warn = Some(Instant::now());
    warn!("{}", message);
}

/// The whole text as one JSON object, else the last line that is one.
pub fn parse_latest_document(text: &str) -> Option<Json> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(doc @ Json::Object(_)) = serde_json::from_str::<Json>(text) {
        return Some(doc);
    }
    text.lines()
        .rev()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find_map(|line| match serde_json::from_str::<Json>(line) {
            Ok(doc @ Json::Object(_)) => Some(doc),
            _ => None,
        })
}
