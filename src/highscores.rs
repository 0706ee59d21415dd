//! Per-game score book
//!
//! One book per game id: the best score ever, a top-10 table and stats
//! accumulated over every finished session. Stored as JSON through a
//! [`ScoreStore`](crate::persistence::ScoreStore).

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// What a finished session reports for bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub score: u64,
    /// Level (or snake length) reached
    pub level: u32,
    pub shots_fired: u32,
    pub hits: u32,
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    pub level: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// Top-10 table, sorted by score descending
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the table
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Rank a score would get (1-indexed), if it qualifies
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let above = self.entries.iter().take_while(|e| e.score >= score).count();
        Some(above + 1)
    }

    /// Insert a score. Ties rank below the existing entry.
    /// Returns the rank achieved, or `None` if it did not qualify.
    pub fn add_score(&mut self, score: u64, level: u32, timestamp: f64) -> Option<usize> {
        let rank = self.potential_rank(score)?;
        self.entries.insert(
            rank - 1,
            HighScoreEntry {
                score,
                level,
                timestamp,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

/// Totals over every finished session of one game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub sessions_played: u32,
    pub total_score: u64,
    pub shots_fired: u64,
    pub hits: u64,
    pub best_level: u32,
}

impl SessionStats {
    pub fn accumulate(&mut self, summary: &SessionSummary) {
        self.sessions_played += 1;
        self.total_score = self.total_score.saturating_add(summary.score);
        self.shots_fired += summary.shots_fired as u64;
        self.hits += summary.hits as u64;
        self.best_level = self.best_level.max(summary.level);
    }

    /// Lifetime accuracy percentage; 100 when nothing was fired
    pub fn accuracy(&self) -> u32 {
        if self.shots_fired == 0 {
            return 100;
        }
        ((self.hits as f64 / self.shots_fired as f64) * 100.0).round() as u32
    }
}

/// Outcome of filing a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recorded {
    /// The session beat the previous best
    pub new_high: bool,
    /// Place in the top-10 table, if it made it
    pub rank: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBook {
    pub high_score: u64,
    #[serde(default)]
    pub table: HighScores,
    #[serde(default)]
    pub stats: SessionStats,
}

impl ScoreBook {
    /// File a finished session. The stored best only ever grows.
    pub fn record(&mut self, summary: &SessionSummary, timestamp: f64) -> Recorded {
        let new_high = summary.score > self.high_score;
        self.high_score = self.high_score.max(summary.score);
        self.stats.accumulate(summary);
        let rank = self.table.add_score(summary.score, summary.level, timestamp);
        Recorded { new_high, rank }
    }
}

/// Format a timestamp as a relative date string
#[cfg(target_arch = "wasm32")]
pub fn format_date(timestamp: f64) -> String {
    format_elapsed(js_sys::Date::now() - timestamp)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn format_date(timestamp: f64) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(timestamp);
    format_elapsed(now - timestamp)
}

fn format_elapsed(diff_ms: f64) -> String {
    let mins = (diff_ms / 60_000.0).floor() as i64;
    let hours = mins / 60;
    let days = hours / 24;
    match (days, hours, mins) {
        (1, _, _) => "Yesterday".to_string(),
        (d, _, _) if d > 1 => format!("{d} days ago"),
        (_, 1, _) => "1 hour ago".to_string(),
        (_, h, _) if h > 1 => format!("{h} hours ago"),
        (_, _, 1) => "1 min ago".to_string(),
        (_, _, m) if m > 1 => format!("{m} mins ago"),
        _ => "Just now".to_string(),
    }
}
