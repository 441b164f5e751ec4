use crate::app_dirs::AppDirs;
use crate::notice::Notice;
use chrono::{DateTime, Local, NaiveDate};
use itertools::Itertools;
use rusqlite::{params, Connection};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

/// Only the best N entries are retained and displayed.
pub const TOP_N: usize = 10;

/// One leaderboard row. `recorded_at` feeds the humanized "when" column.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub name: String,
    pub time_secs: f64,
    pub recorded_at: DateTime<Local>,
}

impl ScoreEntry {
    pub fn new(name: &str, time_secs: f64) -> Self {
        Self {
            name: name.to_string(),
            time_secs,
            recorded_at: Local::now(),
        }
    }
}

/// The three operations the core needs from any leaderboard backing.
pub trait ScoreStore {
    fn insert(&mut self, entry: &ScoreEntry) -> Result<(), Box<dyn Error>>;
    /// Ranked ascending by time, at most `n` rows. An empty result is
    /// valid, not an error.
    fn top(&self, n: usize) -> Result<Vec<ScoreEntry>, Box<dyn Error>>;
}

/// Shared on-disk store, one ranking per calendar day.
#[derive(Debug)]
pub struct SqliteScoreStore {
    conn: Connection,
    day: NaiveDate,
}

impl SqliteScoreStore {
    pub fn new(day: NaiveDate) -> rusqlite::Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("garble_scores.db"));
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }
        Self::open_at(&db_path, day)
    }

    pub fn open_at<P: AsRef<Path>>(path: P, day: NaiveDate) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, day)
    }

    fn with_connection(conn: Connection, day: NaiveDate) -> rusqlite::Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                time_secs REAL NOT NULL,
                day TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_scores_day_time ON scores(day, time_secs)",
            [],
        )?;
        Ok(Self { conn, day })
    }

    fn day_key(&self) -> String {
        self.day.format("%Y-%m-%d").to_string()
    }
}

impl ScoreStore for SqliteScoreStore {
    fn insert(&mut self, entry: &ScoreEntry) -> Result<(), Box<dyn Error>> {
        self.conn.execute(
            "INSERT INTO scores (name, time_secs, day, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.name,
                entry.time_secs,
                self.day_key(),
                entry.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn top(&self, n: usize) -> Result<Vec<ScoreEntry>, Box<dyn Error>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT name, time_secs, recorded_at
            FROM scores
            WHERE day = ?1
            ORDER BY time_secs ASC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![self.day_key(), n as i64], |row| {
            let recorded_str: String = row.get(2)?;
            let recorded_at = DateTime::parse_from_rfc3339(&recorded_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        2,
                        "recorded_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);
            Ok(ScoreEntry {
                name: row.get(0)?,
                time_secs: row.get(1)?,
                recorded_at,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

/// Offline store: a plain list, re-sorted and truncated to the best
/// `TOP_N` after each insert.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    entries: Vec<ScoreEntry>,
}

impl MemoryScoreStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Seeded with a few house names so the board is never blank offline.
    pub fn with_defaults() -> Self {
        let mut store = Self::default();
        for (name, secs) in [("kip", 48.2), ("mo", 67.5), ("tru", 92.1)] {
            store.entries.push(ScoreEntry::new(name, secs));
        }
        store.rerank();
        store
    }

    fn rerank(&mut self) {
        self.entries = std::mem::take(&mut self.entries)
            .into_iter()
            .sorted_by(|a, b| {
                a.time_secs
                    .partial_cmp(&b.time_secs)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .take(TOP_N)
            .collect();
    }
}

impl ScoreStore for MemoryScoreStore {
    fn insert(&mut self, entry: &ScoreEntry) -> Result<(), Box<dyn Error>> {
        self.entries.push(entry.clone());
        self.rerank();
        Ok(())
    }

    fn top(&self, n: usize) -> Result<Vec<ScoreEntry>, Box<dyn Error>> {
        Ok(self.entries.iter().take(n).cloned().collect())
    }
}

/// Read-side adapter over a `ScoreStore`.
///
/// Holds the cached top-N list, a best-effort change subscription (send a
/// unit on the notifier handle and the next poll re-fetches; a missed
/// notification only delays a refresh), and the one-shot placement flag
/// raised when the player's own fresh score lands on the board.
pub struct Leaderboard {
    store: Box<dyn ScoreStore>,
    entries: Vec<ScoreEntry>,
    changes: Receiver<()>,
    notifier: Sender<()>,
    placement: Option<usize>,
    read_warned: bool,
    pending: Option<Notice>,
}

impl Leaderboard {
    pub fn new(store: Box<dyn ScoreStore>) -> Self {
        let (notifier, changes) = mpsc::channel();
        let mut board = Self {
            store,
            entries: Vec::new(),
            changes,
            notifier,
            placement: None,
            read_warned: false,
            pending: None,
        };
        // A failure here has no screen to land on yet; stash it for the
        // first poll.
        board.pending = board.refresh();
        board
    }

    /// Handle for pushing insert notifications. Safe to drop unused, safe
    /// to fire after the board is gone (the send just fails).
    pub fn notifier(&self) -> Sender<()> {
        self.notifier.clone()
    }

    pub fn store_mut(&mut self) -> &mut dyn ScoreStore {
        self.store.as_mut()
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Drain pending change notifications; re-fetch once if any arrived.
    /// Called on tick. Delivers a stashed construction-time warning first.
    pub fn poll_changes(&mut self) -> Option<Notice> {
        if let Some(notice) = self.pending.take() {
            return Some(notice);
        }
        let mut notified = false;
        while self.changes.try_recv().is_ok() {
            notified = true;
        }
        if notified {
            self.refresh()
        } else {
            None
        }
    }

    /// Re-read the top-N list. On a store error the last good list is
    /// kept and a warning is surfaced once, not on every poll.
    pub fn refresh(&mut self) -> Option<Notice> {
        match self.store.top(TOP_N) {
            Ok(entries) => {
                self.entries = entries;
                self.read_warned = false;
                None
            }
            Err(e) => {
                if self.read_warned {
                    None
                } else {
                    self.read_warned = true;
                    Some(Notice::warning(format!("leaderboard unavailable: {e}")))
                }
            }
        }
    }

    /// After the player's own submission, check whether it made the board
    /// and remember the rank for a one-time celebratory signal.
    pub fn note_own_score(&mut self, name: &str, time_secs: f64) {
        self.placement = self
            .entries
            .iter()
            .position(|e| e.name == name && (e.time_secs - time_secs).abs() < 1e-9);
    }

    /// One-shot: the rank (0-based) the fresh score landed at, if any.
    pub fn take_placement(&mut self) -> Option<usize> {
        self.placement.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 30).unwrap()
    }

    fn memory_store() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_sqlite_insert_and_top_ordering() {
        let mut store = SqliteScoreStore::with_connection(memory_store(), day()).unwrap();
        store.insert(&ScoreEntry::new("mo", 67.5)).unwrap();
        store.insert(&ScoreEntry::new("ada", 12.3)).unwrap();
        store.insert(&ScoreEntry::new("kip", 48.2)).unwrap();

        let top = store.top(10).unwrap();
        let names: Vec<_> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["ada", "kip", "mo"]);
    }

    #[test]
    fn test_sqlite_top_respects_limit() {
        let mut store = SqliteScoreStore::with_connection(memory_store(), day()).unwrap();
        for i in 0..15 {
            store
                .insert(&ScoreEntry::new(&format!("p{i}"), 100.0 - i as f64))
                .unwrap();
        }
        assert_eq!(store.top(TOP_N).unwrap().len(), TOP_N);
    }

    #[test]
    fn test_sqlite_scopes_to_day() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.db");
        {
            let mut yesterday = SqliteScoreStore::open_at(
                &path,
                NaiveDate::from_ymd_opt(2025, 8, 29).unwrap(),
            )
            .unwrap();
            yesterday.insert(&ScoreEntry::new("old", 5.0)).unwrap();
        }
        let store = SqliteScoreStore::open_at(&path, day()).unwrap();
        assert!(store.top(10).unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_empty_board_is_ok() {
        let store = SqliteScoreStore::with_connection(memory_store(), day()).unwrap();
        assert!(store.top(10).unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_sorts_and_truncates() {
        let mut store = MemoryScoreStore::empty();
        for i in 0..14 {
            store
                .insert(&ScoreEntry::new(&format!("p{i}"), 200.0 - i as f64))
                .unwrap();
        }
        let top = store.top(TOP_N).unwrap();
        assert_eq!(top.len(), TOP_N);
        assert!(top.windows(2).all(|w| w[0].time_secs <= w[1].time_secs));
        // The slowest four never make the cut.
        assert!(top.iter().all(|e| e.time_secs < 197.0));
    }

    #[test]
    fn test_memory_store_defaults_are_ranked() {
        let store = MemoryScoreStore::with_defaults();
        let top = store.top(TOP_N).unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].name, "kip");
    }

    #[test]
    fn test_leaderboard_poll_refreshes_on_notification() {
        let mut board = Leaderboard::new(Box::new(MemoryScoreStore::empty()));
        assert!(board.entries().is_empty());

        board
            .store_mut()
            .insert(&ScoreEntry::new("ada", 12.3))
            .unwrap();
        // No notification yet, so the cached view may still be stale.
        assert!(board.poll_changes().is_none());
        assert!(board.entries().is_empty());

        board.notifier().send(()).unwrap();
        board.poll_changes();
        assert_eq!(board.entries().len(), 1);
    }

    #[test]
    fn test_placement_flag_is_one_shot() {
        let mut board = Leaderboard::new(Box::new(MemoryScoreStore::with_defaults()));
        board
            .store_mut()
            .insert(&ScoreEntry::new("ada", 12.3))
            .unwrap();
        board.refresh();
        board.note_own_score("ada", 12.3);
        assert_eq!(board.take_placement(), Some(0));
        assert_eq!(board.take_placement(), None);
    }

    #[test]
    fn test_no_placement_when_score_misses_the_board() {
        let mut board = Leaderboard::new(Box::new(MemoryScoreStore::with_defaults()));
        board.refresh();
        board.note_own_score("ada", 999.0);
        assert_eq!(board.take_placement(), None);
    }

    struct FlakyStore {
        fail: bool,
    }

    impl ScoreStore for FlakyStore {
        fn insert(&mut self, _entry: &ScoreEntry) -> Result<(), Box<dyn Error>> {
            Ok(())
        }

        fn top(&self, _n: usize) -> Result<Vec<ScoreEntry>, Box<dyn Error>> {
            if self.fail {
                Err("timeout".into())
            } else {
                Ok(vec![ScoreEntry::new("ada", 12.3)])
            }
        }
    }

    #[test]
    fn test_startup_read_failure_reaches_the_player() {
        let mut board = Leaderboard::new(Box::new(FlakyStore { fail: true }));
        let warning = board.poll_changes().expect("stashed warning surfaces");
        assert!(warning.text.contains("leaderboard unavailable"));
        assert!(board.entries().is_empty());

        // Warned once; quiet afterwards until a read succeeds.
        assert!(board.poll_changes().is_none());
        assert!(board.refresh().is_none());
    }

    #[test]
    fn test_healthy_store_has_no_startup_warning() {
        let mut board = Leaderboard::new(Box::new(FlakyStore { fail: false }));
        assert!(board.poll_changes().is_none());
        assert_eq!(board.entries().len(), 1);
    }
}
