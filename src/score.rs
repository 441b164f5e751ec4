use crate::board::{ScoreEntry, ScoreStore};
use crate::notice::Notice;
use crate::session::{GameSession, Outcome, HINT_PENALTY_MS};
use std::time::{Duration, SystemTime};

/// Total time in milliseconds: wall elapsed plus skip penalties plus the
/// flat hint penalty. Non-negative by construction and non-decreasing in
/// both penalty inputs.
pub fn total_millis(elapsed_ms: u64, penalty_ms: u64, hint_used: bool) -> u64 {
    elapsed_ms + penalty_ms + if hint_used { HINT_PENALTY_MS } else { 0 }
}

pub fn compute_total_seconds(
    finished_at: SystemTime,
    started_at: SystemTime,
    penalty_ms: u64,
    hint_used: bool,
) -> f64 {
    let elapsed = finished_at
        .duration_since(started_at)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64;
    total_millis(elapsed, penalty_ms, hint_used) as f64 / 1000.0
}

/// Final score for a finished session. `None` unless the outcome is
/// `Finished`; an abandoned run never produces a score.
pub fn session_total_seconds(session: &GameSession) -> Option<f64> {
    if session.outcome != Outcome::Finished {
        return None;
    }
    let (started, finished) = (session.started_at?, session.finished_at?);
    Some(compute_total_seconds(
        finished,
        started,
        session.penalty_ms,
        session.hint_used,
    ))
}

/// Best-effort push to the leaderboard store. A failed insert is reported
/// as a warning notice and never disturbs the local game outcome; the
/// caller still gets its game-over summary either way.
pub fn submit_score(store: &mut dyn ScoreStore, name: &str, total_secs: f64) -> Result<(), Notice> {
    let entry = ScoreEntry::new(name, total_secs);
    store.insert(&entry).map_err(|e| {
        Notice::warning(format!("score not saved: {e}"))
    })
}
