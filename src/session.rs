use crate::phrase::Phrase;
use std::collections::HashSet;
use std::time::{Duration, SystemTime};

/// Flat penalty for skipping a phrase.
pub const SKIP_PENALTY_MS: u64 = 10_000;
/// Flat once-per-session penalty for using a hint, applied at finish.
pub const HINT_PENALTY_MS: u64 = 5_000;
/// How long the wrong-guess flash stays up before it self-clears.
pub const WRONG_FLASH_MS: u64 = 500;
/// How long a skipped answer stays revealed before the advance; the game
/// loop schedules the delivery, the session only honors it.
pub const REVEAL_DELAY_MS: u64 = 2_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    NotStarted,
    InProgress,
    Finished,
    GaveUp,
}

/// One player's run through the day's phrases.
///
/// Timed transitions take an explicit `now` so the machine can be driven
/// by the 50ms tick in production and by synthetic clocks in tests.
/// Terminal outcomes are absorbing: once `Finished` or `GaveUp`, every
/// transition is a no-op. While `revealed_answer` is set the session is
/// in a skip's reveal window: input is ignored until the caller delivers
/// `advance_after_reveal`.
#[derive(Debug)]
pub struct GameSession {
    pub player: String,
    phrases: Vec<Phrase>,
    pub current: usize,
    pub guess: String,
    pub started_at: Option<SystemTime>,
    pub finished_at: Option<SystemTime>,
    pub penalty_ms: u64,
    pub hint_used: bool,
    pub skipped: HashSet<usize>,
    pub revealed_answer: Option<String>,
    wrong_guess_at: Option<SystemTime>,
    pub outcome: Outcome,
}

impl GameSession {
    pub fn new(phrases: Vec<Phrase>) -> Self {
        Self {
            player: String::new(),
            phrases,
            current: 0,
            guess: String::new(),
            started_at: None,
            finished_at: None,
            penalty_ms: 0,
            hint_used: false,
            skipped: HashSet::new(),
            revealed_answer: None,
            wrong_guess_at: None,
            outcome: Outcome::NotStarted,
        }
    }

    /// Begin the run. Blocked by an empty (or whitespace) name; nothing
    /// else is touched in that case. `started_at` is stamped by the first
    /// tick after this, not here.
    pub fn start(&mut self, name: &str) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty() || self.outcome != Outcome::NotStarted {
            return false;
        }
        self.player = trimmed.to_string();
        self.outcome = Outcome::InProgress;
        true
    }

    /// Periodic clock. Stamps the start time and expires the wrong-guess
    /// flash. No-op once terminal.
    pub fn tick(&mut self, now: SystemTime) {
        if self.outcome != Outcome::InProgress {
            return;
        }
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if let Some(at) = self.wrong_guess_at {
            if elapsed_ms(at, now) >= WRONG_FLASH_MS {
                self.wrong_guess_at = None;
            }
        }
    }

    pub fn current_phrase(&self) -> Option<&Phrase> {
        self.phrases.get(self.current)
    }

    pub fn phrase_count(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.outcome, Outcome::Finished | Outcome::GaveUp)
    }

    fn accepts_input(&self) -> bool {
        self.outcome == Outcome::InProgress
            && self.current_phrase().is_some()
            && self.revealed_answer.is_none()
    }

    pub fn push_char(&mut self, c: char) {
        if self.accepts_input() {
            self.guess.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.accepts_input() {
            self.guess.pop();
        }
    }

    /// Compare the guess buffer against the current answer. A match
    /// advances (or finishes); a miss raises the transient wrong-guess
    /// flash and leaves everything else alone. Returns whether it matched.
    pub fn submit_guess(&mut self, now: SystemTime) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let matched = self
            .current_phrase()
            .is_some_and(|p| p.matches(&self.guess));
        if matched {
            self.advance_or_finish(now);
        } else {
            self.wrong_guess_at = Some(now);
        }
        matched
    }

    pub fn wrong_flash_active(&self, now: SystemTime) -> bool {
        self.wrong_guess_at
            .is_some_and(|at| elapsed_ms(at, now) < WRONG_FLASH_MS)
    }

    /// Surface the current phrase's hint. The penalty is a flat 5s per
    /// session, so repeated calls are idempotent: the flag stays set and
    /// the contribution never grows.
    pub fn use_hint(&mut self) -> Option<String> {
        if !self.accepts_input() {
            return None;
        }
        self.hint_used = true;
        self.current_phrase().map(Phrase::hint_text)
    }

    /// Pass on the current phrase for a 10s penalty. The answer is
    /// revealed and the session waits; the caller schedules an
    /// `advance_after_reveal` delivery `REVEAL_DELAY_MS` later. Returns
    /// whether the skip was applied.
    pub fn skip(&mut self) -> bool {
        if !self.accepts_input() {
            return false;
        }
        self.penalty_ms += SKIP_PENALTY_MS;
        self.skipped.insert(self.current);
        self.revealed_answer = self.current_phrase().map(|p| p.answer.clone());
        true
    }

    /// End a skip's reveal window: the same advance-or-finish transition
    /// as a correct guess. Ignored outside a reveal window, so a stale
    /// delivery after give-up (or after the window already closed) is
    /// harmless.
    pub fn advance_after_reveal(&mut self, now: SystemTime) {
        if self.outcome == Outcome::InProgress && self.revealed_answer.is_some() {
            self.advance_or_finish(now);
        }
    }

    /// Abandon the whole run. Reveals the current answer and goes terminal
    /// immediately. No score is submitted for an abandoned run.
    pub fn give_up(&mut self, now: SystemTime) {
        if self.outcome != Outcome::InProgress {
            return;
        }
        self.revealed_answer = self.current_phrase().map(|p| p.answer.clone());
        self.outcome = Outcome::GaveUp;
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.finished_at = Some(now);
    }

    fn advance_or_finish(&mut self, now: SystemTime) {
        self.current += 1;
        self.guess.clear();
        self.revealed_answer = None;
        self.wrong_guess_at = None;
        if self.current >= self.phrases.len() {
            self.outcome = Outcome::Finished;
            if self.started_at.is_none() {
                self.started_at = Some(now);
            }
            self.finished_at = Some(now);
        }
    }

    /// Display clock: wall elapsed plus accrued skip penalties, in
    /// seconds. Frozen at `finished_at` once terminal. The hint penalty
    /// is folded in at scoring time, not here.
    pub fn elapsed_seconds(&self, now: SystemTime) -> f64 {
        let Some(started) = self.started_at else {
            return self.penalty_ms as f64 / 1000.0;
        };
        let end = self.finished_at.unwrap_or(now);
        (elapsed_ms(started, end) + self.penalty_ms) as f64 / 1000.0
    }
}

fn elapsed_ms(from: SystemTime, to: SystemTime) -> u64 {
    to.duration_since(from).unwrap_or(Duration::ZERO).as_millis() as u64
}
