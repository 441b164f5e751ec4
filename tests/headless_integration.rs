use std::sync::mpsc;
use std::time::{Duration, SystemTime};

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use garble::board::{Leaderboard, MemoryScoreStore, ScoreEntry, ScoreStore};
use garble::daily::select_daily;
use garble::phrase::PhrasePool;
use garble::runtime::{FixedTicker, GameEvent, Runner, TestEventSource};
use garble::score::{session_total_seconds, submit_score};
use garble::session::{GameSession, Outcome};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 30).unwrap()
}

fn daily_session() -> GameSession {
    let pool = PhrasePool::load("english").unwrap();
    let mut session = GameSession::new(select_daily(&pool.phrases, day()));
    assert!(session.start("ada"));
    session
}

fn key(c: char) -> GameEvent {
    GameEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Headless run without a TTY: scripted keystrokes through the channel
// source, clock driven by timeouts, all five phrases solved.
#[test]
fn headless_full_day_completes_and_scores() {
    let mut session = daily_session();

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    // Queue the answers up front; an Enter after each.
    let pool = PhrasePool::load("english").unwrap();
    let selected = select_daily(&pool.phrases, day());
    for answer in selected.iter().map(|p| &p.answer) {
        for c in answer.chars() {
            tx.send(key(c)).unwrap();
        }
        tx.send(GameEvent::Key(KeyEvent::new(
            KeyCode::Enter,
            KeyModifiers::NONE,
        )))
        .unwrap();
    }

    for _ in 0..500u32 {
        let now = SystemTime::now();
        match runner.step() {
            GameEvent::Tick => session.tick(now),
            GameEvent::Key(k) => match k.code {
                KeyCode::Enter => {
                    session.submit_guess(now);
                }
                KeyCode::Char(c) => session.push_char(c),
                _ => {}
            },
            _ => {}
        }
        if session.is_terminal() {
            break;
        }
    }

    assert_eq!(session.outcome, Outcome::Finished);
    let total = session_total_seconds(&session).unwrap();
    assert!(total >= 0.0);
    // No hints, no skips: the total is pure wall time, well under a second
    // of scripted play plus the 5s hint penalty ceiling.
    assert!(total < 5.0);
}

// The skip advance travels through the pump's deferred lane, not the
// session clock: ticks keep the answer on screen until the scheduled
// event is delivered.
#[test]
fn headless_skip_advance_arrives_through_the_pump() {
    let mut session = daily_session();
    let t0 = SystemTime::now();
    session.tick(t0);

    assert!(session.skip());
    assert_eq!(session.current, 0);
    assert!(session.revealed_answer.is_some());

    let (_tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(2)),
    );
    runner.schedule(GameEvent::AdvancePhrase, Duration::from_millis(10));

    let mut delivered = false;
    for _ in 0..200u32 {
        match runner.step() {
            GameEvent::Tick => session.tick(SystemTime::now()),
            GameEvent::AdvancePhrase => {
                session.advance_after_reveal(SystemTime::now());
                delivered = true;
                break;
            }
            _ => {}
        }
        // The reveal outlives every plain tick.
        assert_eq!(session.current, 0);
    }

    assert!(delivered);
    assert_eq!(session.current, 1);
    assert!(session.revealed_answer.is_none());
}

#[test]
fn headless_cancelled_advance_leaves_session_alone() {
    let mut session = daily_session();
    let t0 = SystemTime::now();
    session.tick(t0);
    assert!(session.skip());
    session.give_up(t0 + Duration::from_millis(500));

    let (_tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(2)),
    );
    runner.schedule(GameEvent::AdvancePhrase, Duration::from_millis(5));
    runner.cancel_deferred();
    assert!(!runner.has_deferred());

    for _ in 0..10u32 {
        if let GameEvent::AdvancePhrase = runner.step() {
            session.advance_after_reveal(SystemTime::now());
        }
    }
    assert_eq!(session.current, 0);
    assert_eq!(session.outcome, Outcome::GaveUp);
}

#[test]
fn headless_finished_run_lands_on_board() {
    let mut session = daily_session();
    let t0 = SystemTime::now();
    session.tick(t0);
    while !session.is_terminal() {
        let answer = session.current_phrase().unwrap().answer.clone();
        session.guess = answer;
        session.submit_guess(t0 + Duration::from_millis(12_345));
    }
    let total = session_total_seconds(&session).unwrap();
    assert!((total - 12.345).abs() < 1e-9);

    let mut board = Leaderboard::new(Box::new(MemoryScoreStore::with_defaults()));
    submit_score(board.store_mut(), &session.player, total).unwrap();
    board.notifier().send(()).unwrap();
    assert!(board.poll_changes().is_none());
    board.note_own_score(&session.player, total);

    // 12.345s beats all three seeded defaults.
    assert_eq!(board.take_placement(), Some(0));
    assert_eq!(board.take_placement(), None);
    assert_eq!(board.entries()[0].name, "ada");
}

#[test]
fn headless_gave_up_run_submits_nothing() {
    let mut session = daily_session();
    let t0 = SystemTime::now();
    session.tick(t0);
    session.give_up(t0 + Duration::from_secs(3));

    assert_eq!(session.outcome, Outcome::GaveUp);
    assert_eq!(session_total_seconds(&session), None);
}

#[test]
fn headless_board_keeps_top_ten_only() {
    let mut store = MemoryScoreStore::empty();
    for i in 0..15 {
        store
            .insert(&ScoreEntry::new(&format!("p{i}"), 100.0 - f64::from(i)))
            .unwrap();
    }
    let top = store.top(garble::board::TOP_N).unwrap();
    assert_eq!(top.len(), 10);
    // Fastest first.
    assert!(top.windows(2).all(|w| w[0].time_secs <= w[1].time_secs));
    assert_eq!(top[0].name, "p14");
}
