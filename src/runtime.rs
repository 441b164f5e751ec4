use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Everything that can move the app: keystrokes, terminal resizes, the
/// periodic clock tick, and the deferred advance that ends a skip's
/// answer-reveal window.
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    AdvancePhrase,
}

/// Where terminal events come from. Swappable so tests can feed scripted
/// keys through a channel instead of a TTY.
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout`; Err(Timeout) when nothing arrived.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Production source backed by a crossterm reader thread.
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(GameEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(GameEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed source for headless tests.
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// One-event-at-a-time pump. A quiet interval becomes a Tick, so the
/// session clock keeps advancing even when the player does nothing.
///
/// The pump also owns a single deferred-event lane: `schedule` arms an
/// event for delivery after a delay, `cancel_deferred` disarms it. The
/// skip flow uses this for the advance at the end of the answer-reveal
/// window; the game loop cancels it when the run goes terminal first.
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    deferred: Option<(Instant, GameEvent)>,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            deferred: None,
        }
    }

    /// Arm `event` for delivery after `delay`. One lane only: a new
    /// schedule replaces whatever was pending.
    pub fn schedule(&mut self, event: GameEvent, delay: Duration) {
        self.deferred = Some((Instant::now() + delay, event));
    }

    pub fn cancel_deferred(&mut self) {
        self.deferred = None;
    }

    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    /// Next event: a due deferred event first, then whatever the source
    /// yields, then Tick on timeout. Waits no longer than the tick
    /// interval or the deferred deadline, whichever comes sooner.
    pub fn step(&mut self) -> GameEvent {
        if let Some(ev) = self.take_due_deferred() {
            return ev;
        }

        let wait = match &self.deferred {
            Some((due, _)) => self
                .ticker
                .interval()
                .min(due.saturating_duration_since(Instant::now())),
            None => self.ticker.interval(),
        };

        match self.event_source.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.take_due_deferred().unwrap_or(GameEvent::Tick)
            }
        }
    }

    fn take_due_deferred(&mut self) -> Option<GameEvent> {
        let due = self.deferred.as_ref().map(|(due, _)| *due)?;
        if due <= Instant::now() {
            self.deferred.take().map(|(_, ev)| ev)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::mpsc;

    fn quiet_runner(
        interval_ms: u64,
    ) -> (mpsc::Sender<GameEvent>, Runner<TestEventSource, FixedTicker>) {
        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(interval_ms)),
        );
        (tx, runner)
    }

    #[test]
    fn test_quiet_source_yields_tick() {
        let (_tx, mut runner) = quiet_runner(1);
        assert_matches!(runner.step(), GameEvent::Tick);
    }

    #[test]
    fn test_queued_event_passes_through() {
        let (tx, rx) = mpsc::channel();
        tx.send(GameEvent::Resize).unwrap();
        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(10)),
        );
        assert_matches!(runner.step(), GameEvent::Resize);
    }

    #[test]
    fn test_disconnected_source_degrades_to_ticks() {
        let (tx, rx) = mpsc::channel::<GameEvent>();
        drop(tx);
        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        assert_matches!(runner.step(), GameEvent::Tick);
    }

    #[test]
    fn test_deferred_event_fires_after_its_delay() {
        let (_tx, mut runner) = quiet_runner(1);
        runner.schedule(GameEvent::AdvancePhrase, Duration::from_millis(5));
        assert!(runner.has_deferred());

        let mut fired = false;
        for _ in 0..100 {
            if matches!(runner.step(), GameEvent::AdvancePhrase) {
                fired = true;
                break;
            }
        }
        assert!(fired);
        assert!(!runner.has_deferred());
    }

    #[test]
    fn test_cancelled_deferred_never_fires() {
        let (_tx, mut runner) = quiet_runner(1);
        runner.schedule(GameEvent::AdvancePhrase, Duration::from_millis(2));
        runner.cancel_deferred();
        assert!(!runner.has_deferred());

        for _ in 0..10 {
            assert_matches!(runner.step(), GameEvent::Tick);
        }
    }

    #[test]
    fn test_queued_key_beats_a_pending_deferred() {
        let (tx, rx) = mpsc::channel();
        tx.send(GameEvent::Resize).unwrap();
        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(10)),
        );
        runner.schedule(GameEvent::AdvancePhrase, Duration::from_millis(50));
        assert_matches!(runner.step(), GameEvent::Resize);
        assert!(runner.has_deferred());
    }

    #[test]
    fn test_reschedule_replaces_previous_deferred() {
        let (_tx, mut runner) = quiet_runner(1);
        runner.schedule(GameEvent::AdvancePhrase, Duration::from_secs(60));
        runner.schedule(GameEvent::AdvancePhrase, Duration::from_millis(2));

        let mut fired = false;
        for _ in 0..100 {
            if matches!(runner.step(), GameEvent::AdvancePhrase) {
                fired = true;
                break;
            }
        }
        assert!(fired);
    }
}
