mod ui;

use chrono::NaiveDate;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::{Duration, SystemTime},
};

use garble::{
    board::{Leaderboard, MemoryScoreStore, SqliteScoreStore},
    celebration::Celebration,
    config::{ConfigStore, FileConfigStore},
    daily::select_daily,
    notice::{Notice, ToastLine},
    phrase::PhrasePool,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    score::{session_total_seconds, submit_score},
    session::{GameSession, Outcome, REVEAL_DELAY_MS},
    TICK_RATE_MS,
};

/// daily garbled-phrase guessing game for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Say the garbled phrase out loud and type what it really means. Five phrases a day, same five for everyone; hints and skips cost you seconds on the shared leaderboard."
)]
pub struct Cli {
    /// player name (skips the name prompt)
    #[clap(short, long)]
    name: Option<String>,

    /// phrase pool to draw from
    #[clap(short, long)]
    pool: Option<String>,

    /// keep scores local to this run instead of the shared store
    #[clap(long)]
    offline: bool,

    /// replay a specific day's puzzle (YYYY-MM-DD, UTC)
    #[clap(short, long)]
    date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Name,
    Play,
    Summary,
    Board,
}

pub struct App {
    pub session: GameSession,
    pub board: Leaderboard,
    pub screen: Screen,
    pub name_input: String,
    pub toast: ToastLine,
    pub celebration: Celebration,
    pub day: NaiveDate,
    pub final_time: Option<f64>,
    hint: Option<(usize, String)>,
    submitted: bool,
    pub quit: bool,
}

impl App {
    pub fn new(
        session: GameSession,
        board: Leaderboard,
        preset_name: Option<String>,
        day: NaiveDate,
    ) -> Self {
        let mut app = Self {
            session,
            board,
            screen: Screen::Name,
            name_input: preset_name.clone().unwrap_or_default(),
            toast: ToastLine::default(),
            celebration: Celebration::default(),
            day,
            final_time: None,
            hint: None,
            submitted: false,
            quit: false,
        };
        if let Some(name) = preset_name {
            if app.session.start(&name) {
                app.screen = Screen::Play;
            }
        }
        app
    }

    /// Hint text for the phrase currently on screen; stale hints from
    /// earlier phrases are not shown.
    pub fn hint_for_current(&self) -> Option<&str> {
        self.hint
            .as_ref()
            .filter(|(idx, _)| *idx == self.session.current)
            .map(|(_, text)| text.as_str())
    }

    pub fn handle_key(&mut self, key: KeyEvent, width: u16, height: u16) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }

        match self.screen {
            Screen::Name => self.handle_name_key(key),
            Screen::Play => self.handle_play_key(key, width, height),
            Screen::Summary => match key.code {
                KeyCode::Enter | KeyCode::Char('l') => {
                    if let Some(notice) = self.board.refresh() {
                        self.toast.show(notice);
                    }
                    self.screen = Screen::Board;
                }
                KeyCode::Esc | KeyCode::Char('q') => self.quit = true,
                _ => {}
            },
            Screen::Board => match key.code {
                KeyCode::Char('r') => {
                    if let Some(notice) = self.board.refresh() {
                        self.toast.show(notice);
                    }
                }
                KeyCode::Esc | KeyCode::Char('q') => self.quit = true,
                _ => {}
            },
        }
    }

    fn handle_name_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => self.name_input.push(c),
            KeyCode::Backspace => {
                self.name_input.pop();
            }
            KeyCode::Enter => {
                if self.session.start(&self.name_input) {
                    self.screen = Screen::Play;
                } else {
                    self.toast.show(Notice::warning("enter a name to start"));
                }
            }
            KeyCode::Esc => self.quit = true,
            _ => {}
        }
    }

    fn handle_play_key(&mut self, key: KeyEvent, width: u16, height: u16) {
        let now = SystemTime::now();
        match key.code {
            KeyCode::Esc => self.session.give_up(now),
            KeyCode::Enter => {
                self.session.submit_guess(now);
            }
            KeyCode::Backspace => self.session.backspace(),
            KeyCode::Char('h') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(text) = self.session.use_hint() {
                    self.hint = Some((self.session.current, text));
                }
            }
            KeyCode::Char('k') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.session.skip();
            }
            KeyCode::Char(c) => self.session.push_char(c),
            _ => {}
        }
        self.settle(width, height);
    }

    /// Delivery of the pump's deferred advance at the end of a skip's
    /// reveal window. The session discards it if the run already ended.
    pub fn on_advance(&mut self, width: u16, height: u16) {
        self.session.advance_after_reveal(SystemTime::now());
        self.settle(width, height);
    }

    /// Periodic clock: drives the session (start stamp, wrong-guess flash
    /// expiry), toast expiry, confetti, and the leaderboard change
    /// subscription.
    pub fn on_tick(&mut self, width: u16, height: u16) {
        let now = SystemTime::now();
        if self.screen == Screen::Play {
            self.session.tick(now);
        }
        self.toast.expire(now);
        self.celebration.update();
        if let Some(notice) = self.board.poll_changes() {
            self.toast.show(notice);
        }
        self.settle(width, height);
    }

    /// Move off the play screen once the session goes terminal: compute
    /// the total, push it to the store (best effort), and raise the
    /// celebration if the fresh score made the board.
    fn settle(&mut self, width: u16, height: u16) {
        if self.screen != Screen::Play || !self.session.is_terminal() {
            return;
        }

        if self.session.outcome == Outcome::Finished && !self.submitted {
            self.submitted = true;
            self.final_time = session_total_seconds(&self.session);
            if let Some(total) = self.final_time {
                let player = self.session.player.clone();
                match submit_score(self.board.store_mut(), &player, total) {
                    Ok(()) => {
                        let _ = self.board.notifier().send(());
                        self.toast
                            .show(Notice::success(format!("finished in {total:.1}s")));
                    }
                    Err(notice) => self.toast.show(notice),
                }
                if let Some(notice) = self.board.refresh() {
                    self.toast.show(notice);
                }
                self.board.note_own_score(&player, total);
                if let Some(rank) = self.board.take_placement() {
                    self.celebration.start(width, height);
                    self.toast
                        .show(Notice::success(format!("top 10! you're #{}", rank + 1)));
                }
            }
        }

        self.screen = Screen::Summary;
    }

    #[cfg(test)]
    pub fn offline_for_tests(name: Option<&str>) -> Self {
        let pool = PhrasePool::load("english").unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 8, 30).unwrap();
        let selection = select_daily(&pool.phrases, day);
        let board = Leaderboard::new(Box::new(MemoryScoreStore::with_defaults()));
        Self::new(
            GameSession::new(selection),
            board,
            name.map(str::to_string),
            day,
        )
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    if let Some(name) = &cli.name {
        config.player_name = Some(name.clone());
    }
    if let Some(pool) = &cli.pool {
        config.pool = pool.clone();
    }
    if cli.offline {
        config.offline = true;
    }

    let day = match &cli.date {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::InvalidValue, "--date must be YYYY-MM-DD")
                    .exit();
            }
        },
        None => chrono::Utc::now().date_naive(),
    };

    let pool = match PhrasePool::load(&config.pool) {
        Ok(pool) => pool,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(
                ErrorKind::InvalidValue,
                format!("{e} (available: {})", PhrasePool::available().join(", ")),
            )
            .exit();
        }
    };

    // The selection is frozen here for the whole session; a UTC rollover
    // mid-game does not re-sample.
    let selection = select_daily(&pool.phrases, day);

    let mut startup_notice = None;
    let board = if config.offline {
        Leaderboard::new(Box::new(MemoryScoreStore::with_defaults()))
    } else {
        match SqliteScoreStore::new(day) {
            Ok(store) => Leaderboard::new(Box::new(store)),
            Err(e) => {
                startup_notice = Some(Notice::warning(format!(
                    "score store unavailable, playing offline: {e}"
                )));
                Leaderboard::new(Box::new(MemoryScoreStore::with_defaults()))
            }
        }
    };

    let mut app = App::new(
        GameSession::new(selection),
        board,
        config.player_name.clone(),
        day,
    );
    if let Some(notice) = startup_notice {
        app.toast.show(notice);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    // Remember the player for next time.
    if !app.session.player.is_empty() {
        config.player_name = Some(app.session.player.clone());
    }
    let _ = config_store.save(&config);

    Ok(())
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let events = CrosstermEventSource::new();
    let ticker = FixedTicker::new(Duration::from_millis(TICK_RATE_MS));
    let mut runner = Runner::new(events, ticker);

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let size = terminal.size().unwrap_or_default();
        match runner.step() {
            GameEvent::Tick => app.on_tick(size.width, size.height),
            GameEvent::Resize => {}
            GameEvent::AdvancePhrase => app.on_advance(size.width, size.height),
            GameEvent::Key(key) => app.handle_key(key, size.width, size.height),
        }

        // A skip opens a reveal window: arm the advance. A terminal run
        // disarms whatever is still pending.
        if app.session.is_terminal() {
            runner.cancel_deferred();
        } else if app.screen == Screen::Play
            && app.session.revealed_answer.is_some()
            && !runner.has_deferred()
        {
            runner.schedule(
                GameEvent::AdvancePhrase,
                Duration::from_millis(REVEAL_DELAY_MS),
            );
        }

        if app.quit {
            break;
        }
    }

    Ok(())
}
