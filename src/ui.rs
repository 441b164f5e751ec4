use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};
use std::time::SystemTime;
use time_humanize::HumanTime;
use unicode_width::UnicodeWidthStr;

use crate::{App, Screen};
use garble::notice::NoticeKind;
use garble::session::Outcome;

const HORIZONTAL_MARGIN: u16 = 5;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            Screen::Name => render_name_entry(self, area, buf),
            Screen::Play => render_play(self, area, buf),
            Screen::Summary => render_summary(self, area, buf),
            Screen::Board => render_board(self, area, buf),
        }

        render_toast(self, area, buf);

        if self.celebration.is_active {
            render_confetti(self, area, buf);
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn render_name_entry(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let title = Paragraph::new(Span::styled(
        format!("garble · {}", app.day.format("%Y-%m-%d")),
        bold().fg(Color::Magenta),
    ))
    .alignment(Alignment::Center);
    title.render(chunks[1], buf);

    let prompt = Paragraph::new(Line::from(vec![
        Span::styled("who's playing?  ", dim()),
        Span::styled(app.name_input.clone(), bold()),
        Span::styled("_", bold().add_modifier(Modifier::SLOW_BLINK)),
    ]))
    .alignment(Alignment::Center);
    prompt.render(chunks[3], buf);

    let legend = Paragraph::new(Span::styled("type your name, (enter) to start", italic()))
        .alignment(Alignment::Center);
    legend.render(chunks[5], buf);
}

fn render_play(app: &App, area: Rect, buf: &mut Buffer) {
    let now = SystemTime::now();
    let session = &app.session;

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let gibberish = session
        .current_phrase()
        .map(|p| p.gibberish.clone())
        .unwrap_or_else(|| "no phrases to play today".to_string());
    let gibberish_lines =
        ((gibberish.width() as f64 / f64::from(max_chars_per_line)).ceil() as u16).max(1);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(1),               // progress + clock
            Constraint::Min(1),                  // pad
            Constraint::Length(gibberish_lines), // the garbled phrase
            Constraint::Length(1),               // pad
            Constraint::Length(1),               // guess buffer
            Constraint::Length(1),               // hint / revealed answer
            Constraint::Min(1),                  // pad
            Constraint::Length(1),               // legend
        ])
        .split(area);

    let mut status = if session.phrase_count() == 0 {
        format!("{:.1}s", session.elapsed_seconds(now))
    } else {
        format!(
            "phrase {}/{}   {:.1}s",
            (session.current + 1).min(session.phrase_count()),
            session.phrase_count(),
            session.elapsed_seconds(now),
        )
    };
    if session.penalty_ms > 0 {
        status.push_str(&format!("   +{}s penalty", session.penalty_ms / 1000));
    }
    if session.hint_used {
        status.push_str("   hint used");
    }
    Paragraph::new(Span::styled(status, dim()))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(gibberish, bold().fg(Color::Magenta)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    let guess_style = if session.wrong_flash_active(now) {
        bold().fg(Color::Red)
    } else {
        bold()
    };
    let guess = Paragraph::new(Line::from(vec![
        Span::styled("say it: ", dim()),
        Span::styled(session.guess.clone(), guess_style),
        Span::styled("_", dim()),
    ]))
    .alignment(Alignment::Center);
    guess.render(chunks[4], buf);

    if let Some(answer) = &session.revealed_answer {
        Paragraph::new(Span::styled(
            format!("it was: {answer}"),
            bold().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);
    } else if let Some(hint) = app.hint_for_current() {
        Paragraph::new(Span::styled(format!("hint: {hint}"), italic().fg(Color::Cyan)))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }

    let legend = Paragraph::new(Span::styled(
        "(enter) guess · (ctrl-h) hint · (ctrl-k) skip · (esc) give up",
        italic(),
    ))
    .alignment(Alignment::Center);
    legend.render(chunks[7], buf);
}

fn render_summary(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let headline = match session.outcome {
        Outcome::Finished => Span::styled("all phrases solved!", bold().fg(Color::Green)),
        Outcome::GaveUp => Span::styled("gave up, see you tomorrow", bold().fg(Color::Yellow)),
        _ => Span::styled("game over", bold()),
    };
    Paragraph::new(headline)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    if session.outcome == Outcome::Finished {
        let total = app.final_time.unwrap_or_default();
        Paragraph::new(Span::styled(format!("{total:.1}s"), bold()))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
    } else if let Some(answer) = &session.revealed_answer {
        Paragraph::new(Span::styled(
            format!("it was: {answer}"),
            bold().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }

    let breakdown = format!(
        "{} solved · {} skipped · hint {}",
        session
            .phrase_count()
            .saturating_sub(session.skipped.len())
            .min(session.current),
        session.skipped.len(),
        if session.hint_used { "used" } else { "unused" },
    );
    Paragraph::new(Span::styled(breakdown, dim()))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Span::styled("(enter) leaderboard · (esc) quit", italic()))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
}

fn render_board(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let title = Paragraph::new(format!("today's best · {}", app.day.format("%Y-%m-%d")))
        .block(Block::default().borders(Borders::ALL).title("leaderboard"))
        .style(bold().fg(Color::Cyan))
        .alignment(Alignment::Center);
    title.render(chunks[0], buf);

    let entries = app.board.entries();
    if entries.is_empty() {
        let empty = Paragraph::new("no scores yet today, yours could be first")
            .style(dim())
            .alignment(Alignment::Center);
        empty.render(chunks[1], buf);
    } else {
        let header = Row::new(vec![
            Cell::from("#"),
            Cell::from("name"),
            Cell::from("time"),
            Cell::from("when"),
        ])
        .style(bold().fg(Color::Yellow));

        let rows: Vec<Row> = entries
            .iter()
            .enumerate()
            .map(|(rank, entry)| {
                let mine = entry.name == app.session.player;
                let style = if mine { bold().fg(Color::Green) } else { Style::default() };
                let age_secs = (chrono::Local::now() - entry.recorded_at).num_seconds();
                Row::new(vec![
                    Cell::from(format!("{}", rank + 1)),
                    Cell::from(entry.name.clone()),
                    Cell::from(format!("{:.1}s", entry.time_secs)),
                    Cell::from(format!("{}", HumanTime::from(-age_secs))),
                ])
                .style(style)
            })
            .collect();

        let table = Table::new(
            rows,
            &[
                Constraint::Length(4),
                Constraint::Length(20),
                Constraint::Length(10),
                Constraint::Min(12),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("top 10"));
        table.render(chunks[1], buf);
    }

    Paragraph::new(Span::styled("(r)efresh · (esc) quit", italic()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
}

fn render_toast(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(notice) = app.toast.visible() else {
        return;
    };
    let color = match notice.kind {
        NoticeKind::Info => Color::Cyan,
        NoticeKind::Success => Color::Green,
        NoticeKind::Warning => Color::Yellow,
        NoticeKind::Error => Color::Red,
    };
    let line = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };
    Paragraph::new(Span::styled(notice.text.clone(), bold().fg(color)))
        .alignment(Alignment::Center)
        .render(line, buf);
}

fn render_confetti(app: &App, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
    ];

    for particle in app.celebration.visible(area.width, area.height) {
        let x = particle.x as u16;
        let y = particle.y as u16;
        let color = colors[particle.color_index % colors.len()];
        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&particle.symbol.to_string());
            cell.set_style(Style::default().fg(color));
        }
    }
}
