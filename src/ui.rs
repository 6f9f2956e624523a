use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use repzone::{
    celebration::{Celebration, ParticleKind},
    difficulty::{Difficulty, TRACK_END},
    game::RepGame,
    session::{GameState, MAX_MISSES},
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn difficulty_color(d: Difficulty) -> Color {
    match d {
        Difficulty::Easy => Color::Green,
        Difficulty::Medium => Color::Yellow,
        Difficulty::Hard => Color::Red,
    }
}

/// Map a track position onto one of `width` columns.
pub fn column_for(position: f64, width: usize) -> usize {
    let last = width.saturating_sub(1) as f64;
    ((position.clamp(0.0, TRACK_END) / TRACK_END) * last).round() as usize
}

/// The rep track: power zone shaded, indicator drawn on top.
pub fn track_line(game: &RepGame, width: usize) -> Line<'static> {
    let window = game.target_window();
    let zone = column_for(window.start, width)..=column_for(window.end, width);
    let indicator = column_for(game.position(), width);

    let indicator_style = match game.state() {
        GameState::Hit => bold().fg(Color::Green),
        GameState::Miss => bold().fg(Color::Red),
        _ => bold().fg(Color::Yellow),
    };
    let zone_style = Style::default().fg(Color::Cyan);

    let spans = (0..width)
        .map(|col| {
            if col == indicator {
                Span::styled("\u{25cf}", indicator_style)
            } else if zone.contains(&col) {
                Span::styled("\u{2593}", zone_style)
            } else {
                Span::styled("\u{2500}", dim())
            }
        })
        .collect::<Vec<_>>();

    Line::from(spans)
}

/// "POWER ZONE" centred under the shaded columns.
fn zone_label_line(game: &RepGame, width: usize) -> Line<'static> {
    let label = "POWER ZONE";
    let window = game.target_window();
    let mid = (column_for(window.start, width) + column_for(window.end, width)) / 2;
    let pad = mid.saturating_sub(label.width() / 2);
    Line::from(vec![
        Span::raw(" ".repeat(pad)),
        Span::styled(label, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    ])
}

fn stats_line(game: &RepGame) -> Line<'static> {
    let label = Style::default().fg(Color::Gray);
    let value = bold();
    let misses_style = if game.total_misses() + 1 >= MAX_MISSES {
        bold().fg(Color::Red)
    } else {
        value
    };

    Line::from(vec![
        Span::styled("Score ", label),
        Span::styled(game.score().to_string(), value),
        Span::raw("   "),
        Span::styled("High ", label),
        Span::styled(game.high_score().to_string(), value),
        Span::raw("   "),
        Span::styled("Combo ", label),
        Span::styled(format!("{}x", game.combo()), value.fg(Color::Magenta)),
        Span::raw("   "),
        Span::styled("Reps ", label),
        Span::styled(game.total_hits().to_string(), value),
        Span::raw("   "),
        Span::styled("Misses ", label),
        Span::styled(
            format!("{}/{}", game.total_misses(), MAX_MISSES),
            misses_style,
        ),
    ])
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.game.state() {
            GameState::Ready => render_menu(self, area, buf),
            GameState::Playing | GameState::Hit | GameState::Miss => {
                render_workout(self, area, buf)
            }
            GameState::GameOver => render_game_over(self, area, buf),
        }
    }
}

fn render_menu(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Length(4),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(vec![
        Line::from(Span::styled("REP CHALLENGE", bold().fg(Color::Yellow))),
        Line::from(Span::styled(
            "Time your reps perfectly in the power zone!",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ])
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    Paragraph::new(Span::styled("Select intensity", bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let options = Difficulty::ALL
        .iter()
        .enumerate()
        .flat_map(|(i, d)| {
            let text = format!(" [{}] {} ", i + 1, d.label());
            let style = if *d == app.selected {
                bold().fg(Color::Black).bg(difficulty_color(*d))
            } else {
                Style::default().fg(difficulty_color(*d))
            };
            [Span::styled(text, style), Span::raw("  ")]
        })
        .collect::<Vec<_>>();
    let window = app.selected.target_window();
    Paragraph::new(vec![
        Line::from(options),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "speed {}  |  power zone {}-{} ({} wide)",
                app.selected.speed(),
                window.start,
                window.end,
                window.width()
            ),
            dim(),
        )),
    ])
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        format!("High score: {}", app.game.high_score()),
        bold().fg(Color::Magenta),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    let how_to = [
        "Watch the indicator sweep from left to right",
        "Press SPACE while it is inside the power zone",
        "Closer to the centre = more points",
        "Consecutive reps build a combo bonus",
        "3 bad form reps end the workout",
        "p pauses, Esc quits",
    ];
    Paragraph::new(
        how_to
            .iter()
            .map(|l| Line::from(format!("- {l}")))
            .collect::<Vec<_>>(),
    )
    .block(Block::default().borders(Borders::ALL).title("How to play"))
    .wrap(Wrap { trim: true })
    .render(chunks[4], buf);

    Paragraph::new(Span::styled(
        "(enter) start / (1-3 or arrows) intensity / (esc) exit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[5], buf);
}

fn render_workout(app: &App, area: Rect, buf: &mut Buffer) {
    let game = &app.game;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let d = game.difficulty();
    Paragraph::new(Span::styled(
        format!("{} mode", d.label()),
        bold().fg(difficulty_color(d)),
    ))
    .alignment(Alignment::Right)
    .render(chunks[0], buf);

    Paragraph::new(stats_line(game))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let track_block = Block::default().borders(Borders::ALL);
    let inner = track_block.inner(chunks[3]);
    track_block.render(chunks[3], buf);
    let width = inner.width as usize;
    Paragraph::new(track_line(game, width)).render(inner, buf);

    let label_area = Rect {
        x: inner.x,
        width: inner.width,
        ..chunks[4]
    };
    Paragraph::new(zone_label_line(game, width)).render(label_area, buf);

    if let Some(outcome) = game.last_outcome() {
        let style = if outcome.is_hit() {
            bold().fg(Color::Green)
        } else {
            bold().fg(Color::Red)
        };
        Paragraph::new(Span::styled(outcome.message(), style))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }

    Paragraph::new(Span::styled(
        "(space) rep / (p) pause / (esc) quit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[7], buf);

    if app.confirm_quit.is_some() {
        render_dialog(
            "Quit workout?",
            &["Your progress will be lost.", "", "(y) quit / (n) keep training"],
            Color::Red,
            area,
            buf,
        );
    } else if game.is_paused() {
        render_dialog(
            "PAUSED",
            &["Press p to resume"],
            Color::Yellow,
            area,
            buf,
        );
    }
}

fn render_game_over(app: &App, area: Rect, buf: &mut Buffer) {
    let game = &app.game;
    let summary = game.summary();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(2),
            Constraint::Length(6),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Span::styled("WORKOUT COMPLETE!", bold().fg(Color::Yellow)))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let row = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:>12}  "), Style::default().fg(Color::Gray)),
            Span::styled(format!("{value:<8}"), bold()),
        ])
    };
    Paragraph::new(vec![
        row("Final score", summary.score.to_string()),
        row("Total reps", summary.hits.to_string()),
        row("Best combo", format!("{}x", summary.best_combo)),
        row("Bad form", summary.misses.to_string()),
        row("Accuracy", format!("{}%", summary.hit_rate())),
        row("Intensity", summary.difficulty.label().to_string()),
    ])
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let banner = if game.is_new_record() {
        Span::styled("NEW HIGH SCORE!", bold().fg(Color::Magenta))
    } else {
        Span::styled(format!("High score: {}", game.high_score()), dim())
    };
    Paragraph::new(banner)
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(r) train again / (esc) exit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[5], buf);

    if app.celebration.is_active() {
        render_celebration(&app.celebration, area, buf);
    }
}

fn render_dialog(title: &str, lines: &[&str], color: Color, area: Rect, buf: &mut Buffer) {
    let width = lines
        .iter()
        .map(|l| l.width())
        .chain(std::iter::once(title.width()))
        .max()
        .unwrap_or(0) as u16
        + 6;
    let height = lines.len() as u16 + 2;
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    };

    Clear.render(rect, buf);
    Paragraph::new(lines.iter().map(|l| Line::from(*l)).collect::<Vec<_>>())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(Span::styled(title.to_string(), bold().fg(color))),
        )
        .render(rect, buf);
}

/// Render celebration particles on top of the game over screen
fn render_celebration(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::LightBlue,
    ];

    for particle in &celebration.particles {
        if particle.x < 0.0 || particle.y < 0.0 {
            continue;
        }
        let (x, y) = (particle.x.round() as u16, particle.y.round() as u16);
        if x >= area.width || y >= area.height {
            continue;
        }

        let mut style = Style::default().fg(colors[particle.color_index % colors.len()]);
        if matches!(particle.kind, ParticleKind::Letter { .. }) {
            style = style.add_modifier(Modifier::BOLD);
        } else if particle.age > particle.max_age * 0.6 {
            style = style.add_modifier(Modifier::DIM);
        }

        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_char(particle.symbol).set_style(style);
        }
    }
}
