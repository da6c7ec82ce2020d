//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use chrono::Local;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, NoticeLevel, Screen};
use crate::browser::Browser;
use crate::catalog::Record;
use crate::compose::{ComposeFlow, ComposePhase, Draft, DraftField};
use crate::config::UiSettings;
use crate::detail::{DetailView, Overlay};

const BROWSER_CONTROLS: &[(&str, &str)] = &[
    ("h/l", "prev/next CD"),
    ("enter", "play"),
    ("n", "new record"),
    ("q", "quit"),
];

const SEARCH_CONTROLS: &[(&str, &str)] = &[
    ("type", "search"),
    ("up/down", "move"),
    ("enter", "pick"),
    ("ctrl-u", "clear"),
    ("esc", "back"),
];

const DRAFT_CONTROLS: &[(&str, &str)] = &[
    ("tab", "next field"),
    ("enter", "newline / load photo"),
    ("ctrl-x", "drop photo"),
    ("ctrl-s", "save"),
    ("esc", "back"),
];

const DETAIL_CONTROLS: &[(&str, &str)] = &[
    ("e", "edit"),
    ("d", "delete"),
    ("p", "photo"),
    ("s", "story"),
    ("x", "export"),
    ("esc", "back"),
];

const CONFIRM_CONTROLS: &[(&str, &str)] = &[("y", "delete"), ("n/esc", "keep")];

/// Spinning disc frames, one per tick.
const DISC_FRAMES: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// Width of one CD slot in the carousel.
const SLOT_WIDTH: u16 = 22;

/// Render the controls help text for the current screen.
fn controls_text(app: &App) -> String {
    let controls = match &app.screen {
        Screen::Browser => BROWSER_CONTROLS,
        Screen::Compose { flow, .. } if flow.draft().is_some() => DRAFT_CONTROLS,
        Screen::Compose { .. } => SEARCH_CONTROLS,
        Screen::Detail(view) if view.is_confirming_delete() => CONFIRM_CONTROLS,
        Screen::Detail(_) => DETAIL_CONTROLS,
    };
    controls
        .iter()
        .map(|(k, v)| format!("[{}] {}", k, v))
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn padded() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

fn format_bytes(n: usize) -> String {
    if n >= 1024 * 1024 {
        format!("{:.1} MiB", n as f64 / (1024.0 * 1024.0))
    } else if n >= 1024 {
        format!("{:.1} KiB", n as f64 / 1024.0)
    } else {
        format!("{} B", n)
    }
}

/// The body of a record's detail card.
pub fn detail_lines(record: &Record) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::raw("◉ "),
            Span::styled(record.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(format!("  {}", record.artist)),
    ];
    if !record.album_art.is_empty() {
        lines.push(Line::from(format!("  art: {}", record.album_art)).dim());
    }
    lines.push(Line::from(""));

    lines.push(Line::from("lyrics").underlined());
    match &record.lyrics {
        Some(lyrics) => lines.extend(lyrics.lines().map(|l| Line::from(l.to_string()))),
        None => lines.push(Line::from("(none)").dim()),
    }
    lines.push(Line::from(""));

    lines.push(Line::from("story").underlined());
    match &record.story {
        Some(story) => lines.extend(story.lines().map(|l| Line::from(l.to_string()))),
        None => lines.push(Line::from("(none)").dim()),
    }
    lines.push(Line::from(""));

    let photo = match &record.photo {
        Some(p) => format!("photo: {}", format_bytes(p.len())),
        None => "photo: none".to_string(),
    };
    lines.push(Line::from(photo).dim());
    lines.push(
        Line::from(format!(
            "kept on {}",
            record.created_at.with_timezone(&Local).format("%Y.%m.%d %H:%M")
        ))
        .dim(),
    );
    lines
}

/// A record's detail card, as shown on screen and in exported snapshots.
pub fn detail_card(record: &Record) -> Paragraph<'static> {
    Paragraph::new(detail_lines(record))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" RE:CORD ")
                .title_alignment(Alignment::Center),
        )
        .wrap(Wrap { trim: false })
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(frame: &mut Frame, app: &App, ui_settings: &UiSettings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" RE:CORD ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    match &app.screen {
        Screen::Browser => draw_browser(frame, &app.browser, chunks[1]),
        Screen::Compose { flow, .. } => draw_compose(frame, flow, chunks[1]),
        Screen::Detail(view) => draw_detail(frame, view, app.detail_record().as_ref(), chunks[1]),
    }

    // Footer: notice line (if any) above the controls.
    let mut footer_lines = Vec::new();
    if let Some(notice) = &app.notice {
        let style = match notice.level {
            NoticeLevel::Info => Style::default().fg(Color::Green),
            NoticeLevel::Error => Style::default().fg(Color::Red),
        };
        footer_lines.push(Line::styled(notice.text.clone(), style));
    }
    footer_lines.push(Line::from(controls_text(app)));
    let footer = Paragraph::new(footer_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(padded()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[2]);
}

fn draw_browser(frame: &mut Frame, browser: &Browser, area: Rect) {
    let Some(focus) = browser.focus() else {
        let empty = Paragraph::new("No records yet.\nPress n to keep your first song.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" records "));
        frame.render_widget(empty, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(3)])
        .split(area);

    // Carousel: a window of CD slots centered on the focused one when possible.
    let records = browser.records();
    let slots = usize::from((chunks[0].width / SLOT_WIDTH).max(1));
    let total = records.len();
    let start = if total <= slots {
        0
    } else {
        focus.saturating_sub(slots / 2).min(total - slots)
    };
    let end = (start + slots).min(total);
    let constraints: Vec<Constraint> = (start..end).map(|_| Constraint::Length(SLOT_WIDTH)).collect();
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(chunks[0]);

    for (cell, i) in cells.iter().zip(start..end) {
        let record = &records[i];
        let active = i == focus;
        let disc = match browser.spin() {
            Some(spin) if active => DISC_FRAMES[spin.frame as usize % DISC_FRAMES.len()],
            _ => "◉",
        };
        // Only the active CD shows its labels.
        let mut lines = vec![Line::from(disc).centered()];
        if active {
            lines.push(Line::from(record.title.clone()).bold().centered());
            lines.push(Line::from(record.artist.clone()).centered());
        }
        let block = if active {
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().add_modifier(Modifier::BOLD))
                .title(format!(" {}/{} ", i + 1, total))
        } else {
            Block::default().borders(Borders::ALL).dim()
        };
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            *cell,
        );
    }

    // Player
    let player_block = Block::default()
        .borders(Borders::ALL)
        .title(" player ")
        .padding(padded());
    match browser.spin() {
        Some(spin) => {
            let gauge = Gauge::default()
                .block(player_block)
                .ratio(f64::from(spin.progress().clamp(0.0, 1.0)))
                .label("spinning...");
            frame.render_widget(gauge, chunks[1]);
        }
        None => {
            let hint = Paragraph::new("Pick a CD and press enter to play it.")
                .alignment(Alignment::Center)
                .block(player_block);
            frame.render_widget(hint, chunks[1]);
        }
    }
}

fn draw_compose(frame: &mut Frame, flow: &ComposeFlow, area: Rect) {
    if let Some(draft) = flow.draft() {
        draw_draft(frame, draft, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let search = Paragraph::new(format!("{}_", flow.query()))
        .block(Block::default().borders(Borders::ALL).title(" search songs ").padding(padded()));
    frame.render_widget(search, chunks[0]);

    let results_block = Block::default().borders(Borders::ALL).title(" results ");
    let message = match flow.phase() {
        ComposePhase::Idle => Some("Type a song title or an artist.".to_string()),
        ComposePhase::Searching { .. } => Some("Searching...".to_string()),
        ComposePhase::ResultsShown => match flow.search_error() {
            Some(e) => Some(format!("Search failed: {}", e)),
            None if flow.results().is_empty() => Some("No songs found.".to_string()),
            None => None,
        },
        ComposePhase::Composing | ComposePhase::Committed(_) => None,
    };
    if let Some(message) = message {
        let style = if flow.search_error().is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        frame.render_widget(
            Paragraph::new(message).style(style).block(results_block).wrap(Wrap { trim: true }),
            chunks[1],
        );
        return;
    }

    // Only build ListItems for the visible window.
    let total = flow.results().len();
    let height = usize::from(chunks[1].height.saturating_sub(2));
    let sel = flow.cursor();
    let (start, end) = if total <= height || height == 0 {
        (0, total)
    } else {
        let start = sel.saturating_sub(height / 2).min(total - height);
        (start, start + height)
    };
    let items: Vec<ListItem> = flow.results()[start..end]
        .iter()
        .map(|c| ListItem::new(format!("{} - {}", c.title, c.artist)))
        .collect();
    let list = List::new(items)
        .block(results_block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ratatui::widgets::ListState::default();
    if total > 0 {
        state.select(Some(sel - start));
    }
    frame.render_stateful_widget(list, chunks[1], &mut state);
}

fn draw_draft(frame: &mut Frame, draft: &Draft, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area);

    let song = Paragraph::new(vec![
        Line::from(draft.title.clone()).bold(),
        Line::from(draft.artist.clone()),
    ])
    .block(Block::default().borders(Borders::ALL).title(" song ").padding(padded()));
    frame.render_widget(song, chunks[0]);

    let field_block = |field: DraftField| {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", field.label()))
            .padding(padded());
        if draft.focus == field {
            block.border_style(Style::default().fg(Color::Yellow))
        } else {
            block
        }
    };
    let cursor = |field: DraftField| if draft.focus == field { "_" } else { "" };

    let lyrics = Paragraph::new(format!("{}{}", draft.lyrics, cursor(DraftField::Lyrics)))
        .block(field_block(DraftField::Lyrics))
        .wrap(Wrap { trim: false });
    frame.render_widget(lyrics, chunks[1]);

    let story = Paragraph::new(format!("{}{}", draft.story, cursor(DraftField::Story)))
        .block(field_block(DraftField::Story))
        .wrap(Wrap { trim: false });
    frame.render_widget(story, chunks[2]);

    let attached = match &draft.photo {
        Some(p) => format!("  ({} attached)", format_bytes(p.len())),
        None => String::new(),
    };
    let photo = Paragraph::new(format!(
        "{}{}{}",
        draft.photo_path,
        cursor(DraftField::Photo),
        attached
    ))
    .block(field_block(DraftField::Photo));
    frame.render_widget(photo, chunks[3]);
}

fn draw_detail(frame: &mut Frame, view: &DetailView, record: Option<&Record>, area: Rect) {
    let Some(record) = record else {
        frame.render_widget(
            Paragraph::new("This record is gone.").block(Block::default().borders(Borders::ALL)),
            area,
        );
        return;
    };
    frame.render_widget(detail_card(record), area);

    // Overlays keep the card visible under them.
    match view.overlay() {
        Some(Overlay::Photo) => {
            let popup = centered_rect_sized(40, 5, area);
            frame.render_widget(Clear, popup);
            let size = record.photo.as_ref().map_or(0, |p| p.len());
            let text = Paragraph::new(format!("Photo attached, {}", format_bytes(size)))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(" photo (p closes) "));
            frame.render_widget(text, popup);
        }
        Some(Overlay::Story) => {
            let popup = centered_rect_sized(area.width.saturating_sub(8), area.height.saturating_sub(4), area);
            frame.render_widget(Clear, popup);
            let text = Paragraph::new(record.story.clone().unwrap_or_default())
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" story (s closes) ")
                        .padding(padded()),
                )
                .wrap(Wrap { trim: false });
            frame.render_widget(text, popup);
        }
        None => {}
    }

    if view.is_confirming_delete() {
        let popup = centered_rect_sized(44, 5, area);
        frame.render_widget(Clear, popup);
        let confirm = Paragraph::new(vec![
            Line::from(record.title_line()).bold(),
            Line::from("Delete this record? [y] yes  [n] no"),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" delete "),
        );
        frame.render_widget(confirm, popup);
    }
}
