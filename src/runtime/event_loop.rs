use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, Screen};
use crate::config;
use crate::detail::Overlay;
use crate::ui;

/// Main terminal event loop: pulls model updates, draws, handles input and
/// advances animations once per tick. Returns `Ok(())` when quit is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick = Duration::from_millis(settings.ui.tick_ms.max(1));
    let mut last_tick = Instant::now();

    loop {
        app.sync();
        terminal.draw(|f| ui::draw(f, app, &settings.ui))?;

        let timeout = tick.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key_event(key, app);
                }
            }
        }

        if last_tick.elapsed() >= tick {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

pub(super) fn handle_key_event(key: KeyEvent, app: &mut App) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        app.quit();
        return;
    }
    app.clear_notice();

    match &app.screen {
        Screen::Browser => handle_browser_key(key, app),
        Screen::Compose { flow, .. } => {
            let drafting = flow.draft().is_some();
            handle_compose_key(key, ctrl, drafting, app);
        }
        Screen::Detail(view) => {
            if view.is_confirming_delete() {
                handle_confirm_key(key, app);
            } else {
                handle_detail_key(key, app);
            }
        }
    }
}

fn handle_browser_key(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('h') | KeyCode::Left => app.browse_prev(),
        KeyCode::Char('l') | KeyCode::Right => app.browse_next(),
        KeyCode::Enter | KeyCode::Char(' ') => app.open_focused(),
        KeyCode::Char('n') => app.start_compose(),
        KeyCode::Esc => app.browser.cancel_open(),
        _ => {}
    }
}

fn handle_compose_key(key: KeyEvent, ctrl: bool, drafting: bool, app: &mut App) {
    match key.code {
        KeyCode::Esc => app.compose_back(),
        KeyCode::Enter => app.compose_enter(),
        KeyCode::Backspace => app.compose_backspace(),
        KeyCode::Tab if drafting => app.compose_next_field(),
        KeyCode::Down if !drafting => app.compose_next(),
        KeyCode::Up if !drafting => app.compose_prev(),
        KeyCode::Char('n') if ctrl && !drafting => app.compose_next(),
        KeyCode::Char('p') if ctrl && !drafting => app.compose_prev(),
        KeyCode::Char('u') if ctrl && !drafting => app.compose_clear_query(),
        KeyCode::Char('s') if ctrl && drafting => app.compose_commit(),
        KeyCode::Char('x') if ctrl && drafting => app.compose_clear_photo(),
        KeyCode::Char(c) if !ctrl && !c.is_control() => app.compose_input(c),
        _ => {}
    }
}

fn handle_detail_key(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') => app.detail_back(),
        KeyCode::Char('e') => app.detail_edit(),
        KeyCode::Char('d') => app.detail_request_delete(),
        KeyCode::Char('p') => app.detail_toggle(Overlay::Photo),
        KeyCode::Char('s') => app.detail_toggle(Overlay::Story),
        KeyCode::Char('x') => app.detail_export(),
        _ => {}
    }
}

fn handle_confirm_key(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('y') => app.detail_confirm_delete(),
        KeyCode::Char('n') | KeyCode::Esc => app.detail_cancel_delete(),
        _ => {}
    }
}
