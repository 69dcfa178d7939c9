use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.widget.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Ctrl-C quits from anywhere
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    if app.widget.is_open() {
        handle_widget_key(app, key);
    } else {
        handle_host_key(app, key);
    }
}

fn handle_host_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') => app.widget.open(),
        _ => {}
    }
}

fn handle_widget_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.widget.close(),
        KeyCode::Enter => app.widget.submit(),
        KeyCode::Backspace => app.widget.backspace(),
        KeyCode::Delete => app.widget.delete(),
        KeyCode::Left => app.widget.cursor_left(),
        KeyCode::Right => app.widget.cursor_right(),
        KeyCode::Home => app.widget.cursor_home(),
        KeyCode::End => app.widget.cursor_end(),
        KeyCode::Up => app.widget.scroll_up(),
        KeyCode::Down => app.widget.scroll_down(),
        KeyCode::Char(c) => app.widget.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if !app.widget.is_open() {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollUp => app.widget.scroll_up(),
        MouseEventKind::ScrollDown => app.widget.scroll_down(),
        _ => {}
    }
}
