use crossterm::event::{KeyCode, KeyModifiers};

use crate::app::{App, Focus, Screen};

pub async fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
    if modifiers.contains(KeyModifiers::CONTROL) && matches!(key, KeyCode::Char('c')) {
        app.should_quit = true;
        return;
    }

    match app.screen() {
        Screen::Login => handle_login_key(app, key).await,
        Screen::Messages if app.is_editing() => handle_edit_key(app, key),
        Screen::Messages => match app.focus {
            Focus::Composer => handle_composer_key(app, key),
            Focus::List => handle_list_key(app, key),
        },
    }
}

async fn handle_login_key(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => app.submit_login().await,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.login.toggle_focus()
        }
        KeyCode::Char(c) => {
            app.status_message = None;
            app.login.push(c);
        }
        KeyCode::Backspace => app.login.backspace(),
        _ => {}
    }
}

fn handle_composer_key(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => {
            app.status_message = None;
            if let Err(e) = app.send_message() {
                app.status_message = Some(format!("Send failed: {e}"));
            }
        }
        KeyCode::Tab | KeyCode::BackTab => app.toggle_focus(),
        KeyCode::Char(c) => {
            if app.status_message.is_some() {
                app.status_message = None;
            }
            app.input.push(c);
        }
        KeyCode::Backspace => {
            app.input.pop();
        }
        _ => {}
    }
}

fn handle_list_key(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Tab | KeyCode::BackTab => app.toggle_focus(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Enter | KeyCode::Char('e') => app.begin_edit(),
        _ => {}
    }
}

fn handle_edit_key(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc => app.cancel_edit(),
        // Leaving the editor commits it, like losing focus.
        KeyCode::Enter | KeyCode::Tab | KeyCode::BackTab => {
            if let Err(e) = app.commit_edit() {
                app.status_message = Some(format!("Edit failed: {e}"));
            }
        }
        KeyCode::Char(c) => {
            if let Some(buffer) = app.edit_buffer() {
                buffer.push(c);
            }
        }
        KeyCode::Backspace => {
            if let Some(buffer) = app.edit_buffer() {
                buffer.pop();
            }
        }
        _ => {}
    }
}
