use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::{
    app::{App, Focus, LoginField, Screen},
    models::format_timestamp,
};

const UNREADABLE: &str = "<unreadable message>";

pub fn ui(f: &mut Frame, app: &App) {
    let mut constraints = vec![
        Constraint::Length(3), // Header
        Constraint::Min(0),    // Page
    ];
    if app.status_message.is_some() {
        constraints.insert(1, Constraint::Length(1));
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    render_header(f, app, chunks[0]);
    if let Some(status) = &app.status_message {
        let status = Paragraph::new(status.as_str())
            .style(Style::default().fg(Color::Cyan))
            .alignment(Alignment::Center);
        f.render_widget(status, chunks[1]);
    }

    let page = chunks[chunks.len() - 1];
    match app.screen() {
        Screen::Login => render_login(f, app, page),
        Screen::Messages => render_messages(f, app, page),
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        "Parley Demo",
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(username) = &app.session.username {
        spans.push(Span::raw(format!("  Welcome {username}")));
    }
    let peer = app.peer.as_deref().unwrap_or("offline");
    spans.push(Span::styled(
        format!("  [{peer}]"),
        Style::default().fg(Color::DarkGray),
    ));

    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_login(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let form = &app.login;
    let masked = "*".repeat(form.password_input.chars().count());
    let fields = [
        (LoginField::Username, "Username", form.username_input.as_str()),
        (LoginField::Password, "Password", masked.as_str()),
    ];
    for (chunk, (field, title, text)) in chunks.iter().zip(fields) {
        let focused = form.focus == field;
        let input = Paragraph::new(text)
            .style(field_style(focused))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(input, *chunk);
        if focused {
            f.set_cursor_position((cursor_x(*chunk, text), chunk.y + 1));
        }
    }

    let help = Paragraph::new("Tab to switch fields, Enter to log in, Esc to quit")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[2]);
}

fn render_messages(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let composer_focused = app.focus == Focus::Composer && !app.is_editing();
    let input = Paragraph::new(app.input.as_str())
        .style(field_style(composer_focused))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Message (Enter to send, Tab for the list)"),
        );
    f.render_widget(input, chunks[0]);
    if composer_focused {
        f.set_cursor_position((cursor_x(chunks[0], &app.input), chunks[0].y + 1));
    }

    let items: Vec<ListItem> = app
        .items
        .iter()
        .map(|item| {
            let mut spans = Vec::new();
            match (app.edit_for(item), &item.message) {
                (Some(edit), Some(Ok(message))) => {
                    spans.push(username_span(&message.username));
                    spans.push(Span::styled(
                        format!("{}_", edit.buffer),
                        Style::default().fg(Color::Yellow),
                    ));
                }
                (_, Some(Ok(message))) => {
                    spans.push(username_span(&message.username));
                    spans.push(Span::raw(message.text.clone()));
                }
                (_, Some(Err(_))) => spans.push(Span::styled(
                    UNREADABLE,
                    Style::default().fg(Color::Red),
                )),
                (_, None) => spans.push(Span::raw("")),
            }
            spans.push(Span::styled(
                format!("  {}", format_timestamp(&item.time)),
                Style::default().fg(Color::DarkGray),
            ));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list_focused = app.focus == Focus::List;
    let title = if app.is_editing() {
        "Editing (Enter or Tab to save, Esc to cancel)".to_string()
    } else {
        format!("Messages ({}) - e to edit, Esc to quit", app.items.len())
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(field_style(list_focused)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    if list_focused && !app.items.is_empty() {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(list, chunks[1], &mut state);
}

/// Cursor column after `text` in a bordered input, kept inside the border.
fn cursor_x(area: Rect, text: &str) -> u16 {
    let typed = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
    let last = area.right().saturating_sub(2).max(area.x + 1);
    area.x.saturating_add(1).saturating_add(typed).min(last)
}

fn username_span(username: &str) -> Span<'static> {
    Span::styled(
        format!("{username}: "),
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    )
}

fn field_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    }
}
