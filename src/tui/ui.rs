//! TUI Rendering

use super::app::{App, Focus, TextInput};
use crate::data::display_name;
use crate::rag::{ChatMessage, Role};
use crate::session::{NoticeLevel, SessionStatus};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const SIDEBAR_WIDTH: u16 = 36;

/// Main draw function
pub fn draw(f: &mut Frame, app: &mut App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(f.area());

    draw_sidebar(f, app, columns[0]);
    draw_main(f, app, columns[1]);
}

fn focus_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Title
            Constraint::Length(3), // Upload path
            Constraint::Min(3),    // Pending files
            Constraint::Length(3), // Process button
            Constraint::Length(3), // Status badge
            Constraint::Length(3), // Clear chat button
            Constraint::Length(5), // Model info
        ])
        .split(area);

    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            "📚 StudyBuddy AI",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "AI-Powered Document Q&A",
            Style::default().fg(Color::Gray),
        )),
    ])
    .block(Block::default().borders(Borders::BOTTOM))
    .alignment(Alignment::Center);
    f.render_widget(title, rows[0]);

    draw_input(
        f,
        app,
        &app.upload_input,
        Focus::UploadPath,
        "Upload Documents",
        "Path to a PDF, then Enter",
        rows[1],
    );

    draw_pending_files(f, app, rows[2]);
    draw_button(f, app, Focus::Process, "⚡ Process Documents", app.can_process(), rows[3]);

    let status = app.status();
    let color = match status {
        SessionStatus::Ready => Color::Green,
        SessionStatus::WaitingForDocuments => Color::Yellow,
    };
    let mut badge_spans = vec![
        Span::styled("● ", Style::default().fg(color)),
        Span::styled(status.label(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ];
    if let Some(snapshot) = app.snapshot.as_ref().filter(|s| s.chunk_count > 0) {
        badge_spans.push(Span::styled(
            format!(" · {} chunks", snapshot.chunk_count),
            Style::default().fg(Color::Gray),
        ));
    }
    let badge = Paragraph::new(Line::from(badge_spans))
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .alignment(Alignment::Center);
    f.render_widget(badge, rows[4]);

    draw_button(f, app, Focus::ClearChat, "🗑 Clear Chat", app.can_submit(), rows[5]);

    let (model, embedder) = match &app.snapshot {
        Some(snapshot) => (snapshot.model_name.as_str(), short_model_name(&snapshot.embedder_name)),
        None => ("loading...", "loading..."),
    };
    let info = Paragraph::new(vec![
        Line::from("Powered by Groq"),
        Line::from(format!("Model: {}", model)),
        Line::from(format!("Embeddings: {}", embedder)),
        Line::from(format!("Vector Store: {}", app.index_label)),
    ])
    .block(Block::default().borders(Borders::TOP))
    .style(Style::default().fg(Color::DarkGray))
    .alignment(Alignment::Center);
    f.render_widget(info, rows[6]);
}

/// Hub ids are shown without their organisation prefix
fn short_model_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn draw_pending_files(f: &mut Frame, app: &App, area: Rect) {
    let processed = app
        .snapshot
        .as_ref()
        .map(|s| s.document_names.as_slice())
        .unwrap_or(&[]);

    let is_active = app.focus == Focus::Files;

    let items: Vec<ListItem> = app
        .pending_files
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let name = display_name(path);
            let marker = if processed.contains(&name) { "✓" } else { " " };
            let name_style = if is_active && i == app.selected_file {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::LightBlue)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("📄 {} ", name), name_style),
                Span::styled(marker, Style::default().fg(Color::Green)),
            ]))
        })
        .collect();

    let title = if is_active && !app.pending_files.is_empty() {
        format!("Files ({}) [Del: remove]", app.pending_files.len())
    } else {
        format!("Files ({})", app.pending_files.len())
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(focus_style(app, Focus::Files)),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if is_active && !app.pending_files.is_empty() {
        state.select(Some(app.selected_file));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_button(f: &mut Frame, app: &App, focus: Focus, label: &str, enabled: bool, area: Rect) {
    let text_style = if enabled {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let button = Paragraph::new(Span::styled(label, text_style))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(app, focus)),
        )
        .alignment(Alignment::Center);
    f.render_widget(button, area);
}

fn draw_input(
    f: &mut Frame,
    app: &App,
    input: &TextInput,
    focus: Focus,
    title: &str,
    placeholder: &str,
    area: Rect,
) {
    let text = if input.is_empty() {
        Span::styled(placeholder, Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(input.value())
    };

    let widget = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(focus_style(app, focus)),
    );
    f.render_widget(widget, area);

    if app.focus == focus {
        let before_cursor: String = input.value().chars().take(input.cursor()).collect();
        let max_x = area.x + area.width.saturating_sub(2);
        let x = (area.x + 1 + before_cursor.width() as u16).min(max_x);
        f.set_cursor_position((x, area.y + 1));
    }
}

fn draw_main(f: &mut Frame, app: &mut App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Chat
            Constraint::Length(3), // Notice / spinner
            Constraint::Length(3), // Question
        ])
        .split(area);

    let history_empty = app
        .snapshot
        .as_ref()
        .map(|s| s.history.is_empty())
        .unwrap_or(true);

    if history_empty && app.status() == SessionStatus::WaitingForDocuments {
        draw_welcome(f, rows[0]);
    } else {
        draw_chat(f, app, rows[0]);
    }

    draw_notice(f, app, rows[1]);

    let placeholder = "Ask a question about your documents...";
    draw_input(f, app, &app.question_input, Focus::Question, "Question", placeholder, rows[2]);
}

fn draw_welcome(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from("📚"),
        Line::from(""),
        Line::from(Span::styled(
            "Welcome to StudyBuddy AI",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Upload your study materials in the sidebar, process them, \
             then ask questions below. I'll find answers from your documents!",
            Style::default().fg(Color::Gray),
        )),
    ];

    let welcome = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(welcome, area);
}

fn draw_chat(f: &mut Frame, app: &mut App, area: Rect) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;
    let bubble_width = (inner_width * 3 / 4).max(10);

    let history = app
        .snapshot
        .as_ref()
        .map(|s| s.history.as_slice())
        .unwrap_or(&[]);
    let lines = chat_lines(history, bubble_width);

    // Clamp so the view never scrolls past the first message
    let max_scroll = lines.len().saturating_sub(inner_height);
    if app.chat_scroll as usize > max_scroll {
        app.chat_scroll = max_scroll as u16;
    }
    let offset = max_scroll - app.chat_scroll as usize;

    let title = if app.chat_scroll > 0 {
        format!("Chat (scrolled up {} lines)", app.chat_scroll)
    } else {
        "Chat".to_string()
    };

    let chat = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((offset as u16, 0));
    f.render_widget(chat, area);
}

/// Render chat history as pre-wrapped lines, user messages right-aligned
pub fn chat_lines(history: &[ChatMessage], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in history {
        let (label, color, alignment) = match message.role {
            Role::User => ("You", Color::Cyan, Alignment::Right),
            _ => ("StudyBuddy", Color::Green, Alignment::Left),
        };

        lines.push(
            Line::from(Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .alignment(alignment),
        );
        for row in wrap_text(&message.content, width) {
            lines.push(Line::from(row).alignment(alignment));
        }
        lines.push(Line::from(""));
    }

    lines
}

/// Greedy word wrap on display columns; words wider than `width` are split
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let mut word = word;

            while word.width() > width {
                if current_width > 0 {
                    rows.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                let (head, rest) = split_at_width(word, width);
                rows.push(head.to_string());
                word = rest;
            }

            let word_width = word.width();
            let needed = if current_width == 0 { word_width } else { current_width + 1 + word_width };
            if needed > width {
                rows.push(std::mem::take(&mut current));
                current_width = 0;
            }
            if current_width > 0 {
                current.push(' ');
                current_width += 1;
            }
            current_width += word_width;
            current.push_str(word);
        }

        rows.push(current);
    }

    rows
}

/// Split off the longest prefix that fits in `width` columns (at least one char)
fn split_at_width(word: &str, width: usize) -> (&str, &str) {
    let mut used = 0;
    for (i, c) in word.char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            let at = if i == 0 { c.len_utf8() } else { i };
            return word.split_at(at);
        }
        used += w;
    }
    (word, "")
}

fn draw_notice(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(message) = &app.busy {
        Line::from(vec![
            Span::styled(format!("{} ", app.spinner()), Style::default().fg(Color::Cyan)),
            Span::raw(message.as_str()),
        ])
    } else if let Some(notice) = &app.notice {
        let (icon, color) = match notice.level {
            NoticeLevel::Success => ("✅", Color::Green),
            NoticeLevel::Warning => ("⚠", Color::Yellow),
            NoticeLevel::Error => ("✗", Color::Red),
        };
        Line::from(Span::styled(
            format!("{} {}", icon, notice.message),
            Style::default().fg(color),
        ))
    } else {
        Line::from(Span::styled(
            "Tab: switch focus · Enter: select · Del: remove · PgUp/PgDn: scroll · q: quit",
            Style::default().fg(Color::DarkGray),
        ))
    };

    let widget = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(widget, area);
}
