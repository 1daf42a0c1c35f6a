use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::app::{App, AppMode, SettingsField};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    match app.mode {
        AppMode::Main | AppMode::Input => draw_main(frame, app),
        AppMode::Settings => draw_settings(frame, app),
    }
}

/// Draw main view with results, history and settings summary
fn draw_main(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title/input
            Constraint::Min(10),   // Results + sidebar
            Constraint::Length(3), // Status bar
            Constraint::Length(2), // Help line
        ])
        .split(frame.area());

    // Title or input
    if app.mode == AppMode::Input {
        draw_input(frame, app, chunks[0]);
    } else {
        draw_title(frame, chunks[0]);
    }

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);

    draw_results(frame, app, body[0]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(4)])
        .split(body[1]);

    draw_generator_summary(frame, app, sidebar[0]);
    draw_history(frame, app, sidebar[1]);

    // Status bar
    draw_status(frame, app, chunks[2]);

    // Help line
    draw_help(frame, app, chunks[3]);
}

fn draw_title(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new(vec![Line::from(vec![
        Span::styled("🎨 ", Style::default()),
        Span::styled(
            "PixelGenius",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" - AI Image Generator", Style::default().fg(Color::Gray)),
    ])])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)),
    );
    frame.render_widget(title, area);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let input = Paragraph::new(app.input.as_str())
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title("Enter your image description (Enter to generate, ↑ last prompt, Esc to cancel)"),
        );
    frame.render_widget(input, area);

    // Show cursor
    frame.set_cursor_position((area.x + app.cursor_pos as u16 + 1, area.y + 1));
}

fn draw_results(frame: &mut Frame, app: &App, area: Rect) {
    let mut items: Vec<ListItem> = app
        .images
        .iter()
        .enumerate()
        .map(|(i, img)| {
            let location = img
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(not saved)".to_string());

            let content = Line::from(vec![
                Span::styled(
                    format!("image_{:<3}", img.index),
                    if i == app.selected_image {
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::White)
                    },
                ),
                Span::styled(
                    format!("{:>4}x{:<5}", img.bitmap.width(), img.bitmap.height()),
                    Style::default().fg(Color::Green),
                ),
                Span::styled(location, Style::default().fg(Color::Gray)),
            ]);

            ListItem::new(content)
        })
        .collect();

    items.extend(app.failures.iter().map(|f| {
        let badge = match f.failure.status_code() {
            Some(status) => format!("[{}] ", status),
            None => "[--] ".to_string(),
        };
        ListItem::new(Line::from(vec![
            Span::styled(format!("image_{:<3}", f.index), Style::default().fg(Color::DarkGray)),
            Span::styled(badge, Style::default().fg(Color::Yellow)),
            Span::styled(f.failure.to_string(), Style::default().fg(Color::Red)),
        ]))
    }));

    let title = match &app.last_prompt {
        Some(prompt) => format!("Results ({}) - {}", app.images.len(), prompt),
        None => "Results".to_string(),
    };

    if items.is_empty() {
        let hint = if app.generating {
            "🚀 Generating images..."
        } else if app.last_prompt.is_some() {
            "No images generated."
        } else {
            "Press i to describe an image."
        };
        let empty = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(empty, area);
        return;
    }

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(list, area);
}

fn draw_generator_summary(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = SettingsField::all()
        .iter()
        .map(|field| {
            Line::from(vec![
                Span::styled(format!("{:<18}", field.label()), Style::default().fg(Color::Gray)),
                Span::styled(app.get_settings_value(field), Style::default().fg(Color::White)),
            ])
        })
        .collect();

    let summary = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("🛠️ Generator Settings"),
    );
    frame.render_widget(summary, area);
}

fn draw_history(frame: &mut Frame, app: &App, area: Rect) {
    // Newest first
    let items: Vec<ListItem> = app
        .history
        .iter()
        .rev()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    entry.submitted_at.format("%H:%M ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(entry.prompt.clone(), Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("History ({})", app.history.len())),
    );
    frame.render_widget(list, area);
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let (message, style) = if let Some(err) = &app.error_message {
        (err.as_str(), Style::default().fg(Color::Red))
    } else if let Some(status) = &app.status_message {
        (status.as_str(), Style::default().fg(Color::Green))
    } else if app.generating {
        ("Generating...", Style::default().fg(Color::Yellow))
    } else {
        ("Ready", Style::default().fg(Color::Gray))
    };

    let status = Paragraph::new(message)
        .style(style)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, area);
}

fn draw_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = match app.mode {
        AppMode::Input => "Enter: Generate | ↑: Last prompt | Esc: Cancel",
        AppMode::Main => "i: New prompt | s: Settings | z: Download zip | c: Clear | q: Quit",
        AppMode::Settings => "↑↓: Navigate | ←→/Enter: Change | Esc/q: Back",
    };

    let help = Paragraph::new(help_text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, area);
}

/// Draw generator settings screen
fn draw_settings(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Settings list
            Constraint::Length(3), // Status
            Constraint::Length(2), // Help
        ])
        .split(area);

    // Header
    let header = Paragraph::new("🛠️ Generator Settings")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    // Settings list
    let fields = SettingsField::all();
    let items: Vec<ListItem> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let is_selected = i == app.settings_selected;

            let content = Line::from(vec![
                Span::styled(
                    format!("{:<20}", field.label()),
                    if is_selected {
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::White)
                    },
                ),
                Span::styled(
                    format!("{:<18}", app.get_settings_value(field)),
                    if is_selected {
                        Style::default().fg(Color::Yellow)
                    } else {
                        Style::default().fg(Color::Gray)
                    },
                ),
                Span::styled(
                    format!("[←→] {}", app.settings_hint(field)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);

            ListItem::new(content)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::DarkGray));
    frame.render_widget(list, chunks[1]);

    // Status
    draw_status(frame, app, chunks[2]);

    // Help
    draw_help(frame, app, chunks[3]);
}
