use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use super::super::navigator::{Allowed, Menu, index_width};

pub(super) fn draw_menu(frame: &mut Frame, menu: &Menu<'_>) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let count_text = if menu.is_miss() {
        "no pronunciations".to_string()
    } else {
        format!("{} pronunciations", menu.entries.len())
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            menu.word.to_string(),
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(count_text, Style::default().fg(Color::Rgb(185, 195, 210))),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Word"));
    frame.render_widget(header, chunks[0]);

    if menu.is_miss() {
        let miss = Paragraph::new(miss_text(menu))
        .style(Style::default().fg(Color::Rgb(230, 230, 230)))
        .alignment(Alignment::Center)
        .block(panel_block("Pronunciations"));
        frame.render_widget(miss, chunks[1]);
    } else {
        let mut table_state = TableState::default();
        table_state.select(Some(menu.selected));
        let table = Table::new(
            entry_rows(menu),
            [Constraint::Length(4), Constraint::Min(10)],
        )
        .block(panel_block("Pronunciations"))
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(110, 170, 255))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("* ");
        frame.render_stateful_widget(table, chunks[1], &mut table_state);
    }

    let controls = Paragraph::new(key_legend(menu.allowed, menu.entries.len()))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Rgb(185, 195, 210)))
        .block(panel_block("Controls"));
    frame.render_widget(controls, chunks[2]);

    let (status_text, status_style) = status_line(menu);
    let status = Paragraph::new(status_text)
        .style(status_style)
        .block(panel_block("Status"));
    frame.render_widget(status, chunks[3]);
}

fn miss_text(menu: &Menu<'_>) -> String {
    let hint = if menu.allowed.next_word {
        "Press t to try again or n to skip it."
    } else {
        "Press t to try again."
    };
    format!("No pronunciations found for '{}'.\n\n{hint}", menu.word)
}

fn entry_rows(menu: &Menu<'_>) -> Vec<Row<'static>> {
    let width = index_width(menu.entries.len());
    menu.entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            Row::new(vec![
                Cell::from(format!("{idx:0width$}")),
                Cell::from(format!("By {entry}")),
            ])
        })
        .collect()
}

pub(super) fn key_legend(allowed: Allowed, len: usize) -> String {
    let mut keys = Vec::new();
    if allowed.choose {
        keys.push(format!("[0-{}] choose", len.saturating_sub(1)));
    }
    if allowed.next_entry {
        keys.push("[j] next pronunciation".to_string());
    }
    if allowed.previous_entry {
        keys.push("[k] previous pronunciation".to_string());
    }
    if allowed.replay {
        keys.push("[r] replay".to_string());
    }
    if allowed.retry {
        keys.push("[t] try again".to_string());
    }
    if allowed.next_word {
        keys.push("[n] next word".to_string());
    }
    if allowed.previous_word {
        keys.push("[p] previous word".to_string());
    }
    keys.push("[e] new word".to_string());
    keys.push("[q] quit".to_string());
    keys.join("  ")
}

fn status_line(menu: &Menu<'_>) -> (String, Style) {
    if let Some(prompt) = menu.prompt {
        return (
            format!("New word: {prompt}_   (Enter to add, Esc to cancel)"),
            Style::default().fg(Color::Yellow),
        );
    }
    if let Some(message) = menu.message {
        return (
            message.to_string(),
            Style::default()
                .fg(Color::Rgb(255, 145, 120))
                .add_modifier(Modifier::BOLD),
        );
    }
    if !menu.digits.is_empty() {
        return (
            format!("Choose: {}", menu.digits),
            Style::default().fg(Color::Rgb(205, 165, 255)),
        );
    }
    (String::new(), Style::default())
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}
