//! Caption panel rendering.

use limelight_core::captions::TranslationSlot;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::text::truncate_with_ellipsis;
use crate::state::AppState;

/// Rows the caption panel wants for its current content, borders included.
pub fn captions_height(app: &AppState) -> u16 {
    let board = &app.captions;
    let content: usize = board
        .lines()
        .iter()
        .map(|line| 1 + line.translations.len())
        .sum::<usize>()
        + usize::from(board.interim().is_some());
    (content.max(1) + 2).min(u16::MAX as usize) as u16
}

/// Renders the caption panel: finalized lines with their translations,
/// then the provisional line, newest at the bottom.
pub fn render_captions(app: &AppState, frame: &mut Frame, area: Rect) {
    let board = &app.captions;
    let inner_width = area.width.saturating_sub(2) as usize;

    let mut lines: Vec<Line<'static>> = Vec::new();
    for line in board.lines() {
        lines.push(Line::from(Span::styled(
            truncate_with_ellipsis(&line.text, inner_width),
            Style::default().fg(Color::White),
        )));
        for (slot, translation) in &line.translations {
            let tag = slot_tag(slot);
            let text_width = inner_width.saturating_sub(tag.len() + 3);
            lines.push(Line::from(vec![
                Span::styled(format!("  {tag} "), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    truncate_with_ellipsis(&translation.text, text_width),
                    Style::default().fg(Color::Gray),
                ),
            ]));
        }
    }
    if let Some(interim) = board.interim() {
        lines.push(Line::from(Span::styled(
            format!("{}…", truncate_with_ellipsis(&interim.text, inner_width.saturating_sub(1))),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let title = if board.is_enabled() {
        " Captions "
    } else {
        " Captions (off) "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Line::from(Span::styled(
            title,
            Style::default().fg(Color::DarkGray),
        )));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn slot_tag(slot: &TranslationSlot) -> String {
    match slot {
        TranslationSlot::Language(lang) if !lang.is_empty() => format!("[{lang}]"),
        TranslationSlot::Index(index) => format!("[{index}]"),
        TranslationSlot::Language(_) => "↳".to_string(),
    }
}
