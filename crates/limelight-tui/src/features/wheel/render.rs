//! Wheel panel rendering.
//!
//! The wheel is drawn as a horizontal strip of the full partition with a
//! moving pointer above it, plus a roster listing. A strip reads better in
//! terminal cells than an approximated circle and shows exactly the same
//! information: segment proportions and what the pointer is over.

use limelight_core::wheel::geometry::{self, WheelSegment};
use limelight_core::wheel::{WheelPhase, WheelState};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::text::truncate_with_ellipsis;
use crate::state::AppState;

const SEGMENT_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::Blue,
    Color::Red,
];

fn segment_color(index: usize) -> Color {
    SEGMENT_COLORS[index % SEGMENT_COLORS.len()]
}

/// Renders the lottery panel.
pub fn render_wheel(app: &AppState, frame: &mut Frame, area: Rect) {
    let wheel = &app.wheel;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Line::from(Span::styled(
            " Lottery ",
            Style::default().fg(Color::DarkGray),
        )));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let width = inner.width as usize;
    let mut lines: Vec<Line<'static>> = Vec::new();

    if wheel.segments().is_empty() {
        lines.push(Line::from(Span::styled(
            "No participants yet",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.push(pointer_line(wheel, width));
        lines.push(strip_line(wheel.segments(), width));
        lines.push(Line::default());
        lines.push(headline(wheel));
        lines.push(Line::default());
        let rows = (inner.height as usize).saturating_sub(lines.len());
        lines.extend(participant_lines(wheel, width, rows));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// The pointer marker above the strip, at the angle currently under it.
fn pointer_line(wheel: &WheelState, width: usize) -> Line<'static> {
    let position = geometry::pointer_position(wheel.rotation());
    let col = ((position / geometry::FULL_TURN) * width as f64) as usize;
    let col = col.min(width.saturating_sub(1));
    Line::from(vec![
        Span::raw(" ".repeat(col)),
        Span::styled(
            "▼",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    ])
}

/// The partition itself, one colored run per segment.
fn strip_line(segments: &[WheelSegment], width: usize) -> Line<'static> {
    let mut spans = Vec::with_capacity(segments.len() + 1);
    let mut filled = 0usize;
    for (index, segment) in segments.iter().enumerate() {
        let end = ((segment.end_angle / geometry::FULL_TURN) * width as f64).round() as usize;
        let end = end.min(width);
        if end > filled {
            spans.push(Span::styled(
                "█".repeat(end - filled),
                Style::default().fg(segment_color(index)),
            ));
            filled = end;
        }
    }
    if filled < width {
        // Rounding slack goes to the last segment.
        let last = segments.len().saturating_sub(1);
        spans.push(Span::styled(
            "█".repeat(width - filled),
            Style::default().fg(segment_color(last)),
        ));
    }
    Line::from(spans)
}

fn headline(wheel: &WheelState) -> Line<'static> {
    match wheel.phase() {
        WheelPhase::Idle => {
            let tickets: u32 = wheel.segments().iter().map(|s| s.weight).sum();
            Line::from(Span::styled(
                format!(
                    "{} participants  {} tickets",
                    wheel.participants().len(),
                    tickets
                ),
                Style::default().fg(Color::DarkGray),
            ))
        }
        WheelPhase::Spinning => Line::from(Span::styled(
            "Spinning...",
            Style::default().fg(Color::Cyan),
        )),
        WheelPhase::Decelerating => Line::from(Span::styled(
            "Slowing down...",
            Style::default().fg(Color::Yellow),
        )),
        WheelPhase::Revealing { local_winner } => {
            let text = match local_winner {
                Some(name) => format!("Landed on {name}, waiting for the draw..."),
                None => "Waiting for the draw...".to_string(),
            };
            Line::from(Span::styled(text, Style::default().fg(Color::Magenta)))
        }
        WheelPhase::Winner { name } => Line::from(Span::styled(
            format!("Winner: {name}"),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
    }
}

/// The roster, pointer segment marked, canonical winner highlighted.
fn participant_lines(wheel: &WheelState, width: usize, rows: usize) -> Vec<Line<'static>> {
    if rows == 0 {
        return Vec::new();
    }
    let segments = wheel.segments();
    let pointer_id = wheel
        .pointer_segment()
        .map(|segment| segment.participant_id.clone());
    let winner = wheel.canonical_winner().map(str::to_string);

    let (shown, overflow) = if segments.len() > rows {
        let shown = rows.saturating_sub(1);
        (shown, segments.len() - shown)
    } else {
        (segments.len(), 0)
    };

    let mut lines = Vec::with_capacity(shown + 1);
    for segment in segments.iter().take(shown) {
        let under_pointer = pointer_id.as_deref() == Some(segment.participant_id.as_str());
        let is_winner = winner.as_deref() == Some(segment.participant_id.as_str());
        let marker = if under_pointer { "▶ " } else { "  " };
        let style = if is_winner {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else if under_pointer {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::Gray)
        };
        let tickets = format!(" ×{}", segment.weight);
        let name_width = width.saturating_sub(tickets.chars().count() + 3);
        lines.push(Line::from(vec![
            Span::styled(marker.to_string(), Style::default().fg(Color::White)),
            Span::styled(
                truncate_with_ellipsis(&segment.participant_id, name_width),
                style,
            ),
            Span::styled(tickets, Style::default().fg(Color::DarkGray)),
        ]));
    }
    if overflow > 0 {
        lines.push(Line::from(Span::styled(
            format!("  +{overflow} more"),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines
}
