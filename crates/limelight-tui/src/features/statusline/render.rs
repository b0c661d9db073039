//! Status line rendering.

use chrono::Local;
use limelight_core::transport::ConnectionStatus;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::state::NoticeLevel;
use crate::state::AppState;

fn connection_color(status: ConnectionStatus) -> Color {
    match status {
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Connecting => Color::DarkGray,
        ConnectionStatus::Reconnecting => Color::Yellow,
        ConnectionStatus::Disconnected => Color::Red,
    }
}

/// Renders the one-line status bar at the bottom.
pub fn render_status_line(app: &AppState, frame: &mut Frame, area: Rect) {
    let status = app.status_line.snapshot();
    let dim = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled(
            format!("● {}", app.connection.label()),
            Style::default().fg(connection_color(app.connection)),
        ),
        Span::raw("  "),
        Span::styled(
            if app.captions.is_enabled() {
                "captions on"
            } else {
                "captions off"
            },
            dim,
        ),
        Span::raw("  "),
        Span::styled(format!("wheel {}", app.wheel.phase().label()), dim),
    ];
    if app.lottery_locked {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("entries locked", Style::default().fg(Color::Yellow)));
    }

    spans.push(Span::raw("  "));
    match status.notice {
        Some(notice) => {
            let color = match notice.level {
                NoticeLevel::Info => Color::Green,
                NoticeLevel::Error => Color::Red,
            };
            spans.push(Span::styled(notice.text, Style::default().fg(color)));
        }
        None => {
            spans.extend([
                Span::styled("q", dim),
                Span::raw(" quit  "),
                Span::styled("c", dim),
                Span::raw(" captions  "),
                Span::styled("s", dim),
                Span::raw(" start  "),
                Span::styled("x", dim),
                Span::raw(" stop  "),
                Span::styled("r", dim),
                Span::raw(" clear"),
            ]);
        }
    }

    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("{} {:.0}fps", Local::now().format("%H:%M:%S"), status.fps),
        dim,
    ));

    let bar = Paragraph::new(Line::from(spans)).alignment(Alignment::Left);
    frame.render_widget(bar, area);
}
