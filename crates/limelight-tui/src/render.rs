//! Pure view/render functions for the overlay.
//!
//! Functions here take `&AppState` by immutable reference, draw to a ratatui
//! Frame, and never mutate state or return effects. The separation from
//! `TuiRuntime` keeps the render path borrow-checker friendly.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::features::captions::{captions_height, render_captions};
use crate::features::statusline::render_status_line;
use crate::features::wheel::render_wheel;
use crate::state::AppState;

/// Height of the status line at the bottom.
const STATUS_HEIGHT: u16 = 1;

/// Renders the entire overlay to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    if area.height == 0 {
        return;
    }

    // Captions take what they need up to half the terminal, the wheel gets
    // the rest, the status line keeps its single row.
    let captions = captions_height(app).min((area.height / 2).max(3));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(captions),
            Constraint::Min(0),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(area);

    render_captions(app, frame, chunks[0]);
    render_wheel(app, frame, chunks[1]);
    render_status_line(app, frame, chunks[2]);
}
