//! Application state composition.
//!
//! The TUI owns no overlay logic of its own; the interesting state lives in
//! the core managers and this module just composes them:
//!
//! ```text
//! AppState
//! ├── captions: CaptionBoard       (caption lifecycle, timers)
//! ├── wheel: WheelState            (roster, segments, spin physics)
//! ├── connection: ConnectionStatus (mirrored from the transport)
//! └── status_line: StatusLineAccumulator (fps, notices)
//! ```
//!
//! The reducer in `update.rs` is the only place that mutates this; render
//! functions read it immutably.

use limelight_core::captions::CaptionBoard;
use limelight_core::config::Config;
use limelight_core::transport::ConnectionStatus;
use limelight_core::wheel::WheelState;

use crate::statusline::StatusLineAccumulator;

/// Combined application state for the TUI.
pub struct AppState {
    /// Flag indicating the app should quit.
    pub should_quit: bool,
    /// Caption lifecycle manager.
    pub captions: CaptionBoard,
    /// Lottery wheel engine.
    pub wheel: WheelState,
    /// Last observed transport status.
    pub connection: ConnectionStatus,
    /// Whether the server reports the lottery entry list as locked.
    pub lottery_locked: bool,
    /// Status line accumulator (fps, transient notices).
    pub status_line: StatusLineAccumulator,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            should_quit: false,
            captions: CaptionBoard::new(config.captions.clone()),
            wheel: WheelState::new(config.wheel.clone()),
            connection: ConnectionStatus::Connecting,
            lottery_locked: false,
            status_line: StatusLineAccumulator::new(),
        }
    }
}
