//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O only (REST calls, socket sends, quitting); the
//! reducer never performs I/O itself.

use limelight_core::events::ClientCommand;

/// Lottery control operations exposed over REST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotteryAction {
    Start,
    Stop,
    Clear,
}

impl LotteryAction {
    pub fn label(self) -> &'static str {
        match self {
            LotteryAction::Start => "start",
            LotteryAction::Stop => "stop",
            LotteryAction::Clear => "clear",
        }
    }
}

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,
    /// Fetch the current lottery roster over REST.
    Hydrate,
    /// Fire a lottery control request over REST.
    Lottery { action: LotteryAction },
    /// Queue a command on the socket.
    SendSocket(ClientCommand),
}
