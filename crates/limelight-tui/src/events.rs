//! UI event types.
//!
//! Everything the reducer reacts to arrives as a `UiEvent`: terminal input,
//! transport traffic forwarded through the runtime inbox, REST call results,
//! and the runtime's own tick/frame cadence.
//!
//! Events that drive timers or physics carry the `Instant` at which they
//! were observed, so the core managers stay clock-free and the reducer is
//! deterministic under test.

use std::time::Instant;

use limelight_core::api::LotterySnapshot;
use limelight_core::events::ServerEvent;
use limelight_core::transport::ConnectionStatus;

use crate::effects::LotteryAction;

/// Events consumed by the reducer.
#[derive(Debug)]
pub enum UiEvent {
    /// Periodic tick driving caption timers and wheel physics.
    Tick { now: Instant },
    /// Emitted at the top of every loop iteration with the terminal size.
    Frame { width: u16, height: u16 },
    /// Raw terminal input.
    Terminal(crossterm::event::Event),
    /// Overlay event delivered by the socket transport, stamped with its
    /// arrival time.
    Server { event: ServerEvent, now: Instant },
    /// Transport status change.
    Transport(ConnectionStatus),
    /// Result of the roster fetch over REST.
    HydrateResult { result: Result<LotterySnapshot, String> },
    /// Result of a lottery control call over REST.
    LotteryResult {
        action: LotteryAction,
        result: Result<(), String>,
    },
}
