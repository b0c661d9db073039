//! Core limelight library (overlay state machines, transport, config).

pub mod api;
pub mod captions;
pub mod config;
pub mod events;
pub mod logging;
pub mod timer;
pub mod transport;
pub mod wheel;
