//! Overlay panels.
//!
//! Each feature owns its slice of rendering (and, for the status line, its
//! own accumulator state). Shared state lives in [`crate::state::AppState`].

pub mod captions;
pub mod statusline;
pub mod wheel;
