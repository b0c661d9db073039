//! Status line feature slice.
//!
//! One-line bar at the bottom showing connection status, feature toggles,
//! the current wheel phase, and transient feedback from REST calls.
//!
//! ## Module Structure
//!
//! - `state.rs`: StatusLineAccumulator (mutable counters) and StatusLine (immutable snapshot)
//! - `render.rs`: Status line rendering

mod render;
mod state;

pub use render::render_status_line;
pub use state::{Notice, NoticeLevel, StatusLine, StatusLineAccumulator};
