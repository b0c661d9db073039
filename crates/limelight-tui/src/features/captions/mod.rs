//! Caption feature slice.
//!
//! Render-only: the caption lifecycle state lives in
//! `limelight_core::captions` and is driven by the reducer.

mod render;

pub use render::{captions_height, render_captions};
