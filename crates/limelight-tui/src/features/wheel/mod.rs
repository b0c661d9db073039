//! Wheel panel.
//!
//! Render-only: the spin physics and roster state live in
//! `limelight_core::wheel` and are advanced by the reducer.

mod render;

pub use render::render_wheel;
