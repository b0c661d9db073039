//! Shared rendering helpers.

pub mod text;
