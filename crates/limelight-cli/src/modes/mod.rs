//! Runtime execution modes.
//!
//! - `replay`: headless engine drive from a recorded event file
//! - `tui`: full-screen overlay (optional feature)

pub mod replay;

#[cfg(feature = "tui")]
pub use limelight_tui::run_overlay;

#[cfg(not(feature = "tui"))]
pub async fn run_overlay(_config: &limelight_core::config::Config) -> anyhow::Result<()> {
    anyhow::bail!("TUI support is disabled in this build (feature \"tui\").");
}
