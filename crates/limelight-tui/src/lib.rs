//! Full-screen terminal overlay for Limelight.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr};

use anyhow::Result;
pub use features::{captions, statusline, wheel};
use limelight_core::config::Config;
pub use runtime::TuiRuntime;

/// Runs the overlay until the user quits.
pub async fn run_overlay(config: &Config) -> Result<()> {
    // The overlay needs a real terminal to render into
    if !stderr().is_terminal() {
        anyhow::bail!(
            "The overlay requires a terminal.\n\
             Use `limelight replay --events <file>` for headless runs."
        );
    }

    // Print pre-TUI info to stderr (will be replaced by alternate screen)
    let mut err = stderr();
    writeln!(err, "Limelight Overlay")?;
    writeln!(err, "Socket: {}", config.transport.url)?;
    writeln!(err, "API: {}", config.api.base_url)?;
    err.flush()?;

    let mut runtime = TuiRuntime::new(config)?;
    runtime.run()?;

    // Print goodbye after the TUI exits (terminal restored)
    writeln!(stderr(), "Goodbye!")?;

    Ok(())
}
