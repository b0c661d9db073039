//! Overlay command handler.

use anyhow::{Context, Result};
use limelight_core::{config, logging};

use crate::modes;

pub async fn run(config: &config::Config) -> Result<()> {
    // Log to a file; stderr belongs to the alternate screen while the
    // overlay is up. The guard flushes on drop.
    let _guard = logging::init_file().context("init logging")?;

    modes::run_overlay(config).await.context("overlay failed")
}
