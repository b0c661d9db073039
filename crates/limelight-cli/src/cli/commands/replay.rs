//! Replay command handler.

use std::path::Path;

use anyhow::Result;
use limelight_core::config::Config;

use crate::modes;

pub fn run(
    config: &Config,
    events: &Path,
    step_ms: u64,
    settle_ms: u64,
    pretty: bool,
) -> Result<()> {
    limelight_core::logging::init_stderr();

    let options = modes::replay::ReplayOptions {
        events: events.to_path_buf(),
        step_ms,
        settle_ms,
        pretty,
    };
    modes::replay::run_replay(config, &options)
}
