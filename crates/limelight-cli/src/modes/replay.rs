//! Headless replay of recorded overlay sessions.
//!
//! Drives the caption and wheel engines from a recorded event file on a
//! virtual clock, then prints the final state as JSON on stdout. This is the
//! headless way to check overlay behavior: no terminal, no server, fully
//! deterministic.
//!
//! The file format is one wire event per line, the same JSON the socket
//! delivers. Blank lines are skipped; malformed lines are dropped exactly
//! as they would be on the socket.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use limelight_core::captions::{CaptionBoard, CaptionsSnapshot};
use limelight_core::config::Config;
use limelight_core::events::ServerEvent;
use limelight_core::wheel::{WheelSnapshot, WheelState};
use serde::Serialize;

/// Granularity of the settle loop, matching the overlay frame cadence.
const SETTLE_STEP: Duration = Duration::from_millis(16);

/// Options for a replay run.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Path to the event file (one wire event JSON per line).
    pub events: PathBuf,
    /// Virtual time advanced between events, in milliseconds.
    pub step_ms: u64,
    /// Virtual time to keep ticking after the last event, in milliseconds.
    pub settle_ms: u64,
    /// Pretty-print the final state.
    pub pretty: bool,
}

/// Final engine state printed after the replay.
#[derive(Serialize)]
struct ReplayOutput {
    captions: CaptionsSnapshot,
    wheel: WheelSnapshot,
}

/// Replays the event file against fresh engines and prints the final state.
pub fn run_replay(config: &Config, options: &ReplayOptions) -> Result<()> {
    let raw = std::fs::read_to_string(&options.events)
        .with_context(|| format!("read events from {}", options.events.display()))?;

    let mut captions = CaptionBoard::new(config.captions.clone());
    let mut wheel = WheelState::new(config.wheel.clone());

    let step = Duration::from_millis(options.step_ms);
    let mut now = Instant::now();
    let mut applied: u64 = 0;
    let mut dropped: u64 = 0;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(event) = ServerEvent::parse(line) else {
            dropped += 1;
            continue;
        };
        captions.handle_event(&event, now);
        wheel.handle_event(&event, now);
        applied += 1;

        now += step;
        captions.tick(now);
        wheel.step(now);
    }

    // Keep ticking so expiries land and the wheel can come to rest.
    let mut remaining = Duration::from_millis(options.settle_ms);
    while remaining > Duration::ZERO {
        let chunk = remaining.min(SETTLE_STEP);
        now += chunk;
        captions.tick(now);
        wheel.step(now);
        remaining -= chunk;
    }

    let simulated_ms = applied * options.step_ms + options.settle_ms;
    eprintln!("Replayed {applied} events ({dropped} dropped), {simulated_ms}ms simulated");

    let output = ReplayOutput {
        captions: captions.snapshot(),
        wheel: wheel.snapshot(),
    };
    let json = if options.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{json}");
    Ok(())
}
