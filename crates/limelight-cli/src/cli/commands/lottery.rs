//! Lottery control handlers.
//!
//! Thin wrappers over the REST client; the overlay (or any other connected
//! client) sees the resulting state changes over the socket.

use anyhow::{Context, Result};
use limelight_core::api::OverlayApi;

pub async fn start(api: &OverlayApi) -> Result<()> {
    api.start_lottery().await.context("start lottery")?;
    println!("Spin started");
    Ok(())
}

pub async fn stop(api: &OverlayApi) -> Result<()> {
    api.stop_lottery().await.context("stop lottery")?;
    println!("Spin stopping; the server will announce the winner");
    Ok(())
}

pub async fn clear(api: &OverlayApi) -> Result<()> {
    api.clear_participants().await.context("clear participants")?;
    println!("Participants cleared");
    Ok(())
}

pub async fn set_locked(api: &OverlayApi, locked: bool) -> Result<()> {
    api.set_locked(locked).await.context("set lottery lock")?;
    println!("Entries {}", if locked { "locked" } else { "unlocked" });
    Ok(())
}
