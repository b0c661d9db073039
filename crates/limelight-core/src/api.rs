//! REST client for the overlay server.
//!
//! The socket delivers live updates; this client covers everything else:
//! hydrating lottery state before the socket is connected and driving the
//! start/stop/clear/lock controls.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::events::Participant;

/// Lottery state as served over HTTP, used for initial hydration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LotterySnapshot {
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub base_tickets_limit: Option<u32>,
    #[serde(default)]
    pub final_tickets_limit: Option<u32>,
    #[serde(default)]
    pub is_locked: bool,
}

#[derive(Debug, Serialize)]
struct LockRequest {
    locked: bool,
}

#[derive(Clone)]
pub struct OverlayApi {
    client: reqwest::Client,
    base_url: String,
}

impl OverlayApi {
    pub fn new(cfg: &ApiConfig) -> Self {
        OverlayApi {
            client: reqwest::Client::new(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetches the current participant list and ticket limits.
    pub async fn fetch_lottery(&self) -> Result<LotterySnapshot> {
        let url = format!("{}/api/lottery/participants", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        response.json().await.context("malformed lottery snapshot")
    }

    pub async fn start_lottery(&self) -> Result<()> {
        self.post("/api/lottery/start").await
    }

    pub async fn stop_lottery(&self) -> Result<()> {
        self.post("/api/lottery/stop").await
    }

    pub async fn clear_participants(&self) -> Result<()> {
        self.post("/api/lottery/clear").await
    }

    /// Locks or unlocks entry into the current round.
    pub async fn set_locked(&self, locked: bool) -> Result<()> {
        let url = format!("{}/api/lottery/lock", self.base_url);
        self.client
            .post(&url)
            .json(&LockRequest { locked })
            .send()
            .await
            .with_context(|| format!("POST {url}"))?
            .error_for_status()
            .with_context(|| format!("POST {url}"))?;
        Ok(())
    }

    async fn post(&self, path: &str) -> Result<()> {
        let url = format!("{}{path}", self.base_url);
        self.client
            .post(&url)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?
            .error_for_status()
            .with_context(|| format!("POST {url}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let api = OverlayApi::new(&ApiConfig {
            base_url: "http://127.0.0.1:9000/".to_string(),
        });
        assert_eq!(api.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_snapshot_defaults() {
        let snapshot: LotterySnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.participants.is_empty());
        assert_eq!(snapshot.base_tickets_limit, None);
        assert!(!snapshot.is_locked);
    }

    #[test]
    fn test_snapshot_full_shape() {
        let snapshot: LotterySnapshot = serde_json::from_str(
            r#"{
                "participants": [{"id": "ada", "entry_count": 2, "is_subscriber": true, "subscriber_tier": "2000", "subscribed_months": 6}],
                "base_tickets_limit": 3,
                "final_tickets_limit": 10,
                "is_locked": true
            }"#,
        )
        .unwrap();
        assert_eq!(snapshot.participants.len(), 1);
        assert_eq!(snapshot.participants[0].id, "ada");
        assert_eq!(snapshot.base_tickets_limit, Some(3));
        assert!(snapshot.is_locked);
    }
}
