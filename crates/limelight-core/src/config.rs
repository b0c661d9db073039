//! Configuration management for limelight.
//!
//! Loads configuration from ${LIMELIGHT_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Caption display configuration.
///
/// Time-to-live values control how long finalized lines stay visible; the
/// last (newest) line can be given a longer TTL than earlier lines, or none
/// at all so that only the global clear removes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionsConfig {
    /// Whether the caption overlay is active on startup.
    pub enabled: bool,
    /// Maximum number of finalized lines kept visible.
    pub max_lines: usize,
    /// Time-to-live for lines that are no longer the newest, in seconds.
    pub line_ttl_secs: u64,
    /// Time-to-live for the newest line, in seconds (0 means it never
    /// expires on its own and only the global clear removes it).
    pub last_line_ttl_secs: u64,
    /// Quiet period after which a provisional (interim) line is dropped.
    pub interim_quiet_ms: u64,
    /// Total display duration before everything is cleared, in seconds.
    pub display_clear_secs: u64,
    /// How long a line waits for outstanding translations.
    pub translation_wait_ms: u64,
}

impl Default for CaptionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_lines: 3,
            line_ttl_secs: 8,
            last_line_ttl_secs: 0,
            interim_quiet_ms: 1500,
            display_clear_secs: 30,
            translation_wait_ms: 4000,
        }
    }
}

impl CaptionsConfig {
    pub fn line_ttl(&self) -> Duration {
        Duration::from_secs(self.line_ttl_secs)
    }

    /// TTL for the newest line; `None` means it never expires on its own.
    pub fn last_line_ttl(&self) -> Option<Duration> {
        if self.last_line_ttl_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.last_line_ttl_secs))
        }
    }

    pub fn interim_quiet(&self) -> Duration {
        Duration::from_millis(self.interim_quiet_ms)
    }

    pub fn display_clear(&self) -> Duration {
        Duration::from_secs(self.display_clear_secs)
    }

    pub fn translation_wait(&self) -> Duration {
        Duration::from_millis(self.translation_wait_ms)
    }
}

/// Wheel spin and ticket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    /// Angular velocity while spinning, in degrees per second.
    pub spin_velocity_deg_per_sec: f64,
    /// Multiplicative velocity decay applied per physics tick while
    /// decelerating.
    pub decay_factor: f64,
    /// Velocity below which the wheel is considered at rest, in degrees
    /// per second.
    pub rest_threshold_deg_per_sec: f64,
    /// Cap on base tickets from entry count (0 means uncapped).
    pub base_tickets_limit: u32,
    /// Cap on final tickets after the subscriber bonus (0 means uncapped).
    pub final_tickets_limit: u32,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            spin_velocity_deg_per_sec: 540.0,
            decay_factor: 0.985,
            rest_threshold_deg_per_sec: 12.0,
            base_tickets_limit: 10,
            final_tickets_limit: 0,
        }
    }
}

impl WheelConfig {
    pub fn ticket_limits(&self) -> crate::wheel::tickets::TicketLimits {
        crate::wheel::tickets::TicketLimits {
            base: self.base_tickets_limit,
            final_total: self.final_tickets_limit,
        }
    }
}

/// Socket transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Websocket endpoint delivering overlay events.
    pub url: String,
    /// Interval between outgoing heartbeat pings, in seconds.
    pub heartbeat_interval_secs: u64,
    /// The connection is considered stale when nothing has been received
    /// for this long, in seconds.
    pub heartbeat_timeout_secs: u64,
    /// Base delay for reconnect backoff, in milliseconds.
    pub reconnect_base_ms: u64,
    /// Upper bound on a single reconnect delay, in seconds.
    pub reconnect_cap_secs: u64,
    /// Reconnect attempts before giving up and staying disconnected.
    pub max_reconnect_attempts: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8790/overlay".to_string(),
            heartbeat_interval_secs: 5,
            heartbeat_timeout_secs: 15,
            reconnect_base_ms: 500,
            reconnect_cap_secs: 30,
            max_reconnect_attempts: 10,
        }
    }
}

impl TransportConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }

    pub fn reconnect_base(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_ms)
    }

    pub fn reconnect_cap(&self) -> Duration {
        Duration::from_secs(self.reconnect_cap_secs)
    }
}

/// REST endpoint configuration for hydration and lottery control.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the overlay server's HTTP API.
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8790".to_string(),
        }
    }
}

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
/// To update, run `cargo xtask update-default-config`.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for limelight configuration and data directories.
    //!
    //! LIMELIGHT_HOME resolution order:
    //! 1. LIMELIGHT_HOME environment variable (if set)
    //! 2. ~/.config/limelight (default)

    use std::path::PathBuf;

    /// Returns the limelight home directory.
    ///
    /// Checks LIMELIGHT_HOME env var first, falls back to ~/.config/limelight
    pub fn limelight_home() -> PathBuf {
        if let Ok(home) = std::env::var("LIMELIGHT_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("limelight"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        limelight_home().join("config.toml")
    }

    /// Returns the directory for rolling log files.
    pub fn logs_dir() -> PathBuf {
        limelight_home().join("logs")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Caption overlay configuration.
    pub captions: CaptionsConfig,

    /// Lottery wheel configuration.
    pub wheel: WheelConfig,

    /// Socket transport configuration.
    pub transport: TransportConfig,

    /// HTTP API configuration.
    pub api: ApiConfig,
}

impl Config {
    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// Uses the embedded template for structure/comments and merges values
    /// from `Config::default()` into it. `cargo xtask update-default-config`
    /// uses this to keep `default_config.toml` in sync with the Rust
    /// defaults.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let config = Config::default();
        let generated_toml =
            toml::to_string(&config).context("Failed to serialize default config to TOML")?;

        // Parse template as base (preserves comments)
        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;

        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}
