//! Recognized configuration (spec.md §6). Loaded once at startup from an
//! external JSON file by the server, and a matching subset by the client.
//!
//! Follows the teacher's `lobby::reload_config` pattern: a plain
//! `serde_json::from_str` over a file on disk, replacing the whole
//! in-memory value on reload rather than merging field by field.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsocketConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_update_interval")]
    pub update_interval_ms: u64,
    /// Not in spec.md's table verbatim, but §4.5/§5 require a periodic
    /// ping and a liveness timeout that are "configuration-driven" — added
    /// here rather than hard-coded. See DESIGN.md.
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    #[serde(default = "default_liveness_timeout_ms")]
    pub liveness_timeout_ms: u64,
}

fn default_update_interval() -> u64 {
    250
}
fn default_ping_interval_ms() -> u64 {
    15_000
}
fn default_liveness_timeout_ms() -> u64 {
    5_000
}

impl Default for WebsocketConfig {
    fn default() -> Self {
        WebsocketConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            update_interval_ms: default_update_interval(),
            ping_interval_ms: default_ping_interval_ms(),
            liveness_timeout_ms: default_liveness_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnPointsConfig {
    #[serde(default = "default_max_count")]
    pub max_count: usize,
    #[serde(default = "default_clear_radius")]
    pub clear_radius: i32,
    #[serde(default = "default_wait_message")]
    pub wait_message: String,
}

fn default_max_count() -> usize {
    25
}
fn default_clear_radius() -> i32 {
    3
}
fn default_wait_message() -> String {
    "All spawn points are occupied. You'll join as soon as one frees up.".to_string()
}

impl Default for SpawnPointsConfig {
    fn default() -> Self {
        SpawnPointsConfig {
            max_count: default_max_count(),
            clear_radius: default_clear_radius(),
            wait_message: default_wait_message(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_true")]
    pub exponential_backoff: bool,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
}

fn default_true() -> bool {
    true
}
fn default_max_attempts() -> u32 {
    5
}
fn default_retry_delay_ms() -> u64 {
    250
}
fn default_max_retry_delay_ms() -> u64 {
    8_000
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        ReconnectionConfig {
            enabled: default_true(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            exponential_backoff: default_true(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_reconciliation_interval_ms")]
    pub reconciliation_interval_ms: u64,
}

fn default_reconciliation_interval_ms() -> u64 {
    5_000
}

impl Default for PredictionConfig {
    fn default() -> Self {
        PredictionConfig {
            enabled: default_true(),
            reconciliation_interval_ms: default_reconciliation_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolationConfig {
    #[serde(default = "default_interpolation_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_interpolation_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_remote_entity_buffer_max")]
    pub remote_entity_buffer_max: usize,
    #[serde(default = "default_extrapolation_max_ms")]
    pub extrapolation_max_ms: u64,
}

fn default_interpolation_delay_ms() -> u64 {
    100
}
fn default_interpolation_tick_ms() -> u64 {
    50
}
fn default_remote_entity_buffer_max() -> usize {
    20
}
fn default_extrapolation_max_ms() -> u64 {
    300
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        InterpolationConfig {
            delay_ms: default_interpolation_delay_ms(),
            tick_ms: default_interpolation_tick_ms(),
            remote_entity_buffer_max: default_remote_entity_buffer_max(),
            extrapolation_max_ms: default_extrapolation_max_ms(),
        }
    }
}

/// The post-disconnect grace window (spec.md §9 open question — resolved
/// here as a configurable `graceMs`, default 0 = immediate removal).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectConfig {
    #[serde(default)]
    pub grace_ms: u64,
}

impl Default for DisconnectConfig {
    fn default() -> Self {
        DisconnectConfig { grace_ms: 0 }
    }
}

/// The complete, immutable configuration value injected at startup. Neither
/// side mutates this in place; a reload replaces the whole value (see
/// `server::config::reload_config`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub websocket: WebsocketConfig,
    #[serde(default)]
    pub spawn_points: SpawnPointsConfig,
    #[serde(default)]
    pub reconnection: ReconnectionConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub interpolation: InterpolationConfig,
    #[serde(default)]
    pub disconnect: DisconnectConfig,
}

impl Config {
    pub fn from_json(text: &str) -> Result<Config, serde_json::Error> {
        serde_json::from_str(text)
    }
}
