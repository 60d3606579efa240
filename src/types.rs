use serde::{Deserialize, Serialize};

use crate::traffic::PatternWeight;

pub type ChainId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_tracing(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = crate::LoadTestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(crate::LoadTestError::config(format!("unknown log level `{other}`"))),
        }
    }
}

/// A chain reachable at `<base_url><id>` and the block window sampled from it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainSpec {
    pub name: String,
    pub id: ChainId,
    pub block_min: u64,
    pub block_max: u64,
}

impl ChainSpec {
    pub fn new(name: &str, id: &str, block_min: u64, block_max: u64) -> Self {
        Self { name: name.to_string(), id: id.to_string(), block_min, block_max }
    }

    /// Mainnet, Polygon and Arbitrum One with windows deep enough into history to
    /// miss most proxy caches.
    pub fn defaults() -> Vec<ChainSpec> {
        vec![
            ChainSpec::new("ETH", "1", 0x1006F40, 0x1406F40),
            ChainSpec::new("POLYGON", "137", 0x20D9900, 0x40D9900),
            ChainSpec::new("ARBITRUM", "42161", 0x10E1A300, 0x11E1A300),
        ]
    }
}

// Raw settings: everything optional, defaults are applied by `resolve_config`.

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadTestSettings {
    pub base_url: Option<String>,
    pub chains: Option<Vec<ChainSpec>>,
    pub traffic_patterns: Option<Vec<PatternWeight>>,
    pub log_range_min_blocks: Option<u64>,
    pub log_range_max_blocks: Option<u64>,
    pub latest_block_cache_ttl_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub insecure_skip_tls_verify: Option<bool>,
    pub follow_chain_head: Option<bool>,
    pub scenario: Option<ScenarioSettings>,
    pub log_level: Option<LogLevel>,
    pub variant: Option<String>,
    pub results_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioSettings {
    pub rate: Option<u32>,
    pub time_unit_ms: Option<u64>,
    pub duration_secs: Option<u64>,
    pub pre_allocated_vus: Option<usize>,
    pub max_vus: Option<usize>,
    pub graceful_stop_secs: Option<u64>,
}
