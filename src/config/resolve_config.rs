use std::{path::PathBuf, time::Duration};

use url::Url;

use crate::{
    LoadTestError, Result,
    traffic::PatternTable,
    types::{ChainSpec, LoadTestSettings, LogLevel},
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:4000/main/evm/";
pub const DEFAULT_RESULTS_DIR: &str = "loadtest/results";

#[derive(Debug, Clone)]
pub struct NormalizedConfig {
    /// Proxy prefix; requests go to `<base_url><chain id>`
    pub base_url: Url,
    /// Chains picked uniformly at random each iteration
    pub chains: Vec<ChainSpec>,
    /// Weighted traffic mix
    pub patterns: PatternTable,
    pub generator: GeneratorConfig,
    pub transport: TransportConfig,
    pub scenario: ScenarioConfig,
    pub log_level: LogLevel,
    /// Label attached to exported metrics so runs against proxy variants can be compared
    pub variant: String,
    pub results_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Bounds for the width of random `eth_getLogs` ranges, in blocks
    pub log_range_min_blocks: u64,
    pub log_range_max_blocks: u64,
    /// How long a fetched latest block is reused
    pub latest_block_ttl: Duration,
    /// Slide each chain's sampling window forward when a newer head is seen
    pub follow_chain_head: bool,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub request_timeout: Duration,
    pub insecure_skip_tls_verify: bool,
}

#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Iterations started per `time_unit`
    pub rate: u32,
    pub time_unit: Duration,
    pub duration: Duration,
    pub pre_allocated_vus: usize,
    pub max_vus: usize,
    /// Time in-flight iterations get to finish once the test stops
    pub graceful_stop: Duration,
}

impl ScenarioConfig {
    /// Gap between two iteration starts.
    pub fn start_interval(&self) -> Duration {
        self.time_unit / self.rate
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            rate: 10,
            time_unit: Duration::from_secs(1),
            duration: Duration::from_secs(100 * 60),
            pre_allocated_vus: 500,
            max_vus: 500,
            graceful_stop: Duration::from_secs(30),
        }
    }
}

pub fn resolve_config(settings: LoadTestSettings) -> Result<NormalizedConfig> {
    let base_url = Url::parse(settings.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

    let chains = settings.chains.unwrap_or_else(ChainSpec::defaults);
    if chains.is_empty() {
        return Err(LoadTestError::config("at least one chain is required"));
    }
    for chain in &chains {
        if chain.block_min > chain.block_max {
            return Err(LoadTestError::config(format!(
                "chain {} has block_min {} above block_max {}",
                chain.name, chain.block_min, chain.block_max
            )));
        }
    }

    let patterns = match settings.traffic_patterns {
        Some(entries) => PatternTable::new(entries)?,
        None => PatternTable::default(),
    };
    if patterns.total_weight() != 100 {
        tracing::warn!(
            total = patterns.total_weight(),
            "traffic pattern weights do not sum to 100, selection will be skewed"
        );
    }

    let log_range_min_blocks = settings.log_range_min_blocks.unwrap_or(1);
    let log_range_max_blocks = settings.log_range_max_blocks.unwrap_or(100);
    if log_range_min_blocks > log_range_max_blocks {
        return Err(LoadTestError::config(format!(
            "log range min {log_range_min_blocks} is above max {log_range_max_blocks}"
        )));
    }
    for chain in &chains {
        if chain.block_max.checked_add(log_range_max_blocks).is_none() {
            return Err(LoadTestError::config(format!(
                "chain {} block_max {} leaves no room for {log_range_max_blocks}-block log ranges",
                chain.name, chain.block_max
            )));
        }
    }

    let defaults = ScenarioConfig::default();
    let scenario_settings = settings.scenario.unwrap_or_default();
    let scenario = ScenarioConfig {
        rate: scenario_settings.rate.unwrap_or(defaults.rate),
        time_unit: scenario_settings
            .time_unit_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.time_unit),
        duration: scenario_settings
            .duration_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.duration),
        pre_allocated_vus: scenario_settings
            .pre_allocated_vus
            .unwrap_or(defaults.pre_allocated_vus),
        max_vus: scenario_settings.max_vus.unwrap_or(defaults.max_vus),
        graceful_stop: scenario_settings
            .graceful_stop_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.graceful_stop),
    };
    if scenario.rate == 0 {
        return Err(LoadTestError::config("rate must be greater than zero"));
    }
    if scenario.start_interval().is_zero() {
        return Err(LoadTestError::config(format!(
            "rate {} per {:?} leaves no time between iteration starts",
            scenario.rate, scenario.time_unit
        )));
    }
    if scenario.max_vus == 0 || scenario.max_vus < scenario.pre_allocated_vus {
        return Err(LoadTestError::config(format!(
            "max_vus ({}) must be non-zero and at least pre_allocated_vus ({})",
            scenario.max_vus, scenario.pre_allocated_vus
        )));
    }

    Ok(NormalizedConfig {
        base_url,
        chains,
        patterns,
        generator: GeneratorConfig {
            log_range_min_blocks,
            log_range_max_blocks,
            latest_block_ttl: Duration::from_millis(
                settings.latest_block_cache_ttl_ms.unwrap_or(5_000),
            ),
            follow_chain_head: settings.follow_chain_head.unwrap_or(false),
        },
        transport: TransportConfig {
            request_timeout: Duration::from_millis(settings.request_timeout_ms.unwrap_or(30_000)),
            insecure_skip_tls_verify: settings.insecure_skip_tls_verify.unwrap_or(true),
        },
        scenario,
        log_level: settings.log_level.unwrap_or(LogLevel::Info),
        variant: settings.variant.unwrap_or_else(|| "default".to_string()),
        results_dir: PathBuf::from(
            settings.results_dir.as_deref().unwrap_or(DEFAULT_RESULTS_DIR),
        ),
    })
}
