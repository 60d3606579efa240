use std::{fs, str::FromStr};

use crate::{
    LoadTestError, Result,
    traffic::{PatternWeight, TrafficPattern, parse_quantity},
    types::{ChainSpec, LoadTestSettings, ScenarioSettings},
};

pub const ENV_CONFIG_FILE: &str = "LOADTEST_CONFIG";
pub const ENV_BASE_URL: &str = "ERPC_BASE_URL";
pub const ENV_CHAINS: &str = "LOADTEST_CHAINS";
pub const ENV_WEIGHTS: &str = "LOADTEST_WEIGHTS";

impl LoadTestSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the optional JSON file named by `LOADTEST_CONFIG`, then lets individual
    /// variables override it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match lookup(ENV_CONFIG_FILE) {
            Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            None => LoadTestSettings::default(),
        };

        if let Some(url) = lookup(ENV_BASE_URL) {
            settings.base_url = Some(url);
        }
        if let Some(raw) = lookup(ENV_CHAINS) {
            settings.chains = Some(parse_chains(&raw)?);
        }
        if let Some(raw) = lookup(ENV_WEIGHTS) {
            settings.traffic_patterns = Some(parse_weights(&raw)?);
        }

        override_parsed(&lookup, "LOADTEST_LOG_RANGE_MIN_BLOCKS", &mut settings.log_range_min_blocks)?;
        override_parsed(&lookup, "LOADTEST_LOG_RANGE_MAX_BLOCKS", &mut settings.log_range_max_blocks)?;
        override_parsed(&lookup, "LOADTEST_FOLLOW_CHAIN_HEAD", &mut settings.follow_chain_head)?;
        override_parsed(&lookup, "LOADTEST_INSECURE_SKIP_TLS_VERIFY", &mut settings.insecure_skip_tls_verify)?;
        override_parsed(&lookup, "LOADTEST_LOG_LEVEL", &mut settings.log_level)?;

        override_secs_as_ms(&lookup, "LOADTEST_LATEST_BLOCK_TTL_SECS", &mut settings.latest_block_cache_ttl_ms)?;
        override_secs_as_ms(&lookup, "LOADTEST_REQUEST_TIMEOUT_SECS", &mut settings.request_timeout_ms)?;

        if let Some(v) = lookup("LOADTEST_VARIANT") {
            settings.variant = Some(v);
        }
        if let Some(v) = lookup("LOADTEST_RESULTS_DIR") {
            settings.results_dir = Some(v);
        }

        let mut scenario: ScenarioSettings = settings.scenario.take().unwrap_or_default();
        override_parsed(&lookup, "LOADTEST_RATE", &mut scenario.rate)?;
        override_parsed(&lookup, "LOADTEST_TIME_UNIT_MS", &mut scenario.time_unit_ms)?;
        override_parsed(&lookup, "LOADTEST_DURATION_SECS", &mut scenario.duration_secs)?;
        override_parsed(&lookup, "LOADTEST_PRE_ALLOCATED_VUS", &mut scenario.pre_allocated_vus)?;
        override_parsed(&lookup, "LOADTEST_MAX_VUS", &mut scenario.max_vus)?;
        override_parsed(&lookup, "LOADTEST_GRACEFUL_STOP_SECS", &mut scenario.graceful_stop_secs)?;
        settings.scenario = Some(scenario);

        Ok(settings)
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, slot: &mut Option<T>) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        let value = raw
            .trim()
            .parse()
            .map_err(|_| LoadTestError::config(format!("{key}: cannot parse `{raw}`")))?;
        *slot = Some(value);
    }
    Ok(())
}

fn override_secs_as_ms<F>(lookup: &F, key: &str, slot: &mut Option<u64>) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let mut secs: Option<u64> = None;
    override_parsed(lookup, key, &mut secs)?;
    if let Some(s) = secs {
        let ms = s
            .checked_mul(1000)
            .ok_or_else(|| LoadTestError::config(format!("{key}: {s} seconds is out of range")))?;
        *slot = Some(ms);
    }
    Ok(())
}

/// `name:id:min:max` entries separated by commas. Block numbers may be hex.
pub fn parse_chains(raw: &str) -> Result<Vec<ChainSpec>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            let [name, id, min, max] = parts.as_slice() else {
                return Err(LoadTestError::config(format!(
                    "chain entry `{entry}` is not name:id:min:max"
                )));
            };
            let block = |s: &str| {
                parse_quantity(s).ok_or_else(|| {
                    LoadTestError::config(format!("chain entry `{entry}`: bad block number `{s}`"))
                })
            };
            Ok(ChainSpec::new(name, id, block(min)?, block(max)?))
        })
        .collect()
}

/// `PATTERN=weight` entries separated by commas, kept in the given order.
pub fn parse_weights(raw: &str) -> Result<Vec<PatternWeight>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, weight) = entry.split_once('=').ok_or_else(|| {
                LoadTestError::config(format!("weight entry `{entry}` is not PATTERN=weight"))
            })?;
            let pattern = TrafficPattern::from_str(name)?;
            let weight = weight.trim().parse().map_err(|_| {
                LoadTestError::config(format!("weight entry `{entry}`: bad weight"))
            })?;
            Ok(PatternWeight { pattern, weight })
        })
        .collect()
}

