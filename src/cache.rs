use std::time::{Duration, Instant};

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

#[derive(Debug, Clone)]
struct CachedBlock {
    block: Value,
    captured_at: Instant,
}

/// Last `eth_getBlockByNumber("latest")` result of one chain, owned by one virtual user.
///
/// A stale entry stays in place until the next successful fetch overwrites it,
/// but is never handed out.
#[derive(Debug, Clone)]
pub struct LatestBlockCache {
    ttl: Duration,
    entry: Option<CachedBlock>,
}

impl LatestBlockCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn state(&self, now: Instant) -> CacheState {
        match &self.entry {
            None => CacheState::Empty,
            Some(cached) if now.saturating_duration_since(cached.captured_at) < self.ttl => {
                CacheState::Fresh
            }
            Some(_) => CacheState::Stale,
        }
    }

    pub fn fresh(&self, now: Instant) -> Option<&Value> {
        match self.state(now) {
            CacheState::Fresh => self.entry.as_ref().map(|c| &c.block),
            CacheState::Empty | CacheState::Stale => None,
        }
    }

    pub fn store(&mut self, block: Value, captured_at: Instant) {
        self.entry = Some(CachedBlock { block, captured_at });
    }
}
