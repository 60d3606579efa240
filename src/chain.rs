use std::time::Duration;

use crate::{cache::LatestBlockCache, types::ChainSpec};

/// Mutable per-virtual-user view of a configured chain.
#[derive(Debug, Clone)]
pub struct ChainDescriptor {
    pub name: String,
    pub id: String,
    pub block_min: u64,
    pub block_max: u64,
    pub cache: LatestBlockCache,
}

impl ChainDescriptor {
    pub fn new(spec: &ChainSpec, latest_block_ttl: Duration) -> Self {
        Self {
            name: spec.name.clone(),
            id: spec.id.clone(),
            block_min: spec.block_min,
            block_max: spec.block_max,
            cache: LatestBlockCache::new(latest_block_ttl),
        }
    }

    /// Moves the sampling window so it ends at `head`, keeping its width.
    /// Returns whether the window moved.
    pub fn follow_head(&mut self, head: u64) -> bool {
        if head <= self.block_max {
            return false;
        }
        let width = self.block_max - self.block_min;
        self.block_max = head;
        self.block_min = head - width;
        true
    }
}
