pub mod pattern_table;
pub mod sample;

pub use pattern_table::{PatternTable, PatternWeight, SELECTION_RANGE};
pub use sample::{
    BlockRange, parse_quantity, random_address, random_block_number, random_block_range, to_hex,
};

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::LoadTestError;

/// One kind of synthetic traffic. Each iteration picks exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrafficPattern {
    RandomHistoricalBlocks,
    LatestBlockWithLogs,
    RandomLogRanges,
    RandomHistoricalReceipts,
    LatestBlockReceipts,
    RandomAccountBalances,
    TraceRandomTransactions,
}

impl TrafficPattern {
    pub const ALL: [TrafficPattern; 7] = [
        TrafficPattern::RandomHistoricalBlocks,
        TrafficPattern::LatestBlockWithLogs,
        TrafficPattern::RandomLogRanges,
        TrafficPattern::RandomHistoricalReceipts,
        TrafficPattern::LatestBlockReceipts,
        TrafficPattern::RandomAccountBalances,
        TrafficPattern::TraceRandomTransactions,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TrafficPattern::RandomHistoricalBlocks => "RANDOM_HISTORICAL_BLOCKS",
            TrafficPattern::LatestBlockWithLogs => "LATEST_BLOCK_WITH_LOGS",
            TrafficPattern::RandomLogRanges => "RANDOM_LOG_RANGES",
            TrafficPattern::RandomHistoricalReceipts => "RANDOM_HISTORICAL_RECEIPTS",
            TrafficPattern::LatestBlockReceipts => "LATEST_BLOCK_RECEIPTS",
            TrafficPattern::RandomAccountBalances => "RANDOM_ACCOUNT_BALANCES",
            TrafficPattern::TraceRandomTransactions => "TRACE_RANDOM_TRANSACTIONS",
        }
    }
}

impl fmt::Display for TrafficPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrafficPattern {
    type Err = LoadTestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TrafficPattern::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LoadTestError::config(format!("unknown traffic pattern `{wanted}`")))
    }
}
