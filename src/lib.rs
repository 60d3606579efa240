pub mod cache;
pub mod chain;
pub mod config;
pub mod error;
pub mod executor;
pub mod generator;
pub mod jsonrpc;
pub mod metrics;
pub mod traffic;
pub mod transport;
pub mod types;
pub mod validate;

pub use error::{LoadTestError, Result};
pub use generator::{Outcome, SkipReason, TrafficGenerator};
pub use jsonrpc::JsonRpcRequest;
pub use types::{ChainId, ChainSpec, LoadTestSettings, LogLevel, ScenarioSettings};

// Re-export commonly used items
pub use config::{NormalizedConfig, resolve_config};
pub use executor::{ConstantArrivalRate, ExecutionReport, Iteration};
pub use metrics::{Metrics, Summary};
pub use traffic::{PatternTable, PatternWeight, TrafficPattern};
pub use transport::{HttpTransport, MeteredTransport, RpcResponse, RpcTransport};
