pub mod env;
pub mod resolve_config;

pub use env::{parse_chains, parse_weights};
pub use resolve_config::{
    GeneratorConfig, NormalizedConfig, ScenarioConfig, TransportConfig, resolve_config,
};
