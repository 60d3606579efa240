pub mod http;
pub mod metered;

pub use http::HttpTransport;
pub use metered::MeteredTransport;

use async_trait::async_trait;
use serde_json::Value;

use crate::{JsonRpcRequest, Result};

/// Raw HTTP outcome of one JSON-RPC POST. The body is kept as text because
/// validation has to cope with bodies that are not JSON at all.
#[derive(Debug, Clone)]
pub struct RpcResponse {
    pub status: u16,
    pub body: String,
    /// Serialized request, kept for diagnostics
    pub request_body: String,
}

impl RpcResponse {
    pub fn is_ok_status(&self) -> bool {
        self.status == 200
    }

    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

/// Sends a JSON-RPC request to the endpoint of `chain_id`.
///
/// `Err` is reserved for requests that never produced an HTTP response
/// (connect failure, timeout); any status code comes back as `Ok`.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn post(&self, chain_id: &str, request: &JsonRpcRequest) -> Result<RpcResponse>;
}
