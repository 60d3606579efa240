use std::{sync::Arc, time::Instant};

use async_trait::async_trait;

use crate::{
    JsonRpcRequest, Result,
    metrics::Metrics,
    transport::{RpcResponse, RpcTransport},
};

/// Wraps a transport and records every request it sends into `Metrics`.
pub struct MeteredTransport<T> {
    inner: T,
    metrics: Arc<Metrics>,
}

impl<T: RpcTransport> MeteredTransport<T> {
    pub fn new(inner: T, metrics: Arc<Metrics>) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl<T: RpcTransport> RpcTransport for MeteredTransport<T> {
    async fn post(&self, chain_id: &str, request: &JsonRpcRequest) -> Result<RpcResponse> {
        let start = Instant::now();
        let result = self.inner.post(chain_id, request).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => {
                let failed = !(200..400).contains(&response.status);
                self.metrics.record_http(
                    elapsed,
                    response.request_body.len(),
                    response.body.len(),
                    failed,
                );
            }
            Err(e) => {
                tracing::debug!(chain = %chain_id, method = %request.method, error = %e, "request failed before a response");
                self.metrics.record_http(elapsed, 0, 0, true);
            }
        }

        result
    }
}
