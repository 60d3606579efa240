use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::{
    JsonRpcRequest, LoadTestError, NormalizedConfig, Result,
    transport::{RpcResponse, RpcTransport},
};

pub struct HttpTransport {
    base_url: Url,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &NormalizedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.transport.request_timeout)
            .danger_accept_invalid_certs(config.transport.insecure_skip_tls_verify)
            .build()?;

        Ok(Self {
            base_url: config.base_url.clone(),
            timeout: config.transport.request_timeout,
            client,
        })
    }

    /// `<base_url><chain_id>`, concatenated as-is. The base URL is expected to end with `/`.
    pub fn endpoint(&self, chain_id: &str) -> String {
        format!("{}{}", self.base_url, chain_id)
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn post(&self, chain_id: &str, request: &JsonRpcRequest) -> Result<RpcResponse> {
        let request_body = serde_json::to_string(request)?;
        let url = self.endpoint(chain_id);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(request_body.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        tracing::trace!(url = %url, method = %request.method, status, size = body.len(), "rpc call finished");

        Ok(RpcResponse { status, body, request_body })
    }
}

impl HttpTransport {
    fn classify(&self, err: reqwest::Error) -> LoadTestError {
        if err.is_timeout() {
            LoadTestError::Timeout { duration_ms: self.timeout.as_millis() as u64 }
        } else {
            LoadTestError::Network(err)
        }
    }
}
