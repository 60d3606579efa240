#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use rand::{SeedableRng, rngs::StdRng};
use rpc_loadgen::*;
use serde_json::{Value, json};

type Responder = dyn Fn(&JsonRpcRequest) -> Result<RpcResponse> + Send + Sync;

/// In-memory transport answering from a closure and recording what was asked.
pub struct ScriptedTransport {
    responder: Box<Responder>,
    pub calls: parking_lot::Mutex<Vec<(String, JsonRpcRequest)>>,
}

impl ScriptedTransport {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&JsonRpcRequest) -> Result<RpcResponse> + Send + Sync + 'static,
    {
        Arc::new(Self { responder: Box::new(responder), calls: parking_lot::Mutex::new(vec![]) })
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, r)| r.method.clone()).collect()
    }

    pub fn requests(&self) -> Vec<JsonRpcRequest> {
        self.calls.lock().iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn chain_ids(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(c, _)| c.clone()).collect()
    }
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn post(&self, chain_id: &str, request: &JsonRpcRequest) -> Result<RpcResponse> {
        self.calls.lock().push((chain_id.to_string(), request.clone()));
        (self.responder)(request)
    }
}

pub fn response(status: u16, body: Value) -> Result<RpcResponse> {
    Ok(RpcResponse { status, body: body.to_string(), request_body: String::new() })
}

pub fn raw_response(status: u16, body: &str) -> Result<RpcResponse> {
    Ok(RpcResponse { status, body: body.to_string(), request_body: String::new() })
}

pub fn ok_result(result: Value) -> Result<RpcResponse> {
    response(200, json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

pub fn single_chain_config(min: u64, max: u64) -> NormalizedConfig {
    resolve_config(LoadTestSettings {
        base_url: Some("http://localhost:4000/main/evm/".into()),
        chains: Some(vec![ChainSpec::new("TEST", "1", min, max)]),
        ..Default::default()
    })
    .expect("valid test config")
}

pub fn generator(
    config: &NormalizedConfig,
    transport: Arc<ScriptedTransport>,
    seed: u64,
) -> (TrafficGenerator<StdRng>, Arc<Metrics>) {
    let metrics = Arc::new(Metrics::new());
    let generator = TrafficGenerator::new(
        config,
        transport,
        Arc::clone(&metrics),
        StdRng::seed_from_u64(seed),
    );
    (generator, metrics)
}

pub fn block_with_transactions(number: &str, txs: Value) -> Value {
    json!({"number": number, "hash": "0xblock", "transactions": txs})
}

pub fn parse_hex(s: &str) -> u64 {
    u64::from_str_radix(s.trim_start_matches("0x"), 16).expect("hex quantity")
}
