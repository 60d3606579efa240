use std::{sync::Arc, time::Instant};

use rand::{Rng, rngs::StdRng};
use serde_json::{Value, json};

use crate::{
    JsonRpcRequest, NormalizedConfig, Result,
    chain::ChainDescriptor,
    config::GeneratorConfig,
    jsonrpc::{
        DEBUG_TRACE_TRANSACTION, ETH_GET_BALANCE, ETH_GET_BLOCK_BY_NUMBER, ETH_GET_LOGS,
        ETH_GET_TRANSACTION_RECEIPT, TRACE_REPLAY_TRANSACTION, TRACE_TRANSACTION,
        TRANSFER_EVENT_TOPIC, is_truthy, truthy_result,
    },
    metrics::Metrics,
    traffic::{
        PatternTable, TrafficPattern, parse_quantity, random_address, random_block_number,
        random_block_range, to_hex,
    },
    transport::{RpcResponse, RpcTransport},
    validate::{self, CheckReport},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The latest block could not be fetched or had no usable number
    NoLatestBlock,
    /// The latest block carried no transactions to pick from
    NoTransactions,
}

/// What one iteration ended with.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A response came back; its status may still be anything.
    Completed(RpcResponse),
    /// Nothing was sent for this iteration.
    Skipped(SkipReason),
    /// The request never produced a response.
    TransportError(String),
}

impl Outcome {
    pub fn response(&self) -> Option<&RpcResponse> {
        match self {
            Outcome::Completed(response) => Some(response),
            Outcome::Skipped(_) | Outcome::TransportError(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }
}

fn finish(result: Result<RpcResponse>) -> Outcome {
    match result {
        Ok(response) => Outcome::Completed(response),
        Err(e) => Outcome::TransportError(e.to_string()),
    }
}

/// The per-virtual-user traffic source. Owns its chain descriptors, so latest-block
/// caches are never shared between virtual users.
pub struct TrafficGenerator<R = StdRng> {
    chains: Vec<ChainDescriptor>,
    patterns: PatternTable,
    config: GeneratorConfig,
    transport: Arc<dyn RpcTransport>,
    metrics: Arc<Metrics>,
    rng: R,
}

impl<R: Rng + Send> TrafficGenerator<R> {
    pub fn new(
        config: &NormalizedConfig,
        transport: Arc<dyn RpcTransport>,
        metrics: Arc<Metrics>,
        rng: R,
    ) -> Self {
        let ttl = config.generator.latest_block_ttl;
        Self {
            chains: config.chains.iter().map(|spec| ChainDescriptor::new(spec, ttl)).collect(),
            patterns: config.patterns.clone(),
            config: config.generator.clone(),
            transport,
            metrics,
            rng,
        }
    }

    pub fn chains(&self) -> &[ChainDescriptor] {
        &self.chains
    }

    /// One full iteration: pick a chain and a pattern, run it, record checks.
    pub async fn run_iteration(&mut self) -> Outcome {
        let chain_idx = self.rng.gen_range(0..self.chains.len());
        let pattern = self.patterns.sample(&mut self.rng);
        self.metrics.record_iteration(pattern);

        let outcome = self.execute(pattern, chain_idx).await;
        self.record(&outcome, pattern, chain_idx);
        outcome
    }

    fn record(&self, outcome: &Outcome, pattern: TrafficPattern, chain_idx: usize) {
        let chain = &self.chains[chain_idx].name;
        match outcome {
            Outcome::Completed(response) => {
                let report = validate::check_response(response);
                self.metrics.record_checks(&report);
                self.metrics.record_error(!response.is_ok_status());
            }
            Outcome::TransportError(detail) => {
                tracing::debug!(%chain, %pattern, error = %detail, "iteration ended without a response");
                self.metrics.record_checks(&CheckReport::failed());
                self.metrics.record_error(true);
            }
            Outcome::Skipped(reason) => {
                tracing::trace!(%chain, %pattern, ?reason, "iteration skipped");
                self.metrics.record_skip();
            }
        }
    }

    /// Runs `pattern` against `chains()[chain_idx]` without touching the checks.
    pub async fn execute(&mut self, pattern: TrafficPattern, chain_idx: usize) -> Outcome {
        match pattern {
            TrafficPattern::RandomHistoricalBlocks => self.random_historical_block(chain_idx).await,
            TrafficPattern::LatestBlockWithLogs => self.latest_block_with_logs(chain_idx).await,
            TrafficPattern::RandomLogRanges => self.random_log_range(chain_idx).await,
            TrafficPattern::RandomHistoricalReceipts => {
                self.random_historical_receipt(chain_idx).await
            }
            TrafficPattern::LatestBlockReceipts => self.latest_block_receipt(chain_idx).await,
            TrafficPattern::RandomAccountBalances => self.random_account_balance(chain_idx).await,
            TrafficPattern::TraceRandomTransactions => self.trace_random_transaction(chain_idx).await,
        }
    }

    /// Latest block of the chain, reused while fresh. `None` when it cannot be fetched.
    pub async fn latest_block(&mut self, chain_idx: usize) -> Option<Value> {
        let now = Instant::now();
        if let Some(block) = self.chains[chain_idx].cache.fresh(now) {
            return Some(block.clone());
        }

        let response = match self
            .send(chain_idx, ETH_GET_BLOCK_BY_NUMBER, json!(["latest", false]))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(chain = %self.chains[chain_idx].name, error = %e, "latest block fetch failed");
                return None;
            }
        };
        if !response.is_ok_status() {
            return None;
        }
        let body = match response.json() {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(chain = %self.chains[chain_idx].name, error = %e, "failed to parse latest block response");
                return None;
            }
        };
        let block = truthy_result(&body)?.clone();

        let chain = &mut self.chains[chain_idx];
        chain.cache.store(block.clone(), now);
        if self.config.follow_chain_head {
            let head = block.get("number").and_then(Value::as_str).and_then(parse_quantity);
            if let Some(head) = head {
                if chain.follow_head(head) {
                    tracing::debug!(chain = %chain.name, min = chain.block_min, max = chain.block_max, "block window moved to head");
                }
            }
        }
        Some(block)
    }

    async fn random_historical_block(&mut self, chain_idx: usize) -> Outcome {
        let block = self.random_block_hex(chain_idx);
        finish(self.send(chain_idx, ETH_GET_BLOCK_BY_NUMBER, json!([block, false])).await)
    }

    async fn latest_block_with_logs(&mut self, chain_idx: usize) -> Outcome {
        let Some(latest) = self.latest_block(chain_idx).await else {
            return Outcome::Skipped(SkipReason::NoLatestBlock);
        };
        let Some(number) = latest.get("number").filter(|n| is_truthy(n)).cloned() else {
            return Outcome::Skipped(SkipReason::NoLatestBlock);
        };

        let filter = json!({
            "fromBlock": number,
            "toBlock": number,
            "topics": [TRANSFER_EVENT_TOPIC],
        });
        finish(self.send(chain_idx, ETH_GET_LOGS, json!([filter])).await)
    }

    async fn random_log_range(&mut self, chain_idx: usize) -> Outcome {
        let chain = &self.chains[chain_idx];
        let range = random_block_range(
            &mut self.rng,
            chain.block_min,
            chain.block_max,
            self.config.log_range_min_blocks,
            self.config.log_range_max_blocks,
        );

        let filter = json!({
            "fromBlock": to_hex(range.from_block),
            "toBlock": to_hex(range.to_block),
            "topics": [TRANSFER_EVENT_TOPIC],
        });
        finish(self.send(chain_idx, ETH_GET_LOGS, json!([filter])).await)
    }

    async fn random_historical_receipt(&mut self, chain_idx: usize) -> Outcome {
        let block_response = match self.random_full_block(chain_idx).await {
            Ok(response) => response,
            Err(e) => return Outcome::TransportError(e.to_string()),
        };
        let Some(hash) = self.pick_from_block_response(chain_idx, &block_response) else {
            return Outcome::Completed(block_response);
        };
        finish(self.send(chain_idx, ETH_GET_TRANSACTION_RECEIPT, json!([hash])).await)
    }

    async fn latest_block_receipt(&mut self, chain_idx: usize) -> Outcome {
        let Some(latest) = self.latest_block(chain_idx).await else {
            return Outcome::Skipped(SkipReason::NoLatestBlock);
        };
        let Some(hash) = self.pick_transaction_hash(&latest) else {
            return Outcome::Skipped(SkipReason::NoTransactions);
        };
        finish(self.send(chain_idx, ETH_GET_TRANSACTION_RECEIPT, json!([hash])).await)
    }

    async fn random_account_balance(&mut self, chain_idx: usize) -> Outcome {
        let address = random_address(&mut self.rng);
        finish(self.send(chain_idx, ETH_GET_BALANCE, json!([address, "latest"])).await)
    }

    /// Tries the debug and trace namespaces in turn. Nodes usually expose only one
    /// of them, so a failed attempt just moves on to the next method.
    async fn trace_random_transaction(&mut self, chain_idx: usize) -> Outcome {
        let block_response = match self.random_full_block(chain_idx).await {
            Ok(response) => response,
            Err(e) => return Outcome::TransportError(e.to_string()),
        };
        let Some(hash) = self.pick_from_block_response(chain_idx, &block_response) else {
            return Outcome::Completed(block_response);
        };

        let attempts = [
            (DEBUG_TRACE_TRANSACTION, json!([hash, { "tracer": "callTracer" }])),
            (TRACE_REPLAY_TRANSACTION, json!([hash, ["trace"]])),
            (TRACE_TRANSACTION, json!([hash])),
        ];
        for (method, params) in attempts {
            match self.send(chain_idx, method, params).await {
                Ok(response) if self.trace_succeeded(chain_idx, &response) => {
                    return Outcome::Completed(response);
                }
                Ok(response) => {
                    tracing::debug!(chain = %self.chains[chain_idx].name, method, status = response.status, "trace attempt unsuccessful");
                }
                Err(e) => {
                    tracing::debug!(chain = %self.chains[chain_idx].name, method, error = %e, "trace attempt failed");
                }
            }
        }

        Outcome::Completed(block_response)
    }

    fn trace_succeeded(&self, chain_idx: usize, response: &RpcResponse) -> bool {
        if !response.is_ok_status() {
            return false;
        }
        match response.json() {
            Ok(body) => {
                truthy_result(&body).is_some() && !body.get("error").is_some_and(is_truthy)
            }
            Err(e) => {
                tracing::error!(chain = %self.chains[chain_idx].name, error = %e, "failed to parse trace response");
                false
            }
        }
    }

    async fn random_full_block(&mut self, chain_idx: usize) -> Result<RpcResponse> {
        let block = self.random_block_hex(chain_idx);
        self.send(chain_idx, ETH_GET_BLOCK_BY_NUMBER, json!([block, true])).await
    }

    /// Hash of a random transaction in a block response, if the response has any.
    fn pick_from_block_response(&mut self, chain_idx: usize, response: &RpcResponse) -> Option<String> {
        if !response.is_ok_status() {
            return None;
        }
        let body = match response.json() {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(chain = %self.chains[chain_idx].name, error = %e, "failed to process block response");
                return None;
            }
        };
        let block = truthy_result(&body)?;
        self.pick_transaction_hash(block)
    }

    fn pick_transaction_hash(&mut self, block: &Value) -> Option<String> {
        let transactions = block.get("transactions")?.as_array()?;
        if transactions.is_empty() {
            return None;
        }
        transaction_hash(&transactions[self.rng.gen_range(0..transactions.len())])
    }

    fn random_block_hex(&mut self, chain_idx: usize) -> String {
        let chain = &self.chains[chain_idx];
        to_hex(random_block_number(&mut self.rng, chain.block_min, chain.block_max))
    }

    async fn send(&mut self, chain_idx: usize, method: &str, params: Value) -> Result<RpcResponse> {
        let request = JsonRpcRequest::new(method, params, &mut self.rng);
        self.transport.post(&self.chains[chain_idx].id, &request).await
    }
}

/// Non-verbose blocks list bare hashes, verbose ones full transaction objects.
fn transaction_hash(tx: &Value) -> Option<String> {
    match tx {
        Value::String(hash) => Some(hash.clone()),
        Value::Object(fields) => fields.get("hash")?.as_str().map(str::to_string),
        _ => None,
    }
}
