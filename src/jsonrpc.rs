use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Exclusive upper bound for request ids.
pub const MAX_REQUEST_ID: u64 = 100_000_000;

pub const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
pub const ETH_GET_LOGS: &str = "eth_getLogs";
pub const ETH_GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
pub const ETH_GET_BALANCE: &str = "eth_getBalance";
pub const DEBUG_TRACE_TRANSACTION: &str = "debug_traceTransaction";
pub const TRACE_REPLAY_TRANSACTION: &str = "trace_replayTransaction";
pub const TRACE_TRANSACTION: &str = "trace_transaction";

/// ERC-20 `Transfer(address,address,uint256)` event topic.
pub const TRANSFER_EVENT_TOPIC: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
    pub id: u64,
}

impl JsonRpcRequest {
    /// Builds a 2.0 envelope with a random id in `[0, MAX_REQUEST_ID)`.
    ///
    /// The id is only forwarded for correlation, nothing downstream checks it.
    pub fn new<R: Rng + ?Sized>(method: &str, params: Value, rng: &mut R) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: rng.gen_range(0..MAX_REQUEST_ID),
        }
    }
}

/// JavaScript-style truthiness of a JSON value.
///
/// Proxies return all sorts of shapes for `result`/`error` (`null`, `false`, `""`, `0`),
/// so checks are written against this rather than against a typed envelope.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Returns the `result` member of a response body when it is truthy.
pub fn truthy_result(body: &Value) -> Option<&Value> {
    body.get("result").filter(|r| is_truthy(r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use serde_json::json;

    #[test]
    fn test_request_ids_stay_below_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let req = JsonRpcRequest::new(ETH_GET_BALANCE, json!([]), &mut rng);
            assert!(req.id < MAX_REQUEST_ID);
            assert_eq!(req.jsonrpc, "2.0");
        }
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("0x0")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_truthy_result_ignores_null() {
        assert!(truthy_result(&json!({"result": null})).is_none());
        assert!(truthy_result(&json!({"error": {"code": 1}})).is_none());
        assert_eq!(truthy_result(&json!({"result": "0x1"})), Some(&json!("0x1")));
    }
}
