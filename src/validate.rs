use serde_json::Value;

use crate::transport::RpcResponse;

/// Bodies above this size are logged with a short preview only.
pub const LARGE_BODY_BYTES: usize = 1_000_000;
pub const LARGE_BODY_PREVIEW: usize = 100;
/// Bytes kept from each end of an unparseable body.
pub const EXCERPT_BYTES: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckReport {
    pub status_ok: bool,
    pub no_error: bool,
}

impl CheckReport {
    /// Outcome for a request that never got an HTTP response.
    pub fn failed() -> Self {
        Self { status_ok: false, no_error: false }
    }

    pub fn passed(&self) -> bool {
        self.status_ok && self.no_error
    }
}

pub fn check_response(response: &RpcResponse) -> CheckReport {
    CheckReport {
        status_ok: response.is_ok_status(),
        no_error: has_no_error(response),
    }
}

/// True when the body parses, is truthy, and carries no `error` other than `null`.
pub fn has_no_error(response: &RpcResponse) -> bool {
    let size = response.body.len();
    if size > LARGE_BODY_BYTES {
        tracing::warn!(
            size,
            request = %response.request_body,
            preview = %prefix(&response.body, LARGE_BODY_PREVIEW),
            "large response body"
        );
    }

    match serde_json::from_str::<Value>(&response.body) {
        Ok(body) => body_has_no_error(&body),
        Err(e) => {
            tracing::error!(
                error = %e,
                size,
                request = %response.request_body,
                response = %body_excerpt(&response.body),
                "unmarshal error"
            );
            false
        }
    }
}

pub fn body_has_no_error(body: &Value) -> bool {
    crate::jsonrpc::is_truthy(body) && body.get("error").is_none_or(Value::is_null)
}

/// Head and tail of `body` joined by `...`, or the whole body when both ends would overlap.
pub fn body_excerpt(body: &str) -> String {
    if body.len() <= EXCERPT_BYTES * 2 {
        return body.to_string();
    }
    format!("{}...{}", prefix(body, EXCERPT_BYTES), suffix(body, EXCERPT_BYTES))
}

fn prefix(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn suffix(s: &str, max: usize) -> &str {
    let mut start = s.len().saturating_sub(max);
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_suffix_respect_char_boundaries() {
        let s = "ééé";
        assert_eq!(prefix(s, 3), "é");
        assert_eq!(suffix(s, 3), "é");
        assert_eq!(prefix("abc", 10), "abc");
        assert_eq!(suffix("abc", 10), "abc");
    }
}
