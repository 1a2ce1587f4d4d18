//! The wire-contract envelope every tool call returns (§4.10, §6):
//! `{ok, tool, timestamp, ...}` on success, `{ok: false, tool, timestamp,
//! error}` on failure.

use gotn_schema::Result;
use serde::Serialize;
use serde_json::{json, Value};

/// Wrap `result` into the envelope for `tool`, flattening a successful
/// payload's fields alongside `ok`/`tool`/`timestamp`.
pub fn envelope<T: Serialize>(tool: &str, now: &str, result: Result<T>) -> Value {
    match result {
        Ok(payload) => {
            let mut object = match serde_json::to_value(payload) {
                Ok(Value::Object(map)) => Value::Object(map),
                Ok(other) => json!({ "result": other }),
                Err(error) => {
                    return json!({
                        "ok": false,
                        "tool": tool,
                        "timestamp": now,
                        "error": format!("IOError: {error}"),
                    })
                }
            };
            if let Value::Object(map) = &mut object {
                map.insert("ok".to_string(), Value::Bool(true));
                map.insert("tool".to_string(), Value::String(tool.to_string()));
                map.insert("timestamp".to_string(), Value::String(now.to_string()));
            }
            object
        }
        Err(error) => json!({
            "ok": false,
            "tool": tool,
            "timestamp": now,
            "error": format!("{}: {error}", error.kind()),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use gotn_schema::GotnError;

    #[test]
    fn ok_flattens_fields_and_adds_envelope_keys() {
        let value = envelope(
            "store_node",
            "2026-01-01T00:00:00Z",
            Ok(json!({ "node_id": "n1" })),
        );
        assert_eq!(value["ok"], true);
        assert_eq!(value["tool"], "store_node");
        assert_eq!(value["node_id"], "n1");
    }

    #[test]
    fn err_reports_kind_and_message() {
        let value: Value = envelope::<Value>(
            "trace_node",
            "2026-01-01T00:00:00Z",
            Err(GotnError::NotFound("node x not found".to_string())),
        );
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "NotFound: not found: node x not found");
    }
}
