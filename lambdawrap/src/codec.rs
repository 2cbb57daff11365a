//! Payload encoding and decoding

use serde_json::{Map, Value};
use tracing::debug;

/// Encode an event as the JSON text sent to a transport
pub fn encode_event(event: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

/// Decode a transport payload.
///
/// An absent, empty or malformed payload decodes to an empty object. It
/// usually means the function returned nothing, which is not a failure.
pub fn decode_payload(payload: Option<&[u8]>) -> Value {
    let Some(bytes) = payload else {
        return empty();
    };

    match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, payload_size = bytes.len(), "Payload is not JSON, using empty object");
            empty()
        }
    }
}

fn empty() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_json() {
        let value = decode_payload(Some(br#"{"statusCode":200,"body":"ok"}"#));
        assert_eq!(value, json!({ "statusCode": 200, "body": "ok" }));
    }

    #[test]
    fn test_decode_scalar() {
        assert_eq!(decode_payload(Some(b"42")), json!(42));
        assert_eq!(decode_payload(Some(b"null")), Value::Null);
    }

    #[test]
    fn test_decode_missing_or_malformed() {
        for payload in [None, Some(&b""[..]), Some(&b"{not json"[..]), Some(&b"\xff\xfe"[..])] {
            assert_eq!(decode_payload(payload), json!({}));
        }
    }

    #[test]
    fn test_encode_event() {
        let text = encode_event(&json!({ "n": 5 })).unwrap();
        assert_eq!(text, r#"{"n":5}"#);
    }
}
