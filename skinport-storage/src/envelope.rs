//! Cache envelope codec.
//!
//! Every cached value is wrapped as `{ "updatedAt": <timestamp>, "data": <value> }`
//! and stored as a JSON string. `updatedAt` is written as RFC 3339 with full
//! sub-second precision. Reads also accept integer epoch milliseconds.

use chrono::{TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use skinport_core::{EnvelopeError, Timestamp};

/// The sole value stored under a cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEnvelope<T> {
    #[serde(deserialize_with = "deserialize_updated_at")]
    pub updated_at: Timestamp,
    pub data: T,
}

impl<T> CacheEnvelope<T> {
    pub fn new(data: T, updated_at: Timestamp) -> Self {
        Self { updated_at, data }
    }

    pub fn into_parts(self) -> (T, Timestamp) {
        (self.data, self.updated_at)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Rfc3339(Timestamp),
    EpochMillis(i64),
}

fn deserialize_updated_at<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    match WireTimestamp::deserialize(deserializer)? {
        WireTimestamp::Rfc3339(at) => Ok(at),
        WireTimestamp::EpochMillis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("epoch millis out of range: {}", ms))),
    }
}

/// Wrap `value` with `updated_at` and serialize the envelope.
pub fn encode<T: Serialize>(value: &T, updated_at: Timestamp) -> Result<String, EnvelopeError> {
    serde_json::to_string(&CacheEnvelope::new(value, updated_at)).map_err(|e| {
        EnvelopeError::Serialize {
            reason: e.to_string(),
        }
    })
}

/// Parse a raw stored string back into its payload and timestamp.
///
/// Any malformed input yields [`EnvelopeError::Parse`]; readers treat that
/// exactly like a missing key.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<(T, Timestamp), EnvelopeError> {
    serde_json::from_str::<CacheEnvelope<T>>(raw)
        .map(CacheEnvelope::into_parts)
        .map_err(|e| EnvelopeError::Parse {
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_encode_wire_shape() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let raw = encode(&json!({"a": 1}), at).unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["updatedAt"], "2024-05-01T12:00:00Z");
        assert_eq!(parsed["data"]["a"], 1);
    }

    #[test]
    fn test_decode_preserves_subsecond_precision() {
        let at = Utc.timestamp_opt(1_714_564_800, 123_456_789).unwrap();
        let raw = encode(&"payload", at).unwrap();
        let (value, decoded_at): (String, Timestamp) = decode(&raw).unwrap();
        assert_eq!(value, "payload");
        assert_eq!(decoded_at, at);
    }

    #[test]
    fn test_decode_accepts_epoch_millis() {
        let raw = r#"{"updatedAt":1714564800123,"data":[1,2,3]}"#;
        let (value, at): (Vec<u32>, Timestamp) = decode(raw).unwrap();
        assert_eq!(value, vec![1, 2, 3]);
        assert_eq!(at.timestamp_millis(), 1_714_564_800_123);
    }

    #[test]
    fn test_decode_malformed_is_parse_error() {
        let cases = [
            "",
            "not json",
            "{}",
            r#"{"data": 1}"#,
            r#"{"updatedAt": "yesterday", "data": 1}"#,
            r#"{"updatedAt": "2024-05-01T12:00:00Z"}"#,
            r#"{"updatedAt": true, "data": 1}"#,
            "42",
        ];
        for raw in cases {
            let result = decode::<u32>(raw);
            assert!(
                matches!(result, Err(EnvelopeError::Parse { .. })),
                "expected parse error for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_decode_wrong_payload_type_is_parse_error() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let raw = encode(&"text", at).unwrap();
        assert!(matches!(decode::<u32>(&raw), Err(EnvelopeError::Parse { .. })));
    }
}
