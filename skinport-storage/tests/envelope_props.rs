//! Property tests for the cache envelope codec.

use proptest::prelude::*;

use skinport_core::{ServiceResponse, Timestamp};
use skinport_storage::{decode, encode};
use skinport_test_utils::generators::{arb_service_response, arb_timestamp};

proptest! {
    #[test]
    fn prop_envelope_round_trip(response in arb_service_response(), at in arb_timestamp()) {
        let raw = encode(&response, at).unwrap();
        let (decoded, decoded_at): (ServiceResponse, Timestamp) = decode(&raw).unwrap();
        prop_assert_eq!(decoded, response);
        prop_assert_eq!(decoded_at, at);
    }

    #[test]
    fn prop_decode_never_panics(raw in ".*") {
        let _ = decode::<ServiceResponse>(&raw);
    }

    #[test]
    fn prop_truncated_envelope_is_parse_error(
        response in arb_service_response(),
        at in arb_timestamp(),
        cut in 1usize..16,
    ) {
        let raw = encode(&response, at).unwrap();
        let end = raw.len().saturating_sub(cut);
        if let Some(truncated) = raw.get(..end) {
            prop_assert!(decode::<ServiceResponse>(truncated).is_err());
        }
    }
}
