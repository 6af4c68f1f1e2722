//! Record decoding: raw response bodies into domain types.
//!
//! Decoding is lenient about shape (unknown fields are ignored, missing or
//! `null` fields take their zero value) and strict about the types of the
//! fields that are actually consumed.

use noderank_shared::{BaseList, NodeRankError, NodeRecord, Result};
use serde::de::DeserializeOwned;

/// Decode a per-node lookup body.
pub fn decode_node(bytes: &[u8]) -> Result<NodeRecord> {
    decode(bytes)
}

/// Decode the ranked base list.
pub fn decode_base_list(bytes: &[u8]) -> Result<BaseList> {
    decode(bytes)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| NodeRankError::decode(e.to_string(), bytes))
}
