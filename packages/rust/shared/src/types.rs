//! Core domain types: the ranked base list, the per-node lookup record,
//! and the enriched output.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

/// Format of [`Aggregate::last_updated`], e.g. `2024-01-02T15:04:05-0700`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Format a point in time the way the aggregate stamps it.
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Base list
// ---------------------------------------------------------------------------

/// The ranked input list, as published upstream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BaseList {
    /// Provenance timestamp of the list (upstream's own format, kept verbatim).
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_updated: String,
    /// Ranked entries; one unit of work each.
    #[serde(default, deserialize_with = "null_as_default")]
    pub scores: Vec<BaseRecord>,
}

/// One ranked entry of the base list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BaseRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub alias: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub public_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: u64,
}

// ---------------------------------------------------------------------------
// Node lookup record
// ---------------------------------------------------------------------------

/// Per-node data fetched from the lookup service.
///
/// Lives only while a worker maps it into an [`EnrichedRecord`]. Only the
/// fields the merge reads are declared; the alias and address network the
/// service also returns are skipped whatever their type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub addresses: Vec<NodeAddress>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub capacity: u64,
    #[serde(default, deserialize_with = "null_as_default", rename = "channelcount")]
    pub channel_count: u64,
    #[serde(default, deserialize_with = "null_as_default", rename = "noderank")]
    pub rankings: NodeRankings,
}

/// A reachable `host:port` address.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeAddress {
    #[serde(default, deserialize_with = "null_as_default", rename = "addr")]
    pub address: String,
}

/// Rank positions reported by the lookup service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeRankings {
    #[serde(default, deserialize_with = "null_as_default")]
    pub capacity: u64,
    #[serde(default, deserialize_with = "null_as_default", rename = "channelcount")]
    pub channel_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub age: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub growth: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub availability: u64,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A base record merged with its node lookup. Identity is `public_key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRecord {
    pub score: u64,
    pub alias: String,
    pub public_key: String,
    pub addresses: Vec<String>,
    pub color: String,
    pub capacity: u64,
    pub channel_count: u64,
    pub rank_capacity: u64,
    pub rank_channel_count: u64,
    pub rank_age: u64,
    pub rank_growth: u64,
    pub rank_availability: u64,
}

impl EnrichedRecord {
    /// Merge a base record with its lookup result.
    ///
    /// Score, alias and key come from the base list; everything else from the
    /// lookup. Addresses are flattened to bare strings.
    pub fn merge(base: BaseRecord, node: NodeRecord) -> Self {
        Self {
            score: base.score,
            alias: base.alias,
            public_key: base.public_key,
            addresses: node.addresses.into_iter().map(|a| a.address).collect(),
            color: node.color,
            capacity: node.capacity,
            channel_count: node.channel_count,
            rank_capacity: node.rankings.capacity,
            rank_channel_count: node.rankings.channel_count,
            rank_age: node.rankings.age,
            rank_growth: node.rankings.growth,
            rank_availability: node.rankings.availability,
        }
    }
}

/// The output document of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    /// Generation time, formatted with [`TIMESTAMP_FORMAT`].
    pub last_updated: String,
    /// Enriched records in completion order.
    pub data: Vec<EnrichedRecord>,
}

impl Aggregate {
    /// Stamp `data` with the current local time.
    pub fn new(data: Vec<EnrichedRecord>) -> Self {
        Self::stamped(data, &Local::now())
    }

    /// Stamp `data` with an explicit time.
    pub fn stamped<Tz>(data: Vec<EnrichedRecord>, at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            last_updated: format_timestamp(at),
            data,
        }
    }
}
