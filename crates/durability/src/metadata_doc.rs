//! Metadata document serialization
//!
//! The document is a JSON object keyed by dense id (decimal string):
//!
//! ```json
//! {
//!   "0": { "feature_id": "cat-1", "metadata": {}, "timestamp": "2024-05-01T10:00:00Z" },
//!   "1": { "feature_id": "dog-7", "metadata": { "source": "upload" }, "timestamp": "..." }
//! }
//! ```
//!
//! Keys are written in dense-id order. On read, the key set must be exactly
//! `0..N`; anything else means the document is not a valid pair for any blob.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use revsearch_core::{DenseId, Entry, Metadata};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PersistenceError, PersistenceResult};

/// One record of the document, without its key
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryRecord {
    feature_id: String,
    #[serde(default)]
    metadata: Metadata,
    timestamp: String,
}

/// Encode catalog entries (ordered by dense id) as a pretty-printed document
pub fn encode(entries: &[Entry]) -> PersistenceResult<Vec<u8>> {
    let mut doc = Map::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        if entry.dense_id.as_usize() != position {
            return Err(PersistenceError::Inconsistent(format!(
                "entry at position {} carries {}",
                position, entry.dense_id
            )));
        }
        let record = EntryRecord {
            feature_id: entry.feature_id.clone(),
            metadata: entry.metadata.clone(),
            timestamp: entry.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        };
        doc.insert(position.to_string(), serde_json::to_value(record)?);
    }
    Ok(serde_json::to_vec_pretty(&Value::Object(doc))?)
}

/// Decode a document into entries ordered by dense id
pub fn decode(bytes: &[u8]) -> PersistenceResult<Vec<Entry>> {
    let doc: Map<String, Value> = serde_json::from_slice(bytes)?;
    let count = doc.len();

    let mut slots: Vec<Option<Entry>> = vec![None; count];
    for (key, value) in doc {
        let position = key
            .parse::<usize>()
            .ok()
            .filter(|p| *p < count && key == p.to_string())
            .ok_or_else(|| {
                PersistenceError::Inconsistent(format!(
                    "key {:?} is not a dense id in 0..{}",
                    key, count
                ))
            })?;
        let record: EntryRecord = serde_json::from_value(value)?;
        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| {
            PersistenceError::Inconsistent(format!(
                "entry {} has unparseable timestamp {:?}",
                position, record.timestamp
            ))
        })?;
        slots[position] = Some(Entry {
            dense_id: DenseId::new(position as u64),
            feature_id: record.feature_id,
            metadata: record.metadata,
            timestamp,
        });
    }

    // Keys are distinct and all < count, so every slot is filled.
    slots
        .into_iter()
        .enumerate()
        .map(|(position, slot)| {
            slot.ok_or_else(|| {
                PersistenceError::Inconsistent(format!("dense id {} is missing", position))
            })
        })
        .collect()
}

/// RFC 3339, or a naive ISO timestamp read as UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
