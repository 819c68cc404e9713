//! Pre-submission deduplication of repeated records.
//!
//! Re-mining the same history produces overlapping collections; collapsing
//! them before batching saves store round-trips. Idempotent merges make
//! duplicates harmless for correctness either way.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

/// Collapse `records` to one per distinct key.
///
/// The LAST occurrence of a key supplies the surviving record (later mining
/// passes may carry corrected attributes), while the FIRST occurrence fixes
/// its position in the output order.
pub fn dedup_last_wins<T, K, F>(records: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut slots: Vec<Option<T>> = Vec::with_capacity(records.len());
    let mut positions: HashMap<K, usize> = HashMap::with_capacity(records.len());

    for record in records {
        match positions.entry(key(&record)) {
            std::collections::hash_map::Entry::Occupied(entry) => {
                slots[*entry.get()] = Some(record);
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(slots.len());
                slots.push(Some(record));
            }
        }
    }

    slots.into_iter().flatten().collect()
}

/// A structural identity key: the record's full JSON rendering.
///
/// Used for relationship records whose identity is the whole payload
/// (endpoint pair plus attributes), so only exact repeats collapse.
pub fn structural_key<T: Serialize>(record: &T) -> String {
    serde_json::to_string(record).expect("record serializes to JSON")
}
