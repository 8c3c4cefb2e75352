use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::clock::ClockEngine;
use crate::format::{format_elapsed_ms, parse_elapsed};
use crate::laps::{Lap, LapTracker};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-process store. Nothing survives a restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLap {
    pub name: String,
    pub time: String,
    pub is_best: bool,
    pub is_worst: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cumulative_ms: Option<u64>,
}

impl From<&Lap> for PersistedLap {
    fn from(lap: &Lap) -> Self {
        Self {
            name: lap.name(),
            time: format_elapsed_ms(lap.split_ms),
            is_best: lap.is_best,
            is_worst: lap.is_worst,
            split_ms: Some(lap.split_ms),
            cumulative_ms: Some(lap.cumulative_ms),
        }
    }
}

/// Everything needed to bring the stopwatch back after a restart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub elapsed_ms: u64,
    pub is_running: bool,
    pub lap_counter: u32,
    pub best_split_ms: Option<u64>,
    pub worst_split_ms: Option<u64>,
    /// Newest first.
    pub laps: Vec<PersistedLap>,
}

impl PersistedSnapshot {
    pub fn capture(clock: &ClockEngine, laps: &LapTracker, now_ms: u64) -> Self {
        Self {
            elapsed_ms: clock.elapsed_ms(now_ms),
            is_running: clock.is_running(),
            lap_counter: laps.lap_counter(),
            best_split_ms: laps.best_split_ms(),
            worst_split_ms: laps.worst_split_ms(),
            laps: laps.laps().map(PersistedLap::from).collect(),
        }
    }

    /// Decode a stored value field by field. Only a non-object root is
    /// rejected; every bad field falls back to its fresh default.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let laps = match obj.get("laps") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_object)
                .map(decode_lap)
                .collect(),
            _ => Vec::new(),
        };
        Some(Self {
            elapsed_ms: coerce_u64(obj.get("elapsedMs")).unwrap_or(0),
            is_running: obj.get("isRunning").and_then(Value::as_bool).unwrap_or(false),
            lap_counter: coerce_u64(obj.get("lapCounter"))
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
                .unwrap_or(0),
            best_split_ms: coerce_u64(obj.get("bestSplitMs")),
            // 0 was the "no worst lap yet" marker
            worst_split_ms: coerce_u64(obj.get("worstSplitMs")).filter(|&w| w > 0),
            laps,
        })
    }

    /// Laps to hydrate a [`LapTracker`] with, newest first. Entries written
    /// without numeric fields are recovered from their name and time text.
    ///
    /// Missing totals are worked out backwards from the newest lap. When older
    /// laps were evicted their splits are gone, so the newest total is taken
    /// from the saved elapsed time instead of the sum of the held splits.
    pub fn restored_laps(&self) -> Vec<Lap> {
        let count = self.laps.len();
        let splits: Vec<u64> = self
            .laps
            .iter()
            .map(|saved| {
                saved
                    .split_ms
                    .or_else(|| parse_elapsed(&saved.time))
                    .unwrap_or(0)
            })
            .collect();
        let held_total = splits.iter().fold(0u64, |acc, s| acc.saturating_add(*s));
        let mut next_total = if self.lap_counter as usize > count {
            held_total.max(self.elapsed_ms)
        } else {
            held_total
        };

        self.laps
            .iter()
            .zip(splits)
            .enumerate()
            .map(|(pos, (saved, split_ms))| {
                let cumulative_ms = saved.cumulative_ms.unwrap_or(next_total);
                next_total = cumulative_ms.saturating_sub(split_ms);
                let fallback_index = self
                    .lap_counter
                    .max(count as u32)
                    .saturating_sub(pos as u32);
                Lap {
                    index: parse_lap_index(&saved.name).unwrap_or(fallback_index),
                    split_ms,
                    cumulative_ms,
                    is_best: saved.is_best,
                    is_worst: saved.is_worst,
                }
            })
            .collect()
    }

    /// Whether there is anything worth writing out.
    pub fn is_idle(&self) -> bool {
        self.elapsed_ms == 0 && !self.is_running
    }
}

fn decode_lap(obj: &Map<String, Value>) -> PersistedLap {
    let text = |field: &str| {
        obj.get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let flag = |field: &str| obj.get(field).and_then(Value::as_bool).unwrap_or(false);
    PersistedLap {
        name: text("name"),
        time: text("time"),
        is_best: flag("isBest"),
        is_worst: flag("isWorst"),
        split_ms: coerce_u64(obj.get("splitMs")),
        cumulative_ms: coerce_u64(obj.get("cumulativeMs")),
    }
}

// Numbers and numeric strings, floored and clamped at zero.
fn coerce_u64(value: Option<&Value>) -> Option<u64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    // float-to-int casts saturate
    Some(n.max(0.0).floor() as u64)
}

fn parse_lap_index(name: &str) -> Option<u32> {
    name.trim().strip_prefix("Lap")?.trim().parse().ok()
}

/// Mirrors the stopwatch into a [`KeyValueStore`]. Failures never reach the
/// caller; in-memory state stays authoritative.
pub struct PersistenceStore<K> {
    store: K,
    key: String,
}

impl<K: KeyValueStore> PersistenceStore<K> {
    pub fn new(store: K, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Returns whether the snapshot was written.
    pub fn save(&mut self, snapshot: &PersistedSnapshot) -> bool {
        let result = serde_json::to_string(snapshot)
            .map_err(StoreError::from)
            .and_then(|text| self.store.set(&self.key, &text));
        match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save stopwatch state: {}", e);
                false
            }
        }
    }

    pub fn load(&self) -> Option<PersistedSnapshot> {
        let text = match self.store.get(&self.key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read stopwatch state: {}", e);
                return None;
            }
        };
        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Discarding malformed stopwatch state: {}", e);
                return None;
            }
        };
        let snapshot = PersistedSnapshot::from_value(&value);
        if snapshot.is_none() {
            log::warn!("Discarding stopwatch state: not an object");
        }
        snapshot
    }

    pub fn load_or_default(&self) -> PersistedSnapshot {
        self.load().unwrap_or_default()
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut K {
        &mut self.store
    }
}
