use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::SENTINEL_LINE;

/// One row of `hourly_good_production` as exported.
///
/// `total_output` is taken as stored; it is not recomputed from the two
/// output counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductionRecord {
    #[serde(with = "export_timestamp")]
    pub date_time: NaiveDateTime,
    pub plant_name: String,
    pub line_name: String,
    pub output_1: i32,
    pub output_2: i32,
    pub total_output: i32,
}

/// The JSON document written each cycle: `{"data": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub data: Vec<ProductionRecord>,
}

impl ExportSnapshot {
    /// Builds a snapshot in display order, with sentinel-line rows first.
    pub fn from_query(mut records: Vec<ProductionRecord>) -> Self {
        prioritize_sentinel(&mut records);
        Self { data: records }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Stable partition: rows on [`SENTINEL_LINE`] move to the front, every other
/// row keeps its relative position.
pub fn prioritize_sentinel(records: &mut [ProductionRecord]) {
    // sort_by_key is stable
    records.sort_by_key(|r| r.line_name != SENTINEL_LINE);
}

mod export_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::constants::EXPORT_TIMESTAMP_FORMAT;

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(EXPORT_TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, EXPORT_TIMESTAMP_FORMAT)
            .map_err(serde::de::Error::custom)
    }
}
