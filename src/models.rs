//! Data model shared by the engine: raw rows, typed rows, series and region metrics.
//!
//! Every collection here is an immutable snapshot produced by one load. A reload
//! replaces the snapshot wholesale; nothing is patched in place.

use ::geo::MultiPolygon;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Milliseconds since the Unix epoch (UTC midnight of the parsed calendar date).
pub type Timestamp = i64;

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Sentinel for an absent numeric value. Never coerced to zero.
pub const MISSING: f64 = f64::NAN;

/// `true` when `v` is real data rather than the missing sentinel.
#[inline]
pub fn is_present(v: f64) -> bool {
    v.is_finite()
}

pub fn date_to_timestamp(d: NaiveDate) -> Timestamp {
    d.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

pub fn timestamp_to_datetime(t: Timestamp) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(t).unwrap_or_default()
}

/// One source row: column name to raw cell text, in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Raw value of the first column whose name matches exactly.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }
}

/// A typed row: a timestamp plus every numeric field of that row.
///
/// Missing cells hold [`MISSING`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedPoint {
    pub timestamp: Timestamp,
    pub fields: BTreeMap<String, f64>,
}

impl TypedPoint {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    /// Field value, or [`MISSING`] when the row has no such field.
    pub fn value(&self, key: &str) -> f64 {
        self.fields.get(key).copied().unwrap_or(MISSING)
    }
}

/// Output row of the dataset joiner. Same shape as a typed row; timestamps are
/// strictly increasing across a joined set.
pub type JoinedRow = TypedPoint;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: Timestamp,
    pub value: f64,
}

/// One named sequence of points, ascending by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub key: String,
    pub values: Vec<SeriesPoint>,
}

/// Row-oriented result of ingesting a time-series file.
///
/// `keys` lists the numeric columns in header order (date column excluded);
/// `rows` are sorted ascending by timestamp.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub keys: Vec<String>,
    pub rows: Vec<TypedPoint>,
}

impl Table {
    /// Column-oriented view: one series per key, same row order.
    pub fn series(&self) -> Vec<Series> {
        self.keys
            .iter()
            .map(|key| Series {
                key: key.clone(),
                values: self
                    .rows
                    .iter()
                    .map(|r| SeriesPoint {
                        timestamp: r.timestamp,
                        value: r.value(key),
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

/// A dated event to annotate on a temporal chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSpec {
    pub date: NaiveDate,
    pub label: String,
}

/// One borough row of the salary file, already restricted to the two compared years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DumbbellRow {
    pub name: String,
    /// Value in the earlier year.
    pub a: f64,
    /// Value in the later year.
    pub b: f64,
    pub diff: f64,
}

/// Metrics of one region in one year. Unique per `(year, code)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionMetric {
    pub year: i32,
    pub code: String,
    pub name: String,
    pub fields: BTreeMap<String, f64>,
}

impl RegionMetric {
    pub fn value(&self, field: &str) -> f64 {
        self.fields.get(field).copied().unwrap_or(MISSING)
    }
}

/// A region boundary from the geographic source.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFeature {
    pub code: String,
    pub name: String,
    /// Boundary in `[lon, lat]` degrees.
    pub geometry: MultiPolygon<f64>,
}

impl RegionFeature {
    /// Text shown for the region: its name, or the code when unnamed.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.code
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_series_keep_missing_cells() {
        let mut r1 = TypedPoint::new(0);
        r1.fields.insert("a".into(), 1.0);
        let mut r2 = TypedPoint::new(MS_PER_DAY);
        r2.fields.insert("a".into(), MISSING);
        let table = Table {
            keys: vec!["a".into()],
            rows: vec![r1, r2],
        };
        let s = table.series();
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].values[0].value, 1.0);
        assert!(!is_present(s[0].values[1].value));
    }

    #[test]
    fn timestamp_round_trips_through_datetime() {
        let d = NaiveDate::from_ymd_opt(2020, 3, 23).unwrap();
        let t = date_to_timestamp(d);
        assert_eq!(timestamp_to_datetime(t).date_naive(), d);
    }
}
