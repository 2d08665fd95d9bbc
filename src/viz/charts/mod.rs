//! The five dashboard views.

pub mod dumbbell;
pub mod inflation;
pub mod lines;
pub mod map;
pub mod multiples;

pub use dumbbell::SalaryDumbbellView;
pub use inflation::InflationView;
pub use lines::RegionalLinesView;
pub use map::ChoroplethView;
pub use multiples::SmallMultiplesView;

use crate::models::{Timestamp, TypedPoint, is_present};
use crate::scale::LinearScale;

/// Pixel polyline of `key`; missing values become non-finite points that break the line.
pub(crate) fn series_points(rows: &[TypedPoint], key: &str, x: &LinearScale, y: &LinearScale) -> Vec<(f64, f64)> {
    rows.iter()
        .map(|r| {
            let v = r.value(key);
            let py = if is_present(v) { y.apply(v) } else { f64::NAN };
            (x.apply(r.timestamp as f64), py)
        })
        .collect()
}

/// Latest row with a finite value for `key`.
pub(crate) fn last_present(rows: &[TypedPoint], key: &str) -> Option<(Timestamp, f64)> {
    rows.iter()
        .rev()
        .map(|r| (r.timestamp, r.value(key)))
        .find(|(_, v)| is_present(*v))
}
