//! Time alignment of two series by nearest timestamp within a tolerance window.

use crate::models::{JoinedRow, MISSING, MS_PER_DAY, Series, SeriesPoint, Timestamp, TypedPoint};

/// Default tolerance used by the inflation view: about 40 days.
pub const DEFAULT_TOLERANCE_MS: i64 = 40 * MS_PER_DAY;

/// Attach `secondary` to every primary row under `secondary.key`.
///
/// For each primary timestamp the closest secondary point is taken if it lies strictly
/// within `tolerance_ms`; otherwise the field is set to [`MISSING`]. Output has exactly the
/// primary rows, in primary order.
///
/// Both inputs must be sorted ascending; the merge is a single monotonic pass (O(n + m)).
/// Ties: among duplicate secondary timestamps the first one encountered wins, and a primary
/// equidistant from two secondary timestamps takes the earlier one.
pub fn join(primary: &[TypedPoint], secondary: &Series, tolerance_ms: i64) -> Vec<JoinedRow> {
    debug_assert!(primary.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    debug_assert!(
        secondary
            .values
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
    );

    let sec = &secondary.values;
    let mut j = 0usize;
    primary
        .iter()
        .map(|p| {
            let mut row = p.clone();
            let value = match advance_to_nearest(sec, &mut j, p.timestamp) {
                Some(s) if (s.timestamp - p.timestamp).abs() < tolerance_ms => s.value,
                _ => MISSING,
            };
            row.fields.insert(secondary.key.clone(), value);
            row
        })
        .collect()
}

/// Move `j` forward while the next distinct timestamp is strictly closer to `t`.
/// `j` always rests on the first point of its timestamp group.
fn advance_to_nearest<'a>(sec: &'a [SeriesPoint], j: &mut usize, t: Timestamp) -> Option<&'a SeriesPoint> {
    if sec.is_empty() {
        return None;
    }
    loop {
        let cur = sec[*j].timestamp;
        let next = (*j + 1..sec.len()).find(|&k| sec[k].timestamp != cur);
        match next {
            Some(k) if (sec[k].timestamp - t).abs() < (cur - t).abs() => *j = k,
            _ => break,
        }
    }
    sec.get(*j)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::is_present;

    fn row(day: i64) -> TypedPoint {
        let mut r = TypedPoint::new(day * MS_PER_DAY);
        r.fields.insert("rent".into(), day as f64);
        r
    }

    fn sec(points: &[(i64, f64)]) -> Series {
        Series {
            key: "inflation".into(),
            values: points
                .iter()
                .map(|&(d, v)| SeriesPoint {
                    timestamp: d * MS_PER_DAY,
                    value: v,
                })
                .collect(),
        }
    }

    #[test]
    fn nearest_within_tolerance_or_missing() {
        let primary = vec![row(0), row(31), row(200)];
        let s = sec(&[(2, 1.0), (29, 2.0), (35, 3.0)]);
        let out = join(&primary, &s, DEFAULT_TOLERANCE_MS);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].value("inflation"), 1.0);
        assert_eq!(out[1].value("inflation"), 2.0);
        assert!(!is_present(out[2].value("inflation")));
        // primary fields survive untouched
        assert_eq!(out[2].value("rent"), 200.0);
    }

    #[test]
    fn duplicate_secondary_timestamps_take_first() {
        let primary = vec![row(10)];
        let s = sec(&[(0, 5.0), (9, 7.0), (9, 8.0), (30, 1.0)]);
        let out = join(&primary, &s, DEFAULT_TOLERANCE_MS);
        assert_eq!(out[0].value("inflation"), 7.0);
    }

    #[test]
    fn duplicates_do_not_block_a_closer_later_point() {
        let primary = vec![row(20)];
        let s = sec(&[(0, 1.0), (0, 2.0), (19, 3.0)]);
        let out = join(&primary, &s, DEFAULT_TOLERANCE_MS);
        assert_eq!(out[0].value("inflation"), 3.0);
    }

    #[test]
    fn matched_values_are_never_farther_than_tolerance() {
        let primary: Vec<_> = (0..50).map(|i| row(i * 17)).collect();
        let s = sec(&(0..20).map(|i| (i * 45, i as f64)).collect::<Vec<_>>());
        let tol = 10 * MS_PER_DAY;
        let out = join(&primary, &s, tol);
        for r in &out {
            let v = r.value("inflation");
            if is_present(v) {
                let matched_t = (v as i64) * 45 * MS_PER_DAY;
                assert!((matched_t - r.timestamp).abs() < tol);
            }
        }
    }

    #[test]
    fn empty_secondary_yields_all_missing() {
        let primary = vec![row(0), row(1)];
        let out = join(&primary, &sec(&[]), DEFAULT_TOLERANCE_MS);
        assert!(out.iter().all(|r| !is_present(r.value("inflation"))));
    }
}
