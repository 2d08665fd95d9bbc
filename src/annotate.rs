//! Placement of dated event annotations on a temporal chart.
//!
//! Each in-domain event gets a dashed guide line, a marker dot at the interpolated value
//! and a label box. Label boxes are pushed left to stay inside the plot and are staggered
//! vertically by input position so neighbouring events overlap less.

use crate::models::{EventSpec, TypedPoint, date_to_timestamp, is_present};
use crate::scale::{LinearScale, PlotRect};
use crate::viz::text::widest_line_px;
use chrono::NaiveDate;
use log::debug;

/// A laid-out event. All pixel fields are derived from the current scales.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationEvent {
    pub date: NaiveDate,
    pub label: String,
    /// Position of the event in the input list; drives the stagger.
    pub index: usize,
    pub value: f64,
    pub pixel_x: f64,
    pub pixel_y: f64,
    /// Left edge of the label box.
    pub label_x: f64,
    /// Baseline of the first label line.
    pub label_y: f64,
    /// Box width including horizontal padding.
    pub label_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationLayout {
    pub label_offset_px: f64,
    pub pad_px: f64,
    pub right_inset_px: f64,
    pub top_offset_px: f64,
    pub stagger_step_px: f64,
    pub stagger_cycle: usize,
    pub font_px: u32,
}

impl Default for AnnotationLayout {
    fn default() -> Self {
        Self {
            label_offset_px: 4.0,
            pad_px: 4.0,
            right_inset_px: 8.0,
            top_offset_px: 6.0,
            stagger_step_px: 10.0,
            stagger_cycle: 4,
            font_px: 12,
        }
    }
}

impl AnnotationLayout {
    /// Rightmost x a label box may reach.
    pub fn right_boundary(&self, plot: PlotRect) -> f64 {
        plot.right - self.right_inset_px
    }

    /// Lay out `events` against the value series `key` of `rows`.
    ///
    /// Events outside the x domain, or with no finite value to sit on, are dropped.
    pub fn layout(
        &self,
        events: &[EventSpec],
        rows: &[TypedPoint],
        key: &str,
        x: &LinearScale,
        y: &LinearScale,
        plot: PlotRect,
    ) -> Vec<AnnotationEvent> {
        let right_edge = self.right_boundary(plot);
        let cycle = self.stagger_cycle.max(1);
        events
            .iter()
            .enumerate()
            .filter_map(|(index, e)| {
                let t = date_to_timestamp(e.date) as f64;
                if !x.contains(t) {
                    debug!("annotation {:?} outside time domain, dropped", e.label);
                    return None;
                }
                let Some(value) = interpolate_at(rows, key, t) else {
                    debug!("annotation {:?} has no value to attach to, dropped", e.label);
                    return None;
                };
                let pixel_x = x.apply(t);
                let label_width = widest_line_px(&e.label, self.font_px) + 2.0 * self.pad_px;
                let label_x = (pixel_x + self.label_offset_px).min(right_edge - label_width);
                let label_y = plot.top + self.top_offset_px - (index % cycle) as f64 * self.stagger_step_px;
                Some(AnnotationEvent {
                    date: e.date,
                    label: e.label.clone(),
                    index,
                    value,
                    pixel_x,
                    pixel_y: y.apply(value),
                    label_x,
                    label_y,
                    label_width,
                })
            })
            .collect()
    }
}

/// Value of `key` at time `t`, linearly interpolated between the bracketing rows.
///
/// Before the first row or after the last the edge row is used. When one side of the
/// bracket is missing the other side is returned as is.
pub fn interpolate_at(rows: &[TypedPoint], key: &str, t: f64) -> Option<f64> {
    let first = rows.first()?;
    let last = rows.last()?;
    let v = if t <= first.timestamp as f64 {
        first.value(key)
    } else if t >= last.timestamp as f64 {
        last.value(key)
    } else {
        let i = rows.partition_point(|r| (r.timestamp as f64) < t).clamp(1, rows.len() - 1);
        let (a, b) = (&rows[i - 1], &rows[i]);
        let (va, vb) = (a.value(key), b.value(key));
        match (is_present(va), is_present(vb)) {
            (false, _) => vb,
            (_, false) => va,
            _ => {
                let span = (b.timestamp - a.timestamp) as f64;
                if span == 0.0 {
                    va
                } else {
                    va + (t - a.timestamp as f64) / span * (vb - va)
                }
            }
        }
    };
    is_present(v).then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MISSING;
    use crate::scale::ScaleKind;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rows(points: &[(NaiveDate, f64)]) -> Vec<TypedPoint> {
        points
            .iter()
            .map(|(date, v)| {
                let mut r = TypedPoint::new(date_to_timestamp(*date));
                r.fields.insert("inflation".into(), *v);
                r
            })
            .collect()
    }

    fn plot() -> PlotRect {
        PlotRect {
            left: 56.0,
            top: 40.0,
            right: 808.0,
            bottom: 380.0,
        }
    }

    fn scales(lo: NaiveDate, hi: NaiveDate) -> (LinearScale, LinearScale) {
        let p = plot();
        (
            LinearScale::new(
                ScaleKind::Temporal,
                (date_to_timestamp(lo) as f64, date_to_timestamp(hi) as f64),
                (p.left, p.right),
            ),
            LinearScale::new(ScaleKind::Linear, (-5.0, 15.0), (p.bottom, p.top)),
        )
    }

    fn event(date: NaiveDate, label: &str) -> EventSpec {
        EventSpec {
            date,
            label: label.into(),
        }
    }

    #[test]
    fn interpolates_between_bracketing_rows() {
        let r = rows(&[(d(2020, 1, 1), 0.0), (d(2020, 1, 11), 10.0)]);
        let t = date_to_timestamp(d(2020, 1, 6)) as f64;
        assert_eq!(interpolate_at(&r, "inflation", t), Some(5.0));
        let before = date_to_timestamp(d(2019, 1, 1)) as f64;
        assert_eq!(interpolate_at(&r, "inflation", before), Some(0.0));
        assert_eq!(interpolate_at(&[], "inflation", t), None);
    }

    #[test]
    fn missing_side_falls_back_to_the_other() {
        let r = rows(&[(d(2020, 1, 1), MISSING), (d(2020, 2, 1), 3.0), (d(2020, 3, 1), MISSING)]);
        let t = date_to_timestamp(d(2020, 1, 15)) as f64;
        assert_eq!(interpolate_at(&r, "inflation", t), Some(3.0));
        let end = date_to_timestamp(d(2020, 3, 1)) as f64;
        assert_eq!(interpolate_at(&r, "inflation", end), None);
    }

    #[test]
    fn out_of_domain_events_are_dropped() {
        let r = rows(&[(d(2019, 1, 1), 1.0), (d(2024, 1, 1), 2.0)]);
        let (x, y) = scales(d(2019, 1, 1), d(2024, 1, 1));
        let events = [event(d(2010, 1, 1), "too early"), event(d(2021, 12, 16), "BoE"), event(d(2030, 1, 1), "too late")];
        let out = AnnotationLayout::default().layout(&events, &r, "inflation", &x, &y, plot());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "BoE");
        assert_eq!(out[0].index, 1);
    }

    #[test]
    fn labels_never_cross_the_right_boundary() {
        let r = rows(&[(d(2019, 1, 1), 1.0), (d(2025, 6, 1), 2.0)]);
        let (x, y) = scales(d(2019, 1, 1), d(2025, 6, 1));
        let layout = AnnotationLayout::default();
        let events: Vec<EventSpec> = (0..60)
            .map(|i| {
                let date = d(2019, 1, 1) + chrono::Days::new(i * 37);
                event(date, &"Very long annotation label ".repeat(1 + (i as usize % 3)))
            })
            .collect();
        let out = layout.layout(&events, &r, "inflation", &x, &y, plot());
        assert!(!out.is_empty());
        for a in &out {
            assert!(a.label_x + a.label_width <= plot().right, "{a:?}");
            assert!(a.label_x + a.label_width <= layout.right_boundary(plot()) + 1e-9);
        }
        let last = out.last().unwrap();
        assert!(last.label_x < last.pixel_x);
    }

    #[test]
    fn stagger_cycles_by_input_index() {
        let r = rows(&[(d(2019, 1, 1), 1.0), (d(2024, 1, 1), 2.0)]);
        let (x, y) = scales(d(2019, 1, 1), d(2024, 1, 1));
        let events: Vec<EventSpec> = (0..6).map(|i| event(d(2020, 1 + i, 1), "e")).collect();
        let out = AnnotationLayout::default().layout(&events, &r, "inflation", &x, &y, plot());
        let ys: Vec<f64> = out.iter().map(|a| a.label_y).collect();
        assert_eq!(ys, vec![46.0, 36.0, 26.0, 16.0, 46.0, 36.0]);
    }
}
