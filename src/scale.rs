//! Scales and viewport-responsive layout.
//!
//! Scales are values: every data or size change builds new ones from scratch, so a
//! resize to `W`, then `W'`, then back to `W` reproduces exactly the same scales.

use crate::models::{EventSpec, MS_PER_DAY, Timestamp, TypedPoint, date_to_timestamp, is_present, timestamp_to_datetime};
use chrono::{Datelike, NaiveDate};

/// Below this container width the compact layout is used.
pub const COMPACT_BREAKPOINT_PX: f64 = 520.0;

/// Default right-hand pad past the latest annotation (~8 months).
pub const DEFAULT_LOOKAHEAD_PAD_MS: i64 = 240 * MS_PER_DAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleKind {
    Temporal,
    Linear,
    Band,
}

/// Continuous scale mapping `domain` linearly onto `range` (pixels).
///
/// Temporal scales use millisecond timestamps as their domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub kind: ScaleKind,
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(kind: ScaleKind, domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { kind, domain, range }
    }

    pub fn apply(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (v - d0) / span * (r1 - r0)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = r1 - r0;
        if span == 0.0 {
            return d0;
        }
        d0 + (px - r0) / span * (d1 - d0)
    }

    /// A copy whose domain is extended to round values.
    pub fn nice(&self, count: usize) -> Self {
        let (lo, hi) = nice_domain(self.domain.0, self.domain.1, count);
        Self {
            domain: (lo, hi),
            ..*self
        }
    }

    /// Round tick values inside the domain (linear scales).
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain.0, self.domain.1, count)
    }

    /// Calendar-aligned ticks inside the domain (temporal scales).
    pub fn time_ticks(&self, count: usize) -> Vec<TimeTick> {
        time_ticks(self.domain.0 as Timestamp, self.domain.1 as Timestamp, count)
    }

    pub fn contains(&self, v: f64) -> bool {
        let (a, b) = self.domain;
        v >= a.min(b) && v <= a.max(b)
    }
}

/// Tick step as in the usual 1-2-5 scheme; negative values encode `1 / |step|`.
pub fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    let step = (stop - start) / count.max(1) as f64;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -10f64.powf(-power) / factor
    }
}

pub fn nice_domain(mut start: f64, mut stop: f64, count: usize) -> (f64, f64) {
    let reversed = stop < start;
    if reversed {
        std::mem::swap(&mut start, &mut stop);
    }
    let mut prestep: Option<f64> = None;
    for _ in 0..10 {
        let step = tick_increment(start, stop, count);
        if prestep == Some(step) || step == 0.0 || !step.is_finite() {
            break;
        }
        if step > 0.0 {
            start = (start / step).floor() * step;
            stop = (stop / step).ceil() * step;
        } else {
            start = (start * step).ceil() / step;
            stop = (stop * step).floor() / step;
        }
        prestep = Some(step);
    }
    if reversed { (stop, start) } else { (start, stop) }
}

pub fn ticks(mut start: f64, mut stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    if stop < start {
        std::mem::swap(&mut start, &mut stop);
    }
    let inc = tick_increment(start, stop, count);
    if inc == 0.0 || !inc.is_finite() {
        return Vec::new();
    }
    if inc > 0.0 {
        let (r0, r1) = ((start / inc).ceil() as i64, (stop / inc).floor() as i64);
        (r0..=r1).map(|i| i as f64 * inc).collect()
    } else {
        let inv = -inc;
        let (r0, r1) = ((start * inv).ceil() as i64, (stop * inv).floor() as i64);
        (r0..=r1).map(|i| i as f64 / inv).collect()
    }
}

/// One calendar tick with its display label.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeTick {
    pub timestamp: Timestamp,
    pub label: String,
}

/// Candidate intervals in months, smallest first.
const TIME_INTERVALS_MONTHS: [i32; 10] = [1, 2, 3, 6, 12, 24, 60, 120, 240, 600];

pub fn time_ticks(lo: Timestamp, hi: Timestamp, count: usize) -> Vec<TimeTick> {
    if hi < lo || count == 0 {
        return Vec::new();
    }
    let start = timestamp_to_datetime(lo).date_naive();
    let end = timestamp_to_datetime(hi).date_naive();
    let month_index = |d: NaiveDate| d.year() * 12 + d.month0() as i32;
    let (first, last) = (month_index(start), month_index(end));
    let span = last - first + 1;
    let step = TIME_INTERVALS_MONTHS
        .iter()
        .copied()
        .find(|s| (span / s) as usize <= count)
        .unwrap_or(TIME_INTERVALS_MONTHS[TIME_INTERVALS_MONTHS.len() - 1]);

    let mut idx = if start.day() == 1 { first } else { first + 1 };
    idx = (idx + step - 1).div_euclid(step) * step;

    let mut out = Vec::new();
    while idx <= last {
        if let Some(d) = NaiveDate::from_ymd_opt(idx.div_euclid(12), idx.rem_euclid(12) as u32 + 1, 1) {
            let t = date_to_timestamp(d);
            if t >= lo && t <= hi {
                let label = if step >= 12 || d.month() == 1 {
                    d.format("%Y").to_string()
                } else {
                    d.format("%b").to_string()
                };
                out.push(TimeTick { timestamp: t, label });
            }
        }
        idx += step;
    }
    out
}

/// Categorical scale placing evenly spaced bands across a pixel range.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    pub domain: Vec<String>,
    pub range: (f64, f64),
    pub padding: f64,
    start: f64,
    step: f64,
}

impl BandScale {
    /// Bands with equal inner and outer `padding` (fraction of a step), centered in `range`.
    pub fn new(domain: Vec<String>, range: (f64, f64), padding: f64) -> Self {
        let n = domain.len() as f64;
        let (r0, r1) = range;
        let step = (r1 - r0) / (n - padding + padding * 2.0).max(1.0);
        let start = r0 + (r1 - r0 - step * (n - padding)) * 0.5;
        Self {
            domain,
            range,
            padding,
            start,
            step,
        }
    }

    pub fn kind(&self) -> ScaleKind {
        ScaleKind::Band
    }

    pub fn bandwidth(&self) -> f64 {
        self.step * (1.0 - self.padding)
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Leading edge of the band at `index`.
    pub fn position_at(&self, index: usize) -> f64 {
        self.start + self.step * index as f64
    }

    /// Center line of the band for `label`, if it is in the domain.
    pub fn center(&self, label: &str) -> Option<f64> {
        self.domain
            .iter()
            .position(|d| d == label)
            .map(|i| self.position_at(i) + self.bandwidth() / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// Pixel rectangle of the plotting area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PlotRect {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// Per-render layout derived from the container width.
///
/// The compact configuration applies to every axis of the render pass at once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub compact: bool,
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    pub x_ticks: usize,
    pub y_ticks: usize,
    pub tick_font_px: u32,
    pub label_font_px: u32,
}

impl LayoutConfig {
    pub fn for_viewport(width: f64, height: f64, margins: Margins, breakpoint: f64) -> Self {
        if width < breakpoint {
            Self {
                compact: true,
                width,
                height,
                margins: Margins::new(
                    (margins.top * 0.75).round(),
                    (margins.right * 0.6).round(),
                    (margins.bottom * 0.8).round(),
                    (margins.left * 0.7).round(),
                ),
                x_ticks: 4,
                y_ticks: 4,
                tick_font_px: 10,
                label_font_px: 10,
            }
        } else {
            Self {
                compact: false,
                width,
                height,
                margins,
                x_ticks: 7,
                y_ticks: 7,
                tick_font_px: 12,
                label_font_px: 12,
            }
        }
    }

    pub fn plot(&self) -> PlotRect {
        PlotRect {
            left: self.margins.left,
            top: self.margins.top,
            right: (self.width - self.margins.right).max(self.margins.left + 1.0),
            bottom: (self.height - self.margins.bottom).max(self.margins.top + 1.0),
        }
    }
}

/// How the value domain is widened before niceing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Padding {
    /// Pad both ends by a fraction of the range (±1 when the range is zero).
    RangeFraction(f64),
    /// Scale the ends outward (`floor(min·(1−f))`, `ceil(max·(1+f))`).
    Proportional(f64),
}

/// Derives scales from loaded data and the current layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBuilder {
    pub lookahead_pad_ms: i64,
    pub padding: Padding,
    pub nice_count: usize,
}

impl Default for ScaleBuilder {
    fn default() -> Self {
        Self {
            lookahead_pad_ms: DEFAULT_LOOKAHEAD_PAD_MS,
            padding: Padding::RangeFraction(0.1),
            nice_count: 10,
        }
    }
}

impl ScaleBuilder {
    /// Time axis over `rows`, stretched to the latest in-scope event plus the lookahead pad.
    ///
    /// Events dated before the first row are out of scope and do not stretch the domain.
    pub fn temporal(&self, rows: &[TypedPoint], events: &[EventSpec], plot: PlotRect) -> LinearScale {
        let lo = rows.iter().map(|r| r.timestamp).min().unwrap_or(0);
        let data_hi = rows.iter().map(|r| r.timestamp).max().unwrap_or(lo);
        let latest_event = events
            .iter()
            .map(|e| date_to_timestamp(e.date))
            .filter(|t| *t >= lo)
            .max();
        let hi = match latest_event {
            Some(t) => data_hi.max(t) + self.lookahead_pad_ms,
            None => data_hi,
        };
        LinearScale::new(
            ScaleKind::Temporal,
            (lo as f64, hi as f64),
            (plot.left, plot.right),
        )
    }

    /// Value axis over every finite value of `keys` across `rows`.
    pub fn linear_for_rows(&self, rows: &[TypedPoint], keys: &[String], range: (f64, f64)) -> LinearScale {
        let values = rows
            .iter()
            .flat_map(|r| keys.iter().map(move |k| r.value(k)));
        self.linear(values, range)
    }

    /// Value axis over `values`; missing values are ignored.
    pub fn linear(&self, values: impl IntoIterator<Item = f64>, range: (f64, f64)) -> LinearScale {
        let (lo, hi) = values
            .into_iter()
            .filter(|v| is_present(*v))
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((a, b)) => Some((a.min(v), b.max(v))),
            })
            .unwrap_or((0.0, 1.0));
        let (lo, hi) = match self.padding {
            Padding::RangeFraction(f) => {
                let pad = if hi > lo { (hi - lo) * f } else { 1.0 };
                (lo - pad, hi + pad)
            }
            Padding::Proportional(f) => {
                let (a, b) = ((lo * (1.0 - f)).floor(), (hi * (1.0 + f)).ceil());
                if b > a { (a, b) } else { (a - 1.0, b + 1.0) }
            }
        };
        LinearScale::new(ScaleKind::Linear, (lo, hi), range).nice(self.nice_count)
    }

    pub fn band(&self, labels: Vec<String>, range: (f64, f64), padding: f64) -> BandScale {
        BandScale::new(labels, range, padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> PlotRect {
        PlotRect {
            left: 50.0,
            top: 10.0,
            right: 850.0,
            bottom: 610.0,
        }
    }

    #[test]
    fn nice_rounds_outward() {
        assert_eq!(nice_domain(0.13, 9.7, 10), (0.0, 10.0));
        assert_eq!(nice_domain(-3.2, 11.8, 10), (-4.0, 12.0));
        assert_eq!(nice_domain(0.123, 0.987, 10), (0.1, 1.0));
    }

    #[test]
    fn ticks_are_round_and_inside() {
        assert_eq!(ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        let t = ticks(0.0, 1.0, 5);
        assert_eq!(t.len(), 6);
        assert!((t[1] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn linear_pads_ten_percent_and_nices() {
        let b = ScaleBuilder::default();
        let s = b.linear([0.0, 100.0, f64::NAN], (600.0, 10.0));
        assert_eq!(s.domain, (-10.0, 110.0));
        let flat = b.linear([5.0, 5.0], (600.0, 10.0));
        assert_eq!(flat.domain, (4.0, 6.0));
    }

    #[test]
    fn apply_and_invert_agree() {
        let s = LinearScale::new(ScaleKind::Linear, (0.0, 50.0), (600.0, 100.0));
        assert_eq!(s.apply(0.0), 600.0);
        assert_eq!(s.apply(50.0), 100.0);
        assert!((s.invert(s.apply(12.5)) - 12.5).abs() < 1e-9);
    }

    #[test]
    fn temporal_domain_extends_to_future_event() {
        let rows: Vec<TypedPoint> = [(2020, 1), (2024, 1)]
            .iter()
            .map(|&(y, m)| TypedPoint::new(date_to_timestamp(NaiveDate::from_ymd_opt(y, m, 1).unwrap())))
            .collect();
        let event = EventSpec {
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            label: "SDLT change".into(),
        };
        let b = ScaleBuilder::default();
        let s = b.temporal(&rows, std::slice::from_ref(&event), rect());
        let expected = date_to_timestamp(event.date) + DEFAULT_LOOKAHEAD_PAD_MS;
        assert_eq!(s.domain.1 as i64, expected);
        assert_eq!(s.domain.0 as i64, rows[0].timestamp);

        let no_events = b.temporal(&rows, &[], rect());
        assert_eq!(no_events.domain.1 as i64, rows[1].timestamp);
    }

    #[test]
    fn compact_layout_below_breakpoint() {
        let m = Margins::new(40.0, 72.0, 44.0, 56.0);
        let wide = LayoutConfig::for_viewport(880.0, 700.0, m, COMPACT_BREAKPOINT_PX);
        let narrow = LayoutConfig::for_viewport(400.0, 700.0, m, COMPACT_BREAKPOINT_PX);
        assert!(!wide.compact);
        assert!(narrow.compact);
        assert!(narrow.x_ticks < wide.x_ticks && narrow.y_ticks < wide.y_ticks);
        assert!(narrow.margins.left < wide.margins.left);
        assert!(narrow.tick_font_px < wide.tick_font_px);
    }

    #[test]
    fn band_scale_centers_padded_bands() {
        let b = BandScale::new(vec!["a".into(), "b".into()], (0.0, 100.0), 0.4);
        // step = 100 / (2 - 0.4 + 0.8) = 41.666..
        assert!((b.step() - 100.0 / 2.4).abs() < 1e-9);
        let ca = b.center("a").unwrap();
        let cb = b.center("b").unwrap();
        assert!((cb - ca - b.step()).abs() < 1e-9);
        assert!((ca + cb - 100.0).abs() < 1e-9);
        assert!(b.center("zzz").is_none());
    }

    #[test]
    fn time_ticks_are_first_of_month_and_bounded() {
        let lo = date_to_timestamp(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        let hi = date_to_timestamp(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        let t = time_ticks(lo, hi, 7);
        assert!(!t.is_empty() && t.len() <= 7);
        assert!(t.iter().all(|tick| tick.timestamp >= lo && tick.timestamp <= hi));
        // two-year steps aligned on even years
        assert_eq!(t[0].label, "2016");
        assert_eq!(t.last().map(|x| x.label.as_str()), Some("2024"));
    }
}
