//! Pointer-to-data resolution and the per-chart hover state machine.
//!
//! Every query runs in `O(log n)` in the row count (binary search) plus `O(k)` in the
//! number of series at the resolved row.

use crate::color::Rgb;
use crate::models::{Timestamp, TypedPoint, is_present};
use crate::scale::{BandScale, LinearScale, PlotRect};

/// Pointer position in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
}

impl Pointer {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Index of the row whose timestamp is closest to `t`.
///
/// When `t` lies exactly halfway between two rows the later one is returned.
/// `rows` must be sorted ascending; returns `None` only when it is empty.
pub fn nearest_row_index(rows: &[TypedPoint], t: f64) -> Option<usize> {
    if rows.is_empty() {
        return None;
    }
    let i = rows.partition_point(|r| (r.timestamp as f64) < t);
    if i == 0 {
        return Some(0);
    }
    if i == rows.len() {
        return Some(rows.len() - 1);
    }
    let before = t - rows[i - 1].timestamp as f64;
    let after = rows[i].timestamp as f64 - t;
    Some(if before < after { i - 1 } else { i })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverMode {
    /// Every series reports its value at the resolved row.
    Synchronized,
    /// Only the series drawn closest to the pointer is picked.
    Disambiguating,
}

/// One series' value at a resolved row. `pixel_y` is `None` when the value is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesReading {
    pub key: String,
    pub value: f64,
    pub pixel_y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoverHit {
    pub row: usize,
    pub timestamp: Timestamp,
    pub pixel_x: f64,
    pub readings: Vec<SeriesReading>,
    /// Index into `readings` of the picked series (disambiguating mode only).
    pub chosen: Option<usize>,
}

impl HoverHit {
    pub fn chosen_reading(&self) -> Option<&SeriesReading> {
        self.chosen.and_then(|i| self.readings.get(i))
    }
}

/// Index of the reading whose pixel Y is closest to `pointer_y`; ties go to the earliest.
pub fn closest_by_screen_y(readings: &[SeriesReading], pointer_y: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, r) in readings.iter().enumerate() {
        let Some(py) = r.pixel_y else { continue };
        let d = (py - pointer_y).abs();
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Read-only view of one chart's rows and scales used to resolve pointer positions.
#[derive(Debug, Clone, Copy)]
pub struct HoverQuery<'a> {
    pub rows: &'a [TypedPoint],
    pub keys: &'a [String],
    pub x: &'a LinearScale,
    pub y: &'a LinearScale,
    pub mode: HoverMode,
}

impl HoverQuery<'_> {
    /// Resolve a pointer to the nearest row and its readings.
    ///
    /// In disambiguating mode the result is `None` when no series has a finite value
    /// at the resolved row.
    pub fn resolve(&self, p: Pointer) -> Option<HoverHit> {
        let row = nearest_row_index(self.rows, self.x.invert(p.x))?;
        let r = &self.rows[row];
        let readings: Vec<SeriesReading> = self
            .keys
            .iter()
            .map(|k| {
                let value = r.value(k);
                SeriesReading {
                    key: k.clone(),
                    value,
                    pixel_y: is_present(value).then(|| self.y.apply(value)),
                }
            })
            .collect();
        let chosen = match self.mode {
            HoverMode::Synchronized => None,
            HoverMode::Disambiguating => Some(closest_by_screen_y(&readings, p.y)?),
        };
        Some(HoverHit {
            row,
            timestamp: r.timestamp,
            pixel_x: self.x.apply(r.timestamp as f64),
            readings,
            chosen,
        })
    }
}

/// Row of a dumbbell chart under the pointer.
///
/// A row is hit when the pointer is within `tolerance_px` of its center line and
/// horizontally between its two dots (inclusive of the dot radius).
pub fn dumbbell_row_at(
    values: &[(f64, f64)],
    x: &LinearScale,
    y: &BandScale,
    p: Pointer,
    tolerance_px: f64,
    dot_radius: f64,
) -> Option<usize> {
    if values.is_empty() || y.step() <= 0.0 {
        return None;
    }
    let first_center = y.position_at(0) + y.bandwidth() / 2.0;
    let idx = ((p.y - first_center) / y.step()).round();
    if idx < 0.0 || idx as usize >= values.len() {
        return None;
    }
    let idx = idx as usize;
    let cy = y.position_at(idx) + y.bandwidth() / 2.0;
    if (p.y - cy).abs() > tolerance_px {
        return None;
    }
    let (a, b) = values[idx];
    let (xa, xb) = (x.apply(a), x.apply(b));
    let (lo, hi) = (xa.min(xb) - dot_radius, xa.max(xb) + dot_radius);
    (p.x >= lo && p.x <= hi).then_some(idx)
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Enter(Pointer),
    Move(Pointer),
    Leave,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HoverState<H> {
    Idle,
    Active { pointer: Pointer, hit: Option<H> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipLine {
    pub text: String,
    pub swatch: Option<Rgb>,
}

impl TooltipLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            swatch: None,
        }
    }

    pub fn swatch(color: Rgb, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            swatch: Some(color),
        }
    }
}

/// Text shown in a tooltip: a bold title plus detail lines.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TooltipContent {
    pub title: String,
    pub lines: Vec<TooltipLine>,
}

/// The single tooltip overlay of one chart instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tooltip {
    pub visible: bool,
    /// Pointer position the box is anchored to.
    pub anchor: (f64, f64),
    pub content: TooltipContent,
}

impl Tooltip {
    fn hide(&mut self) {
        self.visible = false;
        self.content = TooltipContent::default();
    }
}

/// Hover state machine of one chart: `Idle -> Active -> Active(updated) -> Idle`.
///
/// Owns that chart's tooltip exclusively; nothing else mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverController<H> {
    state: HoverState<H>,
    tooltip: Tooltip,
}

impl<H> Default for HoverController<H> {
    fn default() -> Self {
        Self {
            state: HoverState::Idle,
            tooltip: Tooltip::default(),
        }
    }
}

impl<H> HoverController<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &HoverState<H> {
        &self.state
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, HoverState::Active { .. })
    }

    pub fn hit(&self) -> Option<&H> {
        match &self.state {
            HoverState::Active { hit, .. } => hit.as_ref(),
            HoverState::Idle => None,
        }
    }

    /// Apply one pointer event.
    ///
    /// A pointer outside `area` is treated as a leave. `resolve` maps a pointer to a hit
    /// and `describe` turns a hit into tooltip text.
    pub fn handle<R, D>(&mut self, event: PointerEvent, area: PlotRect, resolve: R, describe: D)
    where
        R: FnOnce(Pointer) -> Option<H>,
        D: FnOnce(&H) -> TooltipContent,
    {
        let pointer = match event {
            PointerEvent::Enter(p) | PointerEvent::Move(p) if area.contains(p.x, p.y) => p,
            _ => {
                self.reset();
                return;
            }
        };
        let hit = resolve(pointer);
        match &hit {
            Some(h) => {
                self.tooltip.visible = true;
                self.tooltip.anchor = (pointer.x, pointer.y);
                self.tooltip.content = describe(h);
            }
            None => self.tooltip.hide(),
        }
        self.state = HoverState::Active { pointer, hit };
    }

    /// Back to `Idle` with the tooltip hidden. Called on leave and on any data or size change.
    pub fn reset(&mut self) {
        self.state = HoverState::Idle;
        self.tooltip.hide();
    }
}
