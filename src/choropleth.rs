//! Metric-to-color mapping for the regional map, with per-year top-N emphasis.
//!
//! The color domain is fixed once per dataset and never follows the selected year, so
//! the same ratio gets the same color in every year.

use crate::color::{Rgb, interpolate_lab};
use crate::models::{RegionFeature, RegionMetric, is_present};
use ahash::AHashMap;
use log::warn;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const LOW_COLOR: Rgb = Rgb::new(0xf3, 0xf4, 0xf6);
pub const HIGH_COLOR: Rgb = Rgb::new(0x98, 0x23, 0x39);
/// Neutral grey for regions without a value. Off the ramp, so it never reads as a low ratio.
pub const MISSING_FILL: Rgb = Rgb::new(0xe5, 0xe7, 0xeb);
pub const BORDER_STROKE: Rgb = Rgb::new(0xd1, 0xd5, 0xdb);
pub const TOP_STROKE: Rgb = Rgb::new(0x9e, 0x2f, 0x50);
pub const OUTLINE_STROKE: Rgb = Rgb::new(0x73, 0x60, 0x5b);
/// Swatch used in the tooltip's top-N badge.
pub const TOP_BADGE: Rgb = Rgb::new(0x9d, 0x61, 0x73);

pub const DEFAULT_DOMAIN: (f64, f64) = (5.0, 25.0);
pub const DEFAULT_TOP_N: usize = 5;

/// Numeric domain of the color ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorDomain {
    pub lo: f64,
    pub hi: f64,
}

impl ColorDomain {
    pub fn fixed(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Span of `field` over every year of `metrics`; `None` when no value is finite.
    pub fn across_years(metrics: &[RegionMetric], field: &str) -> Option<Self> {
        metrics
            .iter()
            .map(|m| m.value(field))
            .filter(|v| is_present(*v))
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((a, b)) => Some((a.min(v), b.max(v))),
            })
            .map(|(lo, hi)| Self { lo, hi })
    }
}

impl Default for ColorDomain {
    fn default() -> Self {
        Self::fixed(DEFAULT_DOMAIN.0, DEFAULT_DOMAIN.1)
    }
}

/// Clamped Lab ramp from [`LOW_COLOR`] to [`HIGH_COLOR`] over a fixed domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChoroplethColorMapper {
    pub domain: ColorDomain,
    pub low: Rgb,
    pub high: Rgb,
    pub missing: Rgb,
}

impl ChoroplethColorMapper {
    pub fn new(domain: ColorDomain) -> Self {
        Self {
            domain,
            low: LOW_COLOR,
            high: HIGH_COLOR,
            missing: MISSING_FILL,
        }
    }

    /// Position of `v` along the ramp in `[0, 1]`, or `None` for a missing value.
    pub fn position(&self, v: f64) -> Option<f64> {
        if !is_present(v) {
            return None;
        }
        let ColorDomain { lo, hi } = self.domain;
        if hi <= lo {
            return Some(if v < lo { 0.0 } else { 1.0 });
        }
        Some(((v - lo) / (hi - lo)).clamp(0.0, 1.0))
    }

    /// Ramp color at position `t`. Fills and legend stops both come from here.
    pub fn interpolate(&self, t: f64) -> Rgb {
        interpolate_lab(self.low, self.high, t)
    }

    pub fn color(&self, v: f64) -> Rgb {
        match self.position(v) {
            Some(t) => self.interpolate(t),
            None => self.missing,
        }
    }

    /// `count` evenly spaced `(offset, color)` stops from 0 to 1.
    pub fn legend_stops(&self, count: usize) -> Vec<(f64, Rgb)> {
        let n = count.max(2);
        (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64;
                (t, self.interpolate(t))
            })
            .collect()
    }
}

impl Default for ChoroplethColorMapper {
    fn default() -> Self {
        Self::new(ColorDomain::default())
    }
}

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-'’.,()]").expect("static regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Region name key for fallback matching: case, punctuation and `&` spelling are ignored.
pub fn clean_name(s: &str) -> String {
    let lower = s.to_lowercase().replace('\u{200B}', "").replace('&', " and ");
    let spaced = SEPARATORS.replace_all(&lower, " ");
    SPACES.replace_all(&spaced, " ").trim().to_string()
}

/// Indices of the `n` largest finite values, descending; equal values keep input order.
pub fn top_n(values: &[f64], n: usize) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..values.len()).filter(|&i| is_present(values[i])).collect();
    ranked.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    ranked.truncate(n);
    ranked
}

/// Region metrics of one year with code and cleaned-name lookups.
#[derive(Debug, Clone, Default)]
pub struct YearMetrics {
    pub rows: Vec<RegionMetric>,
    by_code: AHashMap<String, usize>,
    by_name: AHashMap<String, usize>,
}

impl YearMetrics {
    fn new(rows: Vec<RegionMetric>) -> Self {
        let mut by_code = AHashMap::with_capacity(rows.len());
        let mut by_name = AHashMap::with_capacity(rows.len());
        // later rows win on duplicate keys
        for (i, r) in rows.iter().enumerate() {
            if !r.code.is_empty() {
                by_code.insert(r.code.clone(), i);
            }
            by_name.insert(clean_name(&r.name), i);
        }
        Self { rows, by_code, by_name }
    }

    /// Row index for a feature: by code, then by cleaned name.
    pub fn lookup_index(&self, feature: &RegionFeature) -> Option<usize> {
        if !feature.code.is_empty()
            && let Some(&i) = self.by_code.get(&feature.code)
        {
            return Some(i);
        }
        let key = if feature.name.is_empty() {
            &feature.code
        } else {
            &feature.name
        };
        self.by_name.get(&clean_name(key)).copied()
    }

    pub fn lookup(&self, feature: &RegionFeature) -> Option<&RegionMetric> {
        self.lookup_index(feature).map(|i| &self.rows[i])
    }

    /// Row indices of this year's top `n` regions by `field`.
    pub fn top_n(&self, field: &str, n: usize) -> Vec<usize> {
        let values: Vec<f64> = self.rows.iter().map(|r| r.value(field)).collect();
        top_n(&values, n)
    }
}

/// All loaded region metrics, sliced by year.
#[derive(Debug, Clone, Default)]
pub struct RegionMetricIndex {
    by_year: BTreeMap<i32, YearMetrics>,
}

impl RegionMetricIndex {
    pub fn new(metrics: Vec<RegionMetric>) -> Self {
        let mut grouped: BTreeMap<i32, Vec<RegionMetric>> = BTreeMap::new();
        for m in metrics {
            grouped.entry(m.year).or_default().push(m);
        }
        Self {
            by_year: grouped
                .into_iter()
                .map(|(y, rows)| (y, YearMetrics::new(rows)))
                .collect(),
        }
    }

    /// Years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.by_year.keys().copied().collect()
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.by_year.keys().next_back().copied()
    }

    pub fn year(&self, year: i32) -> Option<&YearMetrics> {
        self.by_year.get(&year)
    }
}

/// Visual state of one region for the selected year.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionShade<'a> {
    pub feature: &'a RegionFeature,
    pub metric: Option<&'a RegionMetric>,
    pub value: f64,
    pub fill: Rgb,
    /// Rank among the emphasized regions, 0 being the largest.
    pub top_rank: Option<usize>,
}

impl RegionShade<'_> {
    pub fn is_top(&self) -> bool {
        self.top_rank.is_some()
    }

    pub fn stroke(&self) -> (Rgb, f64) {
        if self.is_top() { (TOP_STROKE, 2.0) } else { (BORDER_STROKE, 1.0) }
    }
}

/// Shade every feature for `year`. Unmatched features get the missing fill and can
/// never be emphasized.
pub fn shade_year<'a>(
    index: &'a RegionMetricIndex,
    features: &'a [RegionFeature],
    mapper: &ChoroplethColorMapper,
    field: &str,
    top: usize,
    year: i32,
) -> Vec<RegionShade<'a>> {
    let slice = index.year(year);
    let ranks: AHashMap<usize, usize> = slice
        .map(|s| s.top_n(field, top))
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(rank, row)| (row, rank))
        .collect();
    features
        .iter()
        .map(|feature| {
            let row = slice.and_then(|s| s.lookup_index(feature));
            if row.is_none() {
                warn!("no {year} metrics for region {:?}", feature.label());
            }
            let metric = row.and_then(|i| slice.map(|s| &s.rows[i]));
            let value = metric.map(|m| m.value(field)).unwrap_or(f64::NAN);
            RegionShade {
                feature,
                metric,
                value,
                fill: mapper.color(value),
                top_rank: row.and_then(|i| ranks.get(&i).copied()),
            }
        })
        .collect()
}
