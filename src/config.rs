//! Dashboard configuration, read from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file) reproduces the stock
//! dashboard. Example:
//!
//! ```toml
//! base_url = "https://example.org/housing/"
//! width = 640
//!
//! [choropleth]
//! domain = "dataset"   # or [5.0, 25.0]
//! top_n = 3
//!
//! [[annotations]]
//! date = "2020-03-23"
//! label = "UK lockdown\nbegins"
//! ```

use crate::choropleth::{ColorDomain, DEFAULT_DOMAIN, DEFAULT_TOP_N};
use crate::error::{ChartError, Result};
use crate::models::{EventSpec, MS_PER_DAY, RegionMetric};
use crate::scale::COMPACT_BREAKPOINT_PX;
use crate::viz::DEFAULT_WIDTH;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sources {
    pub hpi: String,
    pub rents: String,
    pub yoy: String,
    pub inflation: String,
    pub salary: String,
    pub metrics: String,
    pub boundaries: String,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            hpi: "hpi_uk_london.csv".into(),
            rents: "pipr_uk.csv".into(),
            yoy: "pipr_hpi_uk.csv".into(),
            inflation: "uk_inflation_rate.csv".into(),
            salary: "ldn_salary_growth.csv".into(),
            metrics: "ldn_ar_we_hp.csv".into(),
            boundaries: "london_boroughs.geojson".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalaryConfig {
    pub from_year: i32,
    pub to_year: i32,
}

impl Default for SalaryConfig {
    fn default() -> Self {
        Self {
            from_year: 2022,
            to_year: 2024,
        }
    }
}

/// How the choropleth color domain is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DomainSpec {
    /// Explicit `[lo, hi]`.
    Fixed(f64, f64),
    /// Min/max of the field over every year of the loaded metrics, computed once.
    Dataset,
}

impl DomainSpec {
    /// Resolve against the full (all-years) metrics set.
    pub fn resolve(&self, metrics: &[RegionMetric], field: &str) -> ColorDomain {
        match *self {
            DomainSpec::Fixed(lo, hi) => ColorDomain::fixed(lo, hi),
            DomainSpec::Dataset => ColorDomain::across_years(metrics, field).unwrap_or_default(),
        }
    }
}

impl Default for DomainSpec {
    fn default() -> Self {
        DomainSpec::Fixed(DEFAULT_DOMAIN.0, DEFAULT_DOMAIN.1)
    }
}

/// Accepts either the string `"dataset"` or a two-number array.
impl<'de> Deserialize<'de> for DomainSpec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, SeqAccess, Visitor};
        struct DomainVisitor;

        impl<'de> Visitor<'de> for DomainVisitor {
            type Value = DomainSpec;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "\"dataset\" or an array [lo, hi]")
            }

            fn visit_str<E>(self, s: &str) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                if s.eq_ignore_ascii_case("dataset") {
                    Ok(DomainSpec::Dataset)
                } else {
                    Err(E::custom(format!("unknown domain {s:?}")))
                }
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let lo: f64 = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let hi: f64 = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(1, &self))?;
                if seq.next_element::<f64>()?.is_some() {
                    return Err(de::Error::invalid_length(3, &self));
                }
                Ok(DomainSpec::Fixed(lo, hi))
            }
        }

        deserializer.deserialize_any(DomainVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChoroplethConfig {
    pub domain: DomainSpec,
    pub top_n: usize,
    pub field: String,
}

impl Default for ChoroplethConfig {
    fn default() -> Self {
        Self {
            domain: DomainSpec::default(),
            top_n: DEFAULT_TOP_N,
            field: "affordability".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL or directory that source file names are resolved against.
    pub base_url: String,
    pub sources: Sources,
    pub width: f64,
    pub join_tolerance_days: i64,
    pub annotation_pad_days: i64,
    pub compact_breakpoint_px: f64,
    pub salary: SalaryConfig,
    pub choropleth: ChoroplethConfig,
    pub annotations: Vec<EventSpec>,
}

fn event(y: i32, m: u32, d: u32, label: &str) -> Option<EventSpec> {
    Some(EventSpec {
        date: NaiveDate::from_ymd_opt(y, m, d)?,
        label: label.into(),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "data".into(),
            sources: Sources::default(),
            width: DEFAULT_WIDTH,
            join_tolerance_days: 40,
            annotation_pad_days: 240,
            compact_breakpoint_px: COMPACT_BREAKPOINT_PX,
            salary: SalaryConfig::default(),
            choropleth: ChoroplethConfig::default(),
            annotations: [
                event(2020, 3, 23, "UK lockdown\nbegins"),
                event(2021, 12, 16, "BoE first\nrate hike"),
                event(2022, 9, 23, "Mini-budget"),
                event(2025, 3, 1, "SDLT change"),
            ]
            .into_iter()
            .flatten()
            .collect(),
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(text).map_err(|e| ChartError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ChartError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(ChartError::Config(format!("width must be positive, got {}", self.width)));
        }
        if self.join_tolerance_days <= 0 {
            return Err(ChartError::Config("join_tolerance_days must be positive".into()));
        }
        if self.salary.from_year >= self.salary.to_year {
            return Err(ChartError::Config(format!(
                "salary.from_year ({}) must precede salary.to_year ({})",
                self.salary.from_year, self.salary.to_year
            )));
        }
        if let DomainSpec::Fixed(lo, hi) = self.choropleth.domain
            && !(lo < hi)
        {
            return Err(ChartError::Config(format!("choropleth.domain [{lo}, {hi}] is empty")));
        }
        Ok(())
    }

    pub fn join_tolerance_ms(&self) -> i64 {
        self.join_tolerance_days * MS_PER_DAY
    }

    pub fn annotation_pad_ms(&self) -> i64 {
        self.annotation_pad_days * MS_PER_DAY
    }
}
