//! housing_charts
//!
//! Rendering and interaction engine for a housing-market dashboard: multi-series time
//! lines, a three-series inflation chart with dated events, small multiples, a salary
//! dumbbell and a borough choropleth with a year slider. Pairs with the `housing-charts`
//! host binary, which renders each view to SVG.
//!
//! ### Features
//! - Ingest loosely formatted CSV exports into typed, timestamped rows
//! - Join a primary table to a secondary series by nearest timestamp within a tolerance
//! - Build time, linear and band scales with padding and nice ticks
//! - Resolve a pointer to the nearest row (synchronized or disambiguating hover)
//! - Place event annotations without overlap inside the plot
//! - Color regions on a perceptual (Lab) ramp over a fixed domain
//!
//! ### Example
//! ```no_run
//! use housing_charts::ingest::{parse_table, read_records};
//! use housing_charts::viz::charts::RegionalLinesView;
//! use housing_charts::viz::{Chart, ViewKind};
//!
//! let text = std::fs::read_to_string("data/hpi_uk_london.csv")?;
//! let table = parse_table(&read_records(&text)?)?;
//! let mut chart = Chart::new(ViewKind::Hpi, 880.0);
//! chart.load_with(|| RegionalLinesView::new(table));
//! std::fs::write("hpi.svg", chart.render_svg()?)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod annotate;
pub mod choropleth;
pub mod color;
pub mod config;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod hover;
pub mod ingest;
pub mod join;
pub mod models;
pub mod resize;
pub mod scale;
pub mod viz;

pub use config::Config;
pub use error::{ChartError, Result};
pub use models::{Series, SeriesPoint, Table, TypedPoint};
