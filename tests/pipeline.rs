//! End-to-end scenarios through the public API: ingest, mount a view in a `Chart`,
//! interact, and render.

use housing_charts::choropleth::{ColorDomain, MISSING_FILL};
use housing_charts::color::Rgba;
use housing_charts::config::{Config, DomainSpec};
use housing_charts::error::ChartError;
use housing_charts::fetch::ViewState;
use housing_charts::geo::parse_geojson;
use housing_charts::hover::{Pointer, PointerEvent};
use housing_charts::ingest::{parse_inflation, parse_region_metrics, parse_table, read_records};
use housing_charts::join::join;
use housing_charts::viz::charts::{ChoroplethView, RegionalLinesView};
use housing_charts::viz::{Chart, ChartView, Mark, ViewKind};

const HPI: &str = "Month,UK HPI,London HPI,Wales\n\
Jan-20,100,120,90\n\
Feb-20,101,,91\n\
Mar-20,102,125,92\n\
not a date,1,2,3\n";

const METRICS: &str = "year,code,borough,ratio,price,earnings\n\
2023,E1,Camden,18.0,\"£500,000\",\"£41,000\"\n\
2024,E1,Camden,17.0,\"£495,000\",\"£42,000\"\n\
2024,E2,Hackney,12.5,\"£450,000\",\"£38,000\"\n";

const BOUNDARIES: &str = r#"{"type":"FeatureCollection","features":[
{"type":"Feature","properties":{"LAD23CD":"E1","LAD23NM":"Camden"},
 "geometry":{"type":"Polygon","coordinates":[[[-0.20,51.50],[-0.18,51.50],[-0.18,51.52],[-0.20,51.52],[-0.20,51.50]]]}},
{"type":"Feature","properties":{"LAD23CD":"E2","LAD23NM":"Hackney"},
 "geometry":{"type":"Polygon","coordinates":[[[-0.10,51.50],[-0.08,51.50],[-0.08,51.52],[-0.10,51.52],[-0.10,51.50]]]}},
{"type":"Feature","properties":{"LAD23CD":"E9","LAD23NM":"Borough X"},
 "geometry":{"type":"Polygon","coordinates":[[[0.00,51.50],[0.02,51.50],[0.02,51.52],[0.00,51.52],[0.00,51.50]]]}}
]}"#;

fn lines_view() -> RegionalLinesView {
    let table = parse_table(&read_records(HPI).unwrap()).unwrap();
    RegionalLinesView::new(table).unwrap()
}

fn map_view() -> ChoroplethView {
    let metrics = parse_region_metrics(&read_records(METRICS).unwrap()).unwrap();
    let features = parse_geojson(BOUNDARIES).unwrap();
    ChoroplethView::new(features, metrics, ColorDomain::default(), "affordability", 5).unwrap()
}

fn polygon_fills(chart: &Chart<ChoroplethView>) -> Vec<Rgba> {
    chart
        .scene()
        .marks
        .iter()
        .filter_map(|m| match m {
            Mark::Polygon {
                fill: Some(f), ..
            } => Some(*f),
            _ => None,
        })
        .collect()
}

#[test]
fn unparsable_dates_are_dropped_and_blanks_stay_missing() {
    let table = parse_table(&read_records(HPI).unwrap()).unwrap();
    assert_eq!(table.keys, ["uk_hpi", "london_hpi", "wales"]);
    assert_eq!(table.rows.len(), 3);
    assert!(table.rows[1].value("london_hpi").is_nan());
    assert!(table.rows.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}

#[test]
fn inflation_join_leaves_unmatched_months_missing() {
    let yoy = parse_table(&read_records("Date,PIPR,UK_HPI\n2020-01,1,2\n2020-02,1,2\n2020-03,1,2\n").unwrap())
        .unwrap();
    let inflation = parse_inflation(&read_records("Date,Rate\n2020-01-03,0.5\n2020-03-20,0.7\n").unwrap()).unwrap();
    let rows = join(&yoy.rows, &inflation, Config::default().join_tolerance_ms() / 4);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].value("inflation"), 0.5);
    assert!(rows[1].value("inflation").is_nan());
    assert!(rows[2].value("inflation").is_nan());
}

#[test]
fn missing_borough_is_grey_with_no_data_tooltip() {
    let mut chart = Chart::new(ViewKind::Map, 820.0);
    assert!(chart.load_with(|| Ok(map_view())));
    let missing = Rgba::opaque(MISSING_FILL);
    assert_eq!(polygon_fills(&chart).iter().filter(|f| **f == missing).count(), 1);

    let view = chart.view().unwrap();
    let width = chart.width();
    let area = view.hover_area(width);
    // scan the map for the pixel that resolves to the unmatched borough
    let target = (0..200)
        .flat_map(|i| (0..200).map(move |j| (i, j)))
        .map(|(i, j)| {
            Pointer::new(
                area.left + (area.right - area.left) * i as f64 / 200.0,
                area.top + (area.bottom - area.top) * j as f64 / 200.0,
            )
        })
        .find(|p| view.resolve(width, *p) == Some(2))
        .expect("unmatched borough is drawn");
    chart.pointer(PointerEvent::Enter(target));
    let tooltip = chart.tooltip();
    assert!(tooltip.visible);
    assert_eq!(tooltip.content.title, "Borough X (2024)");
    assert_eq!(tooltip.content.lines[0].text, "No data");
}

#[test]
fn year_change_refills_without_moving_the_domain() {
    let mut chart = Chart::new(ViewKind::Map, 820.0);
    chart.load_with(|| Ok(map_view()));
    let before = polygon_fills(&chart);
    let domain_before = *chart.view().unwrap().mapper();
    assert!(chart.update(|v| {
        v.select_year(2023);
    }));
    assert_eq!(chart.view().unwrap().selected_year(), 2023);
    assert_eq!(*chart.view().unwrap().mapper(), domain_before);
    assert_ne!(before, polygon_fills(&chart));
}

#[test]
fn dataset_domain_spans_every_year() {
    let metrics = parse_region_metrics(&read_records(METRICS).unwrap()).unwrap();
    let d = DomainSpec::Dataset.resolve(&metrics, "affordability");
    assert_eq!((d.lo, d.hi), (12.5, 18.0));
}

#[test]
fn resize_round_trip_restores_the_same_drawing() {
    let mut chart = Chart::new(ViewKind::Hpi, 880.0);
    chart.load_with(|| Ok(lines_view()));
    // gaps are NaN in the scene, so compare the rendered documents
    let original = chart.render_svg().unwrap();

    chart.observe_width(420.0);
    chart.observe_width(500.0);
    assert!(chart.on_frame());
    assert_eq!(chart.width(), 500.0);
    assert_ne!(chart.render_svg().unwrap(), original);

    chart.observe_width(880.0);
    assert!(chart.on_frame());
    assert_eq!(chart.render_svg().unwrap(), original);
    assert!(!chart.on_frame());
}

#[test]
fn resize_clears_an_active_tooltip() {
    let mut chart = Chart::new(ViewKind::Hpi, 880.0);
    chart.load_with(|| Ok(lines_view()));
    let plot = chart.view().unwrap().layout(880.0).plot;
    chart.pointer(PointerEvent::Enter(Pointer::new(
        (plot.left + plot.right) / 2.0,
        (plot.top + plot.bottom) / 2.0,
    )));
    assert!(chart.tooltip().visible);

    chart.observe_width(600.0);
    chart.on_frame();
    assert!(!chart.tooltip().visible);
    assert!(!chart.hover().is_active());
}

#[test]
fn superseded_load_is_discarded() {
    let mut chart: Chart<RegionalLinesView> = Chart::new(ViewKind::Hpi, 880.0);
    let first = chart.begin_load();
    let second = chart.begin_load();

    assert!(!chart.complete_load(first, Ok(lines_view())));
    assert!(matches!(chart.state(), ViewState::Loading));
    assert!(chart.scene().texts().any(|t| t.text == "Loading…"));

    assert!(chart.complete_load(second, Err(ChartError::NoValidRows("time series".into()))));
    assert!(matches!(chart.state(), ViewState::Failed(_)));
    let svg = chart.render_svg().unwrap();
    assert!(svg.contains("Error:"));
}
