//! Live source tests. Run with: `cargo test --features online -- --nocapture`
//! Set `HOUSING_CHARTS_BASE_URL` to the directory URL the dashboard's CSV files are served from.
#![cfg(feature = "online")]

use housing_charts::Config;
use housing_charts::fetch::{DataSource, Fetcher};
use housing_charts::ingest::{parse_table, read_records};
use housing_charts::viz::charts::RegionalLinesView;
use housing_charts::viz::{Chart, ViewKind};

fn base_url() -> Option<String> {
    std::env::var("HOUSING_CHARTS_BASE_URL").ok()
}

#[test]
fn live_hpi_renders() {
    let Some(base) = base_url() else {
        eprintln!("HOUSING_CHARTS_BASE_URL not set; skipping");
        return;
    };
    let config = Config::default();
    let fetcher = Fetcher::new().expect("http client");
    let text = fetcher
        .load_text(&DataSource::resolve(&base, &config.sources.hpi))
        .expect("fetch hpi");
    let table = parse_table(&read_records(&text).expect("csv")).expect("rows");
    assert!(!table.rows.is_empty());

    let mut chart = Chart::new(ViewKind::Hpi, config.width);
    assert!(chart.load_with(|| RegionalLinesView::new(table)));
    assert!(chart.render_svg().expect("svg").contains("<svg"));
}

#[test]
fn unknown_file_is_a_fetch_error() {
    let Some(base) = base_url() else {
        return;
    };
    let fetcher = Fetcher::new().expect("http client");
    let err = fetcher
        .load_text(&DataSource::resolve(&base, "no_such_file.csv"))
        .unwrap_err();
    assert!(matches!(err, housing_charts::ChartError::Fetch { .. }));
}
