use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use housing_charts::Config;
use housing_charts::fetch::{DataSource, Fetcher};
use housing_charts::geo::parse_geojson;
use housing_charts::hover::{Pointer, PointerEvent};
use housing_charts::ingest::{parse_inflation, parse_region_metrics, parse_salaries, parse_table, read_records};
use housing_charts::models::RawRecord;
use housing_charts::viz::charts::{
    ChoroplethView, InflationView, RegionalLinesView, SalaryDumbbellView, SmallMultiplesView,
};
use housing_charts::viz::{Chart, ChartView, ViewKind};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "housing-charts",
    version,
    about = "Render the housing dashboard charts to SVG"
)]
struct Cli {
    /// TOML configuration file. Every setting has a default.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory the SVG files are written to (created if missing).
    #[arg(long, default_value = "charts")]
    out_dir: PathBuf,
    /// Container width in pixels (overrides the config file).
    #[arg(long)]
    width: Option<f64>,
    /// Views to render; repeat the flag for several. Renders every view when omitted.
    #[arg(long, value_enum)]
    view: Vec<ViewArg>,
    /// Simulated pointer position as X,Y in canvas pixels; the tooltip is drawn into the output.
    #[arg(long, value_parser = parse_pointer)]
    pointer: Option<Pointer>,
    /// Year shown by the map (defaults to the latest year in the data).
    #[arg(long)]
    year: Option<i32>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ViewArg {
    Hpi,
    Rents,
    Inflation,
    Salary,
    Map,
}

impl From<ViewArg> for ViewKind {
    fn from(v: ViewArg) -> Self {
        match v {
            ViewArg::Hpi => ViewKind::Hpi,
            ViewArg::Rents => ViewKind::Rents,
            ViewArg::Inflation => ViewKind::Inflation,
            ViewArg::Salary => ViewKind::Salary,
            ViewArg::Map => ViewKind::Map,
        }
    }
}

fn parse_pointer(s: &str) -> std::result::Result<Pointer, String> {
    let (x, y) = s.split_once(',').ok_or("expected X,Y")?;
    let x: f64 = x.trim().parse().map_err(|_| format!("invalid X in {s:?}"))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("invalid Y in {s:?}"))?;
    Ok(Pointer::new(x, y))
}

/// Loads sources for the views, resolved against the configured base.
struct Loader<'a> {
    fetcher: Fetcher,
    config: &'a Config,
}

impl Loader<'_> {
    fn text(&self, file_name: &str) -> housing_charts::Result<String> {
        self.fetcher
            .load_text(&DataSource::resolve(&self.config.base_url, file_name))
    }

    fn records(&self, file_name: &str) -> housing_charts::Result<Vec<RawRecord>> {
        read_records(&self.text(file_name)?)
    }

    fn hpi(&self) -> housing_charts::Result<RegionalLinesView> {
        let table = parse_table(&self.records(&self.config.sources.hpi)?)?;
        Ok(RegionalLinesView::new(table)?.with_breakpoint(self.config.compact_breakpoint_px))
    }

    fn rents(&self) -> housing_charts::Result<SmallMultiplesView> {
        let table = parse_table(&self.records(&self.config.sources.rents)?)?;
        Ok(SmallMultiplesView::new(table)?.with_breakpoint(self.config.compact_breakpoint_px))
    }

    fn inflation(&self) -> housing_charts::Result<InflationView> {
        let yoy = parse_table(&self.records(&self.config.sources.yoy)?)?;
        let inflation = parse_inflation(&self.records(&self.config.sources.inflation)?)?;
        let view = InflationView::new(
            &yoy,
            &inflation,
            self.config.join_tolerance_ms(),
            self.config.annotations.clone(),
        )?;
        Ok(view
            .with_lookahead_pad(self.config.annotation_pad_ms())
            .with_breakpoint(self.config.compact_breakpoint_px))
    }

    fn salary(&self) -> housing_charts::Result<SalaryDumbbellView> {
        let s = self.config.salary;
        let rows = parse_salaries(&self.records(&self.config.sources.salary)?, s.from_year, s.to_year)?;
        Ok(SalaryDumbbellView::new(rows, s.from_year, s.to_year)?.with_breakpoint(self.config.compact_breakpoint_px))
    }

    fn map(&self) -> housing_charts::Result<ChoroplethView> {
        let c = &self.config.choropleth;
        let metrics = parse_region_metrics(&self.records(&self.config.sources.metrics)?)?;
        let features = parse_geojson(&self.text(&self.config.sources.boundaries)?)?;
        let domain = c.domain.resolve(&metrics, &c.field);
        ChoroplethView::new(features, metrics, domain, c.field.clone(), c.top_n)
    }
}

/// Mount one view, apply the simulated interaction and write it out.
fn render<V: ChartView>(
    kind: ViewKind,
    width: f64,
    pointer: Option<Pointer>,
    out_dir: &Path,
    load: impl FnOnce() -> housing_charts::Result<V>,
    select: impl FnOnce(&mut V),
) -> Result<PathBuf> {
    let mut chart = Chart::new(kind, width);
    chart.load_with(load);
    chart.update(select);
    if let Some(p) = pointer {
        chart.pointer(PointerEvent::Enter(p));
    }
    match chart.view() {
        Some(_) => info!("rendering {} at width {width}", kind.slug()),
        None => info!("{} failed to load; rendering its error placeholder", kind.slug()),
    }
    let svg = chart
        .render_svg()
        .with_context(|| format!("rendering {}", kind.slug()))?;
    let path = out_dir.join(format!("{}.svg", kind.slug()));
    std::fs::write(&path, svg).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(w) = cli.width {
        config.width = w;
        config.validate().context("invalid --width")?;
    }
    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating output directory {}", cli.out_dir.display()))?;

    let loader = Loader {
        fetcher: Fetcher::new()?,
        config: &config,
    };
    let kinds: Vec<ViewKind> = if cli.view.is_empty() {
        ViewKind::ALL.to_vec()
    } else {
        cli.view.iter().map(|v| ViewKind::from(*v)).collect()
    };

    let (width, pointer, out) = (config.width, cli.pointer, cli.out_dir.as_path());
    for kind in kinds {
        let path = match kind {
            ViewKind::Hpi => render(kind, width, pointer, out, || loader.hpi(), |_| {})?,
            ViewKind::Rents => render(kind, width, pointer, out, || loader.rents(), |_| {})?,
            ViewKind::Inflation => render(kind, width, pointer, out, || loader.inflation(), |_| {})?,
            ViewKind::Salary => render(kind, width, pointer, out, || loader.salary(), |_| {})?,
            ViewKind::Map => render(
                kind,
                width,
                pointer,
                out,
                || loader.map(),
                |v: &mut ChoroplethView| {
                    if let Some(y) = cli.year {
                        v.select_year(y);
                    }
                },
            )?,
        };
        eprintln!("Wrote {} to {}", kind.title(), path.display());
    }
    Ok(())
}
