//! London borough affordability map with a year selector.
//!
//! The color domain is resolved once when the view is built and kept for every year, so
//! switching years only changes fills and the top-N emphasis.

use crate::choropleth::{
    ChoroplethColorMapper, ColorDomain, OUTLINE_STROKE, RegionMetricIndex, RegionShade, TOP_BADGE,
    shade_year,
};
use crate::color::Rgba;
use crate::error::{ChartError, Result};
use crate::geo::{MercatorProjection, shape_at};
use crate::hover::{Pointer, TooltipContent, TooltipLine};
use crate::models::{RegionFeature, RegionMetric};
use crate::scale::PlotRect;
use crate::viz::ChartView;
use crate::viz::legend::{GradientLegend, YearSlider};
use crate::viz::scene::{Mark, Scene, Stroke};
use crate::viz::util::{HIGHLIGHT, format_money, format_value};
use ::geo::MultiPolygon;
use log::debug;

pub const LEGEND_CAPTION: &str = "Affordability ratio (lower = more affordable)";
pub const PRICE_FIELD: &str = "house_price";
pub const PAY_FIELD: &str = "workplace";

const MAP_ASPECT: f64 = 760.0 / 820.0;
const MAP_MARGIN: f64 = 28.0;
const SLIDER_BAND: f64 = 56.0;
const LEGEND_WIDTH: f64 = 260.0;

#[derive(Debug, Clone)]
pub struct ChoroplethView {
    features: Vec<RegionFeature>,
    index: RegionMetricIndex,
    mapper: ChoroplethColorMapper,
    field: String,
    top_n: usize,
    year: i32,
}

impl ChoroplethView {
    /// Starts on the latest year present in `metrics`.
    pub fn new(
        features: Vec<RegionFeature>,
        metrics: Vec<RegionMetric>,
        domain: ColorDomain,
        field: impl Into<String>,
        top_n: usize,
    ) -> Result<Self> {
        if features.is_empty() {
            return Err(ChartError::Geo("no region boundaries".into()));
        }
        let index = RegionMetricIndex::new(metrics);
        let year = index
            .latest_year()
            .ok_or_else(|| ChartError::NoValidRows("regional metrics".into()))?;
        Ok(Self {
            features,
            index,
            mapper: ChoroplethColorMapper::new(domain),
            field: field.into(),
            top_n,
            year,
        })
    }

    pub fn years(&self) -> Vec<i32> {
        self.index.years()
    }

    pub fn selected_year(&self) -> i32 {
        self.year
    }

    pub fn mapper(&self) -> &ChoroplethColorMapper {
        &self.mapper
    }

    /// Select `year`; unknown years are ignored and `false` is returned.
    pub fn select_year(&mut self, year: i32) -> bool {
        if self.index.year(year).is_none() {
            debug!("year {year} not in regional metrics, keeping {}", self.year);
            return false;
        }
        self.year = year;
        true
    }

    /// Select the year under a slider position.
    pub fn select_at(&mut self, width: f64, slider_x: f64) -> bool {
        match self.slider(width).year_at(slider_x) {
            Some(y) => self.select_year(y),
            None => false,
        }
    }

    pub fn slider(&self, width: f64) -> YearSlider {
        YearSlider::new(self.years(), 60.0, (width - 70.0).max(61.0), SLIDER_BAND / 2.0 - 6.0)
    }

    fn map_area(&self, width: f64) -> PlotRect {
        PlotRect {
            left: 0.0,
            top: SLIDER_BAND,
            right: width,
            bottom: self.height(width),
        }
    }

    fn shapes(&self, width: f64) -> Vec<MultiPolygon<f64>> {
        let area = self.map_area(width);
        let projection = MercatorProjection::fit_extent(
            &self.features,
            (area.left + MAP_MARGIN, area.top + MAP_MARGIN),
            (area.right - MAP_MARGIN, area.bottom - MAP_MARGIN),
        );
        match projection {
            Some(p) => self.features.iter().map(|f| p.project_feature(f)).collect(),
            None => vec![MultiPolygon::new(vec![]); self.features.len()],
        }
    }

    pub fn shades(&self) -> Vec<RegionShade<'_>> {
        shade_year(&self.index, &self.features, &self.mapper, &self.field, self.top_n, self.year)
    }
}

fn push_shape(scene: &mut Scene, shape: &MultiPolygon<f64>, fill: Option<Rgba>, stroke: Option<Stroke>) {
    for polygon in shape.iter() {
        let rings = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(|ring| ring.coords().map(|c| (c.x, c.y)).collect())
            .collect();
        scene.push(Mark::Polygon { rings, fill, stroke });
    }
}

impl ChartView for ChoroplethView {
    /// Index into the boundary features.
    type Hit = usize;

    fn height(&self, width: f64) -> f64 {
        SLIDER_BAND + (width * MAP_ASPECT).round().max(240.0)
    }

    fn hover_area(&self, width: f64) -> PlotRect {
        self.map_area(width)
    }

    fn resolve(&self, width: f64, pointer: Pointer) -> Option<usize> {
        shape_at(&self.shapes(width), (pointer.x, pointer.y))
    }

    fn describe(&self, hit: &usize) -> TooltipContent {
        let Some(feature) = self.features.get(*hit) else {
            return TooltipContent::default();
        };
        let title = format!("{} ({})", feature.label(), self.year);
        let Some(slice) = self.index.year(self.year) else {
            return TooltipContent {
                title,
                lines: vec![TooltipLine::plain("No data")],
            };
        };
        let Some(row) = slice.lookup_index(feature) else {
            return TooltipContent {
                title,
                lines: vec![TooltipLine::plain("No data")],
            };
        };
        let m = &slice.rows[row];
        let mut lines = vec![
            TooltipLine::swatch(
                self.mapper.color(m.value(&self.field)),
                format!("Affordability ratio: {}", format_value(m.value(&self.field))),
            ),
            TooltipLine::plain(format!("Median house price: {}", format_money(m.value(PRICE_FIELD)))),
            TooltipLine::plain(format!("Workplace median pay: {}", format_money(m.value(PAY_FIELD)))),
        ];
        if slice.top_n(&self.field, self.top_n).contains(&row) {
            lines.push(TooltipLine::swatch(TOP_BADGE, format!("Top {} least affordable", self.top_n)));
        }
        TooltipContent { title, lines }
    }

    fn draw(&self, width: f64, hit: Option<&usize>) -> Scene {
        let height = self.height(width);
        let mut scene = Scene::new(width, height);
        self.slider(width).draw(&mut scene, self.year);

        let shapes = self.shapes(width);
        let shades = self.shades();
        // emphasised boundaries go on top of their neighbours
        for top_pass in [false, true] {
            for (shade, shape) in shades.iter().zip(&shapes).filter(|(s, _)| s.is_top() == top_pass) {
                let (color, w) = shade.stroke();
                push_shape(&mut scene, shape, Some(shade.fill.into()), Some(Stroke::solid(color, w)));
            }
        }
        for shape in &shapes {
            push_shape(&mut scene, shape, None, Some(Stroke::solid(OUTLINE_STROKE, 0.75)));
        }
        if let Some(shape) = hit.and_then(|i| shapes.get(*i)) {
            push_shape(&mut scene, shape, None, Some(Stroke::solid(HIGHLIGHT, 2.0)));
        }

        let legend_x = (width - LEGEND_WIDTH - 24.0).max(MAP_MARGIN);
        GradientLegend::new(legend_x, height - 36.0, LEGEND_WIDTH.min(width - 2.0 * MAP_MARGIN))
            .draw(&mut scene, &self.mapper, LEGEND_CAPTION);
        scene
    }
}
