//! Borough pay in two years as a dumbbell chart, largest later-year value on top.

use crate::error::{ChartError, Result};
use crate::hover::{Pointer, TooltipContent, TooltipLine, dumbbell_row_at};
use crate::models::DumbbellRow;
use crate::resize::HeightPolicy;
use crate::scale::{
    BandScale, COMPACT_BREAKPOINT_PX, LayoutConfig, LinearScale, Margins, Padding, PlotRect, ScaleBuilder,
};
use crate::viz::ChartView;
use crate::viz::legend::{LegendItem, draw_series_legend};
use crate::viz::scene::{HAlign, Scene, Stroke, VAlign, label};
use crate::viz::text::truncate_to_width;
use crate::viz::util::{
    CONNECTOR, HIGHLIGHT, HOUSE, INK, RENT, SLATE, draw_bottom_axis, draw_vertical_grid, format_money,
    format_signed_money,
};

const MARGINS: Margins = Margins::new(40.0, 160.0, 50.0, 260.0);
const HEIGHT: HeightPolicy = HeightPolicy::PerRow {
    per_row: 24.0,
    base: 90.0,
    min: 320.0,
    max: 1400.0,
};
const BAND_PADDING: f64 = 0.4;
const DOT_RADIUS: f64 = 5.0;
const DOT_RADIUS_HOVER: f64 = 6.5;
const HIT_TOLERANCE_PX: f64 = 11.0;
const X_TICKS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct DumbbellLayout {
    pub layout: LayoutConfig,
    pub plot: PlotRect,
    pub x: LinearScale,
    pub y: BandScale,
}

#[derive(Debug, Clone)]
pub struct SalaryDumbbellView {
    rows: Vec<DumbbellRow>,
    from_year: i32,
    to_year: i32,
    breakpoint: f64,
}

impl SalaryDumbbellView {
    /// `rows` are drawn top to bottom in the given order.
    pub fn new(rows: Vec<DumbbellRow>, from_year: i32, to_year: i32) -> Result<Self> {
        if rows.is_empty() {
            return Err(ChartError::NoValidRows("salary".into()));
        }
        Ok(Self {
            rows,
            from_year,
            to_year,
            breakpoint: COMPACT_BREAKPOINT_PX,
        })
    }

    pub fn with_breakpoint(mut self, px: f64) -> Self {
        self.breakpoint = px;
        self
    }

    pub fn rows(&self) -> &[DumbbellRow] {
        &self.rows
    }

    pub fn layout(&self, width: f64) -> DumbbellLayout {
        let layout = LayoutConfig::for_viewport(width, self.height(width), MARGINS, self.breakpoint);
        let plot = layout.plot();
        let builder = ScaleBuilder {
            padding: Padding::Proportional(0.05),
            ..ScaleBuilder::default()
        };
        let x = builder
            .linear(self.rows.iter().flat_map(|r| [r.a, r.b]), (plot.left, plot.right))
            .nice(X_TICKS);
        let names = self.rows.iter().map(|r| r.name.clone()).collect();
        let y = builder.band(names, (plot.top, plot.bottom), BAND_PADDING);
        DumbbellLayout { layout, plot, x, y }
    }
}

impl ChartView for SalaryDumbbellView {
    /// Index into [`SalaryDumbbellView::rows`].
    type Hit = usize;

    fn height(&self, width: f64) -> f64 {
        HEIGHT.height(width, self.rows.len())
    }

    fn hover_area(&self, width: f64) -> PlotRect {
        self.layout(width).plot
    }

    fn resolve(&self, width: f64, pointer: Pointer) -> Option<usize> {
        let l = self.layout(width);
        let values: Vec<(f64, f64)> = self.rows.iter().map(|r| (r.a, r.b)).collect();
        dumbbell_row_at(&values, &l.x, &l.y, pointer, HIT_TOLERANCE_PX, DOT_RADIUS_HOVER)
    }

    fn describe(&self, hit: &usize) -> TooltipContent {
        let Some(r) = self.rows.get(*hit) else {
            return TooltipContent::default();
        };
        TooltipContent {
            title: r.name.clone(),
            lines: vec![
                TooltipLine::swatch(SLATE, format!("{}: {}", self.from_year, format_money(r.a))),
                TooltipLine::swatch(HOUSE, format!("{}: {}", self.to_year, format_money(r.b))),
                TooltipLine::plain(format!("Change: {}", format_signed_money(r.diff))),
            ],
        }
    }

    fn draw(&self, width: f64, hit: Option<&usize>) -> Scene {
        let DumbbellLayout { layout, plot, x, y } = self.layout(width);
        let mut scene = Scene::new(width, layout.height);
        let ticks = x.ticks(X_TICKS);
        draw_vertical_grid(&mut scene, &x, plot, &ticks);
        draw_bottom_axis(&mut scene, &x, plot, &ticks, layout.tick_font_px, format_money);
        draw_series_legend(
            &mut scene,
            &[
                LegendItem::dot(self.from_year.to_string(), SLATE),
                LegendItem::dot(self.to_year.to_string(), HOUSE),
            ],
            plot.left,
            plot.top - 20.0,
            layout.label_font_px,
        );

        let name_room = layout.margins.left - 16.0;
        for (i, r) in self.rows.iter().enumerate() {
            let highlighted = hit == Some(&i);
            let cy = y.position_at(i) + y.bandwidth() / 2.0;
            let (xa, xb) = (x.apply(r.a), x.apply(r.b));
            let name = truncate_to_width(&r.name, layout.tick_font_px, name_room);
            let name_color = if highlighted { HIGHLIGHT } else { INK };
            scene.text(
                label(plot.left - 8.0, cy, name, layout.tick_font_px, name_color).align(HAlign::Right, VAlign::Middle),
            );
            let connector = if highlighted {
                Stroke::solid(RENT, 3.0)
            } else {
                Stroke::solid(CONNECTOR, 2.0)
            };
            scene.segment((xa, cy), (xb, cy), connector);
            let radius = if highlighted { DOT_RADIUS_HOVER } else { DOT_RADIUS };
            scene.circle((xa, cy), radius, Some(SLATE.into()), None);
            scene.circle((xb, cy), radius, Some(HOUSE.into()), None);
            scene.text(
                label(xa.max(xb) + 8.0, cy, format_signed_money(r.diff), 11, HIGHLIGHT)
                    .align(HAlign::Left, VAlign::Middle),
            );
        }
        scene
    }
}
