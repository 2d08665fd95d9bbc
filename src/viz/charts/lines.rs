//! House price index lines: UK and London emphasised over every other region.

use super::{last_present, series_points};
use crate::color::{Rgb, Rgba};
use crate::error::{ChartError, Result};
use crate::hover::{HoverHit, HoverMode, HoverQuery, Pointer, TooltipContent, TooltipLine};
use crate::models::Table;
use crate::resize::HeightPolicy;
use crate::scale::{COMPACT_BREAKPOINT_PX, LayoutConfig, LinearScale, Margins, PlotRect, ScaleBuilder};
use crate::viz::ChartView;
use crate::viz::scene::{HAlign, Scene, Stroke, VAlign, label};
use crate::viz::util::{
    HIGHLIGHT, INK, NEUTRAL, ROSE, draw_focus, draw_guide, draw_horizontal_grid, draw_left_axis, draw_time_axis,
    format_month, format_tick, format_value, pretty_key,
};

/// Column names accepted for the emphasised series, in preference order.
pub const PRIMARY_KEYS: [&str; 2] = ["uk_hpi", "uk"];
pub const SECONDARY_KEYS: [&str; 2] = ["london_hpi", "london"];

const MARGINS: Margins = Margins::new(40.0, 72.0, 60.0, 80.0);
const HEIGHT: HeightPolicy = HeightPolicy::Aspect {
    ratio: 0.5,
    min: 300.0,
    max: 700.0,
};
const EMPHASIS_WIDTH: f64 = 2.6;
const NEUTRAL_WIDTH: f64 = 1.4;
const NEUTRAL_ALPHA: f64 = 0.7;
const CHOSEN_WIDTH: f64 = 3.2;

/// Scales and plot area for one width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinesLayout {
    pub layout: LayoutConfig,
    pub plot: PlotRect,
    pub x: LinearScale,
    pub y: LinearScale,
}

#[derive(Debug, Clone)]
pub struct RegionalLinesView {
    table: Table,
    primary: String,
    secondary: Option<String>,
    breakpoint: f64,
}

impl RegionalLinesView {
    /// Emphasises the UK and London columns when present, otherwise the first two columns.
    pub fn new(table: Table) -> Result<Self> {
        if table.keys.is_empty() {
            return Err(ChartError::NoValidRows("house price index (no value columns)".into()));
        }
        let pick = |wanted: &[&str], fallback: usize| {
            wanted
                .iter()
                .find(|k| table.has_key(k))
                .map(|k| k.to_string())
                .or_else(|| table.keys.get(fallback).cloned())
        };
        let primary = pick(&PRIMARY_KEYS, 0).unwrap_or_default();
        let secondary = pick(&SECONDARY_KEYS, 1).filter(|k| *k != primary);
        Ok(Self {
            table,
            primary,
            secondary,
            breakpoint: COMPACT_BREAKPOINT_PX,
        })
    }

    pub fn with_breakpoint(mut self, px: f64) -> Self {
        self.breakpoint = px;
        self
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn layout(&self, width: f64) -> LinesLayout {
        let layout = LayoutConfig::for_viewport(width, self.height(width), MARGINS, self.breakpoint);
        let plot = layout.plot();
        let builder = ScaleBuilder::default();
        LinesLayout {
            layout,
            plot,
            x: builder.temporal(&self.table.rows, &[], plot),
            y: builder.linear_for_rows(&self.table.rows, &self.table.keys, (plot.bottom, plot.top)),
        }
    }

    fn color(&self, key: &str) -> Rgb {
        if key == self.primary {
            INK
        } else if self.secondary.as_deref() == Some(key) {
            ROSE
        } else {
            NEUTRAL
        }
    }

    fn is_emphasized(&self, key: &str) -> bool {
        key == self.primary || self.secondary.as_deref() == Some(key)
    }

    /// Keys in drawing order: neutral regions, the chosen neutral, secondary, primary.
    pub fn draw_order<'a>(&'a self, chosen: Option<&'a str>) -> Vec<&'a str> {
        let mut order: Vec<&str> = self
            .table
            .keys
            .iter()
            .map(String::as_str)
            .filter(|k| !self.is_emphasized(k) && Some(*k) != chosen)
            .collect();
        if let Some(c) = chosen
            && !self.is_emphasized(c)
        {
            order.push(c);
        }
        order.extend(self.secondary.as_deref());
        order.push(&self.primary);
        order
    }

    fn stroke(&self, key: &str, chosen: bool) -> Stroke {
        match (chosen, self.is_emphasized(key)) {
            (true, true) => Stroke::solid(self.color(key), CHOSEN_WIDTH),
            (true, false) => Stroke::solid(HIGHLIGHT, CHOSEN_WIDTH),
            (false, true) => Stroke::solid(self.color(key), EMPHASIS_WIDTH),
            (false, false) => Stroke::solid(Rgba::with_alpha(NEUTRAL, NEUTRAL_ALPHA), NEUTRAL_WIDTH),
        }
    }
}

impl ChartView for RegionalLinesView {
    type Hit = HoverHit;

    fn height(&self, width: f64) -> f64 {
        HEIGHT.height(width, self.table.rows.len())
    }

    fn hover_area(&self, width: f64) -> PlotRect {
        self.layout(width).plot
    }

    fn resolve(&self, width: f64, pointer: Pointer) -> Option<HoverHit> {
        let l = self.layout(width);
        HoverQuery {
            rows: &self.table.rows,
            keys: &self.table.keys,
            x: &l.x,
            y: &l.y,
            mode: HoverMode::Disambiguating,
        }
        .resolve(pointer)
    }

    fn describe(&self, hit: &HoverHit) -> TooltipContent {
        let lines = hit
            .chosen_reading()
            .map(|r| {
                let color = if self.is_emphasized(&r.key) { self.color(&r.key) } else { HIGHLIGHT };
                TooltipLine::swatch(color, format!("{}: {}", pretty_key(&r.key), format_value(r.value)))
            })
            .into_iter()
            .collect();
        TooltipContent {
            title: format_month(hit.timestamp),
            lines,
        }
    }

    fn draw(&self, width: f64, hit: Option<&HoverHit>) -> Scene {
        let LinesLayout { layout, plot, x, y } = self.layout(width);
        let mut scene = Scene::new(width, layout.height);
        let y_ticks = y.ticks(layout.y_ticks);
        draw_horizontal_grid(&mut scene, &y, plot, &y_ticks);
        draw_left_axis(&mut scene, &y, plot, &y_ticks, layout.tick_font_px, format_tick);
        draw_time_axis(&mut scene, &x, plot, layout.x_ticks, layout.tick_font_px);

        let chosen = hit.and_then(HoverHit::chosen_reading);
        let chosen_key = chosen.map(|r| r.key.as_str());
        for key in self.draw_order(chosen_key) {
            let points = series_points(&self.table.rows, key, &x, &y);
            scene.line(points, self.stroke(key, chosen_key == Some(key)));
        }

        for key in std::iter::once(self.primary.as_str()).chain(self.secondary.as_deref()) {
            if let Some((t, v)) = last_present(&self.table.rows, key) {
                scene.text(
                    label(x.apply(t as f64) + 6.0, y.apply(v), pretty_key(key), layout.label_font_px, self.color(key))
                        .bold()
                        .align(HAlign::Left, VAlign::Middle),
                );
            }
        }

        if let Some(h) = hit {
            draw_guide(&mut scene, h.pixel_x, plot);
            if let Some(r) = chosen
                && let Some(py) = r.pixel_y
            {
                let color = if self.is_emphasized(&r.key) { self.color(&r.key) } else { HIGHLIGHT };
                draw_focus(&mut scene, (h.pixel_x, py), 4.5, color);
            }
        }
        scene
    }
}
