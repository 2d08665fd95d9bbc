//! Private rent index as small multiples: one panel per region, each showing that region
//! against the UK line and every other region in the background.

use super::{last_present, series_points};
use crate::color::Rgba;
use crate::error::{ChartError, Result};
use crate::hover::{HoverHit, HoverMode, HoverQuery, Pointer, TooltipContent, TooltipLine};
use crate::models::{Table, is_present};
use crate::scale::{COMPACT_BREAKPOINT_PX, LayoutConfig, LinearScale, Margins, PlotRect, ScaleBuilder, ScaleKind};
use crate::viz::ChartView;
use crate::viz::scene::{Scene, Stroke, label};
use crate::viz::util::{
    INK, NEUTRAL, ROSE, draw_focus, draw_guide, draw_horizontal_grid, draw_left_axis, draw_time_axis, format_month,
    format_tick, format_value, pretty_key,
};

pub const UK_KEY: &str = "uk";

const PANEL_MARGINS: Margins = Margins::new(24.0, 16.0, 26.0, 36.0);
const PANEL_MIN_WIDTH: f64 = 280.0;
const PANEL_ASPECT: f64 = 220.0 / 320.0;
const PANEL_TICKS: usize = 4;

/// Panel grid for one container width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelGrid {
    pub columns: usize,
    pub rows: usize,
    pub panel_width: f64,
    pub panel_height: f64,
}

impl PanelGrid {
    pub fn for_width(width: f64, panels: usize) -> Self {
        let columns = ((width / PANEL_MIN_WIDTH).floor() as usize).clamp(1, panels.max(1));
        let panel_width = width / columns as f64;
        Self {
            columns,
            rows: panels.div_ceil(columns),
            panel_width,
            panel_height: (panel_width * PANEL_ASPECT).round().clamp(170.0, 260.0),
        }
    }

    pub fn height(&self) -> f64 {
        self.rows as f64 * self.panel_height
    }

    /// Plot rectangle of panel `i`.
    pub fn plot(&self, i: usize) -> PlotRect {
        let ox = (i % self.columns) as f64 * self.panel_width;
        let oy = (i / self.columns) as f64 * self.panel_height;
        PlotRect {
            left: ox + PANEL_MARGINS.left,
            top: oy + PANEL_MARGINS.top,
            right: ox + self.panel_width - PANEL_MARGINS.right,
            bottom: oy + self.panel_height - PANEL_MARGINS.bottom,
        }
    }

    /// Panel whose plot area contains `p`.
    pub fn panel_at(&self, p: Pointer, panels: usize) -> Option<usize> {
        if p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        let col = (p.x / self.panel_width) as usize;
        let row = (p.y / self.panel_height) as usize;
        let i = row * self.columns + col;
        (col < self.columns && i < panels && self.plot(i).contains(p.x, p.y)).then_some(i)
    }
}

/// Hover result: which panel, and the synchronized readings (focal region, UK) in it.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelHit {
    pub panel: usize,
    pub hit: HoverHit,
}

#[derive(Debug, Clone)]
pub struct SmallMultiplesView {
    table: Table,
    regions: Vec<String>,
    uk: Option<String>,
    /// Shared value domain so panels compare directly.
    y_domain: (f64, f64),
    breakpoint: f64,
}

impl SmallMultiplesView {
    pub fn new(table: Table) -> Result<Self> {
        let uk = table.has_key(UK_KEY).then(|| UK_KEY.to_string());
        let regions: Vec<String> = table.keys.iter().filter(|k| *k != UK_KEY).cloned().collect();
        if regions.is_empty() {
            return Err(ChartError::NoValidRows("rents (no regional columns)".into()));
        }
        let y_domain = ScaleBuilder::default()
            .linear_for_rows(&table.rows, &table.keys, (1.0, 0.0))
            .domain;
        Ok(Self {
            table,
            regions,
            uk,
            y_domain,
            breakpoint: COMPACT_BREAKPOINT_PX,
        })
    }

    pub fn with_breakpoint(mut self, px: f64) -> Self {
        self.breakpoint = px;
        self
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn grid(&self, width: f64) -> PanelGrid {
        PanelGrid::for_width(width, self.regions.len())
    }

    fn scales(&self, plot: PlotRect) -> (LinearScale, LinearScale) {
        let x = ScaleBuilder::default().temporal(&self.table.rows, &[], plot);
        let y = LinearScale::new(ScaleKind::Linear, self.y_domain, (plot.bottom, plot.top));
        (x, y)
    }

    fn panel_keys(&self, panel: usize) -> Vec<String> {
        let mut keys = vec![self.regions[panel].clone()];
        keys.extend(self.uk.clone());
        keys
    }

    fn tick_font(&self, width: f64) -> u32 {
        let layout = LayoutConfig::for_viewport(width, self.height(width), PANEL_MARGINS, self.breakpoint);
        layout.tick_font_px.saturating_sub(2)
    }

    fn draw_panel(&self, scene: &mut Scene, grid: &PanelGrid, panel: usize, font_px: u32, hit: Option<&HoverHit>) {
        let plot = grid.plot(panel);
        let (x, y) = self.scales(plot);
        let ticks = y.ticks(PANEL_TICKS);
        draw_horizontal_grid(scene, &y, plot, &ticks);
        draw_left_axis(scene, &y, plot, &ticks, font_px, format_tick);
        draw_time_axis(scene, &x, plot, PANEL_TICKS, font_px);

        let focal = &self.regions[panel];
        let rows = &self.table.rows;
        for other in self.regions.iter().filter(|k| *k != focal) {
            scene.line(
                series_points(rows, other, &x, &y),
                Stroke::solid(Rgba::with_alpha(NEUTRAL, 0.7), 1.2),
            );
        }
        if let Some(uk) = &self.uk {
            scene.line(series_points(rows, uk, &x, &y), Stroke::solid(INK, 2.2));
        }
        scene.line(series_points(rows, focal, &x, &y), Stroke::solid(ROSE, 2.6));

        let latest = last_present(rows, focal).map(|(_, v)| v).unwrap_or(f64::NAN);
        let title = format!("{} — {}", pretty_key(focal), format_value(latest));
        scene.text(label(plot.left, plot.top - 8.0, title, 12, INK).bold());

        if let Some(h) = hit {
            draw_guide(scene, h.pixel_x, plot);
            for r in h.readings.iter().rev() {
                if let Some(py) = r.pixel_y {
                    let color = if r.key == *focal { ROSE } else { INK };
                    draw_focus(scene, (h.pixel_x, py), 3.5, color);
                }
            }
        }
    }
}

impl ChartView for SmallMultiplesView {
    type Hit = PanelHit;

    fn height(&self, width: f64) -> f64 {
        self.grid(width).height()
    }

    fn hover_area(&self, width: f64) -> PlotRect {
        PlotRect {
            left: 0.0,
            top: 0.0,
            right: width,
            bottom: self.height(width),
        }
    }

    fn resolve(&self, width: f64, pointer: Pointer) -> Option<PanelHit> {
        let grid = self.grid(width);
        let panel = grid.panel_at(pointer, self.regions.len())?;
        let (x, y) = self.scales(grid.plot(panel));
        let keys = self.panel_keys(panel);
        let hit = HoverQuery {
            rows: &self.table.rows,
            keys: &keys,
            x: &x,
            y: &y,
            mode: HoverMode::Synchronized,
        }
        .resolve(pointer)?;
        Some(PanelHit { panel, hit })
    }

    fn describe(&self, h: &PanelHit) -> TooltipContent {
        let lines = h
            .hit
            .readings
            .iter()
            .map(|r| {
                let color = if r.key == self.regions[h.panel] { ROSE } else { INK };
                let value = if is_present(r.value) { format_value(r.value) } else { "–".to_string() };
                TooltipLine::swatch(color, format!("{}: {value}", pretty_key(&r.key)))
            })
            .collect();
        TooltipContent {
            title: format_month(h.hit.timestamp),
            lines,
        }
    }

    fn draw(&self, width: f64, hit: Option<&PanelHit>) -> Scene {
        let grid = self.grid(width);
        let mut scene = Scene::new(width, grid.height());
        let font_px = self.tick_font(width);
        for panel in 0..self.regions.len() {
            let panel_hit = hit.filter(|h| h.panel == panel).map(|h| &h.hit);
            self.draw_panel(&mut scene, &grid, panel, font_px, panel_hit);
        }
        scene
    }
}
