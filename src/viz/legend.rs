//! Legends and the map's year slider, drawn into a [`Scene`].

use super::scene::{HAlign, Scene, Stroke, VAlign, label};
use super::text::estimate_text_width_px;
use super::util::{AXIS, INFLATION, INK, TICK_TEXT, format_tick};
use crate::choropleth::ChoroplethColorMapper;
use crate::color::{Rgb, Rgba};
use crate::scale::{LinearScale, ScaleKind};

/// How a legend entry's sample is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Swatch {
    Line { width: f64, dash: Option<(f64, f64)> },
    Dot { radius: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendItem {
    pub label: String,
    pub color: Rgb,
    pub swatch: Swatch,
}

impl LegendItem {
    pub fn line(label: impl Into<String>, color: Rgb, width: f64) -> Self {
        Self {
            label: label.into(),
            color,
            swatch: Swatch::Line { width, dash: None },
        }
    }

    pub fn dot(label: impl Into<String>, color: Rgb) -> Self {
        Self {
            label: label.into(),
            color,
            swatch: Swatch::Dot { radius: 5.0 },
        }
    }
}

const SAMPLE_W: f64 = 18.0;
const SAMPLE_GAP: f64 = 6.0;
const ITEM_GAP: f64 = 16.0;

/// Single-row legend starting at `(x, y)` (vertical center). Returns the x after the last item.
pub fn draw_series_legend(scene: &mut Scene, items: &[LegendItem], x: f64, y: f64, font_px: u32) -> f64 {
    let mut cx = x;
    for item in items {
        match item.swatch {
            Swatch::Line { width, dash } => {
                let stroke = Stroke {
                    color: item.color.into(),
                    width,
                    dash,
                };
                scene.segment((cx, y), (cx + SAMPLE_W, y), stroke);
            }
            Swatch::Dot { radius } => {
                scene.circle((cx + SAMPLE_W / 2.0, y), radius, Some(item.color.into()), None);
            }
        }
        cx += SAMPLE_W + SAMPLE_GAP;
        scene.text(label(cx, y, item.label.clone(), font_px, INK).align(HAlign::Left, VAlign::Middle));
        cx += estimate_text_width_px(&item.label, font_px) + ITEM_GAP;
    }
    cx
}

/// Geometry of the choropleth color ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientLegend {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Number of solid strips the ramp is sampled into.
    pub steps: usize,
    pub ticks: usize,
}

impl GradientLegend {
    pub fn new(x: f64, y: f64, width: f64) -> Self {
        Self {
            x,
            y,
            width,
            height: 10.0,
            steps: 64,
            ticks: 5,
        }
    }

    /// Ramp, tick labels and caption. The ramp spans exactly the mapper's domain.
    pub fn draw(&self, scene: &mut Scene, mapper: &ChoroplethColorMapper, caption: &str) {
        let steps = self.steps.max(1);
        let strip = self.width / steps as f64;
        for i in 0..steps {
            let t = (i as f64 + 0.5) / steps as f64;
            // overlap by half a pixel so strips don't show seams
            scene.rect(
                self.x + i as f64 * strip,
                self.y,
                strip + 0.5,
                self.height,
                Some(mapper.interpolate(t).into()),
                None,
            );
        }
        scene.rect(self.x, self.y, self.width, self.height, None, Some(Stroke::solid(AXIS, 1.0)));

        let axis = LinearScale::new(
            ScaleKind::Linear,
            (mapper.domain.lo, mapper.domain.hi),
            (self.x, self.x + self.width),
        );
        for v in axis.ticks(self.ticks) {
            let px = axis.apply(v);
            let bottom = self.y + self.height;
            scene.segment((px, bottom), (px, bottom + 4.0), Stroke::solid(TICK_TEXT, 1.0));
            scene.text(label(px, bottom + 6.0, format_tick(v), 10, TICK_TEXT).align(HAlign::Center, VAlign::Top));
        }
        scene.text(label(self.x, self.y - 6.0, caption, 11, INK).bold());
    }
}

/// Horizontal year selector: a track, one tick per year and a thumb on the selection.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSlider {
    pub years: Vec<i32>,
    pub left: f64,
    pub right: f64,
    pub y: f64,
}

impl YearSlider {
    pub fn new(years: Vec<i32>, left: f64, right: f64, y: f64) -> Self {
        Self { years, left, right, y }
    }

    /// Pixel x of the `index`-th year.
    pub fn position_at(&self, index: usize) -> f64 {
        match self.years.len() {
            0 | 1 => (self.left + self.right) / 2.0,
            n => self.left + (self.right - self.left) * index as f64 / (n - 1) as f64,
        }
    }

    /// Year whose tick is closest to `px`.
    pub fn year_at(&self, px: f64) -> Option<i32> {
        let n = self.years.len();
        if n == 0 {
            return None;
        }
        let t = if n == 1 {
            0.0
        } else {
            ((px - self.left) / (self.right - self.left) * (n - 1) as f64).round()
        };
        Some(self.years[t.clamp(0.0, (n - 1) as f64) as usize])
    }

    pub fn draw(&self, scene: &mut Scene, selected: i32) {
        scene.text(label(self.left - 12.0, self.y, "Year", 12, INK).align(HAlign::Right, VAlign::Middle));
        scene.rect(self.left, self.y - 2.0, self.right - self.left, 4.0, Some(AXIS.into()), None);
        for (i, year) in self.years.iter().enumerate() {
            let px = self.position_at(i);
            scene.segment((px, self.y + 6.0), (px, self.y + 10.0), Stroke::solid(TICK_TEXT, 1.0));
            if self.years.len() <= 12 || i % 2 == 0 {
                scene.text(
                    label(px, self.y + 12.0, year.to_string(), 10, TICK_TEXT).align(HAlign::Center, VAlign::Top),
                );
            }
        }
        if let Some(i) = self.years.iter().position(|y| *y == selected) {
            scene.circle(
                (self.position_at(i), self.y),
                7.0,
                Some(Rgba::opaque(INFLATION)),
                Some(Stroke::solid(Rgb::new(0xf9, 0xfa, 0xfb), 2.0)),
            );
        }
        scene.text(
            label(self.right + 14.0, self.y, selected.to_string(), 13, INK)
                .bold()
                .align(HAlign::Left, VAlign::Middle),
        );
    }
}
