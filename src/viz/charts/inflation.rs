//! Year-on-year private rents and house prices against inflation, with dated events.

use crate::annotate::{AnnotationEvent, AnnotationLayout};
use crate::color::{Rgb, Rgba};
use crate::error::{ChartError, Result};
use crate::hover::{HoverHit, HoverMode, HoverQuery, Pointer, TooltipContent, TooltipLine};
use crate::join::join;
use crate::models::{EventSpec, JoinedRow, Series, Table};
use crate::resize::HeightPolicy;
use crate::scale::{
    COMPACT_BREAKPOINT_PX, DEFAULT_LOOKAHEAD_PAD_MS, LayoutConfig, LinearScale, Margins, PlotRect, ScaleBuilder,
};
use crate::viz::ChartView;
use crate::viz::charts::{last_present, series_points};
use crate::viz::scene::{HAlign, Scene, Stroke, VAlign, label};
use crate::viz::text::{estimate_text_width_px, line_height_px};
use crate::viz::util::{
    HOUSE, INFLATION, INK, NEUTRAL, RENT, WHITE, ZERO_LINE, draw_focus, draw_guide, draw_horizontal_grid,
    draw_left_axis, draw_time_axis, format_month, format_percent, format_tick,
};

pub const RENT_KEY: &str = "pipr";
pub const HOUSE_KEY: &str = "uk_hpi";
pub const INFLATION_KEY: &str = "inflation";

const MARGINS: Margins = Margins::new(40.0, 72.0, 44.0, 56.0);
const HEIGHT: HeightPolicy = HeightPolicy::Aspect {
    ratio: 700.0 / 920.0,
    min: 340.0,
    max: 700.0,
};

/// Display settings of one plotted series.
struct SeriesStyle {
    key: &'static str,
    name: &'static str,
    color: Rgb,
    stroke: Stroke,
}

fn styles() -> [SeriesStyle; 3] {
    [
        SeriesStyle {
            key: RENT_KEY,
            name: "Private rents",
            color: RENT,
            stroke: Stroke::solid(RENT, 2.5),
        },
        SeriesStyle {
            key: HOUSE_KEY,
            name: "House prices",
            color: HOUSE,
            stroke: Stroke::solid(HOUSE, 2.5),
        },
        SeriesStyle {
            key: INFLATION_KEY,
            name: "Inflation",
            color: INFLATION,
            stroke: Stroke::dashed(INFLATION, 2.0, 4.0, 3.0),
        },
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct InflationLayout {
    pub layout: LayoutConfig,
    pub plot: PlotRect,
    pub x: LinearScale,
    pub y: LinearScale,
    pub annotations: Vec<AnnotationEvent>,
}

#[derive(Debug, Clone)]
pub struct InflationView {
    rows: Vec<JoinedRow>,
    keys: Vec<String>,
    events: Vec<EventSpec>,
    lookahead_pad_ms: i64,
    breakpoint: f64,
    annotation: AnnotationLayout,
}

impl InflationView {
    /// Join the rent/house growth table with the inflation series on timestamp.
    pub fn new(yoy: &Table, inflation: &Series, tolerance_ms: i64, events: Vec<EventSpec>) -> Result<Self> {
        for key in [RENT_KEY, HOUSE_KEY] {
            if !yoy.has_key(key) {
                return Err(ChartError::MissingColumn(key.into()));
            }
        }
        let rows = join(&yoy.rows, inflation, tolerance_ms);
        if rows.is_empty() {
            return Err(ChartError::NoValidRows("rents and house prices".into()));
        }
        Ok(Self {
            rows,
            keys: [RENT_KEY, HOUSE_KEY, INFLATION_KEY].map(String::from).to_vec(),
            events,
            lookahead_pad_ms: DEFAULT_LOOKAHEAD_PAD_MS,
            breakpoint: COMPACT_BREAKPOINT_PX,
            annotation: AnnotationLayout::default(),
        })
    }

    pub fn with_lookahead_pad(mut self, ms: i64) -> Self {
        self.lookahead_pad_ms = ms;
        self
    }

    pub fn with_breakpoint(mut self, px: f64) -> Self {
        self.breakpoint = px;
        self
    }

    pub fn rows(&self) -> &[JoinedRow] {
        &self.rows
    }

    pub fn layout(&self, width: f64) -> InflationLayout {
        let layout = LayoutConfig::for_viewport(width, self.height(width), MARGINS, self.breakpoint);
        let plot = layout.plot();
        let builder = ScaleBuilder {
            lookahead_pad_ms: self.lookahead_pad_ms,
            ..ScaleBuilder::default()
        };
        let x = builder.temporal(&self.rows, &self.events, plot);
        let y = builder.linear_for_rows(&self.rows, &self.keys, (plot.bottom, plot.top));
        let annotations = self
            .annotation
            .layout(&self.events, &self.rows, INFLATION_KEY, &x, &y, plot);
        InflationLayout {
            layout,
            plot,
            x,
            y,
            annotations,
        }
    }

    fn draw_annotations(&self, scene: &mut Scene, l: &InflationLayout) {
        let font = self.annotation.font_px;
        let line_h = line_height_px(font);
        for a in &l.annotations {
            scene.line(
                vec![(a.pixel_x, l.plot.top), (a.pixel_x, l.plot.bottom)],
                Stroke::dashed(Rgba::with_alpha(NEUTRAL, 0.9), 1.0, 3.0, 3.0),
            );
            scene.circle(
                (a.pixel_x, a.pixel_y),
                4.0,
                Some(NEUTRAL.into()),
                Some(Stroke::solid(WHITE, 1.2)),
            );
            let lines = a.label.lines().count().max(1) as f64;
            scene.rect(
                a.label_x,
                a.label_y - line_h + 2.0,
                a.label_width,
                lines * line_h + 4.0,
                Some(Rgba::with_alpha(WHITE, 0.8)),
                None,
            );
            scene.text(label(a.label_x + self.annotation.pad_px, a.label_y, a.label.clone(), font, INK).bold());
        }
    }
}

impl ChartView for InflationView {
    type Hit = HoverHit;

    fn height(&self, width: f64) -> f64 {
        HEIGHT.height(width, self.rows.len())
    }

    fn hover_area(&self, width: f64) -> PlotRect {
        self.layout(width).plot
    }

    fn resolve(&self, width: f64, pointer: Pointer) -> Option<HoverHit> {
        let l = self.layout(width);
        HoverQuery {
            rows: &self.rows,
            keys: &self.keys,
            x: &l.x,
            y: &l.y,
            mode: HoverMode::Synchronized,
        }
        .resolve(pointer)
    }

    fn describe(&self, hit: &HoverHit) -> TooltipContent {
        let lines = styles()
            .iter()
            .map(|s| {
                let v = hit
                    .readings
                    .iter()
                    .find(|r| r.key == s.key)
                    .map(|r| r.value)
                    .unwrap_or(f64::NAN);
                TooltipLine::swatch(s.color, format!("{}: {}", s.name, format_percent(v)))
            })
            .collect();
        TooltipContent {
            title: format_month(hit.timestamp),
            lines,
        }
    }

    fn draw(&self, width: f64, hit: Option<&HoverHit>) -> Scene {
        let l = self.layout(width);
        let (plot, x, y) = (l.plot, l.x, l.y);
        let mut scene = Scene::new(width, l.layout.height);
        let ticks = y.ticks(l.layout.y_ticks);
        draw_horizontal_grid(&mut scene, &y, plot, &ticks);
        if y.contains(0.0) {
            let y0 = y.apply(0.0);
            scene.segment((plot.left, y0), (plot.right, y0), Stroke::solid(ZERO_LINE, 1.0));
        }
        draw_left_axis(&mut scene, &y, plot, &ticks, l.layout.tick_font_px, |v| format!("{}%", format_tick(v)));
        draw_time_axis(&mut scene, &x, plot, l.layout.x_ticks, l.layout.tick_font_px);

        self.draw_annotations(&mut scene, &l);

        let styles = styles();
        for s in &styles {
            scene.line(series_points(&self.rows, s.key, &x, &y), s.stroke);
        }
        let font = l.layout.label_font_px;
        for s in &styles {
            if let Some((t, v)) = last_present(&self.rows, s.key) {
                let w = estimate_text_width_px(s.name, font);
                let lx = (x.apply(t as f64) + 6.0).min(plot.right - w);
                scene.text(label(lx, y.apply(v), s.name, font, s.color).align(HAlign::Left, VAlign::Middle));
            }
        }

        if let Some(h) = hit {
            draw_guide(&mut scene, h.pixel_x, plot);
            for r in &h.readings {
                if let (Some(py), Some(s)) = (r.pixel_y, styles.iter().find(|s| s.key == r.key)) {
                    draw_focus(&mut scene, (h.pixel_x, py), 4.5, s.color);
                }
            }
        }
        scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SeriesPoint, date_to_timestamp};
    use crate::viz::charts::fixtures::monthly;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn view(events: Vec<EventSpec>) -> InflationView {
        let yoy = monthly(
            &["pipr", "uk_hpi"],
            (2020, 1),
            &[&[1.5, 2.0], &[1.8, 2.4], &[2.1, -0.5], &[2.6, 1.0]],
        );
        let inflation = Series {
            key: INFLATION_KEY.into(),
            values: [(1, 0.8), (2, 1.1), (4, 3.2)]
                .iter()
                .map(|&(m, v)| SeriesPoint {
                    timestamp: date_to_timestamp(date(2020, m, 1)),
                    value: v,
                })
                .collect(),
        };
        InflationView::new(&yoy, &inflation, 10 * crate::models::MS_PER_DAY, events).unwrap()
    }

    #[test]
    fn unmatched_months_keep_rows_with_missing_inflation() {
        let v = view(vec![]);
        assert_eq!(v.rows().len(), 4);
        assert!(v.rows()[2].value(INFLATION_KEY).is_nan());
        let l = v.layout(920.0);
        let t = v.rows()[2].timestamp as f64;
        let hit = v.resolve(920.0, Pointer::new(l.x.apply(t), l.plot.top + 10.0)).unwrap();
        let tip = v.describe(&hit);
        let lines: Vec<&str> = tip.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(lines, ["Private rents: 2.1%", "House prices: -0.5%", "Inflation: —"]);
    }

    #[test]
    fn events_stretch_the_axis_and_stay_inside() {
        let events = vec![
            EventSpec {
                date: date(2020, 2, 15),
                label: "Budget".into(),
            },
            EventSpec {
                date: date(2020, 6, 1),
                label: "Long label\nafter the data".into(),
            },
            EventSpec {
                date: date(2019, 1, 1),
                label: "Too early".into(),
            },
        ];
        let v = view(events);
        let l = v.layout(920.0);
        assert!(l.x.domain.1 > date_to_timestamp(date(2020, 6, 1)) as f64);
        assert_eq!(l.annotations.len(), 2);
        let right = AnnotationLayout::default().right_boundary(l.plot);
        for a in &l.annotations {
            assert!(a.label_x + a.label_width <= right + 1e-9);
        }
        let scene = v.draw(920.0, None);
        assert!(scene.texts().any(|t| t.text == "Budget"));
        assert!(!scene.texts().any(|t| t.text == "Too early"));
    }

    #[test]
    fn missing_column_is_reported() {
        let yoy = monthly(&["pipr"], (2020, 1), &[&[1.0]]);
        let inflation = Series {
            key: INFLATION_KEY.into(),
            values: vec![],
        };
        assert!(matches!(
            InflationView::new(&yoy, &inflation, 1, vec![]),
            Err(ChartError::MissingColumn(k)) if k == HOUSE_KEY
        ));
    }
}
