//! Plotters adapter: turns a [`Scene`] into SVG markup.
//!
//! Only drawing-area primitives are used (paths, circles, rectangles, polygons and
//! text). SVG text is emitted as `<text>` elements, so no font files are needed.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};
use plotters_svg::SVGBackend;

use super::scene::{HAlign, Mark, Scene, Stroke, TextMark, VAlign};
use super::text::line_height_px;
use crate::color::Rgba;
use crate::error::{ChartError, Result};

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

fn render_err<E: std::fmt::Debug>(e: E) -> ChartError {
    ChartError::Render(format!("{e:?}"))
}

pub fn plot_color(c: Rgba) -> RGBAColor {
    RGBAColor(c.rgb.r, c.rgb.g, c.rgb.b, c.alpha)
}

/// Stroke style. Plotters widths are whole pixels; anything visible is at least 1.
pub fn line_style(s: &Stroke) -> ShapeStyle {
    plot_color(s.color).stroke_width(s.width.round().max(1.0) as u32)
}

pub fn fill_style(c: Rgba) -> ShapeStyle {
    plot_color(c).filled()
}

#[inline]
fn px(v: f64) -> i32 {
    v.round() as i32
}

fn to_px(points: &[(f64, f64)]) -> Vec<(i32, i32)> {
    points.iter().map(|&(x, y)| (px(x), px(y))).collect()
}

/// Maximal runs of finite points; a missing value ends the current run.
pub fn finite_runs(points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut cur: Vec<(f64, f64)> = Vec::new();
    for &(x, y) in points {
        if x.is_finite() && y.is_finite() {
            cur.push((x, y));
        } else if !cur.is_empty() {
            runs.push(std::mem::take(&mut cur));
        }
    }
    if !cur.is_empty() {
        runs.push(cur);
    }
    runs
}

/// Cut a polyline into its visible dash pieces. The pattern continues across vertices.
pub fn dash_pieces(points: &[(f64, f64)], dash: f64, gap: f64) -> Vec<Vec<(f64, f64)>> {
    if dash <= 0.0 || points.len() < 2 {
        return vec![points.to_vec()];
    }
    let gap = gap.max(0.0);
    let mut pieces = Vec::new();
    let mut cur: Vec<(f64, f64)> = vec![points[0]];
    let mut drawing = true;
    let mut left = dash;
    for w in points.windows(2) {
        let (mut a, b) = (w[0], w[1]);
        let mut seg = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
        while seg > left {
            let t = left / seg;
            let p = (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t);
            if drawing {
                cur.push(p);
                pieces.push(std::mem::take(&mut cur));
                left = gap;
            } else {
                cur = vec![p];
                left = dash;
            }
            drawing = !drawing;
            seg -= (p.0 - a.0).hypot(p.1 - a.1);
            a = p;
        }
        left -= seg;
        if drawing {
            cur.push(b);
        }
    }
    if drawing && cur.len() > 1 {
        pieces.push(cur);
    }
    pieces
}

fn draw_path(area: &Area, points: &[(f64, f64)], stroke: &Stroke) -> Result<()> {
    let style = line_style(stroke);
    for run in finite_runs(points) {
        let pieces = match stroke.dash {
            Some((d, g)) => dash_pieces(&run, d, g),
            None => vec![run],
        };
        for piece in pieces.iter().filter(|p| p.len() > 1) {
            area.draw(&PathElement::new(to_px(piece), style))
                .map_err(render_err)?;
        }
    }
    Ok(())
}

fn text_style<'a>(t: &TextMark, color: &'a RGBAColor) -> TextStyle<'a> {
    let weight = if t.bold { FontStyle::Bold } else { FontStyle::Normal };
    let h = match t.h {
        HAlign::Left => HPos::Left,
        HAlign::Center => HPos::Center,
        HAlign::Right => HPos::Right,
    };
    let v = match t.v {
        VAlign::Top => VPos::Top,
        VAlign::Middle => VPos::Center,
        VAlign::Baseline => VPos::Bottom,
    };
    TextStyle::from(FontDesc::new(FontFamily::SansSerif, t.font_px as f64, weight))
        .color(color)
        .pos(Pos::new(h, v))
}

fn draw_mark(area: &Area, mark: &Mark) -> Result<()> {
    match mark {
        Mark::Line { points, stroke } => draw_path(area, points, stroke)?,
        Mark::Rect { x, y, w, h, fill, stroke } => {
            let corners = [(px(*x), px(*y)), (px(x + w), px(y + h))];
            if let Some(f) = fill {
                area.draw(&Rectangle::new(corners, fill_style(*f)))
                    .map_err(render_err)?;
            }
            if let Some(s) = stroke {
                area.draw(&Rectangle::new(corners, line_style(s)))
                    .map_err(render_err)?;
            }
        }
        Mark::Circle { center, r, fill, stroke } => {
            let c = (px(center.0), px(center.1));
            let r = px(*r).max(1);
            if let Some(f) = fill {
                area.draw(&Circle::new(c, r, fill_style(*f))).map_err(render_err)?;
            }
            if let Some(s) = stroke {
                area.draw(&Circle::new(c, r, line_style(s))).map_err(render_err)?;
            }
        }
        Mark::Polygon { rings, fill, stroke } => {
            // holes are outlined but not cut out of the fill
            if let (Some(f), Some(outer)) = (fill, rings.first()) {
                area.draw(&Polygon::new(to_px(outer), fill_style(*f)))
                    .map_err(render_err)?;
            }
            if let Some(s) = stroke {
                for ring in rings {
                    let mut closed = ring.clone();
                    if let Some(&first) = ring.first() {
                        closed.push(first);
                    }
                    draw_path(area, &closed, s)?;
                }
            }
        }
        Mark::Text(t) => {
            let color = plot_color(t.color);
            let style = text_style(t, &color);
            let step = line_height_px(t.font_px);
            for (i, line) in t.text.lines().enumerate() {
                let pos = (px(t.x), px(t.y + i as f64 * step));
                area.draw(&Text::new(line.to_string(), pos, style.clone()))
                    .map_err(render_err)?;
            }
        }
    }
    Ok(())
}

/// Render `scene` to a standalone SVG document.
pub fn render_svg(scene: &Scene) -> Result<String> {
    let mut buf = String::new();
    {
        let size = (scene.width.max(1.0).round() as u32, scene.height.max(1.0).round() as u32);
        let root = SVGBackend::with_string(&mut buf, size).into_drawing_area();
        if let Some(bg) = scene.background {
            root.fill(&RGBColor(bg.r, bg.g, bg.b)).map_err(render_err)?;
        }
        for mark in &scene.marks {
            draw_mark(&root, mark)?;
        }
        root.present().map_err(render_err)?;
    }
    Ok(buf)
}
