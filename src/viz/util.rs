//! Shared chart pieces: dashboard palette, number/date formatting and axis drawing.

use num_format::{Locale, ToFormattedString};

use super::scene::{HAlign, Scene, Stroke, VAlign, label};
use crate::color::{Rgb, Rgba};
use crate::models::{Timestamp, is_present, timestamp_to_datetime};
use crate::scale::{LinearScale, PlotRect};

/// Dashboard palette.
pub const INK: Rgb = Rgb::new(0x11, 0x18, 0x27); // uk / primary text
pub const ROSE: Rgb = Rgb::new(0xe1, 0x1d, 0x48); // london / focal region
pub const NEUTRAL: Rgb = Rgb::new(0x9c, 0xa3, 0xaf);
pub const HIGHLIGHT: Rgb = Rgb::new(0x0f, 0x17, 0x2a);
pub const RENT: Rgb = Rgb::new(0x73, 0x60, 0x5b);
pub const HOUSE: Rgb = Rgb::new(0x9e, 0x2f, 0x50);
pub const INFLATION: Rgb = Rgb::new(0x6b, 0x72, 0x80);
pub const SLATE: Rgb = Rgb::new(0x94, 0xa3, 0xb8);
pub const CONNECTOR: Rgb = Rgb::new(0xcb, 0xd5, 0xe1);
pub const GRID: Rgb = Rgb::new(0xf3, 0xf4, 0xf6);
pub const AXIS: Rgb = Rgb::new(0xe5, 0xe7, 0xeb);
pub const GUIDE: Rgb = Rgb::new(0xd1, 0xd5, 0xdb);
pub const ZERO_LINE: Rgb = Rgb::new(0xdd, 0xdd, 0xdd);
pub const TICK_TEXT: Rgb = Rgb::new(0x4b, 0x55, 0x63);
pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
pub const ERROR_TEXT: Rgb = Rgb::new(0xdc, 0x14, 0x3c); // crimson

/// Placeholder text for missing values in tooltips.
pub const MISSING_TEXT: &str = "—";

/// `"Mar 2020"`.
pub fn format_month(t: Timestamp) -> String {
    timestamp_to_datetime(t).format("%b %Y").to_string()
}

/// Whole pounds with thousands separators: `£34,512`.
pub fn format_money(v: f64) -> String {
    if !is_present(v) {
        return MISSING_TEXT.to_string();
    }
    let n = v.round() as i64;
    let sign = if n < 0 { "-" } else { "" };
    format!("{sign}£{}", n.unsigned_abs().to_formatted_string(&Locale::en))
}

/// Money change with an explicit sign: `+£1,204`, `-£88`.
pub fn format_signed_money(v: f64) -> String {
    if !is_present(v) {
        return MISSING_TEXT.to_string();
    }
    if v.round() >= 0.0 {
        format!("+{}", format_money(v))
    } else {
        format_money(v)
    }
}

/// One decimal place, or the missing placeholder.
pub fn format_value(v: f64) -> String {
    if is_present(v) { format!("{v:.1}") } else { MISSING_TEXT.to_string() }
}

pub fn format_percent(v: f64) -> String {
    if is_present(v) { format!("{v:.1}%") } else { MISSING_TEXT.to_string() }
}

/// Shortest form of a tick value: `5`, `2.5`, `-0.25`.
pub fn format_tick(v: f64) -> String {
    let s = format!("{v:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Display name for a series key: `uk_hpi` -> `UK`, `south_east` -> `South East`.
pub fn pretty_key(key: &str) -> String {
    match key {
        "uk" | "uk_hpi" => "UK".to_string(),
        "london" | "london_hpi" => "London".to_string(),
        _ => key
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut c = w.chars();
                match c.next() {
                    Some(f) => f.to_uppercase().chain(c).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Horizontal grid lines at `ticks`.
pub fn draw_horizontal_grid(scene: &mut Scene, y: &LinearScale, plot: PlotRect, ticks: &[f64]) {
    for &v in ticks {
        let py = y.apply(v);
        scene.segment((plot.left, py), (plot.right, py), Stroke::solid(GRID, 1.0));
    }
}

/// Vertical grid lines at `ticks`.
pub fn draw_vertical_grid(scene: &mut Scene, x: &LinearScale, plot: PlotRect, ticks: &[f64]) {
    for &v in ticks {
        let px = x.apply(v);
        scene.segment((px, plot.top), (px, plot.bottom), Stroke::solid(GRID, 1.0));
    }
}

/// Bottom time axis: domain line, calendar ticks, labels centered under each tick.
pub fn draw_time_axis(scene: &mut Scene, x: &LinearScale, plot: PlotRect, count: usize, font_px: u32) {
    scene.segment((plot.left, plot.bottom), (plot.right, plot.bottom), Stroke::solid(AXIS, 1.0));
    for tick in x.time_ticks(count) {
        let px = x.apply(tick.timestamp as f64);
        scene.segment((px, plot.bottom), (px, plot.bottom + 5.0), Stroke::solid(AXIS, 1.0));
        scene.text(
            label(px, plot.bottom + 8.0, tick.label, font_px, TICK_TEXT).align(HAlign::Center, VAlign::Top),
        );
    }
}

/// Bottom value axis with formatted tick labels.
pub fn draw_bottom_axis(
    scene: &mut Scene,
    x: &LinearScale,
    plot: PlotRect,
    ticks: &[f64],
    font_px: u32,
    fmt: impl Fn(f64) -> String,
) {
    scene.segment((plot.left, plot.bottom), (plot.right, plot.bottom), Stroke::solid(AXIS, 1.0));
    for &v in ticks {
        let px = x.apply(v);
        scene.segment((px, plot.bottom), (px, plot.bottom + 5.0), Stroke::solid(AXIS, 1.0));
        scene.text(label(px, plot.bottom + 8.0, fmt(v), font_px, TICK_TEXT).align(HAlign::Center, VAlign::Top));
    }
}

/// Left value axis with right-aligned tick labels.
pub fn draw_left_axis(
    scene: &mut Scene,
    y: &LinearScale,
    plot: PlotRect,
    ticks: &[f64],
    font_px: u32,
    fmt: impl Fn(f64) -> String,
) {
    scene.segment((plot.left, plot.top), (plot.left, plot.bottom), Stroke::solid(AXIS, 1.0));
    for &v in ticks {
        let py = y.apply(v);
        scene.segment((plot.left - 5.0, py), (plot.left, py), Stroke::solid(AXIS, 1.0));
        scene.text(label(plot.left - 8.0, py, fmt(v), font_px, TICK_TEXT).align(HAlign::Right, VAlign::Middle));
    }
}

/// Vertical pointer guide spanning the plot.
pub fn draw_guide(scene: &mut Scene, px: f64, plot: PlotRect) {
    scene.segment((px, plot.top), (px, plot.bottom), Stroke::solid(GUIDE, 1.0));
}

/// Focus dot with a white halo.
pub fn draw_focus(scene: &mut Scene, center: (f64, f64), r: f64, color: Rgb) {
    scene.circle(center, r, Some(Rgba::opaque(color)), Some(Stroke::solid(WHITE, 1.5)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::date_to_timestamp;
    use chrono::NaiveDate;

    #[test]
    fn money_and_percent_formatting() {
        assert_eq!(format_money(34512.4), "£34,512");
        assert_eq!(format_money(-88.0), "-£88");
        assert_eq!(format_signed_money(1204.0), "+£1,204");
        assert_eq!(format_signed_money(-1204.0), "-£1,204");
        assert_eq!(format_signed_money(f64::NAN), MISSING_TEXT);
        assert_eq!(format_percent(3.14159), "3.1%");
        assert_eq!(format_value(f64::NAN), MISSING_TEXT);
        assert_eq!(format_tick(2.5), "2.5");
        assert_eq!(format_tick(-0.0), "0");
        assert_eq!(format_tick(10.0), "10");
    }

    #[test]
    fn keys_are_prettified() {
        assert_eq!(pretty_key("uk_hpi"), "UK");
        assert_eq!(pretty_key("london"), "London");
        assert_eq!(pretty_key("south_east"), "South East");
        assert_eq!(pretty_key("north__west"), "North West");
    }

    #[test]
    fn month_label() {
        let t = date_to_timestamp(NaiveDate::from_ymd_opt(2020, 3, 23).unwrap());
        assert_eq!(format_month(t), "Mar 2020");
    }
}
