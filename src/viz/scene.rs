//! Backend-independent drawing commands.
//!
//! A chart view is a pure function `(data, width, selection) -> Scene`. Marks are drawn
//! in order, so the position of a mark in [`Scene::marks`] is its z-order.

use crate::color::{Rgb, Rgba};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f64,
    /// `(dash, gap)` lengths in pixels.
    pub dash: Option<(f64, f64)>,
}

impl Stroke {
    pub fn solid(color: impl Into<Rgba>, width: f64) -> Self {
        Self {
            color: color.into(),
            width,
            dash: None,
        }
    }

    pub fn dashed(color: impl Into<Rgba>, width: f64, dash: f64, gap: f64) -> Self {
        Self {
            color: color.into(),
            width,
            dash: Some((dash, gap)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Baseline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextMark {
    pub x: f64,
    pub y: f64,
    /// May contain `\n`; lines stack downward from `y`.
    pub text: String,
    pub font_px: u32,
    pub bold: bool,
    pub color: Rgba,
    pub h: HAlign,
    pub v: VAlign,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    /// Polyline; a non-finite coordinate breaks the line into separate runs.
    Line { points: Vec<(f64, f64)>, stroke: Stroke },
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        fill: Option<Rgba>,
        stroke: Option<Stroke>,
    },
    Circle {
        center: (f64, f64),
        r: f64,
        fill: Option<Rgba>,
        stroke: Option<Stroke>,
    },
    /// Outer ring first. Every ring is stroked; only the outer ring is filled.
    Polygon {
        rings: Vec<Vec<(f64, f64)>>,
        fill: Option<Rgba>,
        stroke: Option<Stroke>,
    },
    Text(TextMark),
}

/// A full drawing: canvas size plus ordered marks.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub background: Option<Rgb>,
    pub marks: Vec<Mark>,
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            background: Some(Rgb::new(255, 255, 255)),
            marks: Vec::new(),
        }
    }

    pub fn push(&mut self, mark: Mark) {
        self.marks.push(mark);
    }

    pub fn line(&mut self, points: Vec<(f64, f64)>, stroke: Stroke) {
        self.push(Mark::Line { points, stroke });
    }

    pub fn segment(&mut self, from: (f64, f64), to: (f64, f64), stroke: Stroke) {
        self.line(vec![from, to], stroke);
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: Option<Rgba>, stroke: Option<Stroke>) {
        self.push(Mark::Rect { x, y, w, h, fill, stroke });
    }

    pub fn circle(&mut self, center: (f64, f64), r: f64, fill: Option<Rgba>, stroke: Option<Stroke>) {
        self.push(Mark::Circle { center, r, fill, stroke });
    }

    pub fn text(&mut self, mark: TextMark) {
        self.push(Mark::Text(mark));
    }

    /// Texts in drawing order; handy for assertions.
    pub fn texts(&self) -> impl Iterator<Item = &TextMark> {
        self.marks.iter().filter_map(|m| match m {
            Mark::Text(t) => Some(t),
            _ => None,
        })
    }
}

/// Builder-style text mark with left/baseline anchoring and normal weight.
pub fn label(x: f64, y: f64, text: impl Into<String>, font_px: u32, color: impl Into<Rgba>) -> TextMark {
    TextMark {
        x,
        y,
        text: text.into(),
        font_px,
        bold: false,
        color: color.into(),
        h: HAlign::Left,
        v: VAlign::Baseline,
    }
}

impl TextMark {
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn align(mut self, h: HAlign, v: VAlign) -> Self {
        self.h = h;
        self.v = v;
        self
    }
}
