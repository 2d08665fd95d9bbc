//! Chart views and the per-chart controller that ties loading, resizing and hovering
//! together.
//!
//! - Every view is a pure function of its data, the committed width and the current hover
//!   hit, producing a [`Scene`]
//! - [`Chart`] owns one view's load slot, resize controller and hover state machine
//! - Scenes are rendered to SVG through plotters ([`render_svg`])

pub mod backend;
pub mod charts;
pub mod legend;
pub mod scene;
pub mod text;
pub mod types;
pub mod util;

pub use backend::render_svg;
pub use scene::{Mark, Scene, Stroke};
pub use types::{DEFAULT_WIDTH, ViewKind};

use crate::color::{Rgb, Rgba};
use crate::error::Result;
use crate::fetch::{LoadTicket, ViewSlot, ViewState};
use crate::hover::{HoverController, Pointer, PointerEvent, Tooltip, TooltipContent};
use crate::resize::ResizeController;
use crate::scale::PlotRect;
use log::debug;
use scene::{HAlign, VAlign, label};
use text::{estimate_text_width_px, line_height_px};
use util::{ERROR_TEXT, INK};

/// Height of the loading and error placeholders.
pub const PLACEHOLDER_HEIGHT: f64 = 120.0;

/// One interactive chart view over loaded data.
pub trait ChartView {
    /// What a pointer resolves to.
    type Hit;

    /// Canvas height for a container `width`.
    fn height(&self, width: f64) -> f64;

    /// Region in which pointer events are tracked.
    fn hover_area(&self, width: f64) -> PlotRect;

    fn resolve(&self, width: f64, pointer: Pointer) -> Option<Self::Hit>;

    fn describe(&self, hit: &Self::Hit) -> TooltipContent;

    /// Everything except the tooltip, emphasising `hit` when present.
    fn draw(&self, width: f64, hit: Option<&Self::Hit>) -> Scene;
}

/// A chart instance: load state, committed width and hover state of one view.
pub struct Chart<V: ChartView> {
    kind: ViewKind,
    slot: ViewSlot<V>,
    resize: ResizeController,
    hover: HoverController<V::Hit>,
}

impl<V: ChartView> Chart<V> {
    pub fn new(kind: ViewKind, width: f64) -> Self {
        Self {
            kind,
            slot: ViewSlot::default(),
            resize: ResizeController::new(width),
            hover: HoverController::new(),
        }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn state(&self) -> &ViewState<V> {
        self.slot.state()
    }

    pub fn view(&self) -> Option<&V> {
        self.slot.state().ready()
    }

    pub fn width(&self) -> f64 {
        self.resize.width()
    }

    pub fn hover(&self) -> &HoverController<V::Hit> {
        &self.hover
    }

    pub fn tooltip(&self) -> &Tooltip {
        self.hover.tooltip()
    }

    /// Start a (re)load. The chart shows its loading placeholder until the ticket completes.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.hover.reset();
        self.slot.start()
    }

    /// Complete a load; a result for a superseded ticket is dropped and `false` returned.
    pub fn complete_load(&mut self, ticket: LoadTicket, result: Result<V>) -> bool {
        let applied = self.slot.finish(ticket, result);
        if applied {
            self.hover.reset();
        }
        applied
    }

    /// Load synchronously.
    pub fn load_with(&mut self, load: impl FnOnce() -> Result<V>) -> bool {
        let ticket = self.begin_load();
        self.complete_load(ticket, load())
    }

    /// Record a container width; takes effect at the next [`Chart::on_frame`].
    pub fn observe_width(&mut self, width: f64) {
        self.resize.observe(width);
    }

    /// Frame boundary: commit a pending width. Returns `true` when the chart must be redrawn.
    pub fn on_frame(&mut self) -> bool {
        match self.resize.on_frame() {
            Some(w) => {
                debug!("{} re-laid out at width {w}", self.kind.slug());
                self.hover.reset();
                true
            }
            None => false,
        }
    }

    pub fn pointer(&mut self, event: PointerEvent) {
        let width = self.resize.width();
        match self.slot.state() {
            ViewState::Ready(view) => self.hover.handle(
                event,
                view.hover_area(width),
                |p| view.resolve(width, p),
                |h| view.describe(h),
            ),
            _ => self.hover.reset(),
        }
    }

    /// Change a selection on the loaded view (e.g. the map year). Hover state is cleared.
    pub fn update(&mut self, change: impl FnOnce(&mut V)) -> bool {
        match self.slot.ready_mut() {
            Some(view) => {
                change(view);
                self.hover.reset();
                true
            }
            None => false,
        }
    }

    pub fn scene(&self) -> Scene {
        let width = self.resize.width();
        match self.slot.state() {
            ViewState::Loading => loading_scene(width),
            ViewState::Failed(message) => error_scene(width, message),
            ViewState::Ready(view) => {
                let mut scene = view.draw(width, self.hover.hit());
                draw_tooltip(&mut scene, self.hover.tooltip());
                scene
            }
        }
    }

    pub fn render_svg(&self) -> Result<String> {
        render_svg(&self.scene())
    }
}

pub fn loading_scene(width: f64) -> Scene {
    let mut scene = Scene::new(width, PLACEHOLDER_HEIGHT);
    scene.text(label(20.0, 40.0, "Loading…", 14, INK));
    scene
}

/// Inline failure message shown in place of the chart.
pub fn error_scene(width: f64, message: &str) -> Scene {
    let mut scene = Scene::new(width, PLACEHOLDER_HEIGHT);
    let max = (width - 40.0).max(80.0);
    let lines = text::wrap_text_to_width(&format!("Error: {message}"), 14, max);
    scene.text(label(20.0, 40.0, lines.join("\n"), 14, ERROR_TEXT));
    scene
}

const TOOLTIP_FONT_PX: u32 = 12;
const TOOLTIP_PAD_X: f64 = 10.0;
const TOOLTIP_PAD_Y: f64 = 8.0;
const SWATCH_SPACE: f64 = 16.0;

pub fn tooltip_background() -> Rgba {
    Rgba::with_alpha(Rgb::new(17, 24, 39), 0.92)
}

/// Tooltip box `(x, y, w, h)`: centered above the anchor and kept inside the canvas.
pub fn tooltip_box(tooltip: &Tooltip, canvas: (f64, f64)) -> (f64, f64, f64, f64) {
    let c = &tooltip.content;
    let line_h = line_height_px(TOOLTIP_FONT_PX);
    let title_w = estimate_text_width_px(&c.title, TOOLTIP_FONT_PX);
    let body_w = c
        .lines
        .iter()
        .map(|l| estimate_text_width_px(&l.text, TOOLTIP_FONT_PX) + if l.swatch.is_some() { SWATCH_SPACE } else { 0.0 })
        .fold(0.0, f64::max);
    let w = title_w.max(body_w) + 2.0 * TOOLTIP_PAD_X;
    let h = (1 + c.lines.len()) as f64 * line_h + 2.0 * TOOLTIP_PAD_Y;
    let (ax, ay) = tooltip.anchor;
    let x = (ax - w / 2.0).clamp(0.0, (canvas.0 - w).max(0.0));
    let y = (ay - 1.2 * h).clamp(0.0, (canvas.1 - h).max(0.0));
    (x, y, w, h)
}

pub fn draw_tooltip(scene: &mut Scene, tooltip: &Tooltip) {
    if !tooltip.visible {
        return;
    }
    let (x, y, w, h) = tooltip_box(tooltip, (scene.width, scene.height));
    scene.rect(x, y, w, h, Some(tooltip_background()), None);
    let line_h = line_height_px(TOOLTIP_FONT_PX);
    let text_color = Rgb::new(0xfc, 0xfc, 0xfc);
    let mut ty = y + TOOLTIP_PAD_Y + line_h / 2.0;
    scene.text(
        label(x + TOOLTIP_PAD_X, ty, tooltip.content.title.clone(), TOOLTIP_FONT_PX, text_color)
            .bold()
            .align(HAlign::Left, VAlign::Middle),
    );
    for line in &tooltip.content.lines {
        ty += line_h;
        let mut tx = x + TOOLTIP_PAD_X;
        if let Some(c) = line.swatch {
            scene.circle((tx + 5.0, ty), 5.0, Some(c.into()), None);
            tx += SWATCH_SPACE;
        }
        scene.text(label(tx, ty, line.text.clone(), TOOLTIP_FONT_PX, text_color).align(HAlign::Left, VAlign::Middle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChartError;
    use crate::hover::TooltipLine;

    /// Two-zone toy view: left half hits 0, right half hits 1.
    struct Halves;

    impl ChartView for Halves {
        type Hit = u8;

        fn height(&self, _width: f64) -> f64 {
            100.0
        }

        fn hover_area(&self, width: f64) -> PlotRect {
            PlotRect {
                left: 0.0,
                top: 0.0,
                right: width,
                bottom: 100.0,
            }
        }

        fn resolve(&self, width: f64, p: Pointer) -> Option<u8> {
            Some(if p.x < width / 2.0 { 0 } else { 1 })
        }

        fn describe(&self, hit: &u8) -> TooltipContent {
            TooltipContent {
                title: format!("half {hit}"),
                lines: vec![TooltipLine::plain("x")],
            }
        }

        fn draw(&self, width: f64, _hit: Option<&u8>) -> Scene {
            Scene::new(width, 100.0)
        }
    }

    #[test]
    fn placeholders_follow_load_state() {
        let mut chart: Chart<Halves> = Chart::new(ViewKind::Hpi, 400.0);
        assert_eq!(chart.scene().texts().next().unwrap().text, "Loading…");
        chart.load_with(|| Err(ChartError::MissingColumn("date".into())));
        let scene = chart.scene();
        assert!(scene.texts().next().unwrap().text.starts_with("Error: missing column"));
        chart.load_with(|| Ok(Halves));
        assert!(chart.view().is_some());
    }

    #[test]
    fn resize_resets_hover_and_changes_resolution() {
        let mut chart: Chart<Halves> = Chart::new(ViewKind::Hpi, 400.0);
        chart.load_with(|| Ok(Halves));
        chart.pointer(PointerEvent::Enter(Pointer::new(250.0, 50.0)));
        assert_eq!(chart.hover().hit(), Some(&1));
        assert!(chart.tooltip().visible);
        chart.observe_width(600.0);
        assert!(chart.on_frame());
        assert!(!chart.hover().is_active());
        chart.pointer(PointerEvent::Move(Pointer::new(250.0, 50.0)));
        assert_eq!(chart.hover().hit(), Some(&0));
        chart.pointer(PointerEvent::Leave);
        assert!(!chart.tooltip().visible);
    }

    #[test]
    fn tooltip_stays_on_canvas() {
        let mut chart: Chart<Halves> = Chart::new(ViewKind::Hpi, 400.0);
        chart.load_with(|| Ok(Halves));
        chart.pointer(PointerEvent::Move(Pointer::new(2.0, 3.0)));
        let (x, y, w, h) = tooltip_box(chart.tooltip(), (400.0, 100.0));
        assert!(x >= 0.0 && y >= 0.0);
        assert!(x + w <= 400.0 && y + h <= 100.0);
        let scene = chart.scene();
        assert!(scene.texts().any(|t| t.text == "half 0"));
    }
}
