//! Container-width observation with frame-deferred re-layout.
//!
//! Width observations only record a pending value. The value is committed once per
//! paint frame, so a burst of resize events costs a single rebuild.

/// Width used when the container reports zero (not yet laid out).
pub const FALLBACK_WIDTH: f64 = 820.0;

/// How a chart derives its height from its width and content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightPolicy {
    Fixed(f64),
    /// `width × ratio`, clamped to `[min, max]`.
    Aspect { ratio: f64, min: f64, max: f64 },
    /// `rows × per_row + base`, clamped to `[min, max]`.
    PerRow { per_row: f64, base: f64, min: f64, max: f64 },
}

impl HeightPolicy {
    pub fn height(&self, width: f64, rows: usize) -> f64 {
        match *self {
            HeightPolicy::Fixed(h) => h,
            HeightPolicy::Aspect { ratio, min, max } => (width * ratio).round().clamp(min, max),
            HeightPolicy::PerRow { per_row, base, min, max } => {
                (rows as f64 * per_row + base).clamp(min, max)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeController {
    committed: f64,
    pending: Option<f64>,
}

impl ResizeController {
    pub fn new(initial_width: f64) -> Self {
        Self {
            committed: normalize(initial_width),
            pending: None,
        }
    }

    /// Width the current layout was built for.
    pub fn width(&self) -> f64 {
        self.committed
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record a container width. Replaces any width not yet committed.
    pub fn observe(&mut self, width: f64) {
        self.pending = Some(normalize(width));
    }

    /// Commit the pending width at a frame boundary.
    ///
    /// Returns the new width when it differs from the committed one, meaning scales
    /// must be rebuilt and the chart redrawn.
    pub fn on_frame(&mut self) -> Option<f64> {
        let w = self.pending.take()?;
        if w == self.committed {
            return None;
        }
        self.committed = w;
        Some(w)
    }
}

impl Default for ResizeController {
    fn default() -> Self {
        Self::new(FALLBACK_WIDTH)
    }
}

fn normalize(width: f64) -> f64 {
    if width.is_finite() && width > 0.0 {
        width.floor()
    } else {
        FALLBACK_WIDTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bursts_collapse_into_one_commit() {
        let mut r = ResizeController::new(880.0);
        r.observe(700.0);
        r.observe(650.0);
        r.observe(600.4);
        assert!(r.has_pending());
        assert_eq!(r.on_frame(), Some(600.0));
        assert_eq!(r.on_frame(), None);
        assert_eq!(r.width(), 600.0);
    }

    #[test]
    fn unchanged_width_does_not_trigger() {
        let mut r = ResizeController::new(880.0);
        r.observe(880.0);
        assert_eq!(r.on_frame(), None);
        r.observe(0.0);
        assert_eq!(r.on_frame(), Some(FALLBACK_WIDTH));
    }

    #[test]
    fn per_row_height_is_clamped() {
        let p = HeightPolicy::PerRow {
            per_row: 24.0,
            base: 64.0,
            min: 320.0,
            max: 1400.0,
        };
        assert_eq!(p.height(880.0, 3), 320.0);
        assert_eq!(p.height(880.0, 33), 33.0 * 24.0 + 64.0);
        assert_eq!(p.height(880.0, 500), 1400.0);
        assert_eq!(HeightPolicy::Fixed(420.0).height(880.0, 99), 420.0);
        let a = HeightPolicy::Aspect {
            ratio: 0.5,
            min: 320.0,
            max: 700.0,
        };
        assert_eq!(a.height(880.0, 0), 440.0);
        assert_eq!(a.height(400.0, 0), 320.0);
    }
}
