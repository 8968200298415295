use std::time::{Duration, Instant};

use crate::foundation::core::{Canvas, Point};

/// Most recent pointer location in image pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PointerState {
    /// Pointer is over the surface at this image-space location.
    Present(Point),
    /// Pointer left the surface or never entered it.
    #[default]
    Absent,
}

impl PointerState {
    /// Image-space location, if present.
    pub fn point(self) -> Option<Point> {
        match self {
            PointerState::Present(p) => Some(p),
            PointerState::Absent => None,
        }
    }
}

/// Page-relative layout box of the drawing surface in display (CSS) pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DisplayRect {
    /// Page-relative left edge.
    pub left: f64,
    /// Page-relative top edge.
    pub top: f64,
    /// Displayed width.
    pub width: f64,
    /// Displayed height.
    pub height: f64,
}

impl DisplayRect {
    /// Rect at the page origin with the given displayed size.
    pub fn at_origin(width: f64, height: f64) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    /// Return `true` when every field is finite and the width is positive.
    pub fn is_usable(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
    }
}

/// Cached mapping from page coordinates into image pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleState {
    /// Surface page-relative left edge.
    pub left: f64,
    /// Surface page-relative top edge.
    pub top: f64,
    /// Backing resolution over displayed size.
    pub ratio: f64,
}

impl Default for ScaleState {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            ratio: 1.0,
        }
    }
}

impl ScaleState {
    /// Derive the mapping for a surface with `backing` pixels displayed in `rect`.
    ///
    /// Returns `None` for unusable rects. An empty backing maps with ratio 1.
    pub fn compute(backing: Canvas, rect: DisplayRect) -> Option<Self> {
        if !rect.is_usable() {
            return None;
        }
        let ratio = if backing.width == 0 {
            1.0
        } else {
            f64::from(backing.width) / rect.width
        };
        Some(Self {
            left: rect.left,
            top: rect.top,
            ratio,
        })
    }

    /// Map a page-relative coordinate into image pixel space.
    pub fn to_image(&self, page_x: f64, page_y: f64) -> Point {
        Point::new(
            (page_x - self.left) * self.ratio,
            (page_y - self.top) * self.ratio,
        )
    }
}

/// Coalesces bursts of values into one commit after a quiet period.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    /// Create a debouncer with the given quiet period.
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record `value`, replacing any pending one and restarting the quiet period.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet));
    }

    /// Take the pending value once its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Return `true` while a value is waiting.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any pending value.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/motion/pointer.rs"]
mod tests;
