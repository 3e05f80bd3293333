use serde::Deserialize;
use serde::Serialize;

/// Axis-aligned box reported by the host for an element or a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementRect {
    /// Arguments follow field order.
    pub fn new(
        top: f64,
        left: f64,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Zero width and zero height means the element is not rendered yet.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

/// Per-edge pre-load distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub const fn new(
        top: f64,
        right: f64,
        bottom: f64,
        left: f64,
    ) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

impl Default for Margin {
    fn default() -> Self {
        Self::uniform(100.0)
    }
}

impl From<f64> for Margin {
    fn from(value: f64) -> Self {
        Self::uniform(value)
    }
}

/// Margin-expanded rectangle elements are tested against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationRegion {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl ObservationRegion {
    /// Expand host-reported bounds by `margin`.
    pub fn from_bounds(
        bounds: ElementRect,
        margin: &Margin,
    ) -> Self {
        Self {
            top: bounds.top - margin.top,
            right: bounds.left + bounds.width + margin.right,
            bottom: bounds.top + bounds.height + margin.bottom,
            left: bounds.left - margin.left,
        }
    }
}

/// Returns true when `rect` overlaps `region`.
///
/// Degenerate rectangles never intersect. The left edge comparison is strict
/// while the others are not: an element whose right edge touches the region's
/// left edge still counts as visible.
pub fn intersects(
    rect: &ElementRect,
    region: &ObservationRegion,
) -> bool {
    if rect.is_degenerate() {
        return false;
    }

    !(region.bottom <= rect.top)
        && !(region.right <= rect.left)
        && !(region.top >= rect.top + rect.height)
        && !(region.left > rect.left + rect.width)
}
