use serde::{Deserialize, Serialize};

/// Default inset (in container pixels) applied around every overlay box.
pub const DEFAULT_PADDING: f64 = 3.0;

/// Pixel extent of a container or an image.
///
/// `0×0` is the "unknown" state before layout or image load has resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when both sides are positive finite numbers.
    pub fn is_known(&self) -> bool {
        is_positive(self.width) && is_positive(self.height)
    }
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Rectangle expressed as fractions of the image's own width/height,
/// origin at the top-left corner.
///
/// Values outside `[0, 1]` are accepted and projected unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct NormalizedBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    pub const FULL: NormalizedBox = NormalizedBox::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

// Wire order is [x, y, w, h].
impl From<[f64; 4]> for NormalizedBox {
    fn from([x, y, width, height]: [f64; 4]) -> Self {
        Self { x, y, width, height }
    }
}

impl From<NormalizedBox> for [f64; 4] {
    fn from(b: NormalizedBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// One detection result to be drawn over the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub bbox: NormalizedBox,
    pub label: String,
    /// Masked text for OCR-derived findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Container-local rectangle, ready for absolute positioning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectedRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ProjectedRect {
    /// Grow the rectangle by `padding` on every side. Negative values shrink it.
    pub fn padded(self, padding: f64) -> Self {
        Self {
            left: self.left - padding,
            top: self.top - padding,
            width: self.width + padding * 2.0,
            height: self.height + padding * 2.0,
        }
    }

    /// Inclusive point test. Rectangles with negative extents contain nothing.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left
            && y >= self.top
            && x <= self.left + self.width
            && y <= self.top + self.height
    }
}
