//! Page geometry shared by the cropper and the compositors
//!
//! All coordinates are PDF points with a lower-left origin (y grows upward).

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in PDF user space
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PdfRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    /// True when `other` lies entirely inside this rectangle
    pub fn contains(&self, other: &PdfRect) -> bool {
        const EPSILON: f64 = 1e-6;
        other.x >= self.x - EPSILON
            && other.y >= self.y - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.top() <= self.top() + EPSILON
    }
}

/// Crop regions are plain rectangles in the source page's space
pub type CropRegion = PdfRect;

/// Output page dimensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// ISO A4 in points
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    /// US Letter in points, used when a source page carries no MediaBox
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    pub fn rect(&self) -> PdfRect {
        PdfRect::new(0.0, 0.0, self.width, self.height)
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

/// Uniform scale plus translation, no rotation or shear.
///
/// Maps a form's local origin to `(translate_x, translate_y)` on the output page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlacementTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl PlacementTransform {
    /// Scale `region` to fit a `cell_width` x `cell_height` cell and anchor
    /// its lower-left corner at `(x, y)`
    pub fn fit(region: &CropRegion, cell_width: f64, cell_height: f64, x: f64, y: f64) -> Self {
        Self {
            scale: fit_scale(region, cell_width, cell_height),
            translate_x: x,
            translate_y: y,
        }
    }

    /// Operands for the `cm` operator: `[a b c d e f]`
    pub fn matrix(&self) -> [f64; 6] {
        [
            self.scale,
            0.0,
            0.0,
            self.scale,
            self.translate_x,
            self.translate_y,
        ]
    }

    /// Footprint of a `width` x `height` form once placed
    pub fn placed_rect(&self, width: f64, height: f64) -> PdfRect {
        PdfRect::new(
            self.translate_x,
            self.translate_y,
            width * self.scale,
            height * self.scale,
        )
    }
}

/// Largest uniform scale at which `region` fits inside the cell.
///
/// Upscales when the region is smaller than the cell.
pub fn fit_scale(region: &CropRegion, cell_width: f64, cell_height: f64) -> f64 {
    (cell_width / region.width).min(cell_height / region.height)
}
