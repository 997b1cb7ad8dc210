//! Label region cropping
//!
//! The label is assumed to sit in a horizontal band roughly one third up from
//! the bottom of each source page. Nothing here inspects page content: a page
//! with a different layout simply yields a crop of the wrong area.

use crate::config::CropFractions;
use crate::geometry::{CropRegion, PdfRect};

/// Compute the label crop for a page whose MediaBox is `page_box`
pub fn crop_region(page_box: &PdfRect, fractions: &CropFractions) -> CropRegion {
    let (w, h) = (page_box.width, page_box.height);
    PdfRect::new(
        page_box.x + fractions.x * w,
        page_box.y + fractions.y * h,
        fractions.width * w,
        fractions.height * h,
    )
}
