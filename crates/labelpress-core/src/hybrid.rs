//! Hybrid pages: four labels in the corners, four leaflets in the middle
//!
//! Source pages are consumed in groups of four, one output page per group.
//! Leaflets are paced by group, not by label: page `k` always shows the
//! customers starting at index `4k`, however many labels that page holds.

use crate::config::{HybridLayout, LayoutConfig};
use crate::crop::crop_region;
use crate::customer::CustomerRecord;
use crate::error::LabelPressError;
use crate::geometry::{fit_scale, CropRegion, PageSize, PdfRect, PlacementTransform};
use crate::leaflet::compact_block;
use crate::output::{FormImporter, OutputDocument, Stroke};
use crate::source::SourceDocument;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Labels (and leaflets) per hybrid page
pub const GROUP_SIZE: usize = 4;

/// Padding between a center leaflet's cut line and its text
pub(crate) const LEAFLET_PADDING: f64 = 4.0;

const CUT_GUIDE: Stroke = Stroke::Dashed {
    width: 0.5,
    on: 1.0,
    off: 2.0,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerBill {
    /// 1-based source page number
    pub source_page: u32,
    /// 0 top-left, 1 top-right, 2 bottom-left, 3 bottom-right
    pub slot: usize,
    pub region: CropRegion,
    pub transform: PlacementTransform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridPage {
    pub bills: Vec<CornerBill>,
    /// First customer index this page's leaflets draw from
    pub leaflet_start: usize,
    /// Customer indices actually printed, possibly empty
    pub leaflets: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridPlan {
    pub pages: Vec<HybridPage>,
}

impl HybridPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Size of a corner cell
pub fn corner_cell(page_size: &PageSize, layout: &HybridLayout) -> (f64, f64) {
    (
        page_size.width * layout.corner_width,
        page_size.height * layout.corner_height,
    )
}

/// Lower-left corner of corner cell `slot`; bills are anchored there
pub fn corner_origin(page_size: &PageSize, layout: &HybridLayout, slot: usize) -> (f64, f64) {
    let (cell_width, cell_height) = corner_cell(page_size, layout);
    let inset = layout.corner_inset;
    let left = inset;
    let right = page_size.width - cell_width - inset;
    let top = page_size.height - cell_height - inset;
    let bottom = inset;
    match slot {
        0 => (left, top),
        1 => (right, top),
        2 => (left, bottom),
        _ => (right, bottom),
    }
}

/// The centered area that holds the leaflets
pub fn center_area(page_size: &PageSize, layout: &HybridLayout) -> PdfRect {
    let width = page_size.width * layout.center_width;
    let height = page_size.height * layout.center_height;
    PdfRect::new(
        (page_size.width - width) / 2.0,
        (page_size.height - height) / 2.0,
        width,
        height,
    )
}

/// Rectangle of center leaflet `slot`, laid out 2x2 from the top-left
pub fn center_leaflet_rect(page_size: &PageSize, layout: &HybridLayout, slot: usize) -> PdfRect {
    let area = center_area(page_size, layout);
    let gap = layout.leaflet_gap;
    let width = area.width / 2.0 - gap;
    let height = area.height / 2.0 - gap;
    let column = (slot % 2) as f64;
    let row = (slot / 2) as f64;
    PdfRect::new(
        area.x + column * (width + gap),
        area.top() - (row + 1.0) * height - row * gap,
        width,
        height,
    )
}

/// Plan pages for source pages with the given MediaBoxes
pub fn plan_hybrid(
    page_boxes: &[PdfRect],
    customer_count: usize,
    config: &LayoutConfig,
) -> HybridPlan {
    let layout = &config.hybrid;
    let (cell_width, cell_height) = corner_cell(&config.page_size, layout);

    let pages = page_boxes
        .chunks(GROUP_SIZE)
        .enumerate()
        .map(|(group, boxes)| {
            let bills = boxes
                .iter()
                .enumerate()
                .map(|(slot, page_box)| {
                    let region = crop_region(page_box, &config.crop);
                    let scale = fit_scale(&region, cell_width, cell_height);
                    let (x, y) = corner_origin(&config.page_size, layout, slot);
                    CornerBill {
                        source_page: (group * GROUP_SIZE + slot) as u32 + 1,
                        slot,
                        region,
                        transform: PlacementTransform {
                            scale,
                            translate_x: x,
                            translate_y: y,
                        },
                    }
                })
                .collect();

            let leaflet_start = group * GROUP_SIZE;
            let end = (leaflet_start + GROUP_SIZE).min(customer_count);
            HybridPage {
                bills,
                leaflet_start,
                leaflets: leaflet_start..end.max(leaflet_start),
            }
        })
        .collect();

    HybridPlan { pages }
}

/// Compose hybrid pages for `source`, pairing them with `customers`.
///
/// An empty customer list is allowed; the pages then carry labels only.
pub fn render_hybrid(
    source: &SourceDocument,
    customers: &[CustomerRecord],
    config: &LayoutConfig,
) -> Result<OutputDocument, LabelPressError> {
    config.validate()?;
    let boxes: Vec<PdfRect> = source.pages().iter().map(|p| p.media_box).collect();
    let plan = plan_hybrid(&boxes, customers.len(), config);
    let layout = &config.hybrid;

    let mut out = OutputDocument::new(config.page_size);
    let mut importer = FormImporter::new(source);

    for (index, page) in plan.pages.iter().enumerate() {
        out.begin_page()?;

        for bill in &page.bills {
            let source_page = source.page(bill.source_page).ok_or_else(|| {
                LabelPressError::UnreadableSource(format!("Missing page {}", bill.source_page))
            })?;
            let form = importer.crop_to_form(&mut out, source_page, &bill.region)?;
            out.draw_form(&form, &bill.transform);
        }

        for (slot, customer_index) in page.leaflets.clone().enumerate() {
            let rect = center_leaflet_rect(&config.page_size, layout, slot);
            out.stroke_rect(&rect, CUT_GUIDE);

            let area = PdfRect::new(
                rect.x + LEAFLET_PADDING,
                rect.y + LEAFLET_PADDING,
                rect.width - 2.0 * LEAFLET_PADDING,
                rect.height - 2.0 * LEAFLET_PADDING,
            );
            compact_block(
                &customers[customer_index].name,
                &config.contact_number,
                layout.leaflet_font_size,
                area.width,
            )
            .fit_to(area.width, area.height)
            .draw_centered(&mut out, &area);
        }

        tracing::debug!(
            "Hybrid page {}: {} labels, leaflets {:?}",
            index + 1,
            page.bills.len(),
            page.leaflets
        );
    }

    tracing::info!(
        "Hybrid layout: {} labels and {} customers on {} pages",
        source.page_count(),
        customers.len(),
        plan.page_count()
    );
    Ok(out)
}
