//! N-up grid reprint
//!
//! Cropped labels are placed `per_page` to an output page, filling a
//! `columns`-wide grid row by row from the top-left. Each label keeps its
//! aspect ratio and is anchored at the lower-left corner of its cell.

use crate::config::{GridLayout, LayoutConfig};
use crate::crop::crop_region;
use crate::error::LabelPressError;
use crate::geometry::{CropRegion, PageSize, PdfRect, PlacementTransform};
use crate::output::{FormImporter, OutputDocument};
use crate::source::SourceDocument;
use serde::{Deserialize, Serialize};

/// Where one source page lands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPlacement {
    /// 1-based source page number
    pub source_page: u32,
    /// 0-based output page index
    pub output_page: usize,
    pub slot: usize,
    pub region: CropRegion,
    pub transform: PlacementTransform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPlan {
    pub page_count: usize,
    pub placements: Vec<GridPlacement>,
}

/// Size of one grid cell
pub fn cell_size(page_size: &PageSize, layout: &GridLayout) -> (f64, f64) {
    (
        page_size.width / layout.columns as f64 - layout.cell_margin,
        page_size.height / layout.rows() as f64 - layout.cell_margin,
    )
}

/// Lower-left corner of `slot`'s cell; row 0 is at the top
pub fn cell_origin(page_size: &PageSize, layout: &GridLayout, slot: usize) -> (f64, f64) {
    let (cell_width, cell_height) = cell_size(page_size, layout);
    let column = (slot % layout.columns) as f64;
    let row = (slot / layout.columns) as f64;
    (
        column * (cell_width + layout.cell_margin) + layout.edge_inset,
        page_size.height - (row + 1.0) * (cell_height + layout.cell_margin) + layout.edge_inset,
    )
}

/// Plan placements for pages with the given MediaBoxes, in page order
pub fn plan_grid(page_boxes: &[PdfRect], config: &LayoutConfig) -> GridPlan {
    let layout = &config.grid;
    let per_page = layout.per_page.max(1);
    let (cell_width, cell_height) = cell_size(&config.page_size, layout);

    let placements = page_boxes
        .iter()
        .enumerate()
        .map(|(count, page_box)| {
            let slot = count % per_page;
            let region = crop_region(page_box, &config.crop);
            let (x, y) = cell_origin(&config.page_size, layout, slot);
            GridPlacement {
                source_page: count as u32 + 1,
                output_page: count / per_page,
                slot,
                region,
                transform: PlacementTransform::fit(&region, cell_width, cell_height, x, y),
            }
        })
        .collect();

    GridPlan {
        page_count: page_boxes.len().div_ceil(per_page),
        placements,
    }
}

/// Reprint every page of `source` as an N-up grid
pub fn render_grid(
    source: &SourceDocument,
    config: &LayoutConfig,
) -> Result<OutputDocument, LabelPressError> {
    config.validate()?;
    let boxes: Vec<PdfRect> = source.pages().iter().map(|p| p.media_box).collect();
    let plan = plan_grid(&boxes, config);

    let mut out = OutputDocument::new(config.page_size);
    let mut importer = FormImporter::new(source);

    for (placement, page) in plan.placements.iter().zip(source.pages()) {
        if placement.slot == 0 {
            out.begin_page()?;
        }
        let form = importer.crop_to_form(&mut out, page, &placement.region)?;
        out.draw_form(&form, &placement.transform);
        let placed = placement.transform.placed_rect(form.width, form.height);
        tracing::debug!(
            "Placed page {} in slot {} of output page {} at ({:.1}, {:.1}), {:.1}x{:.1}",
            placement.source_page,
            placement.slot,
            placement.output_page + 1,
            placed.x,
            placed.y,
            placed.width,
            placed.height
        );
    }

    tracing::info!(
        "Grid layout: {} labels on {} pages",
        plan.placements.len(),
        plan.page_count
    );
    Ok(out)
}
