//! Shipping-label PDF transforms
//!
//! This crate turns a vendor shipping-label PDF (one label per page) into
//! derivative PDFs using lopdf:
//! - `compose_grid`: N-up reprint of the cropped labels
//! - `layout_leaflets`: personalized thank-you cards, 8 to a page
//! - `compose_hybrid`: four labels in the corners with matching leaflets in the middle
//!
//! Customer names for the leaflets are mined from the label text by
//! `extract_customers`.

pub mod config;
pub mod crop;
pub mod customer;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod hybrid;
pub mod leaflet;
pub mod names;
pub mod output;
pub mod source;
pub mod text;

#[cfg(test)]
mod fixtures;

pub use config::LayoutConfig;
pub use customer::{validate_customers, CustomerRecord};
pub use error::LabelPressError;
pub use geometry::{CropRegion, PageSize, PdfRect, PlacementTransform};
pub use grid::{plan_grid, render_grid, GridPlan};
pub use hybrid::{plan_hybrid, render_hybrid, HybridPlan};
pub use leaflet::{plan_leaflets, render_leaflets, thank_you_message, LeafletPlan};
pub use names::{clean_customer_name, NameExtractor};
pub use output::OutputDocument;
pub use source::SourceDocument;

use std::path::{Path, PathBuf};

/// Timestamp format used in generated file names
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name for a generated file: `{operation}_{stem}_{timestamp}.pdf`, or
/// `{operation}_{timestamp}.pdf` when there is no input file
pub fn output_file_name(
    operation: &str,
    input: Option<&Path>,
    timestamp: chrono::NaiveDateTime,
) -> String {
    let stamp = timestamp.format(TIMESTAMP_FORMAT);
    let stem = input
        .and_then(Path::file_stem)
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty());
    match stem {
        Some(stem) => format!("{}_{}_{}.pdf", operation, stem, stamp),
        None => format!("{}_{}.pdf", operation, stamp),
    }
}

fn output_path(
    out_dir: &Path,
    operation: &str,
    input: Option<&Path>,
) -> Result<PathBuf, LabelPressError> {
    std::fs::create_dir_all(out_dir).map_err(|e| {
        LabelPressError::WriteFailure(format!("Cannot create {}: {}", out_dir.display(), e))
    })?;
    let name = output_file_name(operation, input, chrono::Local::now().naive_local());
    Ok(out_dir.join(name))
}

/// Customer names found on the labels of `path`, in first-seen order
pub fn extract_customers(path: impl AsRef<Path>) -> Result<Vec<CustomerRecord>, LabelPressError> {
    let source = SourceDocument::load(path)?;
    let customers = NameExtractor::extract(&source);
    if customers.is_empty() {
        return Err(LabelPressError::NoCustomersFound);
    }
    Ok(customers)
}

/// Write an N-up reprint of `path` into `out_dir` and return the new file
pub fn compose_grid(
    path: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &LayoutConfig,
) -> Result<PathBuf, LabelPressError> {
    let path = path.as_ref();
    let source = SourceDocument::load(path)?;
    let out = render_grid(&source, config)?;

    let target = output_path(out_dir.as_ref(), "grid", Some(path))?;
    out.save(&target)?;
    tracing::info!("Saved grid layout to {}", target.display());
    Ok(target)
}

/// Write hybrid pages for `path` and `customers` into `out_dir`
pub fn compose_hybrid(
    path: impl AsRef<Path>,
    customers: &[CustomerRecord],
    out_dir: impl AsRef<Path>,
    config: &LayoutConfig,
) -> Result<PathBuf, LabelPressError> {
    let path = path.as_ref();
    let source = SourceDocument::load(path)?;
    let out = render_hybrid(&source, customers, config)?;

    let target = output_path(out_dir.as_ref(), "hybrid", Some(path))?;
    out.save(&target)?;
    tracing::info!("Saved hybrid layout to {}", target.display());
    Ok(target)
}

/// Write a leaflet sheet for `customers` into `out_dir`
pub fn layout_leaflets(
    customers: &[CustomerRecord],
    out_dir: impl AsRef<Path>,
    config: &LayoutConfig,
) -> Result<PathBuf, LabelPressError> {
    let out = render_leaflets(customers, config)?;

    let target = output_path(out_dir.as_ref(), "leaflets", None)?;
    out.save(&target)?;
    tracing::info!("Saved leaflets to {}", target.display());
    Ok(target)
}
