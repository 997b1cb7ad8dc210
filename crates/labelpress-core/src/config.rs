//! Layout policy constants
//!
//! Every fraction and inset the compositors use lives here so the layouts can
//! be tuned without touching the algorithms. Defaults reproduce the stock
//! templates; a JSON file may override any subset of fields.

use crate::error::LabelPressError;
use crate::geometry::PageSize;
use crate::hybrid::LEAFLET_PADDING;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a JSON layout file
pub const CONFIG_ENV_VAR: &str = "LABELPRESS_CONFIG";

/// WhatsApp number printed on every leaflet
pub const DEFAULT_CONTACT_NUMBER: &str = "+91 7860861434";

/// Fractions of the source page that make up the label crop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CropFractions {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for CropFractions {
    fn default() -> Self {
        Self {
            x: 0.05,
            y: 0.30,
            width: 0.90,
            height: 0.40,
        }
    }
}

/// N-up grid reprint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridLayout {
    pub per_page: usize,
    pub columns: usize,
    /// Subtracted from each half-page dimension to get the cell size
    pub cell_margin: f64,
    /// Offset of the first cell from the page edge
    pub edge_inset: f64,
}

impl GridLayout {
    pub fn rows(&self) -> usize {
        self.per_page.div_ceil(self.columns)
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            per_page: 4,
            columns: 2,
            cell_margin: 20.0,
            edge_inset: 10.0,
        }
    }
}

/// Corner bills plus center leaflets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HybridLayout {
    pub corner_inset: f64,
    /// Corner cell width as a fraction of page width
    pub corner_width: f64,
    /// Corner cell height as a fraction of page height
    pub corner_height: f64,
    pub center_width: f64,
    pub center_height: f64,
    pub leaflet_gap: f64,
    /// Upper bound; text shrinks further when a line would overflow
    pub leaflet_font_size: f64,
}

impl Default for HybridLayout {
    fn default() -> Self {
        Self {
            corner_inset: 10.0,
            corner_width: 0.4,
            corner_height: 0.25,
            center_width: 0.6,
            center_height: 0.5,
            leaflet_gap: 10.0,
            leaflet_font_size: 10.0,
        }
    }
}

/// Standalone leaflet sheet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LeafletLayout {
    pub columns: usize,
    pub rows: usize,
    pub page_margin: f64,
    pub cell_padding: f64,
    pub border_width: f64,
}

impl LeafletLayout {
    pub fn per_page(&self) -> usize {
        self.columns * self.rows
    }
}

impl Default for LeafletLayout {
    fn default() -> Self {
        Self {
            columns: 2,
            rows: 4,
            page_margin: 20.0,
            cell_padding: 8.0,
            border_width: 1.0,
        }
    }
}

/// Complete layout configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub page_size: PageSize,
    pub crop: CropFractions,
    pub grid: GridLayout,
    pub hybrid: HybridLayout,
    pub leaflet: LeafletLayout,
    pub contact_number: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            crop: CropFractions::default(),
            grid: GridLayout::default(),
            hybrid: HybridLayout::default(),
            leaflet: LeafletLayout::default(),
            contact_number: DEFAULT_CONTACT_NUMBER.to_string(),
        }
    }
}

impl LayoutConfig {
    /// Parse a (possibly partial) JSON configuration
    pub fn from_json(json: &str) -> Result<Self, LabelPressError> {
        let config: LayoutConfig = serde_json::from_str(json)
            .map_err(|e| LabelPressError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LabelPressError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LabelPressError::InvalidConfig(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Load from the file named by `LABELPRESS_CONFIG`, or defaults when unset
    pub fn from_env() -> Result<Self, LabelPressError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Reject values that would yield empty or inverted cells
    pub fn validate(&self) -> Result<(), LabelPressError> {
        let invalid = |msg: &str| Err(LabelPressError::InvalidConfig(msg.to_string()));

        if self.page_size.width <= 0.0 || self.page_size.height <= 0.0 {
            return invalid("page size must be positive");
        }

        let crop = &self.crop;
        if crop.width <= 0.0 || crop.height <= 0.0 {
            return invalid("crop width and height must be positive");
        }
        if crop.x < 0.0 || crop.y < 0.0 || crop.x + crop.width > 1.0 || crop.y + crop.height > 1.0
        {
            return invalid("crop region must lie within the page");
        }

        for (name, value) in [
            ("grid edge_inset", self.grid.edge_inset),
            ("grid cell_margin", self.grid.cell_margin),
            ("hybrid corner_inset", self.hybrid.corner_inset),
            ("hybrid leaflet_gap", self.hybrid.leaflet_gap),
            ("leaflet page_margin", self.leaflet.page_margin),
            ("leaflet cell_padding", self.leaflet.cell_padding),
            ("leaflet border_width", self.leaflet.border_width),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LabelPressError::InvalidConfig(format!(
                    "{} must be a non-negative number",
                    name
                )));
            }
        }

        let grid = &self.grid;
        if grid.per_page == 0 || grid.columns == 0 {
            return invalid("grid needs at least one column and one bill per page");
        }
        let cell_width = self.page_size.width / grid.columns as f64 - grid.cell_margin;
        let cell_height = self.page_size.height / grid.rows() as f64 - grid.cell_margin;
        if cell_width <= 0.0 || cell_height <= 0.0 {
            return invalid("grid cell margin leaves no room for bills");
        }

        let hybrid = &self.hybrid;
        for (name, fraction) in [
            ("corner_width", hybrid.corner_width),
            ("corner_height", hybrid.corner_height),
            ("center_width", hybrid.center_width),
            ("center_height", hybrid.center_height),
        ] {
            if fraction <= 0.0 || fraction > 1.0 {
                return Err(LabelPressError::InvalidConfig(format!(
                    "hybrid {} must be in (0, 1]",
                    name
                )));
            }
        }
        if hybrid.leaflet_font_size <= 0.0 {
            return invalid("hybrid leaflet font size must be positive");
        }
        let center_text_width = self.page_size.width * hybrid.center_width / 2.0
            - hybrid.leaflet_gap
            - 2.0 * LEAFLET_PADDING;
        let center_text_height = self.page_size.height * hybrid.center_height / 2.0
            - hybrid.leaflet_gap
            - 2.0 * LEAFLET_PADDING;
        if center_text_width <= 0.0 || center_text_height <= 0.0 {
            return invalid("hybrid leaflet gap leaves no room for leaflet text");
        }

        let leaflet = &self.leaflet;
        if leaflet.columns == 0 || leaflet.rows == 0 {
            return invalid("leaflet grid needs at least one row and column");
        }
        if self.page_size.width - 2.0 * leaflet.page_margin <= 0.0
            || self.page_size.height - 2.0 * leaflet.page_margin <= 0.0
        {
            return invalid("leaflet page margin leaves no room for cards");
        }
        let card_width = (self.page_size.width - 2.0 * leaflet.page_margin)
            / leaflet.columns as f64
            - 2.0 * leaflet.cell_padding;
        let card_height = (self.page_size.height - 2.0 * leaflet.page_margin)
            / leaflet.rows as f64
            - 2.0 * leaflet.cell_padding;
        if card_width <= 0.0 || card_height <= 0.0 {
            return invalid("leaflet cell padding leaves no room for text");
        }

        Ok(())
    }
}
