//! Thank-you leaflets
//!
//! A leaflet sheet is a grid of bordered cards, one per customer, filled row
//! by row from the top-left. The last sheet is padded with borderless
//! placeholder cells so cut lines stay aligned across a print run.

use crate::config::{LayoutConfig, LeafletLayout};
use crate::customer::{validate_customers, CustomerRecord};
use crate::error::LabelPressError;
use crate::geometry::{PageSize, PdfRect};
use crate::output::{OutputDocument, Stroke};
use crate::text::{fit_font_size, Align, StandardFont, StyledLine, TextBlock, Weight};
use serde::{Deserialize, Serialize};

const THANK_YOU_LINE: &str = "Thank you for choosing us!";
const DISPATCH_LINE: &str = "Your order has been dispatched.";
const CONTACT_LINE: &str = "For any queries, contact us on";
const RATING_LINE: &str = "Please rate us 5 stars \u{2B50}\u{2B50}\u{2B50}\u{2B50}\u{2B50} on the app!";
const SIGN_OFF_LINE: &str = "With love,";
const SIGNATURE_LINE: &str = "Your Seller";

fn greeting(name: &str) -> String {
    format!("Dear {},", name)
}

fn whatsapp(contact: &str) -> String {
    format!("WhatsApp: {}", contact)
}

/// The message as printed, one entry per line, blank entries separating
/// paragraphs
pub fn message_lines(name: &str, contact: &str) -> Vec<String> {
    vec![
        greeting(name),
        String::new(),
        THANK_YOU_LINE.to_string(),
        DISPATCH_LINE.to_string(),
        String::new(),
        CONTACT_LINE.to_string(),
        whatsapp(contact),
        String::new(),
        RATING_LINE.to_string(),
        String::new(),
        SIGN_OFF_LINE.to_string(),
        SIGNATURE_LINE.to_string(),
    ]
}

/// Full thank-you message for one customer
pub fn thank_you_message(name: &str, contact: &str) -> String {
    message_lines(name, contact).join("\n")
}

/// Styled paragraph stack of a leaflet card
pub fn card_block(name: &str, contact: &str) -> TextBlock {
    TextBlock::new(vec![
        StyledLine::new(greeting(name), Weight::Bold, 10.0, Align::Left).space_after(5.0),
        StyledLine::new(THANK_YOU_LINE, Weight::Bold, 9.0, Align::Center).space_after(3.0),
        StyledLine::new(DISPATCH_LINE, Weight::Regular, 8.0, Align::Center).space_after(5.0),
        StyledLine::new(CONTACT_LINE, Weight::Regular, 7.0, Align::Center).space_after(2.0),
        StyledLine::new(whatsapp(contact), Weight::Bold, 8.0, Align::Center).space_after(5.0),
        StyledLine::new(RATING_LINE, Weight::Regular, 7.0, Align::Center).space_after(5.0),
        StyledLine::new(SIGN_OFF_LINE, Weight::Regular, 7.0, Align::Right),
        StyledLine::new(SIGNATURE_LINE, Weight::Regular, 7.0, Align::Right),
    ])
}

/// Compact centered message used in the middle of hybrid pages.
///
/// Every line shares one font size, the largest up to `max_size` at which
/// the widest line still fits `width`.
pub fn compact_block(name: &str, contact: &str, max_size: f64, width: f64) -> TextBlock {
    let lines = message_lines(name, contact);
    let size = fit_font_size(&lines, StandardFont::Helvetica, max_size, width);
    TextBlock::new(
        lines
            .into_iter()
            .map(|line| StyledLine::new(line, Weight::Regular, size, Align::Center))
            .collect(),
    )
}

/// What occupies one slot of a leaflet sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeafletCell {
    /// Card for the customer at this index of the input list
    Card { customer_index: usize },
    /// Empty, borderless filler
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafletSheet {
    /// Slot contents, row by row from the top-left
    pub cells: Vec<LeafletCell>,
}

impl LeafletSheet {
    pub fn card_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, LeafletCell::Card { .. }))
            .count()
    }
}

/// Pagination of a customer list into leaflet sheets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafletPlan {
    pub sheets: Vec<LeafletSheet>,
}

impl LeafletPlan {
    pub fn page_count(&self) -> usize {
        self.sheets.len()
    }
}

/// Split `customer_count` cards into full sheets, padding the last one
pub fn plan_leaflets(customer_count: usize, layout: &LeafletLayout) -> LeafletPlan {
    let per_page = layout.per_page().max(1);
    let sheets = (0..customer_count)
        .collect::<Vec<_>>()
        .chunks(per_page)
        .map(|chunk| {
            let mut cells: Vec<LeafletCell> = chunk
                .iter()
                .map(|&customer_index| LeafletCell::Card { customer_index })
                .collect();
            cells.resize(per_page, LeafletCell::Placeholder);
            LeafletSheet { cells }
        })
        .collect();
    LeafletPlan { sheets }
}

/// Rectangle of `slot` on a leaflet sheet; slot 0 is top-left
pub fn cell_rect(page_size: &PageSize, layout: &LeafletLayout, slot: usize) -> PdfRect {
    let usable_width = page_size.width - 2.0 * layout.page_margin;
    let usable_height = page_size.height - 2.0 * layout.page_margin;
    let width = usable_width / layout.columns as f64;
    let height = usable_height / layout.rows as f64;

    let column = slot % layout.columns;
    let row = slot / layout.columns;
    PdfRect::new(
        layout.page_margin + column as f64 * width,
        page_size.height - layout.page_margin - (row + 1) as f64 * height,
        width,
        height,
    )
}

fn inset(rect: &PdfRect, by: f64) -> PdfRect {
    PdfRect::new(
        rect.x + by,
        rect.y + by,
        (rect.width - 2.0 * by).max(0.0),
        (rect.height - 2.0 * by).max(0.0),
    )
}

/// Render one sheet per planned page
pub fn render_leaflets(
    customers: &[CustomerRecord],
    config: &LayoutConfig,
) -> Result<OutputDocument, LabelPressError> {
    config.validate()?;
    validate_customers(customers)?;

    let layout = &config.leaflet;
    let plan = plan_leaflets(customers.len(), layout);
    let mut out = OutputDocument::new(config.page_size);

    for sheet in &plan.sheets {
        out.begin_page()?;
        for (slot, cell) in sheet.cells.iter().enumerate() {
            let LeafletCell::Card { customer_index } = *cell else {
                continue;
            };
            let rect = cell_rect(&config.page_size, layout, slot);
            out.stroke_rect(
                &rect,
                Stroke::Solid {
                    width: layout.border_width,
                },
            );

            let area = inset(&rect, layout.cell_padding);
            card_block(&customers[customer_index].name, &config.contact_number)
                .fit_to(area.width, area.height)
                .draw_top(&mut out, &area);
        }
    }

    tracing::info!(
        "Laid out {} leaflets on {} pages",
        customers.len(),
        plan.page_count()
    );
    Ok(out)
}
