//! Customer name extraction
//!
//! Label pages carry an address block introduced by a "BILL TO" / "SHIP TO"
//! marker; the line right after the marker starts with the customer's name,
//! usually followed by the first part of the address. The cleanup heuristic
//! cuts the address off and normalizes what is left.

use crate::customer::CustomerRecord;
use crate::source::SourceDocument;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// Substrings (matched against the upper-cased line) that introduce an address block
pub const ADDRESS_MARKERS: &[&str] = &["BILL TO", "SHIP TO", "BILL TO / SHIP TO"];

lazy_static! {
    /// Address-type keyword and everything after it
    static ref ADDRESS_KEYWORD_PATTERN: Regex = Regex::new(
        r"(?i)\b(house|h\.no|h\.no\.|flat|apartment|apt|road|rd|street|st|lane|ln|area|sector|block|plot|pin|pincode|pin code|zip|postal|post|near|opp|opposite|behind|beside|next to|above|below)\b.*"
    )
    .unwrap();

    /// Region keyword or a bare six-digit pin code and everything after it
    static ref REGION_KEYWORD_PATTERN: Regex =
        Regex::new(r"(?i)\b(city|district|state|country|india|pin|pincode|\d{6})\b.*").unwrap();

    static ref LONG_DIGIT_RUN_PATTERN: Regex = Regex::new(r"\d{6,}").unwrap();

    static ref TRAILING_CLAUSE_PATTERN: Regex = Regex::new(r"[,;].*").unwrap();

    static ref WHITESPACE_PATTERN: Regex = Regex::new(r"\s+").unwrap();

    static ref ALL_DIGITS_PATTERN: Regex = Regex::new(r"^\d+$").unwrap();
}

/// True if the line introduces an address block
pub fn is_marker_line(line: &str) -> bool {
    let upper = line.trim().to_uppercase();
    ADDRESS_MARKERS.iter().any(|marker| upper.contains(marker))
}

/// Reduce a raw candidate line to a title-cased name.
///
/// Returns `None` when nothing name-like survives.
pub fn clean_customer_name(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }

    let cleaned = ADDRESS_KEYWORD_PATTERN.replace_all(raw, "");
    let cleaned = REGION_KEYWORD_PATTERN.replace_all(&cleaned, "");
    let cleaned = LONG_DIGIT_RUN_PATTERN.replace_all(&cleaned, "");
    let cleaned = TRAILING_CLAUSE_PATTERN.replace_all(&cleaned, "");
    let cleaned = WHITESPACE_PATTERN.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim();

    if ALL_DIGITS_PATTERN.is_match(cleaned) || cleaned.chars().count() < 2 {
        return None;
    }

    Some(
        cleaned
            .split_whitespace()
            .map(title_case)
            .collect::<Vec<_>>()
            .join(" "),
    )
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Scans label text for customer names, de-duplicating by exact cleaned name
#[derive(Debug, Default)]
pub struct NameExtractor {
    seen: HashSet<String>,
    customers: Vec<CustomerRecord>,
}

impl NameExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the lines of one page
    pub fn scan_lines<S: AsRef<str>>(&mut self, lines: &[S]) {
        for (i, line) in lines.iter().enumerate() {
            if !is_marker_line(line.as_ref()) {
                continue;
            }

            // A marker on the last line has nothing to harvest
            let Some(candidate) = lines.get(i + 1) else {
                continue;
            };

            match clean_customer_name(candidate.as_ref().trim()) {
                Some(name) => {
                    if self.seen.insert(name.clone()) {
                        self.customers.push(CustomerRecord::new(name));
                    }
                }
                None => {
                    tracing::debug!("Rejected name candidate {:?}", candidate.as_ref());
                }
            }
        }
    }

    /// Customers in first-seen order
    pub fn finish(self) -> Vec<CustomerRecord> {
        self.customers
    }

    /// Extract every customer from a label document, in page order
    pub fn extract(doc: &SourceDocument) -> Vec<CustomerRecord> {
        let mut extractor = Self::new();
        for page in doc.pages() {
            let lines = doc.page_lines(page);
            extractor.scan_lines(&lines);
        }
        let customers = extractor.finish();
        tracing::info!(
            "Extracted {} customers from {} pages",
            customers.len(),
            doc.page_count()
        );
        customers
    }
}
