//! Read-only access to the vendor label PDF
//!
//! Wraps a parsed `lopdf::Document` and exposes what the transform core needs:
//! 1-indexed pages, their MediaBox, their text split into lines, and the raw
//! content and resources used to lift a page into a Form XObject.

use crate::error::LabelPressError;
use crate::geometry::{PageSize, PdfRect};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::panic::AssertUnwindSafe;
use std::path::Path;

/// Guard against cyclic page trees and self-referencing forms
const MAX_NESTING: usize = 32;

/// Forms nested deeper than this are not searched for text
const MAX_FORM_DEPTH: usize = 8;

/// TJ adjustments below this (in thousandths of an em) read as a word gap
const TJ_SPACE_THRESHOLD: f32 = -100.0;

/// One page of the source document
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePage {
    /// 1-based page number
    pub number: u32,
    pub id: ObjectId,
    pub media_box: PdfRect,
}

/// A parsed label PDF
pub struct SourceDocument {
    doc: Document,
    pages: Vec<SourcePage>,
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("pages", &self.pages.len())
            .finish()
    }
}

impl SourceDocument {
    /// Open a PDF file for reading
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LabelPressError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            LabelPressError::UnreadableSource(format!("Cannot open {}: {}", path.display(), e))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Parse PDF bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LabelPressError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| LabelPressError::UnreadableSource(e.to_string()))?;
        Self::from_document(doc)
    }

    /// Wrap an already parsed document
    pub fn from_document(doc: Document) -> Result<Self, LabelPressError> {
        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(LabelPressError::UnreadableSource(
                "Password-protected PDFs are not supported".into(),
            ));
        }

        let pages: Vec<SourcePage> = doc
            .get_pages()
            .into_iter()
            .map(|(number, id)| SourcePage {
                number,
                id,
                media_box: media_box(&doc, id),
            })
            .collect();

        if pages.is_empty() {
            return Err(LabelPressError::UnreadableSource(
                "Source document has no pages".into(),
            ));
        }

        Ok(Self { doc, pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Pages in document order
    pub fn pages(&self) -> &[SourcePage] {
        &self.pages
    }

    /// Look up a page by its 1-based number
    pub fn page(&self, number: u32) -> Option<&SourcePage> {
        self.pages.iter().find(|p| p.number == number)
    }

    /// Full text of a page, one text line per `\n`-separated line.
    ///
    /// Decoding goes through pdf-extract, which honours simple font
    /// encodings as well as CID fonts with ToUnicode maps. When it fails on
    /// a page the content operators are walked directly instead.
    pub fn page_text(&self, page: &SourcePage) -> String {
        match self.font_aware_text(page) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => self.operator_text(page),
            Err(e) => {
                tracing::debug!("Page {}: {}; walking content operators", page.number, e);
                self.operator_text(page)
            }
        }
    }

    /// Non-blank page text lines, trimmed
    pub fn page_lines(&self, page: &SourcePage) -> Vec<String> {
        self.page_text(page)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn font_aware_text(&self, page: &SourcePage) -> Result<String, LabelPressError> {
        let bytes = self.single_page_bytes(page)?;

        // pdf-extract panics on some malformed fonts
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&bytes)
        }));

        match result {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(LabelPressError::UnreadableSource(format!(
                "Text extraction failed: {}",
                e
            ))),
            Err(_) => Err(LabelPressError::UnreadableSource(
                "Text extraction panicked".into(),
            )),
        }
    }

    /// Serialize a copy of the document that keeps only `page`
    fn single_page_bytes(&self, page: &SourcePage) -> Result<Vec<u8>, LabelPressError> {
        let mut single = self.doc.clone();
        let others: Vec<u32> = self
            .pages
            .iter()
            .map(|p| p.number)
            .filter(|&number| number != page.number)
            .collect();
        if !others.is_empty() {
            single.delete_pages(&others);
            single.prune_objects();
        }

        let mut buffer = Vec::new();
        single.save_to(&mut buffer).map_err(|e| {
            LabelPressError::UnreadableSource(format!("Cannot isolate page {}: {}", page.number, e))
        })?;
        Ok(buffer)
    }

    /// Text from walking the page's content operators, bytes decoded
    /// without consulting the font
    pub(crate) fn operator_text(&self, page: &SourcePage) -> String {
        let mut text = String::new();
        match self.doc.get_page_content(page.id) {
            Ok(content) => {
                let resources = self.page_resources(page).and_then(|r| self.as_dict(r));
                self.collect_text(&content, resources, 0, &mut text);
            }
            Err(e) => {
                tracing::warn!("Page {} has unreadable content: {}", page.number, e);
            }
        }
        text
    }

    pub(crate) fn document(&self) -> &Document {
        &self.doc
    }

    /// Concatenated, decompressed content streams of a page
    pub(crate) fn page_content(&self, page: &SourcePage) -> Result<Vec<u8>, LabelPressError> {
        self.doc.get_page_content(page.id).map_err(|e| {
            LabelPressError::UnreadableSource(format!(
                "Cannot read content of page {}: {}",
                page.number, e
            ))
        })
    }

    /// The page's Resources entry, inherited from the page tree if needed
    pub(crate) fn page_resources(&self, page: &SourcePage) -> Option<&Object> {
        inherited_attribute(&self.doc, page.id, b"Resources")
    }

    fn as_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        resolve(&self.doc, obj).as_dict().ok()
    }

    fn collect_text(
        &self,
        content: &[u8],
        resources: Option<&Dictionary>,
        depth: usize,
        out: &mut String,
    ) {
        let content = match Content::decode(content) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("Skipping undecodable content stream: {}", e);
                return;
            }
        };

        let mut last_x: Option<f32> = None;
        let mut last_y: Option<f32> = None;

        for op in &content.operations {
            match op.operator.as_str() {
                "Tj" | "TJ" => {
                    for operand in &op.operands {
                        push_operand_text(operand, out);
                    }
                }
                "'" | "\"" => {
                    break_line(out);
                    if let Some(operand) = op.operands.last() {
                        push_operand_text(operand, out);
                    }
                }
                "ET" | "T*" => break_line(out),
                "Td" | "TD" => {
                    let dx = op.operands.first().and_then(|o| o.as_float().ok());
                    let dy = op.operands.get(1).and_then(|o| o.as_float().ok());
                    if dy.is_some_and(|dy| dy != 0.0) {
                        break_line(out);
                    } else if dx.is_some_and(|dx| dx != 0.0) {
                        separate_words(out);
                    }
                }
                "Tm" => {
                    let x = op.operands.get(4).and_then(|o| o.as_float().ok());
                    let y = op.operands.get(5).and_then(|o| o.as_float().ok());
                    if let (Some(y), Some(previous)) = (y, last_y) {
                        if y != previous {
                            break_line(out);
                        } else if x != last_x {
                            separate_words(out);
                        }
                    }
                    last_x = x;
                    last_y = y;
                }
                "Do" if depth < MAX_FORM_DEPTH => {
                    let name = op.operands.first().and_then(|o| o.as_name().ok());
                    if let (Some(name), Some(resources)) = (name, resources) {
                        self.collect_form_text(name, resources, depth, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_form_text(
        &self,
        name: &[u8],
        resources: &Dictionary,
        depth: usize,
        out: &mut String,
    ) {
        let stream = resources
            .get(b"XObject")
            .ok()
            .and_then(|x| self.as_dict(x))
            .and_then(|xobjects| xobjects.get(name).ok())
            .map(|obj| resolve(&self.doc, obj))
            .and_then(|obj| obj.as_stream().ok());

        let Some(stream) = stream else {
            return;
        };

        let is_form = stream
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .is_ok_and(|subtype| subtype == b"Form");
        if !is_form {
            return;
        }

        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|r| self.as_dict(r))
            .or(Some(resources));

        self.collect_text(&content, form_resources, depth + 1, out);
    }
}

fn break_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Horizontal moves on the same line separate columns
fn separate_words(out: &mut String) {
    if !out.is_empty() && !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

fn push_operand_text(operand: &Object, out: &mut String) {
    match operand {
        Object::String(bytes, _) => out.push_str(&decode_pdf_string(bytes)),
        Object::Array(items) => {
            for item in items {
                match item {
                    Object::String(bytes, _) => out.push_str(&decode_pdf_string(bytes)),
                    Object::Integer(n) if (*n as f32) < TJ_SPACE_THRESHOLD => out.push(' '),
                    Object::Real(n) if *n < TJ_SPACE_THRESHOLD => out.push(' '),
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

/// Decode a PDF string: UTF-16BE with BOM, then UTF-8, then Latin-1
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        if let Ok(s) = String::from_utf16(&units) {
            return s;
        }
    }
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Follow a single indirect reference
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Look up a page attribute, walking up the page tree for inheritable keys
fn inherited_attribute<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = Some(page_id);
    let mut hops = 0;

    while let Some(id) = current {
        if hops > MAX_NESTING {
            break;
        }
        let dict = doc.get_object(id).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value));
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        hops += 1;
    }

    None
}

fn media_box(doc: &Document, page_id: ObjectId) -> PdfRect {
    let parsed = inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|obj| obj.as_array().ok())
        .and_then(|arr| parse_rect(doc, arr));

    parsed.unwrap_or_else(|| {
        tracing::debug!("Page {:?} has no usable MediaBox, assuming US Letter", page_id);
        PageSize::LETTER.rect()
    })
}

fn parse_rect(doc: &Document, arr: &[Object]) -> Option<PdfRect> {
    if arr.len() < 4 {
        return None;
    }
    let mut coords = [0.0f64; 4];
    for (slot, obj) in coords.iter_mut().zip(arr) {
        *slot = resolve(doc, obj).as_float().ok()? as f64;
    }
    let [x0, y0, x1, y1] = coords;
    let rect = PdfRect::new(x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs());
    (rect.width > 0.0 && rect.height > 0.0).then_some(rect)
}
