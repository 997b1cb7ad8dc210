//! Output document assembly
//!
//! `OutputDocument` builds a fresh PDF page by page. Pages are append-only:
//! drawing always targets the most recently started page, and its operations
//! are flushed into a content stream when the next page begins or the
//! document is finished.
//!
//! `FormImporter` lifts a rectangle of a source page into a Form XObject of
//! the output document. Objects the page depends on are copied over once per
//! source document with their references remapped to fresh IDs.

use crate::error::LabelPressError;
use crate::geometry::{CropRegion, PageSize, PdfRect, PlacementTransform};
use crate::source::{SourceDocument, SourcePage};
use crate::text::StandardFont;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// A Form XObject that has been added to the output document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormXObject {
    pub id: ObjectId,
    /// Width and height of the form's bounding box
    pub width: f64,
    pub height: f64,
}

/// Border style for rectangles
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stroke {
    Solid { width: f64 },
    Dashed { width: f64, on: f64, off: f64 },
}

/// Drawing operations and resources of the page being built
#[derive(Debug, Default)]
struct PageCanvas {
    operations: Vec<Operation>,
    xobjects: Dictionary,
    fonts: Dictionary,
}

/// An append-only PDF under construction
pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    page_size: PageSize,
    current: Option<PageCanvas>,
    font_ids: BTreeMap<StandardFont, ObjectId>,
    form_count: usize,
}

impl OutputDocument {
    pub fn new(page_size: PageSize) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            page_size,
            current: None,
            font_ids: BTreeMap::new(),
            form_count: 0,
        }
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Pages started so far, including the one being drawn
    pub fn page_count(&self) -> usize {
        self.page_ids.len() + usize::from(self.current.is_some())
    }

    /// Close the current page (if any) and start a new blank one
    pub fn begin_page(&mut self) -> Result<(), LabelPressError> {
        self.flush_page()?;
        self.current = Some(PageCanvas::default());
        Ok(())
    }

    fn canvas(&mut self) -> &mut PageCanvas {
        self.current.get_or_insert_with(PageCanvas::default)
    }

    /// Draw `form` with a uniform scale and translation
    pub fn draw_form(&mut self, form: &FormXObject, transform: &PlacementTransform) {
        self.form_count += 1;
        let name = format!("Fm{}", self.form_count);
        tracing::trace!(
            "Drawing {:.1}x{:.1} form as {}",
            form.width,
            form.height,
            name
        );
        let canvas = self.canvas();
        canvas
            .xobjects
            .set(name.as_bytes().to_vec(), Object::Reference(form.id));
        canvas.operations.push(Operation::new("q", vec![]));
        canvas.operations.push(Operation::new(
            "cm",
            transform.matrix().iter().map(|&v| real(v)).collect(),
        ));
        canvas
            .operations
            .push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        canvas.operations.push(Operation::new("Q", vec![]));
    }

    /// Stroke a rectangle outline
    pub fn stroke_rect(&mut self, rect: &PdfRect, stroke: Stroke) {
        let ops = &mut self.canvas().operations;
        ops.push(Operation::new("q", vec![]));
        match stroke {
            Stroke::Solid { width } => {
                ops.push(Operation::new("w", vec![real(width)]));
            }
            Stroke::Dashed { width, on, off } => {
                ops.push(Operation::new("w", vec![real(width)]));
                ops.push(Operation::new(
                    "d",
                    vec![Object::Array(vec![real(on), real(off)]), Object::Integer(0)],
                ));
            }
        }
        ops.push(Operation::new("G", vec![Object::Integer(0)]));
        ops.push(Operation::new(
            "re",
            vec![real(rect.x), real(rect.y), real(rect.width), real(rect.height)],
        ));
        ops.push(Operation::new("S", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }

    /// Resource name for a standard font, registering it on first use
    pub(crate) fn use_font(&mut self, font: StandardFont) -> Vec<u8> {
        let id = match self.font_ids.get(&font) {
            Some(&id) => id,
            None => {
                let mut dict = dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => font.base_font(),
                };
                if font.uses_win_ansi() {
                    dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
                }
                let id = self.doc.add_object(dict);
                self.font_ids.insert(font, id);
                id
            }
        };

        let name = font.resource_name().as_bytes().to_vec();
        self.canvas().fonts.set(name.clone(), Object::Reference(id));
        name
    }

    /// Append raw operations to the current page
    pub(crate) fn push_operations(&mut self, ops: Vec<Operation>) {
        self.canvas().operations.extend(ops);
    }

    fn flush_page(&mut self) -> Result<(), LabelPressError> {
        let Some(canvas) = self.current.take() else {
            return Ok(());
        };

        let content = Content {
            operations: canvas.operations,
        }
        .encode()
        .map_err(|e| {
            LabelPressError::WriteFailure(format!("Failed to encode page content: {}", e))
        })?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));

        let mut resources = Dictionary::new();
        if !canvas.fonts.is_empty() {
            resources.set("Font", Object::Dictionary(canvas.fonts));
        }
        if !canvas.xobjects.is_empty() {
            resources.set("XObject", Object::Dictionary(canvas.xobjects));
        }

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(self.pages_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                real(self.page_size.width),
                real(self.page_size.height),
            ],
            "Resources" => resources,
            "Contents" => Object::Reference(content_id),
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    /// Flush the last page, build the page tree, and serialize
    pub fn finish(mut self) -> Result<Vec<u8>, LabelPressError> {
        self.flush_page()?;

        let kids: Vec<Object> = self.page_ids.iter().map(|&id| Object::Reference(id)).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(self.pages_id),
        });
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| LabelPressError::WriteFailure(format!("Failed to serialize PDF: {}", e)))?;
        Ok(buffer)
    }

    /// Serialize and write to `path` atomically
    pub fn save(self, path: impl AsRef<Path>) -> Result<(), LabelPressError> {
        let bytes = self.finish()?;
        write_atomically(path.as_ref(), &bytes)
    }
}

/// Write through a temporary file in the destination directory, then rename
/// it into place so readers never observe a partial PDF
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), LabelPressError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        LabelPressError::WriteFailure(format!("Cannot create file in {}: {}", dir.display(), e))
    })?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| LabelPressError::WriteFailure(e.to_string()))?;
    tmp.persist(path).map_err(|e| {
        LabelPressError::WriteFailure(format!("Cannot write {}: {}", path.display(), e.error))
    })?;

    tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// Copies page regions of one source document into an output document
pub struct FormImporter<'a> {
    source: &'a SourceDocument,
    remapped: BTreeMap<ObjectId, ObjectId>,
}

impl<'a> FormImporter<'a> {
    pub fn new(source: &'a SourceDocument) -> Self {
        Self {
            source,
            remapped: BTreeMap::new(),
        }
    }

    /// Create a Form XObject holding exactly `region` of `page`, with the
    /// region's lower-left corner at the form's local origin
    pub fn crop_to_form(
        &mut self,
        out: &mut OutputDocument,
        page: &SourcePage,
        region: &CropRegion,
    ) -> Result<FormXObject, LabelPressError> {
        let content = self.source.page_content(page)?;

        let resources = match self.source.page_resources(page) {
            Some(resources) => self.remap(&mut out.doc, resources.clone()),
            None => Object::Dictionary(Dictionary::new()),
        };

        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => 1,
            "BBox" => vec![
                real(region.x),
                real(region.y),
                real(region.right()),
                real(region.top()),
            ],
            "Matrix" => vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                real(-region.x),
                real(-region.y),
            ],
            "Resources" => resources,
        };

        let id = out.doc.add_object(Stream::new(dict, content));
        Ok(FormXObject {
            id,
            width: region.width,
            height: region.height,
        })
    }

    /// Objects copied so far
    #[cfg(test)]
    fn imported_count(&self) -> usize {
        self.remapped.len()
    }

    fn import(&mut self, out: &mut Document, id: ObjectId) -> ObjectId {
        if let Some(&new_id) = self.remapped.get(&id) {
            return new_id;
        }

        // Reserve the new ID before recursing so cycles terminate
        let new_id = out.new_object_id();
        self.remapped.insert(id, new_id);

        let object = match self.source.document().get_object(id) {
            Ok(object) => self.remap(out, object.clone()),
            Err(_) => {
                tracing::warn!("Dangling reference {} {} R replaced with null", id.0, id.1);
                Object::Null
            }
        };
        out.objects.insert(new_id, object);
        new_id
    }

    fn remap(&mut self, out: &mut Document, object: Object) -> Object {
        match object {
            Object::Reference(id) => Object::Reference(self.import(out, id)),
            Object::Array(items) => {
                Object::Array(items.into_iter().map(|o| self.remap(out, o)).collect())
            }
            Object::Dictionary(dict) => Object::Dictionary(self.remap_dict(out, &dict)),
            Object::Stream(mut stream) => {
                stream.dict = self.remap_dict(out, &stream.dict);
                Object::Stream(stream)
            }
            other => other,
        }
    }

    fn remap_dict(&mut self, out: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut remapped = Dictionary::new();
        for (key, value) in dict.iter() {
            // Back-links into the page tree would drag the whole source along
            if key.as_slice() == b"Parent" {
                continue;
            }
            remapped.set(key.clone(), self.remap(out, value.clone()));
        }
        remapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{label_pdf, FixturePage};

    fn page_operators(bytes: &[u8], page_number: u32) -> Vec<String> {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = doc.get_pages()[&page_number];
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        content.operations.into_iter().map(|op| op.operator).collect()
    }

    #[test]
    fn test_empty_document_has_no_pages() {
        let out = OutputDocument::new(PageSize::A4);
        assert_eq!(out.page_count(), 0);
        let bytes = out.finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 0);
    }

    #[test]
    fn test_pages_are_appended_in_order() {
        let mut out = OutputDocument::new(PageSize::A4);
        out.begin_page().unwrap();
        out.stroke_rect(&PdfRect::new(10.0, 10.0, 50.0, 50.0), Stroke::Solid { width: 1.0 });
        out.begin_page().unwrap();
        out.begin_page().unwrap();
        assert_eq!(out.page_count(), 3);

        let bytes = out.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
        assert!(page_operators(&bytes, 1).contains(&"re".to_string()));
        assert!(page_operators(&bytes, 2).is_empty());
    }

    #[test]
    fn test_dashed_stroke_sets_dash_pattern() {
        let mut out = OutputDocument::new(PageSize::A4);
        out.begin_page().unwrap();
        out.stroke_rect(
            &PdfRect::new(0.0, 0.0, 10.0, 10.0),
            Stroke::Dashed {
                width: 0.5,
                on: 1.0,
                off: 2.0,
            },
        );
        let bytes = out.finish().unwrap();
        assert!(page_operators(&bytes, 1).contains(&"d".to_string()));
    }

    #[test]
    fn test_crop_to_form_sets_bbox_and_matrix() {
        let pdf = label_pdf(&[FixturePage::a4(&["BILL TO", "Rafey Khan"])]);
        let source = SourceDocument::from_bytes(&pdf).unwrap();
        let mut out = OutputDocument::new(PageSize::A4);
        let mut importer = FormImporter::new(&source);

        let region = PdfRect::new(30.0, 250.0, 500.0, 300.0);
        let form = importer
            .crop_to_form(&mut out, &source.pages()[0], &region)
            .unwrap();
        assert_eq!((form.width, form.height), (500.0, 300.0));

        let stream = out.doc.get_object(form.id).unwrap().as_stream().unwrap();
        let bbox = stream.dict.get(b"BBox").unwrap().as_array().unwrap();
        let bbox: Vec<f32> = bbox.iter().map(|o| o.as_float().unwrap()).collect();
        assert_eq!(bbox, vec![30.0, 250.0, 530.0, 550.0]);

        let matrix = stream.dict.get(b"Matrix").unwrap().as_array().unwrap();
        let matrix: Vec<f32> = matrix.iter().map(|o| o.as_float().unwrap()).collect();
        assert_eq!(matrix, vec![1.0, 0.0, 0.0, 1.0, -30.0, -250.0]);
    }

    #[test]
    fn test_shared_resources_are_imported_once() {
        let pdf = label_pdf(&[FixturePage::a4(&["one"]), FixturePage::a4(&["two"])]);
        let source = SourceDocument::from_bytes(&pdf).unwrap();
        let mut out = OutputDocument::new(PageSize::A4);
        let mut importer = FormImporter::new(&source);
        let region = PdfRect::new(0.0, 0.0, 100.0, 100.0);

        importer
            .crop_to_form(&mut out, &source.pages()[0], &region)
            .unwrap();
        let after_first = importer.imported_count();
        importer
            .crop_to_form(&mut out, &source.pages()[1], &region)
            .unwrap();
        assert!(after_first > 0);
        assert_eq!(importer.imported_count(), after_first);
    }

    #[test]
    fn test_draw_form_emits_transform() {
        let pdf = label_pdf(&[FixturePage::a4(&["BILL TO", "Rafey Khan"])]);
        let source = SourceDocument::from_bytes(&pdf).unwrap();
        let mut out = OutputDocument::new(PageSize::A4);
        let mut importer = FormImporter::new(&source);
        let form = importer
            .crop_to_form(&mut out, &source.pages()[0], &PdfRect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();

        out.begin_page().unwrap();
        out.draw_form(
            &form,
            &PlacementTransform {
                scale: 0.5,
                translate_x: 10.0,
                translate_y: 20.0,
            },
        );
        let bytes = out.finish().unwrap();
        assert_eq!(page_operators(&bytes, 1), vec!["q", "cm", "Do", "Q"]);
    }

    #[test]
    fn test_save_writes_file_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let mut out = OutputDocument::new(PageSize::A4);
        out.begin_page().unwrap();
        out.save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        // Only the final file remains, no temp leftovers
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.pdf");
        let mut out = OutputDocument::new(PageSize::A4);
        out.begin_page().unwrap();
        let result = out.save(&path);
        assert!(matches!(result, Err(LabelPressError::WriteFailure(_))));
        assert!(!path.exists());
    }
}
