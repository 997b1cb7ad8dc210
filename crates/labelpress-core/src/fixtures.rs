//! In-memory label PDFs for unit tests

use crate::geometry::PageSize;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::{BTreeMap, BTreeSet};

pub struct FixturePage {
    pub lines: Vec<String>,
    pub width: f64,
    pub height: f64,
}

impl FixturePage {
    pub fn a4(lines: &[&str]) -> Self {
        Self::sized(lines, PageSize::A4.width, PageSize::A4.height)
    }

    pub fn sized(lines: &[&str], width: f64, height: f64) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            width,
            height,
        }
    }
}

/// One BT/ET block per line so each line extracts on its own
fn text_operations(lines: &[String], top: f64) -> Vec<Operation> {
    let mut ops = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), Object::Integer(10)],
        ));
        ops.push(Operation::new(
            "Td",
            vec![
                Object::Real(40.0),
                Object::Real((top - 14.0 * i as f64) as f32),
            ],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(line.as_bytes().to_vec())],
        ));
        ops.push(Operation::new("ET", vec![]));
    }
    ops
}

fn font_resources(doc: &mut Document) -> Dictionary {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font_id) },
    }
}

fn finish(mut doc: Document, pages_id: ObjectId, page_ids: Vec<ObjectId>) -> Vec<u8> {
    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => page_ids.len() as i64,
        "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn media_box(width: f64, height: f64) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(width as f32),
        Object::Real(height as f32),
    ])
}

/// Build a PDF with one page per fixture, text in the label band
pub fn label_pdf(pages: &[FixturePage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let resources = font_resources(&mut doc);
    let resources_id = doc.add_object(resources);

    let mut page_ids = Vec::new();
    for page in pages {
        let content = Content {
            operations: text_operations(&page.lines, page.height * 0.65),
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => media_box(page.width, page.height),
            "Resources" => Object::Reference(resources_id),
            "Contents" => Object::Reference(content_id),
        });
        page_ids.push(page_id);
    }

    finish(doc, pages_id, page_ids)
}

/// Build a labelled page for each entry of `labels`: a marker line, the raw
/// name line, and some order noise
pub fn labelled_pdf(labels: &[&str]) -> Vec<u8> {
    let pages: Vec<FixturePage> = labels
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let order = format!("Order No: 1234567{}", i + 1);
            FixturePage::a4(&["Customer Address", "BILL TO / SHIP TO", raw, &order])
        })
        .collect();
    label_pdf(&pages)
}

/// Single A4 page whose text lives inside a Form XObject
pub fn label_pdf_with_form(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_resources = font_resources(&mut doc);

    let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    let form_content = Content {
        operations: text_operations(&lines, 500.0),
    };
    let form_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => media_box(PageSize::A4.width, PageSize::A4.height),
            "Resources" => font_resources,
        },
        form_content.encode().unwrap(),
    ));

    let page_content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("Do", vec![Object::Name(b"Fm0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), page_content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => media_box(PageSize::A4.width, PageSize::A4.height),
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Fm0" => Object::Reference(form_id) },
        },
        "Contents" => Object::Reference(content_id),
    });

    finish(doc, pages_id, vec![page_id])
}

/// Single A4 page whose content is exactly `operations`, with the
/// Helvetica resources available as F1
pub fn operations_pdf(operations: Vec<Operation>) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let resources = font_resources(&mut doc);

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => media_box(PageSize::A4.width, PageSize::A4.height),
        "Resources" => resources,
        "Contents" => Object::Reference(content_id),
    });

    finish(doc, pages_id, vec![page_id])
}

/// Glyph ID assigned to each distinct character, starting at 1
fn glyph_ids(lines: &[&str]) -> BTreeMap<char, u16> {
    let chars: BTreeSet<char> = lines.iter().flat_map(|l| l.chars()).collect();
    chars
        .into_iter()
        .enumerate()
        .map(|(i, c)| (c, i as u16 + 1))
        .collect()
}

fn to_unicode_cmap(glyphs: &BTreeMap<char, u16>) -> Vec<u8> {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );
    cmap.push_str(&format!("{} beginbfchar\n", glyphs.len()));
    for (c, gid) in glyphs {
        cmap.push_str(&format!("<{:04X}> <{:04X}>\n", gid, *c as u32));
    }
    cmap.push_str(
        "endbfchar\n\
         endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap.into_bytes()
}

/// Single A4 page drawn with a Type0 font in Identity-H encoding.
///
/// Strings in the content stream are two-byte glyph IDs, only readable
/// through the font's ToUnicode map.
pub fn type0_label_pdf(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let glyphs = glyph_ids(lines);

    let to_unicode_id = doc.add_object(Stream::new(Dictionary::new(), to_unicode_cmap(&glyphs)));
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => "LabelSans",
        "Flags" => 32,
        "FontBBox" => vec![
            Object::Integer(0),
            Object::Integer(-200),
            Object::Integer(1000),
            Object::Integer(800),
        ],
        "ItalicAngle" => 0,
        "Ascent" => 800,
        "Descent" => -200,
        "CapHeight" => 700,
        "StemV" => 80,
    });
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "LabelSans",
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => Object::Reference(descriptor_id),
        "DW" => 500,
        "CIDToGIDMap" => "Identity",
    });
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "LabelSans",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => Object::Reference(to_unicode_id),
    });

    let mut operations = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let encoded: Vec<u8> = line
            .chars()
            .flat_map(|c| glyphs[&c].to_be_bytes())
            .collect();
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), Object::Integer(10)],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Real(40.0), Object::Real(550.0 - 14.0 * i as f32)],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(encoded, StringFormat::Hexadecimal)],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => media_box(PageSize::A4.width, PageSize::A4.height),
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => Object::Reference(font_id) },
        },
        "Contents" => Object::Reference(content_id),
    });

    finish(doc, pages_id, vec![page_id])
}
