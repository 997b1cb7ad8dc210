//! Label PDF fixtures written to disk

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};

pub const A4: (f32, f32) = (595.28, 841.89);

/// A4 page per entry, each with an address block whose name line is `raw`
pub fn label_document(raw_names: &[&str]) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids = Vec::new();
    for (i, raw) in raw_names.iter().enumerate() {
        let order = format!("Order No: 99{:04}", i + 1);
        let lines = ["Tax Invoice", "BILL TO / SHIP TO", raw, order.as_str()];

        let mut operations = Vec::new();
        for (n, line) in lines.iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(11)]));
            operations.push(Operation::new(
                "Td",
                vec![Object::Integer(40), Object::Real(540.0 - 16.0 * n as f32)],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(line.as_bytes().to_vec())],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(A4.0),
                Object::Real(A4.1),
            ],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

/// Save a label PDF into `dir` and return its path
pub fn write_label_pdf(dir: &Path, file_name: &str, raw_names: &[&str]) -> PathBuf {
    let path = dir.join(file_name);
    let mut doc = label_document(raw_names);
    doc.save(&path).unwrap();
    path
}

pub fn page_count(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}
