//! Styled text blocks on standard PDF fonts
//!
//! Only the standard-14 fonts are used, so nothing is embedded. Latin text is
//! encoded with WinAnsiEncoding and measured with the Helvetica AFM widths;
//! star glyphs are drawn from ZapfDingbats. Characters neither font can show
//! are replaced with `?`.

use crate::geometry::PdfRect;
use crate::output::OutputDocument;
use lopdf::content::Operation;
use lopdf::{Object, StringFormat};

/// Line height as a multiple of font size
pub const LEADING: f64 = 1.2;

/// Glyph widths for codes 32..=126, in thousandths of an em
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Width used for Latin-1 characters outside the ASCII table
const FALLBACK_WIDTH: u16 = 556;

/// ZapfDingbats code for a filled star
const DINGBAT_STAR: u8 = 0x48;
const DINGBAT_STAR_WIDTH: u16 = 816;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    ZapfDingbats,
}

impl StandardFont {
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::ZapfDingbats => "ZapfDingbats",
        }
    }

    pub fn resource_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
            StandardFont::ZapfDingbats => "F3",
        }
    }

    /// Symbol fonts carry their own built-in encoding
    pub fn uses_win_ansi(&self) -> bool {
        !matches!(self, StandardFont::ZapfDingbats)
    }

    fn code_width(&self, code: u8) -> u16 {
        let table = match self {
            StandardFont::Helvetica => &HELVETICA_WIDTHS,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
            StandardFont::ZapfDingbats => return DINGBAT_STAR_WIDTH,
        };
        match code {
            32..=126 => table[(code - 32) as usize],
            _ => FALLBACK_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

impl Weight {
    pub fn font(&self) -> StandardFont {
        match self {
            Weight::Regular => StandardFont::Helvetica,
            Weight::Bold => StandardFont::HelveticaBold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// A run of consecutive characters drawn with one font
#[derive(Debug, Clone, PartialEq)]
struct Run {
    font: StandardFont,
    bytes: Vec<u8>,
    /// Sum of glyph widths, thousandths of an em
    width: u32,
}

fn is_star(c: char) -> bool {
    matches!(c, '\u{2B50}' | '\u{2605}')
}

/// WinAnsiEncoding byte for `c`, if it has one
pub fn win_ansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => match c {
            '\u{20AC}' => Some(0x80),
            '\u{201A}' => Some(0x82),
            '\u{0192}' => Some(0x83),
            '\u{201E}' => Some(0x84),
            '\u{2026}' => Some(0x85),
            '\u{2020}' => Some(0x86),
            '\u{2021}' => Some(0x87),
            '\u{02C6}' => Some(0x88),
            '\u{2030}' => Some(0x89),
            '\u{0160}' => Some(0x8A),
            '\u{2039}' => Some(0x8B),
            '\u{0152}' => Some(0x8C),
            '\u{017D}' => Some(0x8E),
            '\u{2018}' => Some(0x91),
            '\u{2019}' => Some(0x92),
            '\u{201C}' => Some(0x93),
            '\u{201D}' => Some(0x94),
            '\u{2022}' => Some(0x95),
            '\u{2013}' => Some(0x96),
            '\u{2014}' => Some(0x97),
            '\u{02DC}' => Some(0x98),
            '\u{2122}' => Some(0x99),
            '\u{0161}' => Some(0x9A),
            '\u{203A}' => Some(0x9B),
            '\u{0153}' => Some(0x9C),
            '\u{017E}' => Some(0x9E),
            '\u{0178}' => Some(0x9F),
            _ => None,
        },
    }
}

/// Split `text` into font runs, switching to ZapfDingbats for stars
fn runs(text: &str, font: StandardFont) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();

    for c in text.chars() {
        let (run_font, byte) = if is_star(c) {
            (StandardFont::ZapfDingbats, DINGBAT_STAR)
        } else {
            (font, win_ansi_byte(c).unwrap_or(b'?'))
        };
        let width = run_font.code_width(byte) as u32;

        match runs.last_mut() {
            Some(run) if run.font == run_font => {
                run.bytes.push(byte);
                run.width += width;
            }
            _ => runs.push(Run {
                font: run_font,
                bytes: vec![byte],
                width,
            }),
        }
    }

    runs
}

/// Rendered width of `text` in points
pub fn text_width(text: &str, font: StandardFont, size: f64) -> f64 {
    let units: u32 = runs(text, font).iter().map(|r| r.width).sum();
    units as f64 * size / 1000.0
}

/// Largest size not above `max_size` at which every line fits `max_width`
pub fn fit_font_size<S: AsRef<str>>(
    lines: &[S],
    font: StandardFont,
    max_size: f64,
    max_width: f64,
) -> f64 {
    let widest = lines
        .iter()
        .map(|l| text_width(l.as_ref(), font, 1.0))
        .fold(0.0, f64::max);
    if widest <= 0.0 {
        return max_size;
    }
    max_size.min(max_width / widest)
}

/// One line of styled text
#[derive(Debug, Clone, PartialEq)]
pub struct StyledLine {
    pub text: String,
    pub weight: Weight,
    pub size: f64,
    pub align: Align,
    /// Extra gap below the line
    pub space_after: f64,
}

impl StyledLine {
    pub fn new(text: impl Into<String>, weight: Weight, size: f64, align: Align) -> Self {
        Self {
            text: text.into(),
            weight,
            size,
            align,
            space_after: 0.0,
        }
    }

    pub fn space_after(mut self, space: f64) -> Self {
        self.space_after = space;
        self
    }

    fn height(&self) -> f64 {
        self.size * LEADING + self.space_after
    }
}

/// Lines stacked top to bottom
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<StyledLine>,
}

impl TextBlock {
    pub fn new(lines: Vec<StyledLine>) -> Self {
        Self { lines }
    }

    pub fn height(&self) -> f64 {
        self.lines.iter().map(StyledLine::height).sum()
    }

    pub fn width(&self) -> f64 {
        self.lines
            .iter()
            .map(|l| text_width(&l.text, l.weight.font(), l.size))
            .fold(0.0, f64::max)
    }

    /// Uniformly shrink sizes and gaps so the block fits `area`
    pub fn fit_to(mut self, width: f64, height: f64) -> Self {
        let (w, h) = (self.width(), self.height());
        let factor = [1.0, width / w, height / h]
            .into_iter()
            .filter(|f| f.is_finite())
            .fold(1.0, f64::min);
        if factor < 1.0 {
            for line in &mut self.lines {
                line.size *= factor;
                line.space_after *= factor;
            }
        }
        self
    }

    /// Draw inside `area`, starting at its top edge
    pub fn draw_top(&self, out: &mut OutputDocument, area: &PdfRect) {
        self.draw_from(out, area, area.top());
    }

    /// Draw inside `area`, vertically centered
    pub fn draw_centered(&self, out: &mut OutputDocument, area: &PdfRect) {
        let top = area.top() - (area.height - self.height()).max(0.0) / 2.0;
        self.draw_from(out, area, top);
    }

    fn draw_from(&self, out: &mut OutputDocument, area: &PdfRect, top: f64) {
        let mut cursor = top;
        for line in &self.lines {
            // Baseline sits one font size below the top of the line box
            let baseline = cursor - line.size;
            draw_line(out, line, area.x, area.right(), baseline);
            cursor -= line.height();
        }
    }
}

/// Draw one line between `left` and `right` with its baseline at `baseline`
pub fn draw_line(out: &mut OutputDocument, line: &StyledLine, left: f64, right: f64, baseline: f64) {
    if line.text.trim().is_empty() {
        return;
    }

    let runs = runs(&line.text, line.weight.font());
    let width = text_width(&line.text, line.weight.font(), line.size);
    let x = match line.align {
        Align::Left => left,
        Align::Center => left + (right - left - width) / 2.0,
        Align::Right => right - width,
    };

    let mut ops = vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Td",
            vec![Object::Real(x as f32), Object::Real(baseline as f32)],
        ),
    ];
    for run in runs {
        let name = out.use_font(run.font);
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(name), Object::Real(line.size as f32)],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(run.bytes, StringFormat::Literal)],
        ));
    }
    ops.push(Operation::new("ET", vec![]));
    out.push_operations(ops);
}
