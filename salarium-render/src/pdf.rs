//! Minimal paginated PDF writer
//!
//! Pages are collected as lopdf content operations and assembled into a
//! document only when saved, so footers that need the final page count can
//! be drawn after all content is laid out.
//!
//! Text uses the standard Helvetica faces with WinAnsi encoding; no fonts
//! are embedded.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use tracing::instrument;

use crate::error::{RenderError, RenderResult};

/// A4 landscape in points
pub const A4_LANDSCAPE: (f32, f32) = (842.0, 595.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// RGB colour, components in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub f32, pub f32, pub f32);

impl Color {
    pub const BLACK: Color = Color(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color(1.0, 1.0, 1.0);
    pub const NAVY: Color = Color(0.122, 0.227, 0.373);
    pub const SLATE: Color = Color(0.357, 0.392, 0.459);
    pub const HEADER_FILL: Color = Color(0.906, 0.925, 0.953);
    pub const TOTAL_FILL: Color = Color(0.957, 0.965, 0.976);
    pub const RULE: Color = Color(0.816, 0.835, 0.867);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Content of one page
#[derive(Debug, Clone, Default)]
pub struct Page {
    operations: Vec<Operation>,
}

impl Page {
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) -> &mut Self {
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![color.0.into(), color.1.into(), color.2.into()]),
            Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()]),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
        self
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Color) -> &mut Self {
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("RG", vec![color.0.into(), color.1.into(), color.2.into()]),
            Operation::new("w", vec![width.into()]),
            Operation::new("m", vec![x1.into(), y1.into()]),
            Operation::new("l", vec![x2.into(), y2.into()]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
        self
    }

    /// Draw text with its baseline at `y`; `x` is interpreted per `align`
    pub fn text(
        &mut self,
        x: f32,
        y: f32,
        text: &str,
        size: f32,
        font: Font,
        color: Color,
        align: Align,
    ) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        let width = text_width(text, size, font);
        let start_x = match align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource_name().into(), size.into()]),
            Operation::new("rg", vec![color.0.into(), color.1.into(), color.2.into()]),
            Operation::new("Td", vec![start_x.into(), y.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
        self
    }
}

/// Multi-page document builder
#[derive(Debug, Clone)]
pub struct PdfDocument {
    width: f32,
    height: f32,
    title: String,
    pages: Vec<Page>,
}

impl PdfDocument {
    pub fn new(width: f32, height: f32, title: &str) -> Self {
        Self {
            width,
            height,
            title: title.to_string(),
            pages: Vec::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Append a blank page and return its index
    pub fn add_page(&mut self) -> usize {
        self.pages.push(Page::default());
        self.pages.len() - 1
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_mut(&mut self, index: usize) -> RenderResult<&mut Page> {
        self.pages
            .get_mut(index)
            .ok_or_else(|| RenderError::Layout(format!("no page at index {}", index)))
    }

    pub fn pages_mut(&mut self) -> impl Iterator<Item = &mut Page> {
        self.pages.iter_mut()
    }

    /// Assemble the lopdf document and serialise it
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub fn save_to_buffer(&self) -> RenderResult<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(RenderError::Layout("document has no pages".to_string()));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let content = Content {
                operations: page.operations.clone(),
            };
            let bytes = content
                .encode()
                .map_err(|e| RenderError::Pdf(format!("content encoding failed: {}", e)))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, bytes));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), self.width.into(), self.height.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
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
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(encode_win_ansi(&self.title)),
            "Producer" => Object::string_literal("Salarium"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        Ok(buffer)
    }
}

/// Encode text for a WinAnsi (CP1252) font; unmappable characters become '?'
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            _ => b'?',
        })
        .collect()
}

/// Rendered width of `text` in points
pub fn text_width(text: &str, size: f32, font: Font) -> f32 {
    let units: u32 = text.chars().map(|c| glyph_width(c, font)).sum();
    units as f32 * size / 1000.0
}

/// Shorten `text` with a trailing "..." until it fits `max_width`
pub fn truncate_to_width(text: &str, max_width: f32, size: f32, font: Font) -> String {
    if text_width(text, size, font) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + "...";
        if text_width(&candidate, size, font) <= max_width {
            return candidate;
        }
    }
    String::new()
}

// Standard 14 font metrics for ASCII 32..=126 (units per 1000 em)
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // A..Z
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333,
    500, 278, 556, 500, 722, 500, 500, 500, // a..z
    334, 260, 334, 584, // '{'..'~'
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // A..Z
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389,
    556, 333, 611, 556, 778, 556, 556, 500, // a..z
    389, 280, 389, 584, // '{'..'~'
];

fn glyph_width(c: char, font: Font) -> u32 {
    let table = match font {
        Font::Regular => &HELVETICA_WIDTHS,
        Font::Bold => &HELVETICA_BOLD_WIDTHS,
    };
    match c {
        ' '..='~' => table[(c as usize) - 32] as u32,
        '—' => 1000,
        _ => 556,
    }
}
