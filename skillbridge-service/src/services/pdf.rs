//! Plain-text report rendering.
//!
//! Text is laid out as flat wrapped lines: one standard font, one size, fixed
//! margins, automatic page breaks. No markup is interpreted.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use std::path::Path;
use thiserror::Error;

/// Points per millimetre.
const MM: f32 = 72.0 / 25.4;

// A4 portrait
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;

const MARGIN: f32 = 10.0 * MM;
const BOTTOM_MARGIN: f32 = 20.0 * MM;
const CELL_PADDING: f32 = 1.0 * MM;
const LINE_HEIGHT: f32 = 10.0 * MM;
const FONT_SIZE: f32 = 12.0;
const FONT_NAME: &[u8] = b"F1";
const REPORT_TITLE: &str = "SkillBridge Report";

/// Helvetica advance widths for 0x20..=0x7E, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];
const DEFAULT_GLYPH_WIDTH: u16 = 556;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to encode PDF content: {0}")]
    Encoding(String),

    #[error("Failed to write PDF: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders flat text into a standalone PDF file.
pub trait PdfRenderer: Send + Sync {
    fn render(&self, text: &str, output: &Path) -> Result<(), PdfError>;
}

/// Single-column report renderer using the built-in Helvetica font.
#[derive(Debug, Clone, Default)]
pub struct TextReportRenderer;

impl TextReportRenderer {
    /// Lay the text out into pages of lines.
    fn paginate(&self, text: &str) -> Vec<Vec<Vec<u8>>> {
        let max_width = PAGE_WIDTH - 2.0 * MARGIN - 2.0 * CELL_PADDING;
        let lines: Vec<Vec<u8>> = encode_win_ansi(text)
            .split(|b| *b == b'\n')
            .flat_map(|paragraph| wrap_paragraph(paragraph, max_width))
            .collect();

        lines
            .chunks(lines_per_page())
            .map(|chunk| chunk.to_vec())
            .collect()
    }

    fn build_document(&self, text: &str) -> Result<Document, PdfError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page_lines in self.paginate(text) {
            let content = page_content(&page_lines);
            let encoded = content
                .encode()
                .map_err(|e| PdfError::Encoding(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(encode_win_ansi(REPORT_TITLE)),
            "Producer" => Object::string_literal("skillbridge-service"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        Ok(doc)
    }
}

impl PdfRenderer for TextReportRenderer {
    fn render(&self, text: &str, output: &Path) -> Result<(), PdfError> {
        let mut doc = self.build_document(text)?;
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| PdfError::Encoding(e.to_string()))?;
        std::fs::write(output, buffer)?;
        Ok(())
    }
}

fn lines_per_page() -> usize {
    (((PAGE_HEIGHT - MARGIN - BOTTOM_MARGIN) / LINE_HEIGHT).floor() as usize).max(1)
}

fn page_content(lines: &[Vec<u8>]) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(FONT_NAME.to_vec()), Object::Real(FONT_SIZE)],
        ),
    ];

    for (index, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        // Baseline sits mid-line, offset by the font's ascent share.
        let top = MARGIN + index as f32 * LINE_HEIGHT;
        let baseline = PAGE_HEIGHT - (top + 0.5 * LINE_HEIGHT + 0.3 * FONT_SIZE);
        operations.push(Operation::new(
            "Tm",
            vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                Object::Real(MARGIN + CELL_PADDING),
                Object::Real(baseline),
            ],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(line.clone(), StringFormat::Literal)],
        ));
    }

    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

/// Map text onto single-byte WinAnsi codes. Latin-1 passes through, tabs
/// become spaces, carriage returns are dropped, anything else becomes `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| *c != '\r')
        .map(|c| match c {
            '\n' => b'\n',
            '\t' => b' ',
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

fn glyph_width(byte: u8) -> f32 {
    let units = match byte {
        0x20..=0x7E => HELVETICA_WIDTHS[(byte - 0x20) as usize],
        _ => DEFAULT_GLYPH_WIDTH,
    };
    units as f32 * FONT_SIZE / 1000.0
}

/// Greedy word wrap. Breaks at the last space that fits; a word wider than
/// the line is split between characters. An empty paragraph is one blank line.
fn wrap_paragraph(paragraph: &[u8], max_width: f32) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut start = 0;

    while start < paragraph.len() {
        let mut width = 0.0;
        let mut end = start;
        let mut last_space = None;

        while end < paragraph.len() {
            let w = glyph_width(paragraph[end]);
            if width + w > max_width {
                break;
            }
            if paragraph[end] == b' ' {
                last_space = Some(end);
            }
            width += w;
            end += 1;
        }

        if end == paragraph.len() {
            lines.push(paragraph[start..].to_vec());
            break;
        }

        if paragraph[end] == b' ' {
            lines.push(paragraph[start..end].to_vec());
            start = end + 1;
            continue;
        }

        match last_space {
            Some(space) if space > start => {
                lines.push(paragraph[start..space].to_vec());
                start = space + 1;
            }
            _ => {
                let end = end.max(start + 1);
                lines.push(paragraph[start..end].to_vec());
                start = end;
            }
        }
    }

    if lines.is_empty() {
        lines.push(Vec::new());
    }
    lines
}
