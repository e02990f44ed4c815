//! `printpdf` backed [`DocumentCanvas`].

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex,
    PdfPageIndex, Point,
};
use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;

use super::canvas::{CanvasError, DocumentCanvas, FontHandle};
use super::layout::PT_TO_MM;
use super::metrics::FontMetrics;

const LAYER_NAME: &str = "Layer 1";
const RULE_THICKNESS: f32 = 0.5;

struct RegisteredFont {
    font: IndirectFontRef,
    metrics: FontMetrics,
}

pub struct PdfCanvas {
    doc: PdfDocumentReference,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    fonts: Vec<RegisteredFont>,
    width: f32,
    height: f32,
}

impl PdfCanvas {
    pub fn new(title: &str, width: f32, height: f32) -> Self {
        let (doc, page, layer) = PdfDocument::new(title, Mm(width), Mm(height), LAYER_NAME);
        Self {
            doc,
            pages: vec![(page, layer)],
            fonts: Vec::new(),
            width,
            height,
        }
    }

    pub fn a4(title: &str) -> Self {
        Self::new(title, 210.0, 297.0)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Write the finished document to `path`, replacing any existing file.
    pub fn save(self, path: &Path) -> Result<(), CanvasError> {
        let file = File::create(path).map_err(CanvasError::Output)?;
        let mut writer = BufWriter::new(file);
        self.doc
            .save(&mut writer)
            .map_err(|e| CanvasError::Backend(e.to_string()))
    }

    fn push_font(&mut self, font: IndirectFontRef, metrics: FontMetrics) -> FontHandle {
        self.fonts.push(RegisteredFont { font, metrics });
        FontHandle(self.fonts.len() - 1)
    }

    fn layer(&self, page: usize) -> Option<printpdf::PdfLayerReference> {
        self.pages
            .get(page)
            .map(|(p, l)| self.doc.get_page(*p).get_layer(*l))
    }
}

/// Built-in PDF fonts only cover Latin-1.
fn latin1_only(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF { c } else { '?' })
        .collect()
}

impl DocumentCanvas for PdfCanvas {
    fn page_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn register_font(&mut self, data: &[u8]) -> Result<FontHandle, CanvasError> {
        let metrics = FontMetrics::from_font_data(data.to_vec())
            .map_err(|e| CanvasError::Font(e.to_string()))?;
        let font = self
            .doc
            .add_external_font(Cursor::new(data.to_vec()))
            .map_err(|e| CanvasError::Font(e.to_string()))?;
        Ok(self.push_font(font, metrics))
    }

    fn builtin_font(&mut self, bold: bool) -> Result<FontHandle, CanvasError> {
        let face = if bold {
            BuiltinFont::HelveticaBold
        } else {
            BuiltinFont::Helvetica
        };
        let font = self
            .doc
            .add_builtin_font(face)
            .map_err(|e| CanvasError::Font(e.to_string()))?;
        Ok(self.push_font(font, FontMetrics::helvetica(bold)))
    }

    fn measure_text(&self, font: FontHandle, text: &str, size: f32) -> Option<f32> {
        let registered = self.fonts.get(font.0)?;
        Some(registered.metrics.advance_em(text)? * size * PT_TO_MM)
    }

    fn draw_text(&mut self, page: usize, font: FontHandle, text: &str, size: f32, x: f32, y: f32) {
        let (Some(layer), Some(registered)) = (self.layer(page), self.fonts.get(font.0)) else {
            log::warn!("dropping text on unknown page {} or font {:?}", page, font);
            return;
        };
        let text = match registered.metrics {
            FontMetrics::Helvetica { .. } => latin1_only(text),
            FontMetrics::Face(_) => text.to_string(),
        };
        layer.use_text(text, size, Mm(x), Mm(self.height - y), &registered.font);
    }

    fn draw_rule(&mut self, page: usize, x1: f32, x2: f32, y: f32) {
        let Some(layer) = self.layer(page) else {
            return;
        };
        let y = Mm(self.height - y);
        layer.set_outline_thickness(RULE_THICKNESS);
        layer.add_line(Line {
            points: vec![(Point::new(Mm(x1), y), false), (Point::new(Mm(x2), y), false)],
            is_closed: false,
        });
    }

    fn new_page(&mut self) -> usize {
        let (page, layer) = self.doc.add_page(Mm(self.width), Mm(self.height), LAYER_NAME);
        self.pages.push((page, layer));
        self.pages.len() - 1
    }
}
