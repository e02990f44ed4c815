//! Drawing surface abstraction.
//!
//! The renderer only talks to [`DocumentCanvas`]; the PDF backend lives in
//! [`super::pdf`], and [`RecordingCanvas`] records operations so layout and
//! pagination can be checked without producing a file.
//!
//! All coordinates are millimetres with `y` growing downwards from the top
//! edge of the page. Text is positioned by its baseline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("font could not be loaded: {0}")]
    Font(String),
    #[error("failed to write document: {0}")]
    Output(#[source] std::io::Error),
    #[error("PDF backend error: {0}")]
    Backend(String),
}

/// Opaque handle of a font registered with a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontHandle(pub usize);

pub trait DocumentCanvas {
    /// Page width and height in millimetres.
    fn page_size(&self) -> (f32, f32);

    /// Register an embedded font from raw TrueType/OpenType data.
    fn register_font(&mut self, data: &[u8]) -> Result<FontHandle, CanvasError>;

    /// Register one of the backend's built-in fonts.
    fn builtin_font(&mut self, bold: bool) -> Result<FontHandle, CanvasError>;

    /// Width of `text` set in `font` at `size` points, or `None` when the
    /// backend cannot measure it.
    fn measure_text(&self, font: FontHandle, text: &str, size: f32) -> Option<f32>;

    fn draw_text(&mut self, page: usize, font: FontHandle, text: &str, size: f32, x: f32, y: f32);

    /// Horizontal rule from `x1` to `x2` at `y`.
    fn draw_rule(&mut self, page: usize, x1: f32, x2: f32, y: f32);

    /// Append a page and return its index.
    fn new_page(&mut self) -> usize;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    Text {
        page: usize,
        font: FontHandle,
        text: String,
        size: f32,
        x: f32,
        y: f32,
    },
    Rule {
        page: usize,
        y: f32,
    },
    NewPage {
        page: usize,
    },
}

/// Canvas double that keeps every drawing operation in memory.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    width: f32,
    height: f32,
    /// Width of one character in mm; `None` makes every measurement fail.
    char_width: Option<f32>,
    page_count: usize,
    fonts: usize,
    pub ops: Vec<CanvasOp>,
}

impl RecordingCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            char_width: Some(2.0),
            page_count: 1,
            fonts: 0,
            ops: Vec::new(),
        }
    }

    pub fn a4() -> Self {
        Self::new(210.0, 297.0)
    }

    /// A canvas whose text measurements are unavailable.
    pub fn without_metrics(mut self) -> Self {
        self.char_width = None;
        self
    }

    pub fn with_char_width(mut self, width: f32) -> Self {
        self.char_width = Some(width);
        self
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn page_breaks(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, CanvasOp::NewPage { .. }))
            .count()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                CanvasOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Pages on which `needle` was drawn, in drawing order.
    pub fn pages_with_text(&self, needle: &str) -> Vec<usize> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                CanvasOp::Text { page, text, .. } if text == needle => Some(*page),
                _ => None,
            })
            .collect()
    }
}

impl DocumentCanvas for RecordingCanvas {
    fn page_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn register_font(&mut self, data: &[u8]) -> Result<FontHandle, CanvasError> {
        if data.is_empty() {
            return Err(CanvasError::Font("empty font data".to_string()));
        }
        self.fonts += 1;
        Ok(FontHandle(self.fonts - 1))
    }

    fn builtin_font(&mut self, _bold: bool) -> Result<FontHandle, CanvasError> {
        self.fonts += 1;
        Ok(FontHandle(self.fonts - 1))
    }

    fn measure_text(&self, _font: FontHandle, text: &str, _size: f32) -> Option<f32> {
        self.char_width
            .map(|w| text.chars().count() as f32 * w)
    }

    fn draw_text(&mut self, page: usize, font: FontHandle, text: &str, size: f32, x: f32, y: f32) {
        self.ops.push(CanvasOp::Text {
            page,
            font,
            text: text.to_string(),
            size,
            x,
            y,
        });
    }

    fn draw_rule(&mut self, page: usize, _x1: f32, _x2: f32, y: f32) {
        self.ops.push(CanvasOp::Rule { page, y });
    }

    fn new_page(&mut self) -> usize {
        let page = self.page_count;
        self.page_count += 1;
        self.ops.push(CanvasOp::NewPage { page });
        page
    }
}
