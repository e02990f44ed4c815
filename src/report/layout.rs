//! Page geometry, the vertical cursor and text wrapping.

use super::canvas::{DocumentCanvas, FontHandle};

/// Points to millimetres.
pub const PT_TO_MM: f32 = 0.3528;
pub const LINE_SPACING: f32 = 1.4;

/// Distance above the bottom margin below which a section title is pushed
/// to the next page.
pub const SECTION_BREAK_THRESHOLD: f32 = 50.0;
/// Row height used when text cannot be measured.
pub const ROW_FALLBACK_HEIGHT: f32 = 8.0;
/// Footer baseline distance from the bottom edge.
pub const FOOTER_OFFSET: f32 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub section_break_threshold: f32,
    pub row_fallback_height: f32,
    pub footer_offset: f32,
}

impl PageLayout {
    pub fn for_page(page_width: f32, page_height: f32) -> Self {
        Self {
            page_width,
            page_height,
            margin_top: 20.0,
            margin_bottom: 20.0,
            margin_left: 15.0,
            margin_right: 15.0,
            section_break_threshold: SECTION_BREAK_THRESHOLD,
            row_fallback_height: ROW_FALLBACK_HEIGHT,
            footer_offset: FOOTER_OFFSET,
        }
    }

    pub fn a4() -> Self {
        Self::for_page(210.0, 297.0)
    }

    pub fn content_top(&self) -> f32 {
        self.margin_top
    }

    pub fn content_bottom(&self) -> f32 {
        self.page_height - self.margin_bottom
    }

    pub fn usable_height(&self) -> f32 {
        self.content_bottom() - self.content_top()
    }

    pub fn content_left(&self) -> f32 {
        self.margin_left
    }

    pub fn content_right(&self) -> f32 {
        self.page_width - self.margin_right
    }

    pub fn content_width(&self) -> f32 {
        self.content_right() - self.content_left()
    }
}

/// Height of one text line set at `size` points.
pub fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * LINE_SPACING
}

/// Current drawing position: page index and the top of the next block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub page: usize,
    pub y: f32,
}

impl Cursor {
    pub fn start(layout: &PageLayout) -> Self {
        Self {
            page: 0,
            y: layout.content_top(),
        }
    }

    pub fn fits(&self, height: f32, layout: &PageLayout) -> bool {
        self.y + height <= layout.content_bottom()
    }

    /// True once the cursor is inside the near-bottom band.
    pub fn near_bottom(&self, layout: &PageLayout) -> bool {
        self.y > layout.content_bottom() - layout.section_break_threshold
    }

    pub fn break_page(&mut self, canvas: &mut dyn DocumentCanvas, layout: &PageLayout) {
        self.page = canvas.new_page();
        self.y = layout.content_top();
    }

    /// Break the page unless `height` still fits. Returns whether it broke.
    pub fn ensure_space(
        &mut self,
        canvas: &mut dyn DocumentCanvas,
        layout: &PageLayout,
        height: f32,
    ) -> bool {
        if self.fits(height, layout) || self.y <= layout.content_top() {
            return false;
        }
        self.break_page(canvas, layout);
        true
    }

    pub fn advance(&mut self, height: f32) {
        self.y += height;
    }
}

/// Greedy character wrap of `text` into lines no wider than `max_width`.
///
/// Explicit newlines are kept. Returns `None` when the canvas cannot measure
/// text, in which case callers draw the text unwrapped.
pub fn wrap_text(
    canvas: &dyn DocumentCanvas,
    font: FontHandle,
    text: &str,
    size: f32,
    max_width: f32,
) -> Option<Vec<String>> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut width = 0.0;
        for ch in paragraph.chars() {
            let mut buf = [0u8; 4];
            let ch_width = canvas.measure_text(font, ch.encode_utf8(&mut buf), size)?;
            if width + ch_width > max_width && !line.is_empty() {
                lines.push(std::mem::take(&mut line).trim_end().to_string());
                width = 0.0;
                if ch.is_whitespace() {
                    continue;
                }
            }
            line.push(ch);
            width += ch_width;
        }
        lines.push(line);
    }

    Some(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::canvas::RecordingCanvas;

    #[test]
    fn test_wrap_text_by_width() {
        let canvas = RecordingCanvas::a4().with_char_width(2.0);
        let lines = wrap_text(&canvas, FontHandle(0), "abcdefghij", 10.0, 8.0).unwrap();
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_text_keeps_newlines_and_drops_break_space() {
        let canvas = RecordingCanvas::a4().with_char_width(1.0);
        let lines = wrap_text(&canvas, FontHandle(0), "ab cd\nef", 10.0, 2.0).unwrap();
        assert_eq!(lines, vec!["ab", "cd", "ef"]);
    }

    #[test]
    fn test_wrap_text_without_metrics() {
        let canvas = RecordingCanvas::a4().without_metrics();
        assert!(wrap_text(&canvas, FontHandle(0), "abc", 10.0, 8.0).is_none());
    }

    #[test]
    fn test_cursor_breaks_only_when_needed() {
        let layout = PageLayout::a4();
        let mut canvas = RecordingCanvas::a4();
        let mut cursor = Cursor::start(&layout);

        assert!(!cursor.ensure_space(&mut canvas, &layout, 100.0));
        cursor.advance(250.0);
        assert!(cursor.ensure_space(&mut canvas, &layout, 10.0));
        assert_eq!(cursor, Cursor { page: 1, y: layout.content_top() });
        assert_eq!(canvas.page_breaks(), 1);
    }

    #[test]
    fn test_oversized_block_on_fresh_page_does_not_loop() {
        let layout = PageLayout::a4();
        let mut canvas = RecordingCanvas::a4();
        let mut cursor = Cursor::start(&layout);
        assert!(!cursor.ensure_space(&mut canvas, &layout, 1000.0));
        assert_eq!(canvas.page_breaks(), 0);
    }
}
