//! Font resolution for a document.
//!
//! The report font (a Japanese-capable TrueType file) is registered once per
//! document. When it is missing or unreadable the built-in font is used and a
//! [`FontDiagnostic`] is returned instead of failing the document.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::canvas::{CanvasError, DocumentCanvas, FontHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    Embedded(PathBuf),
    Builtin,
}

/// Fonts used by every draw routine of one document.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSet {
    pub regular: FontHandle,
    pub bold: FontHandle,
    pub source: FontSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontDiagnostic {
    pub font_path: String,
    pub reason: String,
}

impl FontSet {
    pub fn is_fallback(&self) -> bool {
        self.source == FontSource::Builtin
    }

    pub fn builtin(canvas: &mut dyn DocumentCanvas) -> Result<Self, CanvasError> {
        Ok(Self {
            regular: canvas.builtin_font(false)?,
            bold: canvas.builtin_font(true)?,
            source: FontSource::Builtin,
        })
    }

    /// Register the font at `font_path`, falling back to the built-in font.
    ///
    /// Only a failure of the built-in font itself is an error.
    pub fn resolve(
        canvas: &mut dyn DocumentCanvas,
        font_path: &Path,
    ) -> Result<(Self, Option<FontDiagnostic>), CanvasError> {
        let embedded = std::fs::read(font_path)
            .map_err(|e| e.to_string())
            .and_then(|data| canvas.register_font(&data).map_err(|e| e.to_string()));

        match embedded {
            Ok(handle) => Ok((
                Self {
                    regular: handle,
                    bold: handle,
                    source: FontSource::Embedded(font_path.to_path_buf()),
                },
                None,
            )),
            Err(reason) => {
                log::warn!(
                    "report font {} unavailable ({}), using built-in font",
                    font_path.display(),
                    reason
                );
                let diagnostic = FontDiagnostic {
                    font_path: font_path.display().to_string(),
                    reason,
                };
                Ok((Self::builtin(canvas)?, Some(diagnostic)))
            }
        }
    }
}
