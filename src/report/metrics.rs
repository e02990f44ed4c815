//! Advance widths used to lay out text before it is drawn.
//!
//! Embedded fonts are measured from the face's `hmtx` table. The built-in
//! Helvetica faces carry no font program, so their widths come from the
//! standard Adobe AFM metrics.

use owned_ttf_parser::{AsFaceRef, FaceParsingError, GlyphId, OwnedFace};

/// Helvetica advances for U+0020..=U+007E in 1/1000 em.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Helvetica-Bold advances for U+0020..=U+007E in 1/1000 em.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p..~
];

/// Horizontal metrics of one registered font.
pub enum FontMetrics {
    Helvetica { bold: bool },
    Face(OwnedFace),
}

impl FontMetrics {
    /// Parse the metrics of a TrueType/OpenType font program.
    pub fn from_font_data(data: Vec<u8>) -> Result<Self, FaceParsingError> {
        Ok(Self::Face(OwnedFace::from_vec(data, 0)?))
    }

    pub fn helvetica(bold: bool) -> Self {
        Self::Helvetica { bold }
    }

    /// Advance of `text` in em, or `None` when a character has no known width.
    pub fn advance_em(&self, text: &str) -> Option<f32> {
        match self {
            Self::Helvetica { bold } => {
                let table = if *bold { &HELVETICA_BOLD } else { &HELVETICA };
                text.chars()
                    .map(|c| afm_advance(table, c))
                    .sum::<Option<u32>>()
                    .map(|units| units as f32 / 1000.0)
            }
            Self::Face(owned) => {
                let face = owned.as_face_ref();
                let units_per_em = f32::from(face.units_per_em());
                text.chars()
                    .map(|c| {
                        // Unmapped characters are drawn with .notdef.
                        let glyph = face.glyph_index(c).unwrap_or(GlyphId(0));
                        face.glyph_hor_advance(glyph).map(u32::from)
                    })
                    .sum::<Option<u32>>()
                    .map(|units| units as f32 / units_per_em)
            }
        }
    }
}

/// Width of `c` as the built-in font draws it. Characters outside Latin-1
/// are drawn as `?`; accented Latin-1 letters take the width of their base
/// letter.
fn afm_advance(table: &[u16; 95], c: char) -> Option<u32> {
    let c = if (c as u32) > 0xFF { '?' } else { latin1_base(c) };
    let index = (c as u32).checked_sub(0x20)? as usize;
    table.get(index).map(|w| u32::from(*w))
}

fn latin1_base(c: char) -> char {
    match c {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' | 'ì'..='ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        '\u{A0}' => ' ',
        other => other,
    }
}
