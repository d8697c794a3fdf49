//! ABOUTME: Glyph header decoding and composite-glyph component walking
//! ABOUTME: Shared between the parser's XHeight/CapHeight lookup and the subsetter's closure

use crate::error::ParseError;
use crate::reader::ByteReader;

pub const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
pub const WE_HAVE_A_SCALE: u16 = 0x0008;
pub const MORE_COMPONENTS: u16 = 0x0020;
pub const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
pub const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

/// The 10-byte glyph header shared by simple and composite glyphs.
#[derive(Debug, Clone, Copy)]
pub struct GlyphHeader {
    pub number_of_contours: i16,
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl GlyphHeader {
    pub fn is_composite(&self) -> bool {
        self.number_of_contours < 0
    }
}

pub fn read_glyph_header(r: ByteReader, glyph_offset: usize) -> Result<GlyphHeader, ParseError> {
    Ok(GlyphHeader {
        number_of_contours: r.i16(glyph_offset)?,
        x_min: r.fword(glyph_offset + 2)? as i32,
        y_min: r.fword(glyph_offset + 4)? as i32,
        x_max: r.fword(glyph_offset + 6)? as i32,
        y_max: r.fword(glyph_offset + 8)? as i32,
    })
}

/// Walk a composite glyph's component list and return the glyph indices it
/// references directly (not transitively). Caller is responsible for the
/// worklist/closure over those references. `glyph_offset` must point at a
/// glyph whose header already reported `number_of_contours < 0`.
pub fn composite_component_glyphs(r: ByteReader, glyph_offset: usize) -> Result<Vec<u32>, ParseError> {
    let mut refs = Vec::new();
    let mut cursor = glyph_offset + 10;
    loop {
        let flags = r.u16(cursor)?;
        let glyph_index = r.u16(cursor + 2)?;
        refs.push(glyph_index as u32);
        cursor += 4;

        cursor += if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };

        cursor += if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            8
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            4
        } else if flags & WE_HAVE_A_SCALE != 0 {
            2
        } else {
            0
        };

        if flags & MORE_COMPONENTS == 0 {
            break;
        }
    }
    Ok(refs)
}
