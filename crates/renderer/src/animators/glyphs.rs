//! Procedural glyph bitmaps.
//!
//! The animators only need glyph-shaped noise, not legible type, so each
//! character maps to a deterministic 5x7 pattern derived from its code point.

/// Columns in a glyph bitmap.
pub const GLYPH_COLUMNS: u32 = 5;
/// Rows in a glyph bitmap.
pub const GLYPH_ROWS: u32 = 7;
/// Horizontal advance relative to the font size.
pub const ADVANCE_RATIO: f32 = 0.6;

/// Binary digits and katakana sprinkled over the particle field.
pub const FIELD_GLYPHS: &str = "01アカサタナハマヤラワガザダバパイキシチニヒミリギジヂビピウクスツヌフムユルグズヅブプエケセテネヘメレゲゼデベペオコソトノホモヨロゴゾドボポヴッン";

/// Binary digits, katakana and code punctuation used by the rain columns.
pub const RAIN_GLYPHS: &str =
    "01アイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワヲン{}[]()<>=+-*/.,:;";

/// Row bitmaps for `glyph`; bit 4 is the leftmost column.
pub fn bitmap(glyph: char) -> [u8; GLYPH_ROWS as usize] {
    let mut rows = [0u8; GLYPH_ROWS as usize];
    if glyph.is_whitespace() {
        return rows;
    }

    let mut state = u64::from(u32::from(glyph)) ^ 0x9E37_79B9_7F4A_7C15;
    for row in rows.iter_mut() {
        state = splitmix(state);
        *row = (state & 0b1_1111) as u8;
    }
    // Guarantee at least one lit cell so every glyph leaves a mark.
    if rows.iter().all(|row| *row == 0) {
        rows[GLYPH_ROWS as usize / 2] = 0b0_0100;
    }
    rows
}

/// Iterates the lit `(column, row)` cells of `glyph`.
pub fn lit_cells(glyph: char) -> impl Iterator<Item = (u32, u32)> {
    let rows = bitmap(glyph);
    (0..GLYPH_ROWS).flat_map(move |row| {
        (0..GLYPH_COLUMNS).filter_map(move |column| {
            let mask = 1u8 << (GLYPH_COLUMNS - 1 - column);
            (rows[row as usize] & mask != 0).then_some((column, row))
        })
    })
}

fn splitmix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyphs_are_deterministic_and_never_blank() {
        for glyph in RAIN_GLYPHS.chars().chain(FIELD_GLYPHS.chars()) {
            assert_eq!(bitmap(glyph), bitmap(glyph));
            assert!(lit_cells(glyph).count() > 0, "{glyph} renders blank");
        }
        assert_eq!(lit_cells(' ').count(), 0);
    }

    #[test]
    fn lit_cells_stay_inside_the_grid() {
        for (column, row) in lit_cells('ア') {
            assert!(column < GLYPH_COLUMNS);
            assert!(row < GLYPH_ROWS);
        }
    }
}
