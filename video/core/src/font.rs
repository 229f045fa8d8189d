use bit_field::BitField;
use crate::surface::Surface;

/// A monospace 1bpp font: one glyph after another, each row packed MSB
/// first into whole bytes.
#[derive(Copy, Clone, Debug)]
pub struct BitmapFont<'a> {
    glyphs: &'a [u8],
    width: usize,
    height: usize,
}

impl<'a> BitmapFont<'a> {
    /// `None` if the table is empty or not a whole number of glyphs.
    pub fn new(glyphs: &'a [u8], width: usize, height: usize) -> Option<Self> {
        if width == 0 || height == 0 {
            return None
        }
        let font = Self { glyphs, width, height };
        if glyphs.is_empty() || glyphs.len() % font.glyph_bytes() != 0 {
            return None
        }
        Some(font)
    }

    /// The 8x16 layout of the VGA text-mode font the game ships with.
    pub fn vga_8x16(glyphs: &'a [u8]) -> Option<Self> {
        Self::new(glyphs, 8, 16)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len() / self.glyph_bytes()
    }

    fn row_bytes(&self) -> usize {
        self.width.div_ceil(8)
    }

    fn glyph_bytes(&self) -> usize {
        self.row_bytes() * self.height
    }

    pub fn pixel(&self, ch: u8, x: usize, y: usize) -> bool {
        let base = ch as usize * self.glyph_bytes() + y * self.row_bytes();
        self.glyphs[base + x / 8].get_bit(7 - x % 8)
    }
}

/// Draws `ch` into the character cell at (`col`, `row`). Set bits take `fg`,
/// clear bits `bg`. Returns false when the font has no such glyph.
pub fn draw_glyph(surface: &mut Surface, font: &BitmapFont<'_>, ch: u8, fg: u8, bg: u8, col: usize, row: usize) -> bool {
    if ch as usize >= font.glyph_count() {
        return false
    }

    let (x0, y0) = (col * font.width(), row * font.height());
    if x0 >= surface.width() || y0 >= surface.height() {
        return true
    }
    let w = font.width().min(surface.width().saturating_sub(x0));
    let h = font.height().min(surface.height().saturating_sub(y0));

    for gy in 0..h {
        let line = &mut surface.row_mut(y0 + gy)[x0..x0 + w];
        for (gx, p) in line.iter_mut().enumerate() {
            *p = if font.pixel(ch, gx, gy) { fg } else { bg };
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;

    fn font() -> [u8; 32] {
        let mut glyphs = [0u8; 32];
        // glyph 1: a diagonal in the first 8 rows
        for i in 0..8 {
            glyphs[16 + i] = 0x80 >> i;
        }
        glyphs
    }

    #[test]
    fn glyph_bits_select_colors() {
        let table = font();
        let font = BitmapFont::vga_8x16(&table).unwrap();
        let mut s = Surface::create(32, 32, Palette::black());

        assert!(draw_glyph(&mut s, &font, 1, 15, 1, 1, 1));
        assert_eq!(s.get(8, 16), Some(15));
        assert_eq!(s.get(9, 16), Some(1));
        assert_eq!(s.get(15, 23), Some(15));
        assert_eq!(s.get(8, 31), Some(1));
        assert_eq!(s.get(7, 16), Some(0));
    }

    #[test]
    fn missing_glyphs_and_edges() {
        let table = font();
        let font = BitmapFont::vga_8x16(&table).unwrap();
        let mut s = Surface::create(12, 20, Palette::black());

        assert!(!draw_glyph(&mut s, &font, 2, 15, 1, 0, 0));
        assert!(s.pixels().iter().all(|p| *p == 0));

        // cell (1, 1) is only partly on the surface
        assert!(draw_glyph(&mut s, &font, 1, 15, 1, 1, 1));
        assert_eq!(s.get(8, 16), Some(15));
        assert_eq!(s.get(11, 19), Some(15));

        assert!(BitmapFont::new(&table[..31], 8, 16).is_none());
        assert!(BitmapFont::new(&[], 8, 16).is_none());
    }

    #[test]
    fn wide_glyphs_span_bytes() {
        // one 10x1 glyph: bits 0 and 9 set
        let table = [0x80, 0x40];
        let font = BitmapFont::new(&table, 10, 1).unwrap();
        assert!(font.pixel(0, 0, 0));
        assert!(font.pixel(0, 9, 0));
        assert!(!font.pixel(0, 8, 0));
    }
}
