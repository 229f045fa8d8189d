pub const TILE_WIDTH: usize = 8;
pub const TILE_HEIGHT: usize = 8;

/// Tile pixels with this value are skipped by every keyed blit.
pub const TRANSPARENT_COLOR: u8 = 0xFF;

/// Font tiles are drawn in this index; recoloured blits replace it.
pub const FONT_COLOR_KEY: u8 = 0x0F;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TileKind {
    Solid,
    Transparent,
    Other,
}

/// A block of indexed pixels from the tile atlas.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Tile<const W: usize = TILE_WIDTH, const H: usize = TILE_HEIGHT> {
    pub kind: TileKind,
    pub pixels: [[u8; W]; H],
}

impl<const W: usize, const H: usize> Tile<W, H> {
    pub const fn new(kind: TileKind, pixels: [[u8; W]; H]) -> Self {
        Self { kind, pixels }
    }

    pub const fn filled(kind: TileKind, value: u8) -> Self {
        Self { kind, pixels: [[value; W]; H] }
    }

    /// Builds a tile from a row-major pixel slice, as tiles are stored in
    /// the atlas. Returns `None` when the slice is not exactly `W * H` long.
    pub fn from_slice(kind: TileKind, pixels: &[u8]) -> Option<Self> {
        if pixels.len() != W * H {
            return None
        }
        let mut tile = Self::filled(kind, 0);
        for (row, src) in tile.pixels.iter_mut().zip(pixels.chunks_exact(W)) {
            row.copy_from_slice(src);
        }
        Some(tile)
    }

    pub const fn width(&self) -> usize {
        W
    }

    pub const fn height(&self) -> usize {
        H
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_is_row_major() {
        let px: [u8; 64] = core::array::from_fn(|i| i as u8);
        let t: Tile = Tile::from_slice(TileKind::Solid, &px).unwrap();
        assert_eq!(t.pixels[1][0], 8);
        assert_eq!(t.pixels[7][7], 63);
        assert!(Tile::<8, 8>::from_slice(TileKind::Solid, &px[..63]).is_none());
    }
}
