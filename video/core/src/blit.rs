use bit_field::BitField;
use log::trace;
use crate::surface::Surface;
use crate::tile::{Tile, TileKind, FONT_COLOR_KEY, TILE_HEIGHT, TILE_WIDTH, TRANSPARENT_COLOR};

/// Palette index the solid-white blit forces opaque pixels to.
pub const WHITE_INDEX: u8 = 0x0F;
/// Bit that selects the high-intensity half of the palette.
pub const INTENSITY_BIT: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Saturates, so a clip rect may extend to the end of the coordinate space.
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.w)
    }

    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h)
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let r = self.right().min(other.right());
        let b = self.bottom().min(other.bottom());
        if r <= x || b <= y {
            return None
        }
        Some(Rect::new(x, y, r.saturating_sub(x), b.saturating_sub(y)))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HighlightPattern {
    /// The triangle below the anti-diagonal.
    LowerRight,
    Full,
    /// The triangle below the diagonal.
    LowerLeft,
}

impl HighlightPattern {
    fn covers(self, row: usize, col: usize) -> bool {
        match self {
            HighlightPattern::LowerRight => row + col >= TILE_WIDTH - 1,
            HighlightPattern::Full => true,
            HighlightPattern::LowerLeft => row >= col,
        }
    }
}

/// CPU-side tile compositing into an indexed surface. Tiles hanging off
/// the surface edge are cut to the visible part.
pub struct TileBlitter<'a> {
    surface: &'a mut Surface,
}

impl<'a> TileBlitter<'a> {
    pub fn new(surface: &'a mut Surface) -> Self {
        Self { surface }
    }

    fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.surface.width() as i32, self.surface.height() as i32)
    }

    /// Runs `op(dst, src)` over the part of the tile inside `clip`. `op`
    /// returns the new destination value, or `None` to leave it.
    fn composite<const W: usize, const H: usize>(
        &mut self,
        tile: &Tile<W, H>,
        x: i32,
        y: i32,
        clip: Rect,
        flip_y: bool,
        mut op: impl FnMut(u8, u8) -> Option<u8>,
    ) {
        let placed = Rect::new(x, y, W as i32, H as i32);
        let Some(area) = placed.intersect(&clip).and_then(|r| r.intersect(&self.bounds())) else {
            trace!(target: "video", "tile at ({}, {}) fully clipped", x, y);
            return
        };

        for dy in area.y..area.bottom() {
            let ty = (dy - y) as usize;
            let src = &tile.pixels[if flip_y { H - 1 - ty } else { ty }];
            let row = self.surface.row_mut(dy as usize);

            for dx in area.x..area.right() {
                let d = &mut row[dx as usize];
                if let Some(v) = op(*d, src[(dx - x) as usize]) {
                    *d = v;
                }
            }
        }
    }

    pub fn blit_opaque<const W: usize, const H: usize>(&mut self, tile: &Tile<W, H>, x: i32, y: i32) {
        let bounds = self.bounds();
        self.composite(tile, x, y, bounds, false, |_, s| Some(s));
    }

    pub fn blit_transparent<const W: usize, const H: usize>(&mut self, tile: &Tile<W, H>, x: i32, y: i32) {
        let bounds = self.bounds();
        self.composite(tile, x, y, bounds, false, keyed);
    }

    /// Solid tiles are copied whole, everything else keyed.
    pub fn draw_tile<const W: usize, const H: usize>(&mut self, tile: &Tile<W, H>, x: i32, y: i32) {
        match tile.kind {
            TileKind::Solid => self.blit_opaque(tile, x, y),
            _ => self.blit_transparent(tile, x, y),
        }
    }

    /// Keyed copy that swaps the font colour key for `color`.
    pub fn blit_recolor<const W: usize, const H: usize>(&mut self, tile: &Tile<W, H>, x: i32, y: i32, color: u8) {
        let bounds = self.bounds();
        self.composite(tile, x, y, bounds, false, |_, s| match s {
            TRANSPARENT_COLOR => None,
            FONT_COLOR_KEY => Some(color),
            _ => Some(s),
        });
    }

    /// Silhouette in white. Solid tiles have no silhouette and are copied.
    pub fn blit_solid_white<const W: usize, const H: usize>(&mut self, tile: &Tile<W, H>, x: i32, y: i32) {
        if tile.kind == TileKind::Solid {
            return self.blit_opaque(tile, x, y)
        }
        let bounds = self.bounds();
        self.composite(tile, x, y, bounds, false, |_, s| (s != TRANSPARENT_COLOR).then_some(WHITE_INDEX));
    }

    /// Brightens what is already on the surface under the tile's opaque
    /// pixels. Only transparent tiles carry a usable mask.
    pub fn blit_mask_bit<const W: usize, const H: usize>(&mut self, tile: &Tile<W, H>, x: i32, y: i32) {
        if tile.kind != TileKind::Transparent {
            return
        }
        let bounds = self.bounds();
        self.composite(tile, x, y, bounds, false, |mut d, s| {
            d.set_bit(INTENSITY_BIT, true);
            (s != TRANSPARENT_COLOR).then_some(d)
        });
    }

    /// Keyed copy, upside down.
    pub fn blit_flipped<const W: usize, const H: usize>(&mut self, tile: &Tile<W, H>, x: i32, y: i32) {
        let bounds = self.bounds();
        self.composite(tile, x, y, bounds, true, keyed);
    }

    /// Keyed copy limited to `clip`.
    pub fn blit_clipped<const W: usize, const H: usize>(&mut self, tile: &Tile<W, H>, x: i32, y: i32, clip: Rect) {
        self.composite(tile, x, y, clip, false, keyed);
    }

    /// Sets the intensity bit over a tile-sized area in `pattern`.
    pub fn highlight(&mut self, x: i32, y: i32, pattern: HighlightPattern) {
        let area = Rect::new(x, y, TILE_WIDTH as i32, TILE_HEIGHT as i32);
        let Some(area) = area.intersect(&self.bounds()) else {
            return
        };

        for dy in area.y..area.bottom() {
            let row = self.surface.row_mut(dy as usize);
            for dx in area.x..area.right() {
                if pattern.covers((dy - y) as usize, (dx - x) as usize) {
                    row[dx as usize].set_bit(INTENSITY_BIT, true);
                }
            }
        }
    }
}

#[inline(always)]
fn keyed(_: u8, s: u8) -> Option<u8> {
    (s != TRANSPARENT_COLOR).then_some(s)
}
