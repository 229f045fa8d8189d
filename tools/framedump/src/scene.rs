use cosmo_rcp::DisplayUnit;
use cosmo_video::{
    BitmapFont, HighlightPattern, RasterizerBackend, Rect, Tile, TileKind, VideoContext, TILE_HEIGHT, TILE_WIDTH,
    TRANSPARENT_COLOR,
};

pub const FONT_BYTES: usize = 256 * 16;

/// A 256-glyph 8x16 font for when none is given: every glyph is a box with
/// its character code written in binary down the middle.
pub fn fallback_font() -> Vec<u8> {
    let mut glyphs = vec![0u8; FONT_BYTES];
    for (ch, glyph) in glyphs.chunks_mut(16).enumerate() {
        glyph[1] = 0x7E;
        glyph[14] = 0x7E;
        for row in 2..14 {
            glyph[row] = 0x42;
        }
        for bit in 0..8 {
            if ch & (1 << bit) != 0 {
                glyph[4 + bit] |= 0x18;
            }
        }
    }
    glyphs
}

fn diamond() -> Tile {
    let mut pixels = [[TRANSPARENT_COLOR; TILE_WIDTH]; TILE_HEIGHT];
    for (y, row) in pixels.iter_mut().enumerate() {
        for (x, p) in row.iter_mut().enumerate() {
            let d = (x as i32 - 3).abs() + (y as i32 - 3).abs();
            if d <= 3 {
                *p = if d == 3 { 0x0F } else { 0x0C };
            }
        }
    }
    Tile::new(TileKind::Transparent, pixels)
}

fn arrow() -> Tile {
    let mut pixels = [[TRANSPARENT_COLOR; TILE_WIDTH]; TILE_HEIGHT];
    for (y, row) in pixels.iter_mut().enumerate() {
        let half = y.min(TILE_HEIGHT - 1 - y);
        for p in row.iter_mut().take(half * 2 + 1) {
            *p = 0x0E;
        }
    }
    pixels[0][0] = 0x0A;
    Tile::new(TileKind::Transparent, pixels)
}

fn bricks() -> Tile {
    let mut pixels = [[0x04; TILE_WIDTH]; TILE_HEIGHT];
    for (y, row) in pixels.iter_mut().enumerate() {
        if y % 4 == 3 {
            row.fill(0x07);
        } else {
            row[if (y / 4) % 2 == 0 { 3 } else { 7 }] = 0x07;
        }
    }
    Tile::new(TileKind::Solid, pixels)
}

/// Paints a row of each kind of tile draw over a banded background.
pub fn paint_game<B: RasterizerBackend, D: DisplayUnit>(ctx: &mut VideoContext<B, D>) {
    let surface = ctx.game_surface_mut();
    let height = surface.height();
    for (y, row) in surface.rows_mut().enumerate() {
        row.fill((y * 8 / height) as u8);
    }

    let (bricks, diamond, arrow) = (bricks(), diamond(), arrow());
    let mut blit = ctx.blitter();

    for x in (0..320).step_by(TILE_WIDTH) {
        blit.draw_tile(&bricks, x, 184);
        blit.draw_tile(&bricks, x, 192);
    }

    for i in 0..8 {
        let x = 16 + i * 36;
        blit.draw_tile(&diamond, x, 24);
        blit.blit_flipped(&arrow, x, 48);
        blit.blit_recolor(&diamond, x, 72, i as u8 + 1);
        blit.blit_solid_white(&arrow, x, 96);
        blit.blit_mask_bit(&diamond, x, 120);
        blit.blit_clipped(&diamond, x, 144, Rect::new(x, 144, 4 + i % 4, 6));
    }

    for (i, pattern) in [HighlightPattern::LowerRight, HighlightPattern::Full, HighlightPattern::LowerLeft]
        .into_iter()
        .enumerate()
    {
        blit.highlight(260 + i as i32 * 12, 160, pattern);
    }
}

/// Writes `lines` into the text surface, one per text row.
pub fn paint_text<B: RasterizerBackend, D: DisplayUnit>(
    ctx: &mut VideoContext<B, D>,
    font: &BitmapFont<'_>,
    lines: &[&str],
) {
    for (row, line) in lines.iter().enumerate() {
        for (col, ch) in line.bytes().enumerate() {
            let fg = 0x08 + (row % 8) as u8;
            ctx.draw_text(font, ch, fg, 0x01, col + 2, row + 1);
        }
    }
}
