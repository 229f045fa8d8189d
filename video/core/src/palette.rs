use log::warn;
use crate::color::{Rgb, EGA_COLORS};
use crate::error::PaletteError;

pub const PALETTE_SIZE: usize = 16;

/// TLUT slot a surface's palette lives in. The two logical surfaces never
/// share one, so switching modes needs no reload.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PaletteSlot {
    Game = 0,
    Text = 1,
}

impl PaletteSlot {
    pub const fn index(self) -> u8 {
        self as u8
    }
}

/// Sixteen colours plus their packed RGBA5551 form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgb; PALETTE_SIZE],
    native: [u16; PALETTE_SIZE],
    version: u32,
    dirty: bool,
}

impl Palette {
    /// New palettes start dirty: nothing has been uploaded yet.
    pub fn new(colors: [Rgb; PALETTE_SIZE]) -> Self {
        Self {
            colors,
            native: colors.map(Rgb::to_native),
            version: 0,
            dirty: true,
        }
    }

    pub fn black() -> Self {
        Self::new([Rgb::BLACK; PALETTE_SIZE])
    }

    /// The fully lit game palette: the eight low-intensity EGA colours
    /// followed by the eight high-intensity ones.
    pub fn lit() -> Self {
        Self::new(core::array::from_fn(lit_color))
    }

    pub fn color(&self, index: usize) -> Rgb {
        self.colors[index]
    }

    pub fn colors(&self) -> &[Rgb; PALETTE_SIZE] {
        &self.colors
    }

    pub fn native(&self) -> &[u16; PALETTE_SIZE] {
        &self.native
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Overwrites `colors.len()` entries starting at `first`. One call is one
    /// version bump, however many entries it touches.
    pub fn set_colors(&mut self, first: usize, colors: &[Rgb]) -> Result<(), PaletteError> {
        let count = colors.len();
        if first > PALETTE_SIZE || count > PALETTE_SIZE - first {
            return Err(PaletteError::OutOfRange { first, count })
        }

        for (i, c) in colors.iter().enumerate() {
            self.colors[first + i] = *c;
            self.native[first + i] = c.to_native();
        }
        self.version = self.version.wrapping_add(1);
        self.dirty = true;
        Ok(())
    }

    /// The palette as the coprocessor loads it: big-endian RGBA5551.
    pub fn to_be_bytes(&self) -> [u8; PALETTE_SIZE * 2] {
        bytemuck::cast(self.native.map(u16::to_be))
    }
}

/// Target of the fade-in for entry `index`.
pub fn lit_color(index: usize) -> Rgb {
    if index < 8 { EGA_COLORS[index] } else { EGA_COLORS[index + 8] }
}

/// Status-returning form of [`Palette::set_colors`]. A missing palette is
/// reported, never assumed away.
pub fn set_colors(palette: Option<&mut Palette>, colors: &[Rgb], first: usize) -> Result<(), PaletteError> {
    let Some(palette) = palette else {
        warn!(target: "video", "set_colors without a palette ({} entries at {})", colors.len(), first);
        return Err(PaletteError::Missing)
    };
    palette.set_colors(first, colors)
}

pub fn set_single_color(palette: Option<&mut Palette>, index: usize, color: Rgb) -> Result<(), PaletteError> {
    set_colors(palette, &[color], index)
}
