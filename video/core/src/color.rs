use cosmo_rcp::color::pack_rgb;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_hex(v: u32) -> Self {
        Self::new((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    /// RGBA5551 as the display unit scans it out.
    #[inline(always)]
    pub const fn to_native(self) -> u16 {
        pack_rgb(self.r, self.g, self.b)
    }
}

/// The game's EGA colour table. 8-15 repeat the low-intensity colours so
/// that 16-23 can be addressed as "index + 8" by the fade-in.
pub const EGA_COLORS: [Rgb; 24] = [
    Rgb::from_hex(0x000000),
    Rgb::from_hex(0x0000AA),
    Rgb::from_hex(0x00AA00),
    Rgb::from_hex(0x00AAAA),
    Rgb::from_hex(0xAA0000),
    Rgb::from_hex(0xAA00AA),
    Rgb::from_hex(0xAA5500),
    Rgb::from_hex(0xAAAAAA),

    Rgb::from_hex(0x000000),
    Rgb::from_hex(0x0000AA),
    Rgb::from_hex(0x00AA00),
    Rgb::from_hex(0x00AAAA),
    Rgb::from_hex(0xAA0000),
    Rgb::from_hex(0xAA00AA),
    Rgb::from_hex(0xAA5500),
    Rgb::from_hex(0xAAAAAA),

    Rgb::from_hex(0x555555),
    Rgb::from_hex(0x5555FF),
    Rgb::from_hex(0x55FF55),
    Rgb::from_hex(0x55FFFF),
    Rgb::from_hex(0xFF5555),
    Rgb::from_hex(0xFF55FF),
    Rgb::from_hex(0xFFFF55),
    Rgb::from_hex(0xFFFFFF),
];

pub const EGA_BLACK: u8 = 0;
pub const EGA_WHITE: u8 = 23;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_conversion_is_the_5551_formula() {
        for c in EGA_COLORS {
            let expect = ((c.r as u16 >> 3) << 11) | ((c.g as u16 >> 3) << 6) | ((c.b as u16 >> 3) << 1) | 1;
            assert_eq!(c.to_native(), expect);
            assert_eq!(c.to_native(), c.to_native());
        }
        assert_eq!(EGA_COLORS[EGA_WHITE as usize], Rgb::WHITE);
        assert_eq!(EGA_COLORS[EGA_BLACK as usize].to_native(), 0x0001);
    }
}
