use bit_field::BitField;

/// Packs 8-bit channels into RGBA5551, keeping the top five bits of each
/// channel. The coverage bit is always set.
#[inline(always)]
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 3) << 6) | ((b as u16 >> 3) << 1) | 1
}

/// Expands RGBA5551 back to 8-bit channels, replicating the high bits into
/// the low ones so that full intensity maps to 0xFF.
pub fn unpack_rgba8(color: u16) -> [u8; 4] {
    let expand = |v: u16| ((v << 3) | (v >> 2)) as u8;
    let a = if color.get_bit(0) { 0xFF } else { 0 };

    [
        expand(color.get_bits(11..16)),
        expand(color.get_bits(6..11)),
        expand(color.get_bits(1..6)),
        a,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_matches_5551_layout() {
        assert_eq!(pack_rgb(0, 0, 0), 0x0001);
        assert_eq!(pack_rgb(0xFF, 0xFF, 0xFF), 0xFFFF);
        assert_eq!(pack_rgb(0xFF, 0, 0), 0xF801);
        assert_eq!(pack_rgb(0, 0xFF, 0), 0x07C1);
        assert_eq!(pack_rgb(0, 0, 0xFF), 0x003F);
        // low three bits of each channel are dropped
        assert_eq!(pack_rgb(0xAA, 0x55, 0x07), pack_rgb(0xA8, 0x50, 0x00));
    }

    #[test]
    fn unpack_expands_to_full_range() {
        assert_eq!(unpack_rgba8(0xFFFF), [0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(unpack_rgba8(0x0001), [0, 0, 0, 0xFF]);
        assert_eq!(unpack_rgba8(0xF800), [0xFF, 0, 0, 0]);
        assert_eq!(unpack_rgba8(pack_rgb(0xAA, 0x55, 0x00)), [0xAD, 0x52, 0x00, 0xFF]);
    }
}
