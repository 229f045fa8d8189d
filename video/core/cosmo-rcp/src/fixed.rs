//! Fixed-point encodings used by RDP command words.

/// One unit in a 10.2 screen coordinate.
pub const SCREEN_ONE: u16 = 1 << 2;
/// One texel in an s10.5 texture coordinate.
pub const TEXEL_ONE: i16 = 1 << 5;
/// A step of 1.0 in s5.10.
pub const STEP_ONE: i16 = 1 << 10;

/// Integer pixel to 10.2.
#[inline(always)]
pub const fn screen(px: u16) -> u16 {
    px << 2
}

/// 10.2 back to its integer part.
#[inline(always)]
pub const fn screen_int(v: u16) -> u16 {
    v >> 2
}

/// Integer texel to s10.5.
#[inline(always)]
pub const fn texel(t: i16) -> i16 {
    t << 5
}

/// `num / den` as s5.10, rounded to nearest. Returns `None` when the ratio
/// does not fit the signed 16-bit field.
pub fn step_ratio(num: u32, den: u32) -> Option<i16> {
    if den == 0 {
        return None
    }
    let v = (num as u64 * 1024 + den as u64 / 2) / den as u64;
    i16::try_from(v).ok()
}
