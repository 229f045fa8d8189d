use core::fmt::{Debug, Formatter};

pub const TMEM_SIZE: usize = 4096;
/// Texels live below this offset whenever TLUT mode is enabled.
pub const TMEM_TEXTURE_HALF: usize = 2048;
/// TMEM word address of the first TLUT entry.
pub const TLUT_WORD: u16 = (TMEM_TEXTURE_HALF / 8) as u16;
pub const PALETTE_ENTRIES: usize = 16;

/// The RDP's 4 KiB texture memory.
pub struct Tmem {
    bytes: [u8; TMEM_SIZE],
}

impl Default for Tmem {
    fn default() -> Self {
        Self { bytes: [0; TMEM_SIZE] }
    }
}

impl Debug for Tmem {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tmem").finish_non_exhaustive()
    }
}

impl Tmem {
    /// TMEM word address of a 16-entry palette slot.
    #[inline(always)]
    pub const fn palette_slot_word(slot: u8) -> u16 {
        TLUT_WORD + slot as u16 * PALETTE_ENTRIES as u16
    }

    #[inline(always)]
    pub fn byte(&self, offset: usize) -> u8 {
        self.bytes[offset % TMEM_SIZE]
    }

    pub fn write(&mut self, offset: usize, data: &[u8]) {
        for (i, b) in data.iter().enumerate() {
            self.bytes[(offset + i) % TMEM_SIZE] = *b;
        }
    }

    pub fn read_u16(&self, offset: usize) -> u16 {
        u16::from_be_bytes([self.byte(offset), self.byte(offset + 1)])
    }

    /// TLUT entries are stored quadruplicated, one 64-bit word each.
    pub fn write_tlut_entry(&mut self, index: u8, color: u16) {
        let base = TMEM_TEXTURE_HALF + index as usize * 8;
        let [hi, lo] = color.to_be_bytes();
        self.write(base, &[hi, lo, hi, lo, hi, lo, hi, lo]);
    }

    pub fn tlut_entry(&self, index: u8) -> u16 {
        self.read_u16(TMEM_TEXTURE_HALF + index as usize * 8)
    }
}
