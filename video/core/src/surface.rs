use alloc::alloc::{handle_alloc_error, Layout};
use alloc::vec::Vec;
use bytemuck::{Pod, Zeroable};
use crate::palette::Palette;

/// Storage unit that gives pixel buffers the 64-byte alignment DMA needs.
#[derive(Copy, Clone, Pod, Zeroable)]
#[repr(C, align(64))]
struct Line([u8; 64]);

/// An 8-bit indexed framebuffer and the palette its indices refer to.
///
/// Rows are `pitch` bytes apart; only the first `width` bytes of each are
/// visible. The buffer is exactly `pitch * height` bytes.
pub struct Surface {
    storage: Vec<Line>,
    width: usize,
    height: usize,
    pitch: usize,
    palette: Palette,
}

impl Surface {
    pub fn create(width: u16, height: u16, palette: Palette) -> Self {
        Self::with_pitch(width, height, width, palette)
    }

    /// Allocates a zeroed buffer. Running out of memory here aborts; there is
    /// nothing sensible to fall back to.
    pub fn with_pitch(width: u16, height: u16, pitch: u16, palette: Palette) -> Self {
        assert!(pitch >= width, "pitch {} narrower than width {}", pitch, width);

        let len = pitch as usize * height as usize;
        let lines = len.div_ceil(64);

        let mut storage = Vec::new();
        if storage.try_reserve_exact(lines).is_err() {
            handle_alloc_error(Layout::array::<Line>(lines).unwrap_or_else(|_| Layout::new::<Line>()));
        }
        storage.resize(lines, Line::zeroed());

        Self {
            storage,
            width: width as usize,
            height: height as usize,
            pitch: pitch as usize,
            palette,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn byte_len(&self) -> usize {
        self.pitch * self.height
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    /// The whole buffer, padding included, as the coprocessor reads it.
    pub fn pixels(&self) -> &[u8] {
        &bytemuck::cast_slice::<Line, u8>(&self.storage)[..self.byte_len()]
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        let len = self.byte_len();
        &mut bytemuck::cast_slice_mut::<Line, u8>(&mut self.storage)[..len]
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.pitch;
        &self.pixels()[start..start + self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let (start, width) = (y * self.pitch, self.width);
        &mut self.pixels_mut()[start..start + width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let width = self.width;
        self.pixels().chunks(self.pitch).map(move |r| &r[..width])
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        let (width, pitch) = (self.width, self.pitch);
        self.pixels_mut().chunks_mut(pitch).map(move |r| &mut r[..width])
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None
        }
        Some(self.pixels()[y * self.pitch + x])
    }

    /// Writes one pixel; out-of-bounds writes are dropped.
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            let pitch = self.pitch;
            self.pixels_mut()[y * pitch + x] = value;
        }
    }

    pub fn fill(&mut self, value: u8) {
        self.pixels_mut().fill(value);
    }

    /// Copies a tightly packed `width * height` image in. A short source
    /// fills as many rows as it covers.
    pub fn copy_from(&mut self, src: &[u8]) {
        let width = self.width;
        for (dst, src) in self.rows_mut().zip(src.chunks(width)) {
            dst[..src.len()].copy_from_slice(src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_dma_aligned_and_sized() {
        let s = Surface::create(320, 200, Palette::black());
        assert_eq!(s.pixels().len(), 64000);
        assert_eq!(s.pixels().as_ptr() as usize % 64, 0);
        assert!(s.pixels().iter().all(|p| *p == 0));
    }

    #[test]
    fn pitch_pads_rows() {
        let mut s = Surface::with_pitch(6, 3, 8, Palette::black());
        assert_eq!(s.byte_len(), 24);
        s.fill(1);
        s.row_mut(1).copy_from_slice(&[2; 6]);
        assert_eq!(s.row(1), &[2; 6]);
        assert_eq!(&s.pixels()[8..16], &[2, 2, 2, 2, 2, 2, 1, 1]);
        assert_eq!(s.rows().count(), 3);
        assert_eq!(s.get(6, 0), None);
        assert_eq!(s.get(5, 1), Some(2));
    }

    #[test]
    fn copy_from_respects_pitch() {
        let mut s = Surface::with_pitch(2, 2, 4, Palette::black());
        s.copy_from(&[1, 2, 3, 4]);
        assert_eq!(s.pixels(), &[1, 2, 0, 0, 3, 4, 0, 0]);

        s.copy_from(&[9, 9, 9]);
        assert_eq!(s.pixels(), &[9, 9, 0, 0, 9, 4, 0, 0]);
    }

    #[test]
    fn set_ignores_out_of_bounds() {
        let mut s = Surface::create(4, 4, Palette::black());
        s.set(4, 0, 7);
        s.set(0, 4, 7);
        s.set(3, 3, 7);
        assert_eq!(s.pixels().iter().filter(|p| **p == 7).count(), 1);
    }
}
