use alloc::vec;
use alloc::vec::Vec;
use log::debug;
use thiserror::Error;

/// Alignment the RSP/RDP DMA engines need for every buffer they touch.
pub const DMA_ALIGN: u32 = 64;

/// A span of coprocessor-visible memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DmaRegion {
    pub addr: u32,
    pub len: u32,
}

impl DmaRegion {
    pub const fn new(addr: u32, len: u32) -> Self {
        Self { addr, len }
    }

    #[inline(always)]
    pub const fn end(&self) -> u32 {
        self.addr + self.len
    }

    #[inline(always)]
    pub fn contains(&self, addr: u32, len: u32) -> bool {
        addr >= self.addr && (addr as u64 + len as u64) <= self.end() as u64
    }
}

/// Bump allocator handing out aligned regions of RDRAM. Nothing is ever freed;
/// the video subsystem allocates everything it needs once, at init.
#[derive(Debug)]
pub struct DmaArena {
    next: u32,
    end: u32,
}

impl DmaArena {
    pub fn new(base: u32, len: u32) -> Self {
        let end = base.saturating_add(len);
        Self { next: align_up(base).min(end), end }
    }

    pub fn alloc(&mut self, len: u32) -> Option<DmaRegion> {
        let addr = self.next;
        let end = addr.checked_add(len)?;
        if end > self.end {
            return None
        }

        self.next = align_up(end).min(self.end);
        debug!(target: "rdp", "dma region ${:08X}..${:08X}", addr, end);
        Some(DmaRegion { addr, len })
    }

    pub fn remaining(&self) -> u32 {
        self.end - self.next
    }
}

#[inline(always)]
const fn align_up(addr: u32) -> u32 {
    (addr + DMA_ALIGN - 1) & !(DMA_ALIGN - 1)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("rdram access out of range: {len} bytes at ${addr:08X}")]
pub struct RdramError {
    pub addr: u32,
    pub len: usize,
}

/// Main memory as the coprocessor sees it. Multi-byte values are big-endian.
pub trait Rdram {
    fn size(&self) -> u32;
    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<(), RdramError>;
    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), RdramError>;

    fn read_u16(&self, addr: u32) -> Result<u16, RdramError> {
        let mut b = [0u8; 2];
        self.read(addr, &mut b)?;
        Ok(u16::from_be_bytes(b))
    }

    fn write_u16(&mut self, addr: u32, value: u16) -> Result<(), RdramError> {
        self.write(addr, &value.to_be_bytes())
    }
}

/// RDRAM backed by host memory.
pub struct VecRdram {
    bytes: Vec<u8>,
}

impl VecRdram {
    pub fn new(size: u32) -> Self {
        Self { bytes: vec![0; size as usize] }
    }

    fn span(&self, addr: u32, len: usize) -> Result<core::ops::Range<usize>, RdramError> {
        let start = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(RdramError { addr, len }),
        }
    }

    pub fn slice(&self, region: DmaRegion) -> Result<&[u8], RdramError> {
        let span = self.span(region.addr, region.len as usize)?;
        Ok(&self.bytes[span])
    }
}

impl Rdram for VecRdram {
    fn size(&self) -> u32 {
        self.bytes.len() as u32
    }

    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<(), RdramError> {
        let span = self.span(addr, buf.len())?;
        buf.copy_from_slice(&self.bytes[span]);
        Ok(())
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), RdramError> {
        let span = self.span(addr, data.len())?;
        self.bytes[span].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_aligns_every_region() {
        let mut arena = DmaArena::new(0x10, 0x1000);
        let a = arena.alloc(100).unwrap();
        let b = arena.alloc(1).unwrap();
        let c = arena.alloc(64).unwrap();

        assert_eq!(a.addr, 0x40);
        assert_eq!(b.addr, 0x40 + 128);
        assert_eq!(c.addr, 0x40 + 192);
        for r in [a, b, c] {
            assert_eq!(r.addr % DMA_ALIGN, 0);
        }
    }

    #[test]
    fn arena_runs_out() {
        let mut arena = DmaArena::new(0, 256);
        assert!(arena.alloc(200).is_some());
        assert!(arena.alloc(64).is_none());
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn rdram_is_big_endian_and_bounds_checked() {
        let mut ram = VecRdram::new(16);
        ram.write_u16(2, 0xABCD).unwrap();
        let mut b = [0u8; 2];
        ram.read(2, &mut b).unwrap();
        assert_eq!(b, [0xAB, 0xCD]);
        assert_eq!(ram.read_u16(2).unwrap(), 0xABCD);

        assert_eq!(ram.write(15, &[1, 2]), Err(RdramError { addr: 15, len: 2 }));
        assert!(ram.read(u32::MAX, &mut b).is_err());
    }

    #[test]
    fn region_bounds() {
        let r = DmaRegion::new(64, 32);
        assert!(r.contains(64, 32));
        assert!(r.contains(80, 16));
        assert!(!r.contains(80, 17));
        assert!(!r.contains(63, 1));
    }
}
