use log::{debug, error};
use crate::memory::{DmaRegion, Rdram, RdramError, VecRdram};
use crate::rdp::{RdpError, SoftRdp};

/// Monotonic id of a submitted display list. Ticket 0 is never issued.
pub type Ticket = u64;

/// The graphics coprocessor as seen from the CPU.
pub trait Coprocessor {
    /// Writes CPU-side bytes back to memory the coprocessor reads. Until a
    /// range is published the coprocessor keeps seeing its previous contents.
    fn publish(&mut self, region: DmaRegion, bytes: &[u8]) -> Result<(), RdramError>;

    /// Starts executing a display list.
    fn execute(&mut self, words: &[u64]) -> Result<Ticket, RdpError>;

    /// The most recent ticket whose list the coprocessor has finished reading.
    fn retired(&mut self) -> Ticket;
}

/// A coprocessor made of host RDRAM and the software RDP. Lists run to
/// completion inside `execute`.
pub struct SoftRcp {
    rdram: VecRdram,
    rdp: SoftRdp,
    issued: Ticket,
    published: u64,
}

impl SoftRcp {
    pub fn new(rdram: VecRdram) -> Self {
        Self { rdram, rdp: SoftRdp::new(), issued: 0, published: 0 }
    }

    pub fn rdram(&self) -> &VecRdram {
        &self.rdram
    }

    pub fn rdp(&self) -> &SoftRdp {
        &self.rdp
    }

    /// Bytes written back through `publish` so far.
    pub fn published_bytes(&self) -> u64 {
        self.published
    }
}

impl Coprocessor for SoftRcp {
    fn publish(&mut self, region: DmaRegion, bytes: &[u8]) -> Result<(), RdramError> {
        if bytes.len() > region.len as usize {
            return Err(RdramError { addr: region.addr, len: bytes.len() })
        }
        self.rdram.write(region.addr, bytes)?;
        self.published += bytes.len() as u64;
        Ok(())
    }

    fn execute(&mut self, words: &[u64]) -> Result<Ticket, RdpError> {
        self.issued += 1;
        debug!(target: "rdp", "executing list #{} ({} words)", self.issued, words.len());
        if let Err(e) = self.rdp.execute(&mut self.rdram, words) {
            error!(target: "rdp", "list #{} faulted: {}", self.issued, e);
            return Err(e)
        }
        Ok(self.issued)
    }

    fn retired(&mut self) -> Ticket {
        self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, ImageDesc, LoadArea, OtherModes, PixelSize, Scissor, TexRect, TexelFormat, TileDesc};
    use crate::display_list::DisplayList;
    use crate::tmem::Tmem;

    fn frame(list: &mut DisplayList<64>, tex: DmaRegion, pal: DmaRegion, fb: u32) {
        list.extend([
            Command::SetColorImage(ImageDesc { format: TexelFormat::Rgba, size: PixelSize::Bits16, width: 4, addr: fb }),
            Command::SetScissor(Scissor { xh: 0, yh: 0, xl: 4 << 2, yl: 1 << 2 }),
            Command::SetTextureImage(ImageDesc { format: TexelFormat::Rgba, size: PixelSize::Bits16, width: 16, addr: pal.addr }),
            Command::SetTile(TileDesc { tmem: Tmem::palette_slot_word(0), tile: 2, ..TileDesc::default() }),
            Command::LoadTlut(LoadArea { tile: 2, sl: 0, tl: 0, sh: 15 << 2, th: 0 }),
            Command::SetOtherModes(OtherModes::CYCLE_COPY | OtherModes::ENABLE_TLUT),
            Command::SetTextureImage(ImageDesc { format: TexelFormat::ColorIndex, size: PixelSize::Bits8, width: 4, addr: tex.addr }),
            Command::SetTile(TileDesc { format: TexelFormat::ColorIndex, size: PixelSize::Bits8, line: 1, tmem: 0, tile: 0, palette: 0 }),
            Command::LoadTile(LoadArea { tile: 0, sl: 0, tl: 0, sh: 3 << 2, th: 0 }),
            Command::TextureRectangle(TexRect { tile: 0, xh: 0, yh: 0, xl: 3 << 2, yl: 0, s: 0, t: 0, dsdx: 4 << 10, dtdy: 1 << 10 }),
            Command::SyncFull,
        ]);
    }

    #[test]
    fn unpublished_pixels_stay_stale() {
        let tex = DmaRegion::new(0x40, 4);
        let pal = DmaRegion::new(0x80, 32);
        let fb = 0x100;

        let mut rcp = SoftRcp::new(VecRdram::new(0x200));
        let palette: [u8; 32] = core::array::from_fn(|i| if i % 2 == 1 { i as u8 } else { 0 });
        rcp.publish(pal, &palette).unwrap();
        rcp.publish(tex, &[1, 1, 1, 1]).unwrap();

        let mut list: DisplayList<64> = DisplayList::new();
        frame(&mut list, tex, pal, fb);
        let t1 = rcp.execute(list.words()).unwrap();
        assert_eq!(rcp.retired(), t1);
        assert_eq!(rcp.rdram().read_u16(fb).unwrap(), 3);

        // the CPU copy changed but was never written back
        let t2 = rcp.execute(list.words()).unwrap();
        assert!(t2 > t1);
        assert_eq!(rcp.rdram().read_u16(fb).unwrap(), 3);

        rcp.publish(tex, &[2, 2, 2, 2]).unwrap();
        rcp.execute(list.words()).unwrap();
        assert_eq!(rcp.rdram().read_u16(fb).unwrap(), 5);
        assert_eq!(rcp.rdp().sync_full_count(), 3);
        assert_eq!(rcp.published_bytes(), 32 + 4 + 4);
    }

    #[test]
    fn publish_rejects_oversized_writes() {
        let mut rcp = SoftRcp::new(VecRdram::new(0x100));
        let r = DmaRegion::new(0x40, 2);
        assert!(rcp.publish(r, &[0; 3]).is_err());
        assert!(rcp.publish(r, &[0; 2]).is_ok());
    }
}
