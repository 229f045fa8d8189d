//! The rasterizer seam. The band scheduler speaks only this trait; the RDP
//! implementation turns it into display-list commands.

pub mod rdp;

use cosmo_rcp::{DmaRegion, FramebufferInfo, Ticket};
use crate::band::BandDraw;
use crate::error::BackendError;
use crate::palette::PaletteSlot;

/// Per-frame pipeline state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameSetup {
    pub target: FramebufferInfo,
    /// One texel per pixel with an inclusive lower-right edge. Otherwise the
    /// one-cycle pipeline steps through the texture.
    pub copy_mode: bool,
}

/// One block of an indexed surface to move into texture memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TextureBand {
    /// The whole surface as the coprocessor sees it.
    pub source: DmaRegion,
    /// Byte offset of the band's first row within `source`.
    pub offset: u32,
    pub pitch: u16,
    /// First source column of the block.
    pub column: u16,
    pub width: u16,
    pub rows: u16,
    pub palette: PaletteSlot,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SubmitInfo {
    pub ticket: Ticket,
    pub words: usize,
}

pub trait RasterizerBackend {
    /// Makes CPU-written bytes visible to the rasterizer.
    fn publish(&mut self, region: DmaRegion, bytes: &[u8]) -> Result<(), BackendError>;

    fn begin_frame(&mut self, setup: FrameSetup) -> Result<(), BackendError>;

    /// Loads 16 packed colours from `source` into the TLUT slot.
    fn load_palette(&mut self, source: DmaRegion, slot: PaletteSlot) -> Result<(), BackendError>;

    fn load_texture_band(&mut self, band: &TextureBand) -> Result<(), BackendError>;

    /// Draws from whatever the last `load_texture_band` left in texture memory.
    fn draw_band(&mut self, draw: &BandDraw) -> Result<(), BackendError>;

    /// Hands the frame's commands to the rasterizer.
    fn submit(&mut self) -> Result<SubmitInfo, BackendError>;

    /// Drops whatever the failed frame queued since `begin_frame`. Commands
    /// queued before it, such as palette preloads, are kept.
    fn abort_frame(&mut self);
}
