use log::{debug, trace};
use thiserror::Error;
use crate::command::{Command, CycleType, ImageDesc, LoadArea, OtherModes, PixelSize, Scissor, TexRect, TexelFormat, TileDesc};
use crate::memory::{Rdram, RdramError};
use crate::tmem::{Tmem, TMEM_SIZE, TMEM_TEXTURE_HALF};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum RdpError {
    #[error("unknown rdp opcode 0x{0:02X}")]
    UnknownOpcode(u8),
    /// A multi-word command ran past the end of the list.
    #[error("command 0x{opcode:02X} truncated")]
    Truncated { opcode: u8 },
    #[error("unsupported {0}")]
    Unsupported(&'static str),
    #[error("tmem overflow: {len} bytes at offset {offset}")]
    TmemOverflow { offset: usize, len: usize },
    #[error("draw with no color image attached")]
    NoColorImage,
    #[error("load with no texture image set")]
    NoTextureImage,
    #[error(transparent)]
    Memory(#[from] RdramError),
}

/// Software interpreter for the subset of RDP commands the video port emits.
#[derive(Debug)]
pub struct SoftRdp {
    tmem: Tmem,
    tiles: [TileDesc; 8],
    texture_image: Option<ImageDesc>,
    color_image: Option<ImageDesc>,
    modes: OtherModes,
    scissor: Scissor,
    sync_full: u64,
    pixels: u64,
}

impl Default for SoftRdp {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftRdp {
    pub fn new() -> Self {
        Self {
            tmem: Tmem::default(),
            tiles: [TileDesc::default(); 8],
            texture_image: None,
            color_image: None,
            modes: OtherModes::empty(),
            scissor: Scissor { xh: 0, yh: 0, xl: 0, yl: 0 },
            sync_full: 0,
            pixels: 0,
        }
    }

    pub fn tmem(&self) -> &Tmem {
        &self.tmem
    }

    pub fn other_modes(&self) -> OtherModes {
        self.modes
    }

    /// Number of SyncFull commands retired so far.
    pub fn sync_full_count(&self) -> u64 {
        self.sync_full
    }

    pub fn pixels_written(&self) -> u64 {
        self.pixels
    }

    pub fn execute<R: Rdram + ?Sized>(&mut self, rdram: &mut R, words: &[u64]) -> Result<(), RdpError> {
        let mut pc = 0;
        while pc < words.len() {
            let (cmd, used) = Command::decode(&words[pc..])?;
            trace!(target: "rdp", "{:04}: {:?}", pc, cmd);
            self.apply(rdram, cmd)?;
            pc += used;
        }
        Ok(())
    }

    fn apply<R: Rdram + ?Sized>(&mut self, rdram: &mut R, cmd: Command) -> Result<(), RdpError> {
        match cmd {
            Command::SyncPipe | Command::SyncTile | Command::SyncLoad => {}
            Command::SyncFull => {
                self.sync_full += 1;
                debug!(target: "rdp", "sync full #{}, {} pixels written", self.sync_full, self.pixels);
            }
            Command::SetOtherModes(modes) => self.modes = modes,
            Command::SetScissor(scissor) => self.scissor = scissor,
            Command::SetColorImage(image) => {
                if image.format != TexelFormat::Rgba || image.size != PixelSize::Bits16 {
                    return Err(RdpError::Unsupported("color image format"))
                }
                self.color_image = Some(image);
            }
            Command::SetTextureImage(image) => self.texture_image = Some(image),
            Command::SetTile(tile) => self.tiles[tile.tile as usize & 7] = tile,
            Command::LoadTile(area) => self.load_tile(rdram, area)?,
            Command::LoadTlut(area) => self.load_tlut(rdram, area)?,
            Command::TextureRectangle(rect) => self.texture_rectangle(rdram, rect)?,
        }
        Ok(())
    }

    fn load_tile<R: Rdram + ?Sized>(&mut self, rdram: &R, area: LoadArea) -> Result<(), RdpError> {
        let image = self.texture_image.ok_or(RdpError::NoTextureImage)?;
        let tile = self.tiles[area.tile as usize & 7];

        let (s0, t0) = ((area.sl >> 2) as usize, (area.tl >> 2) as usize);
        let (s1, t1) = ((area.sh >> 2) as usize, (area.th >> 2) as usize);
        if s1 < s0 || t1 < t0 {
            return Ok(())
        }

        let bpp = image.size.bytes() as usize;
        let row_bytes = (s1 - s0 + 1) * bpp;
        let rows = t1 - t0 + 1;
        let line_bytes = tile.line as usize * 8;
        let base = tile.tmem as usize * 8;

        if rows > 1 && line_bytes < row_bytes {
            return Err(RdpError::Unsupported("tile line shorter than the loaded row"))
        }

        let limit = if self.modes.contains(OtherModes::ENABLE_TLUT) { TMEM_TEXTURE_HALF } else { TMEM_SIZE };
        let end = base + (rows - 1) * line_bytes + row_bytes;
        if end > limit {
            return Err(RdpError::TmemOverflow { offset: base, len: end - base })
        }

        let mut row = [0u8; TMEM_SIZE];
        for t in t0..=t1 {
            let addr = image.addr as usize + (t * image.width as usize + s0) * bpp;
            rdram.read(addr as u32, &mut row[..row_bytes])?;
            self.tmem.write(base + (t - t0) * line_bytes, &row[..row_bytes]);
        }

        trace!(target: "rdp", "load tile {}: {}x{} texels to tmem ${:03X}", area.tile, s1 - s0 + 1, rows, base);
        Ok(())
    }

    fn load_tlut<R: Rdram + ?Sized>(&mut self, rdram: &R, area: LoadArea) -> Result<(), RdpError> {
        let image = self.texture_image.ok_or(RdpError::NoTextureImage)?;
        let tile = self.tiles[area.tile as usize & 7];

        let (first, last) = ((area.sl >> 2) as usize, (area.sh >> 2) as usize);
        if last < first {
            return Ok(())
        }

        let count = last - first + 1;
        let base = tile.tmem as usize * 8;
        if base < TMEM_TEXTURE_HALF || base + count * 8 > TMEM_SIZE {
            return Err(RdpError::TmemOverflow { offset: base, len: count * 8 })
        }

        let entry0 = (base - TMEM_TEXTURE_HALF) / 8;
        for i in 0..count {
            let color = rdram.read_u16(image.addr + ((first + i) * 2) as u32)?;
            self.tmem.write_tlut_entry((entry0 + i) as u8, color);
        }

        trace!(target: "rdp", "load tlut: {} entries at entry {}", count, entry0);
        Ok(())
    }

    fn lookup(&self, palette: u8, index: u8) -> Result<u16, RdpError> {
        if !self.modes.contains(OtherModes::ENABLE_TLUT) {
            return Err(RdpError::Unsupported("color-indexed texels without tlut"))
        }
        Ok(self.tmem.tlut_entry((palette << 4) | (index & 0x0F)))
    }

    fn texel(&self, tile: &TileDesc, s: i32, t: i32) -> Result<u16, RdpError> {
        let (s, t) = (s.max(0) as usize, t.max(0) as usize);
        let row = tile.tmem as usize * 8 + t * tile.line as usize * 8;

        match (tile.format, tile.size) {
            (TexelFormat::ColorIndex, PixelSize::Bits8) => self.lookup(tile.palette, self.tmem.byte(row + s)),
            (TexelFormat::ColorIndex, PixelSize::Bits4) => {
                let b = self.tmem.byte(row + s / 2);
                let index = if s % 2 == 0 { b >> 4 } else { b & 0x0F };
                self.lookup(tile.palette, index)
            }
            (TexelFormat::Rgba, PixelSize::Bits16) => Ok(self.tmem.read_u16(row + s * 2)),
            _ => Err(RdpError::Unsupported("texel format")),
        }
    }

    fn texture_rectangle<R: Rdram + ?Sized>(&mut self, rdram: &mut R, rect: TexRect) -> Result<(), RdpError> {
        let image = self.color_image.ok_or(RdpError::NoColorImage)?;
        let tile = self.tiles[rect.tile as usize & 7];

        let (x0, y0) = ((rect.xh >> 2) as i32, (rect.yh >> 2) as i32);
        // copy mode includes the lower-right edge and walks one texel per pixel
        let (x1, y1, s_step) = match self.modes.cycle_type() {
            CycleType::Copy => ((rect.xl >> 2) as i32 + 1, (rect.yl >> 2) as i32 + 1, 1 << 10),
            CycleType::OneCycle => ((rect.xl >> 2) as i32, (rect.yl >> 2) as i32, rect.dsdx as i32),
            _ => return Err(RdpError::Unsupported("cycle type")),
        };
        let t_step = rect.dtdy as i32;

        let clip_x0 = (self.scissor.xh >> 2) as i32;
        let clip_y0 = (self.scissor.yh >> 2) as i32;
        let clip_x1 = ((self.scissor.xl >> 2) as i32).min(image.width as i32);
        let clip_y1 = (self.scissor.yl >> 2) as i32;

        let s_base = (rect.s as i32) << 5;
        let t_base = (rect.t as i32) << 5;

        for y in y0.max(clip_y0)..y1.min(clip_y1) {
            let t = (t_base + (y - y0) * t_step) >> 10;
            let line = image.addr + (y as u32 * image.width as u32) * 2;

            for x in x0.max(clip_x0)..x1.min(clip_x1) {
                let s = (s_base + (x - x0) * s_step) >> 10;
                let color = self.texel(&tile, s, t)?;
                rdram.write_u16(line + x as u32 * 2, color)?;
                self.pixels += 1;
            }
        }

        Ok(())
    }
}
