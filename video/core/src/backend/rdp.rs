use alloc::boxed::Box;
use alloc::vec::Vec;
use cosmo_rcp::command::{LoadArea, Scissor};
use cosmo_rcp::fixed::{screen, texel, STEP_ONE};
use cosmo_rcp::tmem::{Tmem, PALETTE_ENTRIES};
use cosmo_rcp::{
    Command, Coprocessor, DisplayList, DmaRegion, ImageDesc, OtherModes, PixelSize, TexRect, TexelFormat, Ticket,
    TileDesc,
};
use log::{debug, trace};
use crate::backend::{FrameSetup, RasterizerBackend, SubmitInfo, TextureBand};
use crate::band::BandDraw;
use crate::config::{SubmitPolicy, VideoConfig};
use crate::error::BackendError;
use crate::palette::PaletteSlot;

/// Tile descriptor used to load texels.
const LOAD_TILE: u8 = 0;
/// Tile descriptor used to draw them, bound to a palette slot.
const DRAW_TILE: u8 = 1;
/// Tile descriptor used to load TLUTs.
const TLUT_TILE: u8 = 2;

/// Copy mode ignores the step, but the hardware expects 4.0 here.
const COPY_DSDX: i16 = 4 << 10;

/// Drives the RDP through a ring of display lists.
pub struct RdpBackend<C: Coprocessor> {
    rcp: C,
    lists: Vec<Box<DisplayList>>,
    /// Ticket each list was last submitted under; 0 if never.
    tickets: Vec<Ticket>,
    current: usize,
    /// Length of the current list when the frame being built began.
    frame_start: usize,
    policy: SubmitPolicy,
    copy_mode: bool,
    waits: u64,
}

impl<C: Coprocessor> RdpBackend<C> {
    /// # Panics
    /// If `lists` is zero, or round-robin is asked for with a single list.
    pub fn new(rcp: C, lists: usize, policy: SubmitPolicy) -> Self {
        assert!(lists > 0, "at least one display list is required");
        assert!(
            policy == SubmitPolicy::Synchronous || lists > 1,
            "round-robin submission needs two or more display lists"
        );

        Self {
            rcp,
            lists: (0..lists).map(|_| Box::new(DisplayList::new())).collect(),
            tickets: alloc::vec![0; lists],
            current: 0,
            frame_start: 0,
            policy,
            copy_mode: true,
            waits: 0,
        }
    }

    pub fn from_config(rcp: C, config: &VideoConfig) -> Self {
        Self::new(rcp, config.display_lists, config.submit_policy)
    }

    pub fn coprocessor(&self) -> &C {
        &self.rcp
    }

    pub fn coprocessor_mut(&mut self) -> &mut C {
        &mut self.rcp
    }

    pub fn into_inner(self) -> C {
        self.rcp
    }

    /// Words queued in the list being built.
    pub fn pending_words(&self) -> usize {
        self.lists[self.current].len()
    }

    pub fn current_list(&self) -> usize {
        self.current
    }

    /// Times `submit` found the next list still in flight.
    pub fn waits(&self) -> u64 {
        self.waits
    }

    fn list(&mut self) -> &mut DisplayList {
        &mut self.lists[self.current]
    }

    fn wait_for(&mut self, ticket: Ticket) {
        if self.rcp.retired() >= ticket {
            return
        }
        self.waits += 1;
        trace!(target: "rdp", "waiting for list #{}", ticket);
        while self.rcp.retired() < ticket {
            core::hint::spin_loop();
        }
    }
}

impl<C: Coprocessor> RasterizerBackend for RdpBackend<C> {
    fn publish(&mut self, region: DmaRegion, bytes: &[u8]) -> Result<(), BackendError> {
        self.rcp.publish(region, bytes)?;
        Ok(())
    }

    fn begin_frame(&mut self, setup: FrameSetup) -> Result<(), BackendError> {
        let target = setup.target;
        self.copy_mode = setup.copy_mode;
        self.frame_start = self.lists[self.current].len();

        let modes = if setup.copy_mode {
            OtherModes::CYCLE_COPY | OtherModes::ENABLE_TLUT
        } else {
            OtherModes::ENABLE_TLUT
        };

        self.list().extend([
            Command::SyncPipe,
            Command::SetColorImage(ImageDesc {
                format: target.format,
                size: target.size,
                width: target.width,
                addr: target.region.addr,
            }),
            Command::SetScissor(Scissor { xh: 0, yh: 0, xl: screen(target.width), yl: screen(target.height) }),
            Command::SetOtherModes(modes),
        ]);
        Ok(())
    }

    fn load_palette(&mut self, source: DmaRegion, slot: PaletteSlot) -> Result<(), BackendError> {
        trace!(target: "rdp", "tlut slot {} from ${:08X}", slot.index(), source.addr);
        self.list().extend([
            Command::SyncTile,
            Command::SetTextureImage(ImageDesc {
                format: TexelFormat::Rgba,
                size: PixelSize::Bits16,
                width: PALETTE_ENTRIES as u16,
                addr: source.addr,
            }),
            Command::SetTile(TileDesc { tmem: Tmem::palette_slot_word(slot.index()), tile: TLUT_TILE, ..TileDesc::default() }),
            Command::SyncLoad,
            Command::LoadTlut(LoadArea { tile: TLUT_TILE, sl: 0, tl: 0, sh: screen(PALETTE_ENTRIES as u16 - 1), th: 0 }),
            Command::SyncTile,
        ]);
        Ok(())
    }

    fn load_texture_band(&mut self, band: &TextureBand) -> Result<(), BackendError> {
        // TMEM rows are whole 64-bit words
        let line = band.width.div_ceil(8);
        let tile = |tile, palette| TileDesc {
            format: TexelFormat::ColorIndex,
            size: PixelSize::Bits8,
            line,
            tmem: 0,
            tile,
            palette,
        };

        self.list().extend([
            Command::SetTextureImage(ImageDesc {
                format: TexelFormat::ColorIndex,
                size: PixelSize::Bits8,
                width: band.pitch,
                addr: band.source.addr + band.offset,
            }),
            Command::SetTile(tile(LOAD_TILE, 0)),
            Command::SyncLoad,
            Command::LoadTile(LoadArea {
                tile: LOAD_TILE,
                sl: screen(band.column),
                tl: 0,
                sh: screen(band.column + band.width - 1),
                th: screen(band.rows - 1),
            }),
            Command::SyncTile,
            Command::SetTile(tile(DRAW_TILE, band.palette.index())),
        ]);
        Ok(())
    }

    fn draw_band(&mut self, draw: &BandDraw) -> Result<(), BackendError> {
        let rect = if self.copy_mode {
            TexRect {
                tile: DRAW_TILE,
                xh: screen(draw.dst_x),
                yh: screen(draw.dst_y),
                xl: screen(draw.dst_x + draw.width - 1),
                yl: screen(draw.dst_y + draw.rows - 1),
                s: 0,
                t: texel(draw.t as i16),
                dsdx: COPY_DSDX,
                dtdy: STEP_ONE,
            }
        } else {
            TexRect {
                tile: DRAW_TILE,
                xh: screen(draw.dst_x),
                yh: screen(draw.dst_y),
                xl: screen(draw.dst_x + draw.width),
                yl: screen(draw.dst_y + draw.rows),
                s: 0,
                t: texel(draw.t as i16),
                dsdx: draw.dsdx,
                dtdy: draw.dtdy,
            }
        };
        self.list().push(Command::TextureRectangle(rect));
        Ok(())
    }

    fn submit(&mut self) -> Result<SubmitInfo, BackendError> {
        self.list().push(Command::SyncFull);

        let words = self.lists[self.current].len();
        let executed = self.rcp.execute(self.lists[self.current].words());
        let ticket = match executed {
            Ok(ticket) => ticket,
            Err(e) => {
                self.list().reset();
                self.frame_start = 0;
                return Err(e.into())
            }
        };
        self.tickets[self.current] = ticket;
        debug!(target: "rdp", "submitted list {} as #{} ({} words)", self.current, ticket, words);

        match self.policy {
            SubmitPolicy::RoundRobin => {
                self.current = (self.current + 1) % self.lists.len();
                let pending = self.tickets[self.current];
                self.wait_for(pending);
            }
            SubmitPolicy::Synchronous => self.wait_for(ticket),
        }
        self.list().reset();
        self.frame_start = 0;

        Ok(SubmitInfo { ticket, words })
    }

    fn abort_frame(&mut self) {
        let start = self.frame_start;
        debug!(target: "rdp", "dropping {} words of list {}", self.pending_words().saturating_sub(start), self.current);
        self.list().truncate(start);
    }
}
