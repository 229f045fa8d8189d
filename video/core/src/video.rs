//! The video context: both logical surfaces, their palettes and band plans,
//! and the frame loop that puts the active one on screen.

use cosmo_rcp::{DisplayUnit, DmaArena, DmaRegion, FramebufferInfo};
use log::{debug, error, info, warn};
use crate::backend::RasterizerBackend;
use crate::band::BandPlan;
use crate::blit::TileBlitter;
use crate::color::{Rgb, EGA_COLORS};
use crate::config::VideoConfig;
use crate::error::{PaletteError, VideoError};
use crate::font::{draw_glyph, BitmapFont};
use crate::palette::{set_single_color, Palette, PaletteSlot, PALETTE_SIZE};
use crate::present::{acquire_display, present};
use crate::scheduler::{publish_surface, upload_frame, FrameStats, UploadJob};
use crate::surface::Surface;
use crate::ticker::Ticker;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Game,
    Text,
}

/// A surface together with where the coprocessor reads it from.
struct BoundSurface {
    surface: Surface,
    pixels: DmaRegion,
    palette: DmaRegion,
    slot: PaletteSlot,
    plan: BandPlan,
}

fn alloc(arena: &mut DmaArena, len: u32) -> Result<DmaRegion, VideoError> {
    arena.alloc(len).ok_or(VideoError::OutOfDmaMemory { requested: len })
}

impl BoundSurface {
    fn new(
        width: u16,
        height: u16,
        slot: PaletteSlot,
        config: &VideoConfig,
        arena: &mut DmaArena,
    ) -> Result<Self, VideoError> {
        let plan = BandPlan::new(width, height, config.display_width, config.display_height, config.tmem_limit)?;
        let surface = Surface::create(width, height, Palette::lit());
        let pixels = alloc(arena, surface.byte_len() as u32)?;
        let palette = alloc(arena, (PALETTE_SIZE * 2) as u32)?;
        Ok(Self { surface, pixels, palette, slot, plan })
    }
}

pub struct VideoContext<B: RasterizerBackend, D: DisplayUnit> {
    backend: B,
    display: D,
    game: BoundSurface,
    text: BoundSurface,
    mode: Mode,
    frames: u64,
    last_frame: Option<FrameStats>,
}

impl<B: RasterizerBackend, D: DisplayUnit> VideoContext<B, D> {
    /// Allocates both surfaces and queues both palettes for their TLUT
    /// slots; the loads go out with the first frame.
    pub fn init(config: &VideoConfig, backend: B, display: D, arena: &mut DmaArena) -> Result<Self, VideoError> {
        config.validate()?;

        let game = BoundSurface::new(config.game_width, config.game_height, PaletteSlot::Game, config, arena)?;
        let mut text = BoundSurface::new(config.text_width, config.text_height, PaletteSlot::Text, config, arena)?;
        text.surface.fill(0);

        let mut ctx = Self { backend, display, game, text, mode: Mode::Game, frames: 0, last_frame: None };
        ctx.preload_palette(Mode::Game)?;
        ctx.preload_palette(Mode::Text)?;

        for mode in [Mode::Game, Mode::Text] {
            let plan = ctx.plan(mode);
            let ((sw, sh), (dw, dh)) = (plan.source_size(), plan.display_size());
            info!(
                target: "video",
                "{:?} surface {}x{} on {}x{}: {} bands x {} columns ({:?})",
                mode, sw, sh, dw, dh, plan.bands(), plan.columns(), plan.mapping()
            );
        }
        Ok(ctx)
    }

    pub fn shutdown(self) -> (B, D) {
        info!(target: "video", "video down after {} frames", self.frames);
        (self.backend, self.display)
    }

    fn bound(&self, mode: Mode) -> &BoundSurface {
        match mode {
            Mode::Game => &self.game,
            Mode::Text => &self.text,
        }
    }

    fn preload_palette(&mut self, mode: Mode) -> Result<(), VideoError> {
        let bound = match mode {
            Mode::Game => &mut self.game,
            Mode::Text => &mut self.text,
        };
        let palette = bound.surface.palette_mut();
        self.backend.publish(bound.palette, &palette.to_be_bytes())?;
        self.backend.load_palette(bound.palette, bound.slot)?;
        palette.mark_clean();
        Ok(())
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_game_mode(&mut self) {
        if self.mode != Mode::Game {
            debug!(target: "video", "game mode");
            self.mode = Mode::Game;
        }
    }

    pub fn set_text_mode(&mut self) {
        if self.mode != Mode::Text {
            debug!(target: "video", "text mode");
            self.mode = Mode::Text;
        }
    }

    pub fn game_surface(&self) -> &Surface {
        &self.game.surface
    }

    pub fn game_surface_mut(&mut self) -> &mut Surface {
        &mut self.game.surface
    }

    pub fn text_surface(&self) -> &Surface {
        &self.text.surface
    }

    pub fn text_surface_mut(&mut self) -> &mut Surface {
        &mut self.text.surface
    }

    /// Tile drawing goes to the game surface.
    pub fn blitter(&mut self) -> TileBlitter<'_> {
        TileBlitter::new(&mut self.game.surface)
    }

    pub fn plan(&self, mode: Mode) -> &BandPlan {
        &self.bound(mode).plan
    }

    /// Draws a glyph into text cell (`col`, `row`).
    pub fn draw_text(&mut self, font: &BitmapFont<'_>, ch: u8, fg: u8, bg: u8, col: usize, row: usize) {
        if !draw_glyph(&mut self.text.surface, font, ch, fg, bg, col, row) {
            warn!(target: "video", "no glyph for character {}", ch);
        }
    }

    pub fn fill_screen_with_black(&mut self) {
        self.game.surface.fill(0);
    }

    pub fn draw_fullscreen_image(&mut self, pixels: &[u8]) {
        self.game.surface.copy_from(pixels);
    }

    /// Sets game palette entry `index` to EGA colour `ega`.
    pub fn set_palette_color(&mut self, index: usize, ega: u8) -> Result<(), PaletteError> {
        let Some(color) = EGA_COLORS.get(ega as usize) else {
            warn!(target: "video", "EGA colour {} does not exist", ega);
            return Err(PaletteError::OutOfRange { first: ega as usize, count: 1 })
        };
        self.update_palette(index, *color)
    }

    /// Changes one game palette entry; it reaches the TLUT with the next frame.
    pub fn update_palette(&mut self, index: usize, color: Rgb) -> Result<(), PaletteError> {
        set_single_color(Some(self.game.surface.palette_mut()), index, color)
    }

    /// Presents the active surface.
    pub fn update(&mut self) -> Result<FramebufferInfo, VideoError> {
        let bound = match self.mode {
            Mode::Game => &mut self.game,
            Mode::Text => &mut self.text,
        };

        publish_surface(&mut self.backend, &bound.surface, bound.pixels)?;
        let slot = acquire_display(&mut self.display);

        let job = UploadJob {
            target: slot.info(),
            surface: &mut bound.surface,
            pixels: bound.pixels,
            palette: bound.palette,
            slot: bound.slot,
        };
        let stats = match upload_frame(&mut self.backend, &bound.plan, job) {
            Ok(stats) => stats,
            Err(e) => {
                error!(target: "video", "frame {} failed: {}", self.frames, e);
                // the slot is locked; hand it back rather than leak it
                present(&mut self.display, slot);
                return Err(e.into())
            }
        };

        let shown = present(&mut self.display, slot);
        self.frames += 1;
        self.last_frame = Some(stats);
        debug!(
            target: "video",
            "frame {} ({:?}): {} loads, {} draws, {} words",
            self.frames, self.mode, stats.loads, stats.draws, stats.words
        );
        Ok(shown)
    }

    /// [`update`](Self::update), then gives the ticker a zero-length wait.
    pub fn update_with(&mut self, ticker: &mut dyn Ticker) -> Result<FramebufferInfo, VideoError> {
        let shown = self.update()?;
        ticker.pump();
        Ok(shown)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame(&self) -> Option<FrameStats> {
        self.last_frame
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }
}
