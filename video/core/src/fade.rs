//! Palette fades. Each step changes one game palette entry and presents a
//! frame, so a fade takes sixteen frames plus whatever the caller waits.

use cosmo_rcp::{DisplayUnit, FramebufferInfo};
use log::debug;
use crate::backend::RasterizerBackend;
use crate::color::{EGA_BLACK, EGA_WHITE};
use crate::error::VideoError;
use crate::palette::PALETTE_SIZE;
use crate::ticker::Ticker;
use crate::video::VideoContext;

pub const FADE_STEPS: usize = PALETTE_SIZE;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fade {
    ToBlack,
    ToWhite,
    InFromBlack,
}

impl Fade {
    /// EGA colour entry `step` ends up as.
    pub fn target(self, step: usize) -> u8 {
        match self {
            Fade::ToBlack => EGA_BLACK,
            Fade::ToWhite => EGA_WHITE,
            // skip the repeated block: 0-7, then 16-23
            Fade::InFromBlack => if step < 8 { step as u8 } else { step as u8 + 8 },
        }
    }

    /// Fading out waits before each step; fading in waits after.
    fn waits_first(self) -> bool {
        self != Fade::InFromBlack
    }
}

impl<B: RasterizerBackend, D: DisplayUnit> VideoContext<B, D> {
    /// Sets palette entry `step` to its target and presents.
    pub fn fade_step(&mut self, fade: Fade, step: usize) -> Result<FramebufferInfo, VideoError> {
        self.set_palette_color(step, fade.target(step))?;
        self.update()
    }

    /// Runs a whole fade, waiting `wait_ticks` per step. Blocks until done.
    pub fn fade(&mut self, fade: Fade, wait_ticks: u16, ticker: &mut dyn Ticker) -> Result<(), VideoError> {
        self.fade_with(fade, wait_ticks, ticker, |_, _| {})
    }

    /// [`fade`](Self::fade), calling `on_present` after every frame.
    pub fn fade_with<F>(&mut self, fade: Fade, wait_ticks: u16, ticker: &mut dyn Ticker, mut on_present: F) -> Result<(), VideoError>
    where
        F: FnMut(&Self, FramebufferInfo),
    {
        debug!(target: "video", "{:?}, {} ticks per step", fade, wait_ticks);
        for step in 0..FADE_STEPS {
            if fade.waits_first() {
                ticker.wait_ticks(wait_ticks);
            }

            self.set_palette_color(step, fade.target(step))?;
            let shown = self.update_with(ticker)?;
            on_present(self, shown);

            if !fade.waits_first() {
                ticker.wait_ticks(wait_ticks);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::Call;
    use crate::color::{Rgb, EGA_COLORS};
    use crate::palette::{lit_color, PaletteSlot};
    use crate::video::tests::context;
    use std::vec::Vec;

    #[derive(Default)]
    struct Recorder(Vec<u32>);

    impl Ticker for Recorder {
        fn wait_ms(&mut self, ms: u32) {
            self.0.push(ms);
        }
    }

    #[test]
    fn targets() {
        assert_eq!(Fade::ToBlack.target(9), 0);
        assert_eq!(Fade::ToWhite.target(0), 23);
        assert_eq!(Fade::InFromBlack.target(7), 7);
        assert_eq!(Fade::InFromBlack.target(8), 16);
        assert_eq!(Fade::InFromBlack.target(15), 23);
    }

    #[test]
    fn fade_out_waits_then_presents() {
        let mut ctx = context();
        let mut ticker = Recorder::default();

        ctx.fade(Fade::ToBlack, 3, &mut ticker).unwrap();

        assert_eq!(ticker.0.len(), 32);
        assert!(ticker.0.chunks(2).all(|c| c == [24, 0]));
        assert_eq!(ctx.frames(), 16);
        assert!(ctx.game_surface().palette().colors().iter().all(|c| *c == Rgb::BLACK));
        // one reload per presented frame, plus the two at init
        assert_eq!(ctx.backend().count(|c| matches!(c, Call::LoadPalette(_, PaletteSlot::Game))), 17);
    }

    #[test]
    fn fade_in_sets_one_entry_per_frame() {
        let mut ctx = context();
        for i in 0..16 {
            ctx.update_palette(i, Rgb::BLACK).unwrap();
        }
        let mut ticker = Recorder::default();
        let mut seen = Vec::new();

        ctx.fade_with(Fade::InFromBlack, 1, &mut ticker, |ctx, _| {
            seen.push(*ctx.game_surface().palette().colors());
        }).unwrap();

        assert!(ticker.0.chunks(2).all(|c| c == [0, 8]));
        assert_eq!(seen.len(), 16);
        for (i, palette) in seen.iter().enumerate() {
            assert_eq!(palette[i], lit_color(i));
            assert!(palette[i + 1..].iter().all(|c| *c == Rgb::BLACK));
        }
        assert_eq!(seen[15][15], EGA_COLORS[23]);
    }

    #[test]
    fn fade_to_white() {
        let mut ctx = context();
        let info = ctx.fade_step(Fade::ToWhite, 4).unwrap();
        assert_eq!(info.height, 240);
        assert_eq!(ctx.game_surface().palette().color(4), Rgb::WHITE);
        ctx.fade(Fade::ToWhite, 0, &mut crate::ticker::NoopTicker).unwrap();
        assert!(ctx.game_surface().palette().colors().iter().all(|c| *c == Rgb::WHITE));
    }
}
