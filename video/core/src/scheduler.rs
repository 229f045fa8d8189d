//! Turns a band plan into rasterizer calls for one frame.

use cosmo_rcp::{DmaRegion, FramebufferInfo, Ticket};
use log::{debug, trace};
use crate::backend::{FrameSetup, RasterizerBackend, TextureBand};
use crate::band::BandPlan;
use crate::error::BackendError;
use crate::palette::PaletteSlot;
use crate::surface::Surface;

/// Everything one upload needs to know about the surface being shown.
pub struct UploadJob<'a> {
    pub target: FramebufferInfo,
    pub surface: &'a mut Surface,
    /// Where the surface's pixels were published.
    pub pixels: DmaRegion,
    /// Where the palette is published before a reload.
    pub palette: DmaRegion,
    pub slot: PaletteSlot,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub ticket: Ticket,
    pub words: usize,
    pub loads: u32,
    pub draws: u32,
    pub palette_reloaded: bool,
}

/// Writes the surface's pixel buffer back for the rasterizer to read.
pub fn publish_surface<B: RasterizerBackend + ?Sized>(
    backend: &mut B,
    surface: &Surface,
    region: DmaRegion,
) -> Result<(), BackendError> {
    backend.publish(region, surface.pixels())
}

/// Builds and submits one frame: pipeline setup, the palette when it changed,
/// then every band top to bottom. The pixels must already be published.
///
/// On error the frame's commands are dropped from the backend and a dirty
/// palette stays dirty, so the next frame starts over cleanly.
pub fn upload_frame<B: RasterizerBackend + ?Sized>(
    backend: &mut B,
    plan: &BandPlan,
    job: UploadJob<'_>,
) -> Result<FrameStats, BackendError> {
    let stats = match build_frame(backend, plan, &job) {
        Ok(stats) => stats,
        Err(e) => {
            backend.abort_frame();
            return Err(e)
        }
    };

    if stats.palette_reloaded {
        let palette = job.surface.palette_mut();
        palette.mark_clean();
        debug!(target: "video", "palette slot {} reloaded (version {})", job.slot.index(), palette.version());
    }
    Ok(stats)
}

fn build_frame<B: RasterizerBackend + ?Sized>(
    backend: &mut B,
    plan: &BandPlan,
    job: &UploadJob<'_>,
) -> Result<FrameStats, BackendError> {
    let mut stats = FrameStats::default();

    backend.begin_frame(FrameSetup { target: job.target, copy_mode: plan.copy_mode() })?;

    let palette = job.surface.palette();
    if palette.is_dirty() {
        backend.publish(job.palette, &palette.to_be_bytes())?;
        backend.load_palette(job.palette, job.slot)?;
        stats.palette_reloaded = true;
    }

    let pitch = job.surface.pitch() as u16;
    for step in plan.steps() {
        debug_assert!(step.chunk_bytes() <= plan.limit());

        backend.load_texture_band(&TextureBand {
            source: job.pixels,
            offset: step.src_row as u32 * pitch as u32,
            pitch,
            column: step.src_col,
            width: step.width,
            rows: step.rows,
            palette: job.slot,
        })?;
        stats.loads += 1;

        for draw in step.draws() {
            trace!(target: "video", "band {}.{}: {:?}", step.band, step.column, draw);
            backend.draw_band(&draw)?;
            stats.draws += 1;
        }
    }

    let submitted = backend.submit()?;
    stats.ticket = submitted.ticket;
    stats.words = submitted.words;
    Ok(stats)
}
