//! Band planning: how a surface is cut into pieces that fit texture memory
//! and where each piece lands on the display.
//!
//! The vertical ratio is reduced to `num/den`; a band is a whole multiple of
//! `den` source rows so that every band maps onto a whole number of display
//! rows. When a full-width band does not fit the tile-memory ceiling the
//! surface is also split into equal columns. For the game surface
//! (320x200 onto 320x240) this gives 40 bands of 5 rows, each drawn as 6
//! display rows by repeating the band's first row.

use cosmo_rcp::fixed::{step_ratio, STEP_ONE};
use log::debug;
use crate::error::PlanError;

/// How a band's source rows become display rows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RowMapping {
    Identity,
    /// `n` source rows onto `n + 1` display rows: row 0 is drawn twice.
    DuplicateFirstRow,
    /// Point-sampled with an s5.10 step per display row.
    Resample { dtdy: i16 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BandPlan {
    src_width: u16,
    src_height: u16,
    dst_width: u16,
    dst_height: u16,
    limit: usize,
    columns: u16,
    chunk_width: u16,
    dst_chunk_width: u16,
    band_rows: u16,
    dst_rows: u16,
    dsdx: i16,
    mapping: RowMapping,
}

/// One texture load: a `width` x `rows` block of the surface.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BandStep {
    pub band: u16,
    pub column: u16,
    pub src_row: u16,
    pub src_col: u16,
    pub width: u16,
    pub rows: u16,
    pub dst_x: u16,
    pub dst_y: u16,
    pub dst_width: u16,
    pub dst_rows: u16,
    pub dsdx: i16,
    pub mapping: RowMapping,
}

/// One rectangle drawn from the texels currently in texture memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BandDraw {
    pub dst_x: u16,
    pub dst_y: u16,
    pub width: u16,
    pub rows: u16,
    /// First texel row, relative to the band.
    pub t: u16,
    pub dsdx: i16,
    pub dtdy: i16,
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl BandPlan {
    pub fn new(src_width: u16, src_height: u16, dst_width: u16, dst_height: u16, limit: usize) -> Result<Self, PlanError> {
        if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
            return Err(PlanError::ZeroDimension)
        }

        let g = gcd(src_height as u32, dst_height as u32);
        let den = (src_height as u32 / g) as usize;
        let num = (dst_height as u32 / g) as usize;

        // fewest columns whose chunk is whole TMEM words and fits `den` rows
        let columns = (1..=src_width)
            .find(|&c| {
                let chunk = (src_width / c) as usize;
                src_width % c == 0 && dst_width % c == 0 && chunk % 8 == 0 && chunk * den <= limit
            })
            .ok_or(PlanError::NoColumnSplit { src_width, dst_width, limit })?;

        let chunk_width = src_width / columns;
        let dst_chunk_width = dst_width / columns;

        // tallest band that still divides the surface; k = 1 always does
        let per_k = chunk_width as usize * den;
        let k = (1..=limit / per_k)
            .rev()
            .find(|k| src_height as usize % (den * k) == 0)
            .unwrap_or(1);

        let band_rows = (den * k) as u16;
        let dst_rows = (num * k) as u16;

        let mut dsdx = step_ratio(chunk_width as u32, dst_chunk_width as u32).ok_or(PlanError::StepOutOfRange)?;
        while dsdx > 0 && (dst_chunk_width as i32 - 1) * dsdx as i32 >= (chunk_width as i32) << 10 {
            dsdx -= 1;
        }

        let mapping = if num == den {
            RowMapping::Identity
        } else if dst_rows == band_rows + 1 {
            RowMapping::DuplicateFirstRow
        } else {
            let mut dtdy = step_ratio(band_rows as u32, dst_rows as u32).ok_or(PlanError::StepOutOfRange)?;
            // keep the last display row sampling inside the band
            while dtdy > 0 && (dst_rows as i32 - 1) * dtdy as i32 >= (band_rows as i32) << 10 {
                dtdy -= 1;
            }
            RowMapping::Resample { dtdy }
        };

        let plan = Self {
            src_width,
            src_height,
            dst_width,
            dst_height,
            limit,
            columns,
            chunk_width,
            dst_chunk_width,
            band_rows,
            dst_rows,
            dsdx,
            mapping,
        };
        debug!(
            target: "video",
            "band plan {}x{} -> {}x{}: {} bands x {} columns, {} rows -> {} rows, {:?}",
            src_width, src_height, dst_width, dst_height,
            plan.bands(), columns, band_rows, dst_rows, mapping
        );
        Ok(plan)
    }

    pub fn bands(&self) -> u16 {
        self.src_height / self.band_rows
    }

    pub fn columns(&self) -> u16 {
        self.columns
    }

    pub fn band_rows(&self) -> u16 {
        self.band_rows
    }

    pub fn dst_rows_per_band(&self) -> u16 {
        self.dst_rows
    }

    pub fn mapping(&self) -> RowMapping {
        self.mapping
    }

    pub fn dsdx(&self) -> i16 {
        self.dsdx
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn source_size(&self) -> (u16, u16) {
        (self.src_width, self.src_height)
    }

    pub fn display_size(&self) -> (u16, u16) {
        (self.dst_width, self.dst_height)
    }

    /// Bytes moved into texture memory per load.
    pub fn chunk_bytes(&self) -> usize {
        self.chunk_width as usize * self.band_rows as usize
    }

    /// Copy mode moves one texel per pixel; anything scaled horizontally or
    /// resampled vertically needs the one-cycle pipeline.
    pub fn copy_mode(&self) -> bool {
        self.dsdx == STEP_ONE && !matches!(self.mapping, RowMapping::Resample { .. })
    }

    /// Loads in submission order: top to bottom, left to right within a band.
    pub fn steps(&self) -> impl Iterator<Item = BandStep> + '_ {
        (0..self.bands()).flat_map(move |band| {
            (0..self.columns).map(move |column| BandStep {
                band,
                column,
                src_row: band * self.band_rows,
                src_col: column * self.chunk_width,
                width: self.chunk_width,
                rows: self.band_rows,
                dst_x: column * self.dst_chunk_width,
                dst_y: band * self.dst_rows,
                dst_width: self.dst_chunk_width,
                dst_rows: self.dst_rows,
                dsdx: self.dsdx,
                mapping: self.mapping,
            })
        })
    }
}

impl BandStep {
    pub fn chunk_bytes(&self) -> usize {
        self.width as usize * self.rows as usize
    }

    /// The rectangles covering this step's display area.
    pub fn draws(&self) -> impl Iterator<Item = BandDraw> {
        let draw = |dst_y: u16, rows: u16, dtdy: i16| BandDraw {
            dst_x: self.dst_x,
            dst_y,
            width: self.dst_width,
            rows,
            t: 0,
            dsdx: self.dsdx,
            dtdy,
        };

        let (first, second) = match self.mapping {
            RowMapping::Identity => (draw(self.dst_y, self.dst_rows, STEP_ONE), None),
            RowMapping::DuplicateFirstRow => (
                draw(self.dst_y, 1, STEP_ONE),
                Some(draw(self.dst_y + 1, self.rows, STEP_ONE)),
            ),
            RowMapping::Resample { dtdy } => (draw(self.dst_y, self.dst_rows, dtdy), None),
        };
        core::iter::once(first).chain(second)
    }
}
