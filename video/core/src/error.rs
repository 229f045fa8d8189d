use cosmo_rcp::{RdpError, RdramError};
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// No palette was supplied.
    #[error("no palette")]
    Missing,
    #[error("palette entries {}..{} out of range", first, first + count)]
    OutOfRange { first: usize, count: usize },
}

impl PaletteError {
    /// Negative status code for callers that only look at a return value.
    pub fn code(&self) -> i32 {
        match self {
            PaletteError::Missing => -1,
            PaletteError::OutOfRange { .. } => -2,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("surface or display has a zero dimension")]
    ZeroDimension,
    /// No column split of the surface fits a band into the tile-memory ceiling.
    #[error("cannot split {src_width} source columns onto {dst_width} display columns within {limit} bytes")]
    NoColumnSplit { src_width: u16, dst_width: u16, limit: usize },
    /// The vertical step does not fit the rasterizer's fixed-point field.
    #[error("texture step out of range")]
    StepOutOfRange,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} has a zero dimension")]
    ZeroSize(&'static str),
    #[error("at least one display list is required")]
    NoDisplayLists,
    /// Round-robin submission needs a second list to build into.
    #[error("round-robin submission needs two or more display lists")]
    RoundRobinNeedsTwoLists,
    #[error("tile memory limit {0} exceeds the texture half of tmem")]
    TmemLimitTooLarge(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("publish failed: {0}")]
    Memory(#[from] RdramError),
    #[error("display list failed: {0}")]
    Command(#[from] RdpError),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum VideoError {
    #[error("invalid video config: {0}")]
    Config(#[from] ConfigError),
    #[error("band plan: {0}")]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Palette(#[from] PaletteError),
    #[error("out of dma memory allocating {requested} bytes")]
    OutOfDmaMemory { requested: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::error::Error;

    #[test]
    fn messages_and_sources() {
        let e = PaletteError::OutOfRange { first: 14, count: 4 };
        assert_eq!(e.to_string(), "palette entries 14..18 out of range");
        assert_eq!(e.code(), -2);

        let e = VideoError::from(ConfigError::ZeroSize("display"));
        assert_eq!(e.to_string(), "invalid video config: display has a zero dimension");
        assert!(e.source().is_some());

        let e = VideoError::from(BackendError::from(RdramError { addr: 0x40, len: 2 }));
        assert_eq!(e.to_string(), "publish failed: rdram access out of range: 2 bytes at $00000040");

        assert_eq!(VideoError::OutOfDmaMemory { requested: 64 }.to_string(), "out of dma memory allocating 64 bytes");
    }
}
