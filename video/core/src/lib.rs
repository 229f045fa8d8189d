#![cfg_attr(not(test), no_std)]
#![allow(clippy::single_match)]
extern crate alloc;

pub mod backend;
pub mod band;
pub mod blit;
pub mod color;
pub mod config;
pub mod error;
pub mod fade;
pub mod font;
pub mod palette;
pub mod present;
pub mod scheduler;
pub mod surface;
pub mod ticker;
pub mod tile;
pub mod video;

pub use backend::{RasterizerBackend, rdp::RdpBackend};
pub use band::{BandDraw, BandPlan, BandStep, RowMapping};
pub use blit::{HighlightPattern, Rect, TileBlitter};
pub use color::{Rgb, EGA_COLORS};
pub use config::{SubmitPolicy, VideoConfig};
pub use error::{BackendError, ConfigError, PaletteError, PlanError, VideoError};
pub use fade::{Fade, FADE_STEPS};
pub use font::BitmapFont;
pub use palette::{Palette, PaletteSlot, set_colors, set_single_color};
pub use surface::Surface;
pub use ticker::{NoopTicker, Ticker};
pub use tile::{Tile, TileKind, TILE_HEIGHT, TILE_WIDTH, TRANSPARENT_COLOR};
pub use video::{Mode, VideoContext};
