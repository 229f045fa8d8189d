#![cfg_attr(not(test), no_std)]
#![allow(clippy::single_match)]
extern crate alloc;

pub mod color;
pub mod command;
pub mod display_list;
pub mod fixed;
pub mod memory;
pub mod rcp;
pub mod rdp;
pub mod tmem;
pub mod vi;

pub use command::{Command, CycleType, ImageDesc, OtherModes, PixelSize, TexRect, TexelFormat, TileDesc};
pub use display_list::DisplayList;
pub use memory::{DmaArena, DmaRegion, Rdram, RdramError, VecRdram, DMA_ALIGN};
pub use rcp::{Coprocessor, SoftRcp, Ticket};
pub use rdp::{RdpError, SoftRdp};
pub use tmem::Tmem;
pub use vi::{DisplayUnit, FramebufferInfo, SlotId, SlotState, VirtualDisplay};
