use heapless::Vec;
use log::{trace, warn};
use crate::command::{PixelSize, TexelFormat};
use crate::memory::{DmaArena, DmaRegion};

pub const MAX_FRAMEBUFFERS: usize = 4;

/// Opaque handle to one of the display unit's framebuffers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlotId(u8);

impl SlotId {
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FramebufferInfo {
    pub region: DmaRegion,
    pub width: u16,
    pub height: u16,
    pub format: TexelFormat,
    pub size: PixelSize,
}

/// The video interface: a ring of framebuffers scanned out at vblank.
pub trait DisplayUnit {
    /// Claims a free framebuffer, if there is one.
    fn try_lock(&mut self) -> Option<SlotId>;

    fn framebuffer(&self, slot: SlotId) -> FramebufferInfo;

    /// Queues a locked framebuffer for scan-out at the next vblank.
    fn show(&mut self, slot: SlotId);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlotState {
    Free,
    Locked,
    Queued,
    Showing,
}

#[derive(Debug)]
struct Slot {
    info: FramebufferInfo,
    state: SlotState,
    queued_at: u64,
}

/// A display unit with no panel attached. Retraces happen when `vblank` is
/// called, or on demand when `auto_vblank` is set and a lock finds no free
/// framebuffer.
#[derive(Debug)]
pub struct VirtualDisplay {
    slots: Vec<Slot, MAX_FRAMEBUFFERS>,
    auto_vblank: bool,
    queue_seq: u64,
    vblanks: u64,
    frames_shown: u64,
}

impl VirtualDisplay {
    /// Allocates `count` RGBA5551 framebuffers out of `arena`.
    pub fn new(arena: &mut DmaArena, count: usize, width: u16, height: u16) -> Option<Self> {
        if count == 0 || count > MAX_FRAMEBUFFERS {
            return None
        }

        let mut slots = Vec::new();
        for _ in 0..count {
            let region = arena.alloc(width as u32 * height as u32 * 2)?;
            let info = FramebufferInfo { region, width, height, format: TexelFormat::Rgba, size: PixelSize::Bits16 };
            slots.push(Slot { info, state: SlotState::Free, queued_at: 0 }).ok()?;
        }

        Some(Self { slots, auto_vblank: false, queue_seq: 0, vblanks: 0, frames_shown: 0 })
    }

    pub fn with_auto_vblank(mut self, auto_vblank: bool) -> Self {
        self.auto_vblank = auto_vblank;
        self
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn state(&self, slot: SlotId) -> SlotState {
        self.slots[slot.index()].state
    }

    pub fn showing(&self) -> Option<SlotId> {
        self.slots.iter().position(|s| s.state == SlotState::Showing).map(|i| SlotId(i as u8))
    }

    pub fn vblank_count(&self) -> u64 {
        self.vblanks
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }

    /// Retrace: the oldest queued framebuffer goes on screen and the one it
    /// replaces becomes free.
    pub fn vblank(&mut self) {
        self.vblanks += 1;

        let next = self.slots.iter().enumerate()
            .filter(|(_, s)| s.state == SlotState::Queued)
            .min_by_key(|(_, s)| s.queued_at)
            .map(|(i, _)| i);

        let Some(next) = next else {
            return
        };

        for s in self.slots.iter_mut() {
            if s.state == SlotState::Showing {
                s.state = SlotState::Free;
            }
        }
        self.slots[next].state = SlotState::Showing;
        self.frames_shown += 1;
        trace!(target: "vi", "vblank {}: showing slot {}", self.vblanks, next);
    }

    fn lock_free(&mut self) -> Option<SlotId> {
        let i = self.slots.iter().position(|s| s.state == SlotState::Free)?;
        self.slots[i].state = SlotState::Locked;
        Some(SlotId(i as u8))
    }
}

impl DisplayUnit for VirtualDisplay {
    fn try_lock(&mut self) -> Option<SlotId> {
        if let Some(slot) = self.lock_free() {
            return Some(slot)
        }
        if self.auto_vblank {
            self.vblank();
            return self.lock_free()
        }
        None
    }

    fn framebuffer(&self, slot: SlotId) -> FramebufferInfo {
        self.slots[slot.index()].info
    }

    fn show(&mut self, slot: SlotId) {
        let Some(s) = self.slots.get_mut(slot.index()) else {
            warn!(target: "vi", "show of unknown slot {}", slot.index());
            return
        };
        if s.state != SlotState::Locked {
            warn!(target: "vi", "show of slot {} in state {:?}, ignored", slot.index(), s.state);
            return
        }
        self.queue_seq += 1;
        s.state = SlotState::Queued;
        s.queued_at = self.queue_seq;
    }
}
