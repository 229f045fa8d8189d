use cosmo_rcp::{DisplayUnit, FramebufferInfo, SlotId};
use log::trace;

/// A locked framebuffer. Not `Clone`: a slot is presented exactly once.
#[derive(Debug)]
pub struct Slot {
    id: SlotId,
    info: FramebufferInfo,
}

impl Slot {
    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn info(&self) -> FramebufferInfo {
        self.info
    }
}

/// Spins until the display unit hands out a framebuffer. This is the one
/// place a frame can block, and it has no timeout.
pub fn acquire_display<D: DisplayUnit + ?Sized>(display: &mut D) -> Slot {
    let mut polls = 0u32;
    let id = loop {
        if let Some(id) = display.try_lock() {
            break id
        }
        polls = polls.wrapping_add(1);
        core::hint::spin_loop();
    };

    trace!(target: "video", "slot {} acquired after {} polls", id.index(), polls);
    Slot { id, info: display.framebuffer(id) }
}

/// Queues the slot for the next vblank and returns what it holds.
pub fn present<D: DisplayUnit + ?Sized>(display: &mut D, slot: Slot) -> FramebufferInfo {
    display.show(slot.id);
    slot.info
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmo_rcp::{DmaArena, SlotState, VirtualDisplay};

    #[test]
    fn acquire_blocks_until_a_retrace() {
        let mut arena = DmaArena::new(0, 0x10_0000);
        let mut display = VirtualDisplay::new(&mut arena, 2, 320, 240).unwrap().with_auto_vblank(true);

        let a = acquire_display(&mut display);
        let a_info = present(&mut display, a);
        let b = acquire_display(&mut display);
        let b_id = b.id();
        present(&mut display, b);

        // both slots are queued; the first retrace puts `a` on screen and
        // only the second frees it again
        let c = acquire_display(&mut display);
        assert_eq!(c.info(), a_info);
        assert_eq!(display.state(b_id), SlotState::Showing);
        assert_eq!(display.vblank_count(), 2);
    }
}
