use heapless::Vec;
use crate::command::Command;

/// Default capacity of a display list, in 64-bit words.
pub const DISPLAY_LIST_WORDS: usize = 2048;

/// A fixed-capacity batch of RDP command words.
///
/// The capacity is sized at build time for the largest frame the video
/// pipeline can emit, so running out is a programming error and panics.
pub struct DisplayList<const N: usize = DISPLAY_LIST_WORDS> {
    words: Vec<u64, N>,
}

impl<const N: usize> Default for DisplayList<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DisplayList<N> {
    pub const fn new() -> Self {
        Self { words: Vec::new() }
    }

    pub fn push(&mut self, cmd: Command) {
        let encoded = cmd.encode();
        assert!(
            self.words.len() + encoded.len() <= N,
            "display list overflow: {} of {} words used, pushing {:?}",
            self.words.len(), N, cmd
        );
        for w in encoded.iter() {
            // capacity checked above
            let _ = self.words.push(*w);
        }
    }

    pub fn extend<I: IntoIterator<Item = Command>>(&mut self, cmds: I) {
        for cmd in cmds {
            self.push(cmd);
        }
    }

    pub fn reset(&mut self) {
        self.words.clear();
    }

    /// Drops every word after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.words.truncate(len);
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_counts_words() {
        let mut dl: DisplayList<8> = DisplayList::new();
        dl.push(Command::SyncPipe);
        dl.extend([Command::SyncTile, Command::SyncFull]);
        assert_eq!(dl.len(), 3);
        assert_eq!(dl.words()[2] >> 56, 0x29);

        dl.truncate(1);
        assert_eq!(dl.len(), 1);
        assert_eq!(dl.words()[0] >> 56, 0x27);
        dl.truncate(4);
        assert_eq!(dl.len(), 1);

        dl.reset();
        assert!(dl.is_empty());
        assert_eq!(dl.capacity(), 8);
    }

    #[test]
    #[should_panic(expected = "display list overflow")]
    fn overflow_is_fatal() {
        let mut dl: DisplayList<2> = DisplayList::new();
        dl.push(Command::SyncPipe);
        dl.push(Command::TextureRectangle(crate::command::TexRect {
            tile: 0, xh: 0, yh: 0, xl: 4, yl: 4, s: 0, t: 0, dsdx: 1024, dtdy: 1024,
        }));
    }
}
