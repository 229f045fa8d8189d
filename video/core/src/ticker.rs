/// Length of one game tick.
pub const TICK_MS: u32 = 8;

/// The host's notion of time. The video pipeline never reads a clock; it
/// only asks to be put to sleep, and those sleeps are where the audio mixer
/// gets serviced.
pub trait Ticker {
    fn wait_ms(&mut self, ms: u32);

    fn wait_ticks(&mut self, ticks: u16) {
        self.wait_ms(ticks as u32 * TICK_MS);
    }

    /// A zero-length wait: lets the mixer run without delaying the frame.
    fn pump(&mut self) {
        self.wait_ms(0);
    }
}

/// Returns immediately.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopTicker;

impl Ticker for NoopTicker {
    fn wait_ms(&mut self, _ms: u32) {}
}

impl<T: Ticker + ?Sized> Ticker for &mut T {
    fn wait_ms(&mut self, ms: u32) {
        (**self).wait_ms(ms)
    }
}
