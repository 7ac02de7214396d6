//! Trait for components that can be advanced by clock pulses.

use crate::Ticks;

/// A component that can be advanced by clock pulses.
///
/// A whole system implements this so front-ends can drive it without
/// knowing how the pulse is divided between its chips.
pub trait Tickable {
    /// Advance the component by one clock pulse.
    fn tick(&mut self);

    /// Advance the component by multiple pulses.
    ///
    /// Default implementation calls `tick()` in a loop. Components may
    /// override for efficiency, but must produce identical results.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick();
        }
    }
}
