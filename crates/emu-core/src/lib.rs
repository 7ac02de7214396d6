//! Core traits and types for cycle-accurate emulation.
//!
//! Components advance one clock pulse at a time. A CPU borrows a `Bus` for
//! the duration of each tick instead of holding a reference to it, so a
//! single owning system struct can wire every component together.

mod bus;
mod cpu;
mod observable;
mod tickable;
mod ticks;

pub use bus::Bus;
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use tickable::Tickable;
pub use ticks::Ticks;
