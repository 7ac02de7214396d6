//! CPU core trait.

use crate::Bus;

/// A CPU core.
///
/// CPUs execute instructions and access memory through a bus. The bus is
/// passed into every call that may touch memory, never stored, so the
/// owning system can hand the same bus to other components between ticks.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Advance the CPU by one clock cycle.
    fn tick<B: Bus>(&mut self, bus: &mut B);

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true when the in-flight instruction has used all its cycles.
    fn complete(&self) -> bool;

    /// Request a maskable interrupt. Returns true if accepted.
    fn interrupt<B: Bus>(&mut self, bus: &mut B) -> bool;

    /// Request a non-maskable interrupt.
    fn nmi<B: Bus>(&mut self, bus: &mut B);

    /// Reset the CPU to its initial state, loading the reset vector.
    fn reset<B: Bus>(&mut self, bus: &mut B);
}
