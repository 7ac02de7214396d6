//! Memory bus interface.

/// Memory bus interface.
///
/// Components access memory and memory-mapped peripherals through this
/// trait. The bus handles address decoding and routing to the appropriate
/// device.
pub trait Bus {
    /// Read a byte from the given address.
    ///
    /// May trigger device side effects (for example a status register that
    /// clears on read).
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Read a byte without any side effects.
    ///
    /// Used by debuggers and disassemblers so inspection never perturbs
    /// emulated state.
    fn peek(&self, address: u16) -> u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatBus(Vec<u8>);

    impl Bus for FlatBus {
        fn read(&mut self, address: u16) -> u8 {
            self.0[usize::from(address)]
        }

        fn write(&mut self, address: u16, value: u8) {
            self.0[usize::from(address)] = value;
        }

        fn peek(&self, address: u16) -> u8 {
            self.0[usize::from(address)]
        }
    }

    #[test]
    fn peek_matches_read_on_plain_memory() {
        let mut bus = FlatBus(vec![0; 0x10000]);
        bus.write(0x1234, 0x56);
        assert_eq!(bus.peek(0x1234), 0x56);
        assert_eq!(bus.read(0x1234), 0x56);
    }
}
