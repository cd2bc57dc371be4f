//! Memory-mapped bus access.

/// A device mapped into the 68000 address space.
///
/// Addresses are the full 24-bit CPU address. Word accesses always target the even address of
/// the word; the byte at the even address travels in the high lane.
pub trait Mem {
    /// Read an 8-bit value from the given address.
    fn read_u8(&self, addr: u32) -> u8;

    /// Read a 16-bit value from the word containing the given address.
    fn read_u16(&self, addr: u32) -> u16;

    /// Write an 8-bit value to the given address.
    fn write_u8(&mut self, addr: u32, val: u8);

    /// Write a 16-bit value to the word containing the given address.
    fn write_u16(&mut self, addr: u32, val: u16);
}
