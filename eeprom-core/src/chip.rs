//! Serial EEPROM chip profiles.
//!
//! A [`ChipProfile`] captures a 24Cxx chip's geometry and how a particular cartridge board wires
//! its SCL/SDA pins onto the 68000 bus.

use serde::Serialize;

/// Largest supported chip (24C64/24C65).
pub const MAX_CAPACITY: usize = 8 * 1024;

/// Addressing scheme used by the chip.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[must_use]
pub enum AddressMode {
    /// Mode 1 (X24C01): START is followed by a 7-bit word address and the R/W bit.
    SevenBit,
    /// Mode 2 (24C01-24C16): a device byte followed by one word address byte.
    EightBit,
    /// Mode 3 (24C32-24C512): a device byte followed by two word address bytes.
    SixteenBit,
}

impl AddressMode {
    #[must_use]
    pub const fn address_bits(self) -> u8 {
        match self {
            Self::SevenBit => 7,
            Self::EightBit => 8,
            Self::SixteenBit => 16,
        }
    }
}

/// A single bus line: the CPU address it is mapped at and the data bit it occupies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[must_use]
pub struct Line {
    pub addr: u32,
    pub bit: u8,
}

impl Line {
    pub const fn new(addr: u32, bit: u8) -> Self {
        Self { addr, bit }
    }

    /// Whether this line is carried by a byte access at `addr`.
    #[must_use]
    pub const fn on_byte(&self, addr: u32) -> bool {
        self.addr == addr
    }

    /// Whether this line is carried by a word access at `addr`.
    #[must_use]
    pub const fn on_word(&self, addr: u32) -> bool {
        self.addr & !1 == addr & !1
    }

    /// Position of this line within a 16-bit bus word. Even addresses use the high lane.
    #[must_use]
    pub const fn word_bit(&self) -> u8 {
        if self.addr & 1 == 1 {
            self.bit
        } else {
            self.bit + 8
        }
    }
}

/// How a cartridge board connects the EEPROM to the bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[must_use]
pub struct BusWiring {
    pub scl: Line,
    pub sda_in: Line,
    pub sda_out: Line,
}

/// Where a clocked address bit ends up.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[must_use]
pub enum BitRole {
    /// Device select bit `n` of the slave mask.
    Device(u8),
    /// Word address bit `n`.
    Word(u8),
    /// The chip is too small to decode this bit. Any device bits already collected move one
    /// position down so they stay contiguous with the word address.
    Unused,
}

/// Bit routing for each address field, indexed by clock number within the field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[must_use]
pub struct AddressLayout {
    /// Mode 1 address byte, clocks 0..=7 (word address bits 7..=0).
    pub word7: [BitRole; 8],
    /// Device byte, clocks 5..=7 (device bits 2..=0 or word address bits 10..=8).
    pub device: [BitRole; 3],
    /// Mode 3 high address byte, clocks 1..=8 (word address bits 15..=8).
    pub high: [BitRole; 8],
    /// Low address byte, clocks 1..=8 (word address bits 7..=0).
    pub low: [BitRole; 8],
}

impl AddressLayout {
    pub const fn new(mode: AddressMode, size_mask: u16) -> Self {
        let capacity = size_mask as u32 + 1;
        let mut layout = Self {
            word7: [BitRole::Unused; 8],
            device: [BitRole::Unused; 3],
            high: [BitRole::Unused; 8],
            low: [BitRole::Unused; 8],
        };

        let mut i = 0;
        while i < 8 {
            let bit = 7 - i as u8;
            if (1u32 << bit) <= size_mask as u32 {
                layout.word7[i] = BitRole::Word(bit);
            }
            let bit = 15 - i as u8;
            if capacity >= 1u32 << (bit + 1) {
                layout.high[i] = BitRole::Word(bit);
            }
            let bit = 7 - i as u8;
            if capacity >= 1u32 << (bit + 1) {
                layout.low[i] = BitRole::Word(bit);
            }
            i += 1;
        }

        // Mode 2 chips larger than 256 bytes take their upper address bits from the device
        // select pins; mode 3 chips always treat them as device select.
        let mut i = 0;
        while i < 3 {
            let device_bit = 2 - i as u8;
            let word_bit = 10 - i as u8;
            layout.device[i] = if matches!(mode, AddressMode::SixteenBit)
                || (size_mask as u32) < (1u32 << word_bit)
            {
                BitRole::Device(device_bit)
            } else {
                BitRole::Word(word_bit)
            };
            i += 1;
        }

        layout
    }
}

/// Geometry and wiring of a serial EEPROM.
///
/// The address layout is derived from the mode and size, so a profile can only be built with
/// [`ChipProfile::new`]:
///
/// ```compile_fail
/// use eeprom_core::chip::{AddressMode, BusWiring, ChipProfile, Line};
///
/// let line = Line::new(0x20_0001, 0);
/// let wiring = BusWiring { scl: line, sda_in: line, sda_out: line };
/// let x24c16 = ChipProfile::new(AddressMode::EightBit, 0x7FF, 0x7FF, wiring);
/// let _ = ChipProfile { size_mask: 0x7F, ..x24c16 };
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[must_use]
pub struct ChipProfile {
    mode: AddressMode,
    size_mask: u16,
    pagewrite_mask: u16,
    wiring: BusWiring,
    layout: AddressLayout,
}

impl ChipProfile {
    /// Create a new `ChipProfile`.
    ///
    /// # Panics
    ///
    /// Panics if the capacity described by `size_mask` exceeds [`MAX_CAPACITY`] or is not a power
    /// of two, or if a wired line names a data bit outside its byte.
    pub const fn new(
        mode: AddressMode,
        size_mask: u16,
        pagewrite_mask: u16,
        wiring: BusWiring,
    ) -> Self {
        assert!(
            (size_mask as usize) < MAX_CAPACITY,
            "eeprom capacity exceeds 8 KiB"
        );
        assert!(
            (size_mask as u32 + 1).is_power_of_two(),
            "eeprom size mask must be a power of two minus one"
        );
        assert!(
            wiring.scl.bit < 8 && wiring.sda_in.bit < 8 && wiring.sda_out.bit < 8,
            "eeprom line bit must be within a byte"
        );
        Self {
            mode,
            size_mask,
            pagewrite_mask,
            wiring,
            layout: AddressLayout::new(mode, size_mask),
        }
    }

    pub const fn mode(&self) -> AddressMode {
        self.mode
    }

    /// Capacity minus one.
    #[must_use]
    pub const fn size_mask(&self) -> u16 {
        self.size_mask
    }

    /// Word address bits that roll over during a sequential write.
    #[must_use]
    pub const fn pagewrite_mask(&self) -> u16 {
        self.pagewrite_mask
    }

    pub const fn wiring(&self) -> BusWiring {
        self.wiring
    }

    pub const fn layout(&self) -> &AddressLayout {
        &self.layout
    }

    #[must_use]
    pub const fn address_bits(&self) -> u8 {
        self.mode.address_bits()
    }

    /// Number of bytes of storage.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.size_mask as usize + 1
    }

    /// Conventional part number for a chip of this capacity.
    #[must_use]
    pub const fn part_name(&self) -> &'static str {
        match self.size_mask {
            0x007F => "24C01",
            0x00FF => "24C02",
            0x01FF => "24C04",
            0x03FF => "24C08",
            0x07FF => "24C16",
            0x0FFF => "24C32",
            0x1FFF => "24C65",
            _ => "24Cxx",
        }
    }

    /// Whether a byte write at `addr` drives SCL or SDA.
    #[must_use]
    pub const fn drives_byte(&self, addr: u32) -> bool {
        self.wiring.scl.on_byte(addr) || self.wiring.sda_in.on_byte(addr)
    }

    /// Whether a word write at `addr` drives SCL or SDA.
    #[must_use]
    pub const fn drives_word(&self, addr: u32) -> bool {
        self.wiring.scl.on_word(addr) || self.wiring.sda_in.on_word(addr)
    }
}
