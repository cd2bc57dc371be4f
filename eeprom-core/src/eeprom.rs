//! Two-wire serial EEPROM (24Cxx) emulation.
//!
//! The console bit-bangs SCL and SDA through memory-mapped cartridge registers. Every write
//! samples both lines and advances the protocol by at most one edge, so the device is driven
//! entirely by the order of bus writes rather than by elapsed time.

use crate::{
    chip::{AddressMode, BitRole, ChipProfile},
    common::{Reset, ResetKind, Sram},
    database::ChipDatabase,
    error::{Error, Result},
    fs,
    mem::Mem,
};
use std::{fmt, path::Path};
use tracing::{debug, info, trace};

const SRAM_EXTENSION: &str = "eep";

/// Value of an erased cell.
const ERASED: u8 = 0xFF;

/// The ninth clock of every byte is reserved for the acknowledge bit.
const ACK_CLOCK: u8 = 9;

/// Protocol state. Counters track the clock within the current byte.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub enum State {
    #[default]
    Standby,
    /// A read was not acknowledged by the master. Only STOP is recognized.
    WaitStop,
    /// Mode 1 address byte: `[A6..A0 RW]`.
    WordAddr7 { counter: u8, read: bool },
    /// Device byte: `[1 0 1 0 DEV2 DEV1 DEV0 RW]`.
    SlaveAddr { counter: u8, read: bool },
    /// Mode 3 word address high byte.
    WordAddrHigh { counter: u8 },
    /// Word address low byte.
    WordAddrLow { counter: u8 },
    ReadData { counter: u8 },
    WriteData { counter: u8 },
}

impl State {
    /// Whether the device pulls SDA low to acknowledge the byte it just received.
    #[must_use]
    pub const fn is_acknowledging(self) -> bool {
        matches!(
            self,
            Self::WordAddr7 {
                counter: ACK_CLOCK,
                ..
            } | Self::SlaveAddr {
                counter: ACK_CLOCK,
                ..
            } | Self::WordAddrHigh { counter: ACK_CLOCK }
                | Self::WordAddrLow { counter: ACK_CLOCK }
                | Self::WriteData { counter: ACK_CLOCK }
        )
    }

    /// The first rising SCL edge after START arms the address byte counter.
    const fn rise(self) -> Self {
        match self {
            Self::WordAddr7 { counter: 0, read } => Self::WordAddr7 { counter: 1, read },
            Self::SlaveAddr { counter: 0, read } => Self::SlaveAddr { counter: 1, read },
            state => state,
        }
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
struct Lines {
    scl: bool,
    sda: bool,
    prev_scl: bool,
    prev_sda: bool,
}

impl Lines {
    const fn start(&self) -> bool {
        self.prev_scl && self.scl && self.prev_sda && !self.sda
    }

    const fn stop(&self) -> bool {
        self.prev_scl && self.scl && !self.prev_sda && self.sda
    }

    const fn rising(&self) -> bool {
        !self.prev_scl && self.scl
    }

    const fn falling(&self) -> bool {
        self.prev_scl && !self.scl
    }

    fn latch(&mut self) {
        self.prev_scl = self.scl;
        self.prev_sda = self.sda;
    }
}

/// A cartridge serial EEPROM.
#[derive(Clone)]
#[must_use]
pub struct Eeprom {
    profile: Option<ChipProfile>,
    state: State,
    lines: Lines,
    slave_mask: u32,
    word_address: u16,
    dirty: bool,
    store: Vec<u8>,
}

impl Default for Eeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl Eeprom {
    /// Create an `Eeprom` with no chip attached. Bus accesses are ignored until a profile is set.
    pub const fn new() -> Self {
        Self {
            profile: None,
            state: State::Standby,
            lines: Lines {
                scl: false,
                sda: false,
                prev_scl: false,
                prev_sda: false,
            },
            slave_mask: 0,
            word_address: 0,
            dirty: false,
            store: Vec::new(),
        }
    }

    /// Create a blank `Eeprom` for the given chip.
    pub fn with_profile(profile: ChipProfile) -> Self {
        let mut eeprom = Self::new();
        eeprom.set_profile(Some(profile));
        eeprom
    }

    /// Create a blank `Eeprom` for the game with the given ROM serial and checksum.
    ///
    /// # Errors
    ///
    /// If the game is not in the database, then [`Error::NotFound`] is returned.
    pub fn for_game(serial: &[u8], checksum: u16) -> Result<Self> {
        let entry = ChipDatabase::global().lookup(serial, checksum)?;
        debug!("found eeprom entry for `{}`", entry.title);
        Ok(Self::with_profile(entry.profile))
    }

    /// Index of the database entry for the given ROM serial and checksum.
    #[must_use]
    pub fn detect_type(serial: &[u8], checksum: u16) -> Option<usize> {
        ChipDatabase::global().detect(serial, checksum)
    }

    /// Attach the chip of the database entry at `index`, or detach the chip with `None`.
    ///
    /// # Errors
    ///
    /// If `index` is outside the database, then [`Error::OutOfRange`] is returned and the
    /// current chip is kept.
    pub fn set_type(&mut self, index: Option<usize>) -> Result<()> {
        let profile = index
            .map(|index| ChipDatabase::global().profile_at(index))
            .transpose()?;
        self.set_profile(profile);
        Ok(())
    }

    /// Attach a chip, replacing the store with a blank one of matching capacity.
    pub fn set_profile(&mut self, profile: Option<ChipProfile>) {
        match &profile {
            Some(profile) => info!(
                "attached {} serial eeprom ({} bytes)",
                profile.part_name(),
                profile.capacity()
            ),
            None => debug!("detached serial eeprom"),
        }
        self.store = vec![ERASED; profile.map_or(0, |profile| profile.capacity())];
        self.profile = profile;
        self.dirty = false;
        self.reset_protocol();
    }

    #[must_use]
    pub const fn profile(&self) -> Option<&ChipProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.profile.is_some()
    }

    pub const fn state(&self) -> State {
        self.state
    }

    /// Whether the store changed since the last [`Eeprom::clear_dirty`].
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[must_use]
    pub fn store(&self) -> &[u8] {
        &self.store
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<u8> {
        self.store.clone()
    }

    /// Overwrite the store with previously saved contents. Any transfer in progress is
    /// abandoned.
    ///
    /// # Errors
    ///
    /// If `data` doesn't match the chip capacity, then [`Error::SizeMismatch`] is returned and the
    /// store is left unmodified.
    pub fn restore(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != self.store.len() {
            return Err(Error::SizeMismatch {
                expected: self.store.len(),
                found: data.len(),
            });
        }
        self.store.copy_from_slice(data);
        self.dirty = true;
        self.reset_protocol();
        Ok(())
    }

    /// Return every cell to the erased state.
    pub fn erase(&mut self) {
        if !self.store.is_empty() {
            self.store.fill(ERASED);
            self.dirty = true;
        }
    }

    fn reset_protocol(&mut self) {
        self.state = State::Standby;
        self.lines = Lines::default();
        self.slave_mask = 0;
        self.word_address = 0;
    }

    fn address(&self, profile: &ChipProfile) -> usize {
        ((self.slave_mask | u32::from(self.word_address)) & u32::from(profile.size_mask())) as usize
    }

    /// Level the device presents on SDA out.
    fn sda_out(&self, profile: &ChipProfile) -> bool {
        match self.state {
            State::ReadData {
                counter: counter @ 1..=8,
            } => (self.store[self.address(profile)] >> (8 - counter)) & 0x01 == 0x01,
            state if state.is_acknowledging() => false,
            _ => self.lines.sda,
        }
    }

    fn route(&mut self, role: BitRole, bit: bool) {
        match role {
            BitRole::Device(n) => self.slave_mask |= u32::from(bit) << n,
            BitRole::Word(n) => {
                let mask = 1 << n;
                if bit {
                    self.word_address |= mask;
                } else {
                    self.word_address &= !mask;
                }
            }
            BitRole::Unused => self.slave_mask >>= 1,
        }
    }

    fn step(&mut self, profile: &ChipProfile) {
        let lines = self.lines;
        let state = self.state;
        self.state = match state {
            State::WaitStop if lines.stop() => {
                trace!("stop");
                State::Standby
            }
            State::WaitStop => State::WaitStop,
            _ if lines.start() => {
                trace!("start");
                self.start(profile)
            }
            _ if lines.stop() => {
                trace!("stop");
                State::Standby
            }
            State::Standby => State::Standby,
            state if lines.rising() => state.rise(),
            state if lines.falling() => self.clock(state, lines.prev_sda, profile),
            state => state,
        };
        self.lines.latch();
    }

    fn start(&mut self, profile: &ChipProfile) -> State {
        self.slave_mask = 0;
        match profile.mode() {
            AddressMode::SevenBit => {
                self.word_address = 0;
                State::WordAddr7 {
                    counter: 0,
                    read: false,
                }
            }
            AddressMode::EightBit | AddressMode::SixteenBit => State::SlaveAddr {
                counter: 0,
                read: false,
            },
        }
    }

    /// Handle a falling SCL edge. `bit` is the SDA level held while SCL was high.
    fn clock(&mut self, state: State, bit: bool, profile: &ChipProfile) -> State {
        let layout = profile.layout();
        match state {
            State::Standby | State::WaitStop => state,
            State::WordAddr7 { counter, read } => match counter {
                0..=7 => {
                    self.route(layout.word7[usize::from(counter)], bit);
                    State::WordAddr7 {
                        counter: counter + 1,
                        read,
                    }
                }
                8 => State::WordAddr7 {
                    counter: ACK_CLOCK,
                    read: bit,
                },
                _ => {
                    self.word_address &= profile.size_mask();
                    if read {
                        State::ReadData { counter: 1 }
                    } else {
                        State::WriteData { counter: 1 }
                    }
                }
            },
            State::SlaveAddr { counter, read } => match counter {
                0..=4 => State::SlaveAddr {
                    counter: counter + 1,
                    read,
                },
                5..=7 => {
                    self.route(layout.device[usize::from(counter - 5)], bit);
                    State::SlaveAddr {
                        counter: counter + 1,
                        read,
                    }
                }
                8 => State::SlaveAddr {
                    counter: ACK_CLOCK,
                    read: bit,
                },
                _ => {
                    // Make room for the word address byte(s) that follow
                    let next = if profile.mode() == AddressMode::SixteenBit {
                        self.slave_mask <<= 16;
                        State::WordAddrHigh { counter: 1 }
                    } else {
                        self.slave_mask <<= 8;
                        State::WordAddrLow { counter: 1 }
                    };
                    if read {
                        State::ReadData { counter: 1 }
                    } else {
                        next
                    }
                }
            },
            State::WordAddrHigh { counter } => {
                if counter < ACK_CLOCK {
                    self.route(layout.high[usize::from(counter - 1)], bit);
                    State::WordAddrHigh {
                        counter: counter + 1,
                    }
                } else {
                    State::WordAddrLow { counter: 1 }
                }
            }
            State::WordAddrLow { counter } => {
                if counter < ACK_CLOCK {
                    self.route(layout.low[usize::from(counter - 1)], bit);
                    State::WordAddrLow {
                        counter: counter + 1,
                    }
                } else {
                    self.word_address &= profile.size_mask();
                    State::WriteData { counter: 1 }
                }
            }
            State::ReadData { counter } => {
                if counter < ACK_CLOCK {
                    if counter == 8 {
                        // Sequential reads wrap around at the end of the chip
                        self.word_address = self.word_address.wrapping_add(1) & profile.size_mask();
                    }
                    State::ReadData {
                        counter: counter + 1,
                    }
                } else if bit {
                    debug!("read not acknowledged, waiting for stop");
                    State::WaitStop
                } else {
                    State::ReadData { counter: 1 }
                }
            }
            State::WriteData { counter } => {
                if counter < ACK_CLOCK {
                    let addr = self.address(profile);
                    let mask = 1 << (8 - counter);
                    if bit {
                        self.store[addr] |= mask;
                    } else {
                        self.store[addr] &= !mask;
                    }
                    self.dirty = true;
                    if counter == 8 {
                        trace!("wrote ${:02X} to ${addr:04X}", self.store[addr]);
                        // Sequential writes wrap around within the current page
                        let page = profile.pagewrite_mask();
                        self.word_address = ((self.word_address & !page)
                            | (self.word_address.wrapping_add(1) & page))
                            & profile.size_mask();
                    }
                    State::WriteData {
                        counter: counter + 1,
                    }
                } else {
                    State::WriteData { counter: 1 }
                }
            }
        }
    }
}

impl Mem for Eeprom {
    fn read_u8(&self, addr: u32) -> u8 {
        let Some(profile) = &self.profile else {
            return 0xFF;
        };
        let line = profile.wiring().sda_out;
        if !line.on_byte(addr) || self.sda_out(profile) {
            0xFF
        } else {
            !(1 << line.bit)
        }
    }

    fn read_u16(&self, addr: u32) -> u16 {
        let Some(profile) = &self.profile else {
            return 0xFFFF;
        };
        let line = profile.wiring().sda_out;
        if !line.on_word(addr) || self.sda_out(profile) {
            0xFFFF
        } else {
            !(1 << line.word_bit())
        }
    }

    fn write_u8(&mut self, addr: u32, val: u8) {
        let Some(profile) = self.profile else {
            return;
        };
        if !profile.drives_byte(addr) {
            return;
        }
        let wiring = profile.wiring();
        self.lines.scl = if wiring.scl.on_byte(addr) {
            val & (1 << wiring.scl.bit) != 0
        } else {
            self.lines.prev_scl
        };
        self.lines.sda = if wiring.sda_in.on_byte(addr) {
            val & (1 << wiring.sda_in.bit) != 0
        } else {
            self.lines.prev_sda
        };
        self.step(&profile);
    }

    fn write_u16(&mut self, addr: u32, val: u16) {
        let Some(profile) = self.profile else {
            return;
        };
        if !profile.drives_word(addr) {
            return;
        }
        let wiring = profile.wiring();
        self.lines.scl = if wiring.scl.on_word(addr) {
            val & (1 << wiring.scl.word_bit()) != 0
        } else {
            self.lines.prev_scl
        };
        self.lines.sda = if wiring.sda_in.on_word(addr) {
            val & (1 << wiring.sda_in.word_bit()) != 0
        } else {
            self.lines.prev_sda
        };
        self.step(&profile);
    }
}

impl Reset for Eeprom {
    /// Abandon any transfer in progress. Contents are non-volatile and survive either kind of
    /// reset; use [`Eeprom::erase`] to blank the chip.
    fn reset(&mut self, _kind: ResetKind) {
        self.reset_protocol();
    }
}

impl Sram for Eeprom {
    fn save(&self, path: impl AsRef<Path>) -> fs::Result<()> {
        if self.profile.is_none() {
            return Ok(());
        }
        fs::save(path.as_ref().with_extension(SRAM_EXTENSION), &self.store)
    }

    fn load(&mut self, path: impl AsRef<Path>) -> fs::Result<()> {
        if self.profile.is_none() {
            return Ok(());
        }
        let data: Vec<u8> = fs::load(path.as_ref().with_extension(SRAM_EXTENSION))?;
        self.restore(&data)?;
        self.dirty = false;
        Ok(())
    }
}

impl fmt::Debug for Eeprom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eeprom")
            .field("profile", &self.profile)
            .field("state", &self.state)
            .field("slave_mask", &format_args!("${:05X}", self.slave_mask))
            .field("word_address", &format_args!("${:04X}", self.word_address))
            .field("dirty", &self.dirty)
            .field("len", &self.store.len())
            .finish()
    }
}
