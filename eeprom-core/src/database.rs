//! Cartridge EEPROM database.
//!
//! Games with a serial EEPROM don't advertise it in the ROM header, so the chip type and board
//! wiring are looked up by serial number (and, for ambiguous serials, the header checksum).

use crate::{
    chip::{AddressMode, BusWiring, ChipProfile, Line},
    error::{Error, Result},
};
use serde::Serialize;

/// Acclaim boards used by the first NBA Jam release.
const ACCLAIM_OLD: BusWiring = BusWiring {
    scl: Line::new(0x20_0001, 1),
    sda_in: Line::new(0x20_0001, 0),
    sda_out: Line::new(0x20_0001, 1),
};

const ACCLAIM: BusWiring = BusWiring {
    scl: Line::new(0x20_0000, 0),
    sda_in: Line::new(0x20_0001, 0),
    sda_out: Line::new(0x20_0001, 0),
};

const ELECTRONIC_ARTS: BusWiring = BusWiring {
    scl: Line::new(0x20_0001, 6),
    sda_in: Line::new(0x20_0001, 7),
    sda_out: Line::new(0x20_0001, 7),
};

const SEGA: BusWiring = BusWiring {
    scl: Line::new(0x20_0001, 1),
    sda_in: Line::new(0x20_0001, 0),
    sda_out: Line::new(0x20_0001, 0),
};

const CODEMASTERS: BusWiring = BusWiring {
    scl: Line::new(0x30_0000, 1),
    sda_in: Line::new(0x30_0000, 0),
    sda_out: Line::new(0x38_0001, 7),
};

const fn x24c01(wiring: BusWiring) -> ChipProfile {
    ChipProfile::new(AddressMode::SevenBit, 0x7F, 0x7F, wiring)
}

const fn x24c02(wiring: BusWiring) -> ChipProfile {
    ChipProfile::new(AddressMode::EightBit, 0xFF, 0xFF, wiring)
}

const fn x24c08(wiring: BusWiring) -> ChipProfile {
    ChipProfile::new(AddressMode::EightBit, 0x3FF, 0x3FF, wiring)
}

const fn x24c16(wiring: BusWiring) -> ChipProfile {
    ChipProfile::new(AddressMode::EightBit, 0x7FF, 0x7FF, wiring)
}

const fn x24c65(wiring: BusWiring) -> ChipProfile {
    ChipProfile::new(AddressMode::SixteenBit, 0x1FFF, 0x1FFF, wiring)
}

/// A known game and the EEPROM its cartridge carries.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[must_use]
pub struct GameEntry {
    /// Serial number prefix, without the leading `GM `.
    pub game_id: &'static str,
    /// Header checksum required to match, or `0` to match on the serial alone.
    pub checksum: u16,
    pub profile: ChipProfile,
    pub title: &'static str,
}

impl GameEntry {
    pub const fn new(
        game_id: &'static str,
        checksum: u16,
        profile: ChipProfile,
        title: &'static str,
    ) -> Self {
        Self {
            game_id,
            checksum,
            profile,
            title,
        }
    }

    /// Whether this entry applies to a ROM with the given serial and checksum.
    #[must_use]
    pub fn matches(&self, serial: &[u8], checksum: u16) -> bool {
        serial.starts_with(self.game_id.as_bytes())
            && (self.checksum == 0 || self.checksum == checksum)
    }
}

// Order matters: serials shared by several games are told apart by checksum, and the first
// matching entry wins.
#[rustfmt::skip]
static GAMES: [GameEntry; 29] = [
    // Acclaim, 24C02 (old mapper)
    GameEntry::new("T-081326", 0, x24c02(ACCLAIM_OLD), "NBA Jam (UE)"),
    GameEntry::new("T-81033", 0, x24c02(ACCLAIM_OLD), "NBA Jam (J)"),
    // Acclaim, 24C02
    GameEntry::new("T-81406", 0, x24c02(ACCLAIM), "NBA Jam TE"),
    GameEntry::new("T-081276", 0, x24c02(ACCLAIM), "NFL Quarterback Club"),
    // Acclaim, 24C16
    GameEntry::new("T-081586", 0, x24c16(ACCLAIM), "NFL Quarterback Club '96"),
    // Acclaim, 24C65
    GameEntry::new("T-81576", 0, x24c65(ACCLAIM), "College Slam"),
    GameEntry::new("T-81476", 0, x24c65(ACCLAIM), "Frank Thomas Big Hurt Baseball"),
    // Electronic Arts, 24C01
    GameEntry::new("T-50176", 0, x24c01(ELECTRONIC_ARTS), "Rings of Power"),
    GameEntry::new("T-50396", 0, x24c01(ELECTRONIC_ARTS), "NHLPA Hockey 93"),
    GameEntry::new("T-50446", 0, x24c01(ELECTRONIC_ARTS), "John Madden Football 93"),
    GameEntry::new("T-50516", 0, x24c01(ELECTRONIC_ARTS), "John Madden Football 93 (Championship Ed.)"),
    GameEntry::new("T-50606", 0, x24c01(ELECTRONIC_ARTS), "Bill Walsh College Football"),
    // Sega, 24C01
    GameEntry::new("T-12046", 0, x24c01(SEGA), "Megaman - The Wily Wars"),
    GameEntry::new("T-12053", 0xEA80, x24c01(SEGA), "Rockman Mega World (J) [A]"),
    GameEntry::new("MK-1215", 0, x24c01(SEGA), "Evander 'Real Deal' Holyfield's Boxing"),
    GameEntry::new("MK-1228", 0, x24c01(SEGA), "Greatest Heavyweights of the Ring (U)"),
    GameEntry::new("G-5538", 0, x24c01(SEGA), "Greatest Heavyweights of the Ring (J)"),
    GameEntry::new("PR-1993", 0, x24c01(SEGA), "Greatest Heavyweights of the Ring (E)"),
    GameEntry::new("G-4060", 0, x24c01(SEGA), "Wonderboy in Monster World"),
    GameEntry::new("00001211-00", 0, x24c01(SEGA), "Sports Talk Baseball"),
    GameEntry::new("00004076-00", 0, x24c01(SEGA), "Honoo no Toukyuuji Dodge Danpei"),
    GameEntry::new("G-4524", 0, x24c01(SEGA), "Ninja Burai Densetsu"),
    // Codemasters, 24C01
    GameEntry::new("T-120106", 0, x24c01(CODEMASTERS), "Brian Lara Cricket"),
    // Codemasters, 24C08
    GameEntry::new("T-120096", 0, x24c08(CODEMASTERS), "Micro Machines 2 - Turbo Tournament (E)"),
    GameEntry::new("00000000-00", 0x168B, x24c08(CODEMASTERS), "Micro Machines Military"),
    GameEntry::new("00000000-00", 0xCEE0, x24c08(CODEMASTERS), "Micro Machines Military (Bad)"),
    // Codemasters, 24C16
    GameEntry::new("00000000-00", 0x165E, x24c16(CODEMASTERS), "Micro Machines Turbo Tournament 96"),
    GameEntry::new("00000000-00", 0x2C41, x24c16(CODEMASTERS), "Micro Machines Turbo Tournament 96 (Bad)"),
    // Codemasters, 24C65
    GameEntry::new("T-120146-50", 0, x24c65(CODEMASTERS), "Brian Lara Cricket 96, Shane Warne Cricket"),
];

static DATABASE: ChipDatabase = ChipDatabase::new(&GAMES);

/// An ordered table of games with serial EEPROMs.
#[derive(Debug, Copy, Clone)]
#[must_use]
pub struct ChipDatabase {
    entries: &'static [GameEntry],
}

impl ChipDatabase {
    pub const fn new(entries: &'static [GameEntry]) -> Self {
        Self { entries }
    }

    /// The built-in database of known cartridges.
    pub fn global() -> &'static Self {
        &DATABASE
    }

    #[must_use]
    pub const fn entries(&self) -> &'static [GameEntry] {
        self.entries
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'static GameEntry> {
        self.entries.get(index)
    }

    /// Index of the first entry matching the given ROM serial and checksum.
    #[must_use]
    pub fn detect(&self, serial: &[u8], checksum: u16) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.matches(serial, checksum))
    }

    /// The first entry matching the given ROM serial and checksum.
    ///
    /// # Errors
    ///
    /// If no entry matches, then [`Error::NotFound`] is returned.
    pub fn lookup(&self, serial: &[u8], checksum: u16) -> Result<&'static GameEntry> {
        self.detect(serial, checksum)
            .map(|index| &self.entries[index])
            .ok_or_else(|| Error::not_found(serial, checksum))
    }

    /// The chip profile for the entry at `index`.
    ///
    /// # Errors
    ///
    /// If `index` is outside the table, then [`Error::OutOfRange`] is returned.
    pub fn profile_at(&self, index: usize) -> Result<ChipProfile> {
        self.get(index)
            .map(|entry| entry.profile)
            .ok_or(Error::OutOfRange {
                index,
                len: self.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn entry(game_id: &'static str, checksum: u16, size_mask: u16) -> GameEntry {
        GameEntry::new(
            game_id,
            checksum,
            ChipProfile::new(AddressMode::EightBit, size_mask, size_mask, ACCLAIM),
            game_id,
        )
    }

    #[test]
    fn detect_serial_prefix() {
        let db = ChipDatabase::global();
        // Header serials carry a revision suffix after the catalog number.
        let index = db.detect(b"T-081326 -00", 0x1234).expect("nba jam");
        assert_eq!(db.entries()[index].title, "NBA Jam (UE)");
        assert_eq!(db.detect(b"T-0813", 0), None, "serial shorter than entry");
        assert_eq!(db.detect(b"X-081326", 0), None);
    }

    #[test]
    fn detect_checksum() {
        let db = ChipDatabase::global();
        assert_eq!(db.detect(b"T-12053 -00", 0x0000), None);
        let index = db.detect(b"T-12053 -00", 0xEA80).expect("rockman");
        assert_eq!(db.entries()[index].profile.mode(), AddressMode::SevenBit);

        let entry = db.lookup(b"00000000-00", 0x2C41).expect("micro machines 96");
        assert_eq!(entry.profile.part_name(), "24C16");
        let entry = db.lookup(b"00000000-00", 0xCEE0).expect("micro machines military");
        assert_eq!(entry.profile.part_name(), "24C08");
        assert!(matches!(
            db.lookup(b"00000000-00", 0x0001),
            Err(Error::NotFound { checksum: 0x0001, .. })
        ));
    }

    #[test]
    fn detect_first_match_wins() {
        static ENTRIES: [GameEntry; 4] = [
            entry("T-1000", 0xAAAA, 0x3FF),
            entry("T-1000", 0, 0xFF),
            entry("T-1000", 0xBBBB, 0x7FF),
            entry("T-10", 0, 0x7FF),
        ];
        let db = ChipDatabase::new(&ENTRIES);
        assert_eq!(db.detect(b"T-1000", 0xAAAA), Some(0));
        assert_eq!(db.detect(b"T-1000", 0xBBBB), Some(1), "earlier wildcard");
        assert_eq!(db.detect(b"T-1099", 0xBBBB), Some(3));
    }

    #[test]
    fn profile_at() {
        let db = ChipDatabase::global();
        let profile = db.profile_at(5).expect("college slam");
        assert_eq!(profile.capacity(), 8 * 1024);
        assert_eq!(profile.address_bits(), 16);
        assert_eq!(
            db.profile_at(db.len()),
            Err(Error::OutOfRange {
                index: db.len(),
                len: db.len()
            })
        );
    }

    #[test]
    fn board_wiring() {
        let db = ChipDatabase::global();
        let ea = db.lookup(b"T-50396", 0).expect("nhlpa 93").profile;
        assert_eq!(ea.wiring().scl, Line::new(0x20_0001, 6));
        assert_eq!(ea.wiring().sda_out, Line::new(0x20_0001, 7));
        let codies = db.lookup(b"T-120146-50", 0).expect("brian lara 96").profile;
        assert_eq!(codies.wiring().sda_out.addr, 0x38_0001);
        assert_ne!(codies.wiring().scl.addr, codies.wiring().sda_out.addr);
    }
}
