use eeprom_core::{
    chip::{BusWiring, Line},
    common::{Reset, ResetKind, Sram},
    database::ChipDatabase,
    eeprom::{Eeprom, State},
    error::Error,
    fs,
    mem::Mem,
};
use std::path::PathBuf;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
}

fn eeprom_for(serial: &str) -> Eeprom {
    init_tracing();
    Eeprom::for_game(serial.as_bytes(), 0).expect("known game")
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Width {
    Byte,
    Word,
}

/// The console side of the bus, driving the lines with byte or word accesses.
struct Master {
    eeprom: Eeprom,
    wiring: BusWiring,
    width: Width,
    scl: bool,
    sda: bool,
}

impl Master {
    fn new(eeprom: Eeprom, width: Width) -> Self {
        let wiring = eeprom.profile().expect("chip attached").wiring();
        Self {
            eeprom,
            wiring,
            width,
            scl: false,
            sda: false,
        }
    }

    fn drive(&mut self, line: Line) {
        let BusWiring { scl, sda_in, .. } = self.wiring;
        match self.width {
            Width::Byte => {
                let mut val = 0u8;
                if scl.on_byte(line.addr) && self.scl {
                    val |= 1 << scl.bit;
                }
                if sda_in.on_byte(line.addr) && self.sda {
                    val |= 1 << sda_in.bit;
                }
                self.eeprom.write_u8(line.addr, val);
            }
            Width::Word => {
                let mut val = 0u16;
                if scl.on_word(line.addr) && self.scl {
                    val |= 1 << scl.word_bit();
                }
                if sda_in.on_word(line.addr) && self.sda {
                    val |= 1 << sda_in.word_bit();
                }
                self.eeprom.write_u16(line.addr & !1, val);
            }
        }
    }

    fn scl(&mut self, level: bool) {
        self.scl = level;
        self.drive(self.wiring.scl);
    }

    fn sda(&mut self, level: bool) {
        self.sda = level;
        self.drive(self.wiring.sda_in);
    }

    fn sense(&self) -> bool {
        let out = self.wiring.sda_out;
        match self.width {
            Width::Byte => self.eeprom.read_u8(out.addr) & (1 << out.bit) != 0,
            Width::Word => self.eeprom.read_u16(out.addr & !1) & (1 << out.word_bit()) != 0,
        }
    }

    fn start(&mut self) {
        self.sda(true);
        self.scl(true);
        self.sda(false);
        self.scl(false);
    }

    fn stop(&mut self) {
        self.sda(false);
        self.scl(true);
        self.sda(true);
        self.scl(false);
    }

    fn send(&mut self, byte: u8) -> bool {
        for i in (0..8).rev() {
            self.sda((byte >> i) & 0x01 == 0x01);
            self.scl(true);
            self.scl(false);
        }
        self.sda(true);
        self.scl(true);
        let ack = !self.sense();
        self.scl(false);
        ack
    }

    fn recv(&mut self, ack: bool) -> u8 {
        let mut byte = 0;
        self.sda(true);
        for _ in 0..8 {
            self.scl(true);
            byte = (byte << 1) | u8::from(self.sense());
            self.scl(false);
        }
        self.sda(!ack);
        self.scl(true);
        self.scl(false);
        byte
    }

    /// Send a complete write transaction, asserting every byte is acknowledged.
    fn write(&mut self, header: &[u8], data: &[u8]) {
        self.start();
        for &byte in header.iter().chain(data) {
            assert!(self.send(byte), "byte ${byte:02X} not acknowledged");
        }
        self.stop();
    }

    /// Set the address with a dummy write, then read `len` bytes after a repeated START.
    fn read(&mut self, header: &[u8], device: Option<u8>, len: usize) -> Vec<u8> {
        self.start();
        for &byte in header {
            assert!(self.send(byte), "byte ${byte:02X} not acknowledged");
        }
        if let Some(device) = device {
            self.start();
            assert!(self.send(device | 0x01), "device read not acknowledged");
        }
        let data = (0..len).map(|i| self.recv(i + 1 < len)).collect();
        self.stop();
        data
    }
}

#[test]
fn acclaim_24c02_random_read() {
    let mut bus = Master::new(eeprom_for("T-81406"), Width::Byte);
    bus.write(&[0xA0, 0x40], &[0xCA, 0xFE, 0x42]);
    assert_eq!(&bus.eeprom.store()[0x40..0x43], &[0xCA, 0xFE, 0x42]);
    assert_eq!(bus.read(&[0xA0, 0x41], Some(0xA0), 2), [0xFE, 0x42]);
    assert_eq!(bus.eeprom.state(), State::Standby);
}

#[test]
fn acclaim_old_board() {
    let mut bus = Master::new(eeprom_for("T-081326"), Width::Byte);
    bus.write(&[0xA0, 0x10], &[0x5A]);
    assert_eq!(bus.read(&[0xA0, 0x10], Some(0xA0), 1), [0x5A]);
}

#[test]
fn codemasters_24c08_device_bits() {
    let mut bus = Master::new(eeprom_for("T-120096"), Width::Byte);
    // A9 and A8 of $2AB travel in the device byte
    bus.write(&[0xA4, 0xAB], &[0x5A]);
    assert_eq!(bus.eeprom.store()[0x2AB], 0x5A);
    assert_eq!(bus.read(&[0xA4, 0xAB], Some(0xA4), 1), [0x5A]);

    // The remaining device select pin is not decoded by a 1 KiB chip
    bus.write(&[0xAC, 0xAB], &[0x77]);
    assert_eq!(bus.eeprom.store()[0x2AB], 0x77);
}

#[test]
fn codemasters_sda_out_register() {
    let mut bus = Master::new(eeprom_for("T-120106"), Width::Byte);
    bus.start();
    for _ in 0..8 {
        bus.sda(false);
        bus.scl(true);
        bus.scl(false);
    }
    assert!(bus.eeprom.state().is_acknowledging());
    assert_eq!(bus.eeprom.read_u8(0x38_0001), 0x7F);
    assert_eq!(bus.eeprom.read_u8(0x30_0000), 0xFF, "sda in is write only");
}

#[test]
fn x24c65_two_byte_address() {
    let mut bus = Master::new(eeprom_for("T-81576"), Width::Byte);
    bus.write(&[0xA0, 0x12, 0x34], &[0xDE, 0xAD]);
    assert_eq!(&bus.eeprom.store()[0x1234..0x1236], &[0xDE, 0xAD]);
    assert_eq!(bus.read(&[0xA0, 0x12, 0x34], Some(0xA0), 2), [0xDE, 0xAD]);

    // Address bits above the chip capacity are ignored
    bus.write(&[0xA0, 0xF2, 0x34], &[0xBE]);
    assert_eq!(bus.eeprom.store()[0x1234], 0xBE);
}

#[test]
fn x24c65_sequential_read_wraps() {
    let mut eeprom = eeprom_for("T-120146-50");
    let mut data = vec![0x00; eeprom.store().len()];
    data[0x1FFF] = 0x11;
    data[0x0000] = 0x22;
    data[0x0001] = 0x33;
    eeprom.restore(&data).expect("restored");

    let mut bus = Master::new(eeprom, Width::Byte);
    assert_eq!(
        bus.read(&[0xA0, 0x1F, 0xFF], Some(0xA0), 3),
        [0x11, 0x22, 0x33]
    );
}

#[test]
fn x24c16_page_write_wraps() {
    let mut bus = Master::new(eeprom_for("T-081586"), Width::Word);
    // 24C16 with a full-chip page: writes roll over from the last cell to the first
    bus.write(&[0xAE, 0xFF], &[0x01, 0x02]);
    assert_eq!(bus.eeprom.store()[0x7FF], 0x01);
    assert_eq!(bus.eeprom.store()[0x000], 0x02);
}

#[test]
fn ea_word_accesses() {
    let mut bus = Master::new(eeprom_for("T-50446"), Width::Word);
    bus.write(&[0x20 << 1], &[0x99, 0x66]);
    assert_eq!(&bus.eeprom.store()[0x20..0x22], &[0x99, 0x66]);

    bus.start();
    assert!(bus.send((0x20 << 1) | 0x01));
    assert_eq!(bus.recv(true), 0x99);
    assert_eq!(bus.recv(false), 0x66);
    bus.stop();
}

#[test]
fn acclaim_word_lanes() {
    // SCL on the even byte (high lane), SDA on the odd byte (low lane)
    let mut bus = Master::new(eeprom_for("T-81476"), Width::Word);
    bus.write(&[0xA0, 0x00, 0x80], &[0x3C]);
    assert_eq!(bus.eeprom.store()[0x80], 0x3C);

    let mut bytes = Master::new(bus.eeprom.clone(), Width::Byte);
    assert_eq!(bytes.read(&[0xA0, 0x00, 0x80], Some(0xA0), 1), [0x3C]);
}

#[test]
fn codemasters_word_lanes() {
    let mut bus = Master::new(eeprom_for("T-120146-50"), Width::Word);
    bus.write(&[0xA0, 0x01, 0x00], &[0xC3]);
    assert_eq!(bus.eeprom.store()[0x100], 0xC3);
    assert_eq!(bus.read(&[0xA0, 0x01, 0x00], Some(0xA0), 1), [0xC3]);
}

#[test]
fn checksum_disambiguates() {
    init_tracing();
    let mm96 = Eeprom::for_game(b"00000000-00", 0x165E).expect("micro machines 96");
    assert_eq!(mm96.store().len(), 2048);
    let military = Eeprom::for_game(b"00000000-00", 0x168B).expect("micro machines military");
    assert_eq!(military.store().len(), 1024);
    assert!(matches!(
        Eeprom::for_game(b"00000000-00", 0x1234),
        Err(Error::NotFound { checksum: 0x1234, .. })
    ));
    assert!(Eeprom::for_game(b"T-12053", 0xEA80).is_ok());
    assert!(Eeprom::for_game(b"T-12053", 0x0000).is_err());
}

#[test]
fn unknown_game() {
    init_tracing();
    let err = Eeprom::for_game(b"T-99999", 0).expect_err("not in database");
    assert!(matches!(err, Error::NotFound { ref serial, .. } if serial == "T-99999"));

    let mut eeprom = Eeprom::new();
    let len = ChipDatabase::global().len();
    assert_eq!(
        eeprom.set_type(Some(len)),
        Err(Error::OutOfRange { index: len, len })
    );
    assert!(!eeprom.is_present());
}

#[test]
fn reset_during_transfer() {
    let mut bus = Master::new(eeprom_for("T-12046"), Width::Byte);
    bus.write(&[0x05 << 1], &[0xAB]);
    bus.start();
    bus.send(0x06 << 1);
    bus.eeprom.reset(ResetKind::Soft);
    assert_eq!(bus.eeprom.state(), State::Standby);

    bus.scl = false;
    bus.sda = false;
    assert_eq!(bus.read(&[(0x05 << 1) | 0x01], None, 1), [0xAB]);
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("eeprom-core-{}", std::process::id()))
        .join(name)
}

#[test]
fn battery_save_round_trip() -> anyhow::Result<()> {
    let mut bus = Master::new(eeprom_for("T-81576"), Width::Byte);
    bus.write(&[0xA0, 0x00, 0x10], b"HISCORE");
    assert!(bus.eeprom.is_dirty());

    let path = temp_path("college_slam.sav");
    bus.eeprom.save(&path)?;
    assert!(path.with_extension("eep").exists());

    let mut loaded = eeprom_for("T-81576");
    loaded.load(&path)?;
    assert_eq!(loaded.store(), bus.eeprom.store());
    assert!(!loaded.is_dirty());

    let mut smaller = eeprom_for("T-81406");
    assert!(matches!(
        smaller.load(&path),
        Err(fs::Error::Chip(Error::SizeMismatch {
            expected: 256,
            found: 8192
        }))
    ));
    assert!(smaller.store().iter().all(|&b| b == 0xFF));

    std::fs::remove_file(path.with_extension("eep"))?;
    Ok(())
}

#[test]
fn battery_save_without_chip() -> anyhow::Result<()> {
    let path = temp_path("no_chip.sav");
    let mut eeprom = Eeprom::new();
    eeprom.save(&path)?;
    assert!(!path.with_extension("eep").exists());
    eeprom.load(&path)?;
    Ok(())
}
