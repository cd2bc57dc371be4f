#![doc = include_str!("../README.md")]

pub mod chip;
pub mod common;
pub mod database;
pub mod eeprom;
pub mod error;
pub mod fs;
pub mod mem;

pub mod prelude {
    //! The prelude re-exports the types needed to wire a serial EEPROM into a cartridge bus.

    pub use crate::{
        chip::{AddressMode, BusWiring, ChipProfile, Line},
        common::{Reset, ResetKind, Sram},
        database::{ChipDatabase, GameEntry},
        eeprom::{Eeprom, State},
        error::Error,
        mem::Mem,
    };
}
