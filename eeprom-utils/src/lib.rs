//! Command line tools for inspecting serial EEPROM data.

pub mod logging;
