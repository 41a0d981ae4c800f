//! CHIP-8 core.

#![warn(missing_docs)]

pub mod core;
pub mod debugger;
pub mod emulator;
pub mod errors;
pub mod peripherals;
