//! DMG Game Boy emulation core: CPU, bus, interrupt controller, timer, joypad,
//! serial, LCD/PPU, DMA, and cartridge loading, plus the driver (`gb`) that wires
//! them together and the terminal debugger built on top of it.

#[macro_use]
extern crate log;

pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod debugger;
pub mod dma;
pub mod error;
pub mod gb;
pub mod interrupt;
pub mod joypad;
pub mod lcd;
pub mod memory;
pub mod ppu;
pub mod renderer;
pub mod serial;
pub mod timer;
pub mod util;
