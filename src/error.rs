use std::fmt;
use std::io;

/// Fatal, startup-time failures. Anything that survives past `Emulator::power_on`
/// is handled by logging and graceful degradation instead (see `GbError::BootRomLoad`,
/// which is the one variant the driver treats as non-fatal).
#[derive(Debug)]
pub enum GbError {
    /// The ROM file could not be opened or read.
    RomLoad(io::Error),
    /// The file was too short to contain a cartridge header (needs at least 0x150 bytes).
    RomTooSmall(usize),
    /// Cartridge header byte 0x147 named an MBC type other than 0x00 (flat 32 KiB ROM).
    UnsupportedCartridgeType(u8),
    /// A boot ROM path was given but the file could not be read. Non-fatal: the driver
    /// logs a warning and boots directly into the cartridge at 0x0100.
    BootRomLoad(io::Error),
}

impl fmt::Display for GbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GbError::RomLoad(e) => write!(f, "failed to load ROM: {}", e),
            GbError::RomTooSmall(n) => {
                write!(f, "ROM is too small to contain a cartridge header ({} bytes)", n)
            }
            GbError::UnsupportedCartridgeType(b) => write!(
                f,
                "unsupported cartridge type 0x{:02X} (only the flat 32 KiB ROM, type 0x00, is supported)",
                b
            ),
            GbError::BootRomLoad(e) => write!(f, "failed to load boot ROM: {}", e),
        }
    }
}

impl std::error::Error for GbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GbError::RomLoad(e) | GbError::BootRomLoad(e) => Some(e),
            GbError::RomTooSmall(_) | GbError::UnsupportedCartridgeType(_) => None,
        }
    }
}

impl From<io::Error> for GbError {
    fn from(e: io::Error) -> Self {
        GbError::RomLoad(e)
    }
}
