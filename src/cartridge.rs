//! Cartridge loading. Only the flat 32 KiB ROM layout (header byte 0x147 == 0x00,
//! no memory bank controller) is supported; anything else is rejected up front
//! rather than silently misbehaving partway through emulation.

use std::fs;
use std::path::Path;

use crate::error::GbError;
use crate::memory::Rom;

const HEADER_CARTRIDGE_TYPE: usize = 0x147;
const MIN_ROM_SIZE: usize = 0x150;
const FLAT_ROM_CARTRIDGE_TYPE: u8 = 0x00;

/// Reads `path`, validates the cartridge header, and returns a `Rom` device ready
/// to register on the bus at 0x0000.
pub fn load(path: impl AsRef<Path>) -> Result<Rom, GbError> {
    let data = fs::read(path).map_err(GbError::RomLoad)?;
    if data.len() < MIN_ROM_SIZE {
        return Err(GbError::RomTooSmall(data.len()));
    }
    let cart_type = data[HEADER_CARTRIDGE_TYPE];
    if cart_type != FLAT_ROM_CARTRIDGE_TYPE {
        return Err(GbError::UnsupportedCartridgeType(cart_type));
    }
    Ok(Rom::new(0x0000, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn header_with_type(cart_type: u8) -> Vec<u8> {
        let mut rom = vec![0u8; 0x8000];
        rom[HEADER_CARTRIDGE_TYPE] = cart_type;
        rom
    }

    fn write_temp(bytes: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("gabe-test-{}.gb", bytes.len()));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn flat_rom_loads_successfully() {
        let path = write_temp(&header_with_type(0x00));
        let rom = load(&path).unwrap();
        assert_eq!(rom.read_byte(HEADER_CARTRIDGE_TYPE as u16), 0x00);
    }

    #[test]
    fn mbc_header_is_rejected() {
        let path = write_temp(&header_with_type(0x01));
        match load(&path) {
            Err(GbError::UnsupportedCartridgeType(0x01)) => {}
            other => panic!("expected UnsupportedCartridgeType, got {:?}", other),
        }
    }

    #[test]
    fn short_file_is_rejected() {
        let path = write_temp(&[0u8; 16]);
        match load(&path) {
            Err(GbError::RomTooSmall(16)) => {}
            other => panic!("expected RomTooSmall, got {:?}", other),
        }
    }
}
