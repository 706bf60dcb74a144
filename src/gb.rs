//! Wires every device onto one `Bus`, keeps a typed handle to the ones the cycle
//! loop drives directly, and runs the per-frame cycle budget. Mirrors the
//! reference project's `Gameboy` driver, generalized to the fixed memory map and
//! peripheral set this core implements.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use crate::bus::{Bus, DeviceRef};
use crate::cartridge;
use crate::cpu::{Cpu, CpuControl};
use crate::dma::Dma;
use crate::error::GbError;
use crate::interrupt::{InterruptController, InterruptKind, InterruptSource};
use crate::joypad::{Button, Joypad};
use crate::lcd::{Lcd, LcdEvent, Oam, Vram};
use crate::memory::{HighRam, Ram, Rom};
use crate::ppu::Ppu;
use crate::serial::Serial;
use crate::timer::Timer;

/// T-cycles in one 59.7 Hz frame: 154 scanlines * 456 dots.
pub const CYCLES_PER_FRAME: u32 = 70224;

const WORK_RAM_START: u16 = 0xC000;
const WORK_RAM_SIZE: u16 = 0x2000;
const CART_RAM_START: u16 = 0xA000;
const CART_RAM_SIZE: u16 = 0x2000;
const HIGH_RAM_START: u16 = 0xFF80;
const HIGH_RAM_SIZE: u16 = 0x7F;
const BOOT_ROM_SIZE: usize = 256;

/// Drives the CPU, the interrupt controller, and every timed peripheral against a
/// shared `Bus`. Owns the only handles capable of driving time forward; everything
/// else is reached exclusively through bus reads/writes.
pub struct Gameboy {
    bus: Bus,
    cpu: Cpu,
    ic: InterruptController,
    lcd: Rc<RefCell<Lcd>>,
    ppu: Ppu,
    dma: Rc<RefCell<Dma>>,
    joypad: Rc<RefCell<Joypad>>,
    rom: Rc<RefCell<Rom>>,
    booting: bool,
    shadowed_rom_bytes: [u8; BOOT_ROM_SIZE],
    total_cycles: u64,
}

impl Gameboy {
    /// Loads `rom_path`, builds the device graph, and registers everything on a
    /// fresh bus. `boot_rom_path` is optional: if given but unreadable or the
    /// wrong size, the boot is logged as skipped and the cartridge is entered
    /// directly at 0x0100 instead.
    pub fn power_on(rom_path: impl AsRef<Path>, boot_rom_path: Option<&Path>) -> Result<Self, GbError> {
        let rom = cartridge::load(rom_path)?;
        let rom = Rc::new(RefCell::new(rom));

        let mut bus = Bus::new();
        bus.add_device(&(rom.clone() as DeviceRef), 0x0000, 0x8000);

        let vram = Rc::new(RefCell::new(Vram::new()));
        bus.add_device(&(vram.clone() as DeviceRef), 0x8000, 0x2000);

        let cart_ram = Rc::new(RefCell::new(Ram::new(CART_RAM_START, CART_RAM_SIZE)));
        bus.add_device(&(cart_ram as DeviceRef), CART_RAM_START, CART_RAM_SIZE);

        let work_ram = Rc::new(RefCell::new(Ram::new(WORK_RAM_START, WORK_RAM_SIZE)));
        bus.add_device(&(work_ram as DeviceRef), WORK_RAM_START, WORK_RAM_SIZE);

        let oam = Rc::new(RefCell::new(Oam::new()));
        bus.add_device(&(oam.clone() as DeviceRef), 0xFE00, 0xA0);

        let joypad = Rc::new(RefCell::new(Joypad::new()));
        bus.add_device(&(joypad.clone() as DeviceRef), 0xFF00, 1);

        let serial = Rc::new(RefCell::new(Serial::new()));
        bus.add_device(&(serial.clone() as DeviceRef), 0xFF01, 2);

        let timer = Rc::new(RefCell::new(Timer::new()));
        bus.add_device(&(timer.clone() as DeviceRef), 0xFF04, 4);

        let mut ic = InterruptController::new(&mut bus);
        ic.add_source(Box::new(JoypadSource(joypad.clone())));
        ic.add_source(Box::new(SerialSource(serial)));
        ic.add_source(Box::new(TimerSource(timer)));

        let lcd = Rc::new(RefCell::new(Lcd::new(vram.clone(), oam.clone())));
        bus.add_device(&(lcd.clone() as DeviceRef), 0xFF40, 0x0C);

        let high_ram = Rc::new(RefCell::new(HighRam::new(HIGH_RAM_START, HIGH_RAM_SIZE)));
        bus.add_device(&(high_ram as DeviceRef), HIGH_RAM_START, HIGH_RAM_SIZE);

        let dma = Rc::new(RefCell::new(Dma::new(oam.clone())));
        // Registered after the LCD so 0xFF46 (which falls inside the LCD's
        // 0xFF40-0xFF4B register block) resolves to the DMA trigger instead.
        bus.add_device(&(dma.clone() as DeviceRef), 0xFF46, 1);

        let ppu = Ppu::new(vram, oam);

        let boot_rom = match boot_rom_path {
            Some(p) => match fs::read(p) {
                Ok(bytes) if bytes.len() == BOOT_ROM_SIZE => {
                    let mut arr = [0u8; BOOT_ROM_SIZE];
                    arr.copy_from_slice(&bytes);
                    Some(arr)
                }
                Ok(bytes) => {
                    warn!(
                        "boot ROM {} is {} bytes, expected {}; skipping",
                        p.display(),
                        bytes.len(),
                        BOOT_ROM_SIZE
                    );
                    None
                }
                Err(e) => {
                    warn!("{}", GbError::BootRomLoad(e));
                    None
                }
            },
            None => None,
        };

        let mut gb = Gameboy {
            bus,
            cpu: Cpu::new(),
            ic,
            lcd,
            ppu,
            dma,
            joypad,
            rom,
            booting: boot_rom.is_some(),
            shadowed_rom_bytes: [0; BOOT_ROM_SIZE],
            total_cycles: 0,
        };

        if let Some(image) = boot_rom {
            gb.overlay_boot_rom(image);
            gb.cpu.set_pc(0x0000);
        } else {
            gb.cpu.set_pc(0x0100);
        }

        Ok(gb)
    }

    fn overlay_boot_rom(&mut self, image: [u8; BOOT_ROM_SIZE]) {
        let mut rom = self.rom.borrow_mut();
        for i in 0..BOOT_ROM_SIZE {
            self.shadowed_rom_bytes[i] = rom.peek_raw(i as u16);
            rom.poke_raw(i as u16, image[i]);
        }
    }

    fn restore_cartridge_rom(&mut self) {
        let mut rom = self.rom.borrow_mut();
        for i in 0..BOOT_ROM_SIZE {
            rom.poke_raw(i as u16, self.shadowed_rom_bytes[i]);
        }
    }

    pub fn set_button(&self, button: Button, pressed: bool) {
        self.joypad.borrow_mut().set_button(button, pressed);
    }

    /// Current CPU program counter, for the debugger.
    pub fn pc(&self) -> u16 {
        self.cpu.pc()
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    pub fn framebuffer(&self) -> &[u8] {
        self.ppu.framebuffer()
    }

    pub fn lcd_on(&self) -> bool {
        self.lcd.borrow().lcd_enabled()
    }

    /// Executes exactly one CPU instruction and fans its cycle cost out to every
    /// peripheral, in the order the driver is specified to use. Returns the
    /// number of T-cycles the instruction consumed.
    pub fn tick(&mut self) -> u32 {
        let cycles = self.cpu.step(&self.bus);
        self.total_cycles += cycles as u64;

        if self.booting && self.cpu.pc() >= 0x0100 {
            self.restore_cartridge_rom();
            self.booting = false;
        }

        self.ic.update(cycles, &mut self.cpu, &self.bus);
        self.dma.borrow_mut().update(cycles, &self.bus);

        let event = self.lcd.borrow_mut().update(cycles, &mut self.ic);
        if let Some(event) = event {
            match event {
                LcdEvent::HBlankEntered(ly) => {
                    let lcd = self.lcd.borrow();
                    self.ppu.draw_scanline(ly, &lcd);
                }
                LcdEvent::VBlankEntered => {
                    self.ppu.enter_vblank(&mut self.ic);
                }
            }
        }

        cycles
    }

    /// Runs `tick` until at least `budget` T-cycles have been consumed this call,
    /// returning the exact total (never less than `budget`, since instructions
    /// are not divisible mid-execution).
    pub fn step(&mut self, budget: u32) -> u32 {
        let mut consumed = 0;
        while consumed < budget {
            consumed += self.tick();
        }
        consumed
    }

    /// Runs exactly one frame's worth of cycles (`CYCLES_PER_FRAME`).
    pub fn step_frame(&mut self) -> u32 {
        self.step(CYCLES_PER_FRAME)
    }
}

struct JoypadSource(Rc<RefCell<Joypad>>);
impl InterruptSource for JoypadSource {
    fn flag_bit(&self) -> u8 {
        InterruptKind::Joypad.flag_bit()
    }
    fn vector_addr(&self) -> u16 {
        InterruptKind::Joypad.vector_addr()
    }
    fn update(&mut self, cycles: u32) -> bool {
        self.0.borrow_mut().update(cycles)
    }
}

struct SerialSource(Rc<RefCell<Serial>>);
impl InterruptSource for SerialSource {
    fn flag_bit(&self) -> u8 {
        InterruptKind::Serial.flag_bit()
    }
    fn vector_addr(&self) -> u16 {
        InterruptKind::Serial.vector_addr()
    }
    fn update(&mut self, cycles: u32) -> bool {
        self.0.borrow_mut().update(cycles)
    }
}

struct TimerSource(Rc<RefCell<Timer>>);
impl InterruptSource for TimerSource {
    fn flag_bit(&self) -> u8 {
        InterruptKind::Timer.flag_bit()
    }
    fn vector_addr(&self) -> u16 {
        InterruptKind::Timer.vector_addr()
    }
    fn update(&mut self, cycles: u32) -> bool {
        self.0.borrow_mut().update(cycles)
    }
}
