#[macro_use]
extern crate log;
extern crate clap;
extern crate env_logger;

use std::path::Path;

use clap::{App, Arg};
use gabe::debugger::{Debugger, DebuggerState};
use gabe::gb::Gameboy;
use gabe::renderer::{HeadlessRenderer, MinifbRenderer, Renderer};

/// Optional boot ROM image, looked for in the working directory.
const BOOT_ROM_FILE: &str = "DMG_ROM.bin";

fn main() {
    let matches = App::new("GaBE")
        .version("0.1")
        .author("Joe Thill <rocketlobster42@gmail.com>")
        .about("Game Boy emulator core")
        .arg(
            Arg::with_name("ROM")
                .value_name("FILE")
                .help("Game to run in standard GB file format")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("debugger")
                .help("Launches the terminal REPL debugger instead of the windowed loop")
                .short("d")
                .long("debugger"),
        )
        .arg(
            Arg::with_name("tracing")
                .help("Enables CPU instruction tracing at the trace! log level")
                .long("tracing"),
        )
        .get_matches();

    if matches.is_present("tracing") {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace")).init();
    } else {
        env_logger::init();
    }

    let rom_path = matches.value_of("ROM").unwrap();
    let debug_enabled = matches.is_present("debugger");

    let boot_rom_path = Path::new(BOOT_ROM_FILE);
    let boot_rom = if boot_rom_path.exists() { Some(boot_rom_path) } else { None };

    let mut gb = match Gameboy::power_on(rom_path, boot_rom) {
        Ok(gb) => gb,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let mut debugger = Debugger::new(debug_enabled);

    if debug_enabled {
        run_debugger_loop(&mut gb, &mut debugger);
        return;
    }

    run_windowed_loop(&mut gb, &mut debugger);
}

fn run_debugger_loop(gb: &mut Gameboy, debugger: &mut Debugger) {
    loop {
        match debugger.run(gb) {
            Ok(DebuggerState::Quit) | Ok(DebuggerState::Disabled) => break,
            Ok(DebuggerState::Next) | Ok(DebuggerState::Continue) => continue,
            Err(e) => {
                error!("debugger terminal I/O failed: {}", e);
                break;
            }
        }
    }
}

fn run_windowed_loop(gb: &mut Gameboy, debugger: &mut Debugger) {
    let mut renderer = MinifbRenderer::new("GaBE");

    while renderer.is_open() {
        if debugger.is_running() {
            match debugger.run(gb) {
                Ok(DebuggerState::Quit) => debugger.quit(),
                Ok(_) => {}
                Err(e) => {
                    error!("debugger terminal I/O failed: {}", e);
                    debugger.quit();
                }
            }
            continue;
        }

        gb.step_frame();
        renderer.present(gb.framebuffer());

        for (button, pressed) in renderer.poll_input() {
            gb.set_button(button, pressed);
        }
    }
}

/// Exercised by integration tests that want a driver loop without opening a
/// window; production code always goes through `run_windowed_loop`.
#[allow(dead_code)]
fn run_headless_frames(gb: &mut Gameboy, frames: u32) -> HeadlessRenderer {
    let mut renderer = HeadlessRenderer::new();
    for _ in 0..frames {
        gb.step_frame();
        renderer.present(gb.framebuffer());
    }
    renderer
}
