//! The driver's only two external dependencies: something to display a finished
//! frame, and something to report which buttons are currently held. Grounded on
//! `gabe_cli`'s `minifb`-based window loop, generalized behind a poll-based trait
//! so the emulator core doesn't depend on a concrete windowing backend.

use crate::joypad::Button;

pub trait Renderer {
    /// False once the user has closed the window (or otherwise asked to stop).
    fn is_open(&self) -> bool;

    /// Presents one completed frame: `SCREEN_WIDTH * SCREEN_HEIGHT * 3` RGB888 bytes.
    fn present(&mut self, framebuffer: &[u8]);

    /// Buttons whose held/released state changed since the last poll.
    fn poll_input(&mut self) -> Vec<(Button, bool)>;
}

/// Drives nothing: useful for headless test harnesses and the debugger, where no
/// window is wanted but the driver still needs a `Renderer` to hand frames to.
pub struct HeadlessRenderer {
    open: bool,
    last_frame: Vec<u8>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        HeadlessRenderer {
            open: true,
            last_frame: Vec::new(),
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn last_frame(&self) -> &[u8] {
        &self.last_frame
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HeadlessRenderer {
    fn is_open(&self) -> bool {
        self.open
    }

    fn present(&mut self, framebuffer: &[u8]) {
        self.last_frame.clear();
        self.last_frame.extend_from_slice(framebuffer);
    }

    fn poll_input(&mut self) -> Vec<(Button, bool)> {
        Vec::new()
    }
}

use crate::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};
use minifb::{Key, ScaleMode, Window, WindowOptions};

const KEY_MAP: &[(Key, Button)] = &[
    (Key::X, Button::A),
    (Key::Z, Button::B),
    (Key::Enter, Button::Start),
    (Key::Backspace, Button::Select),
    (Key::Up, Button::Up),
    (Key::Down, Button::Down),
    (Key::Left, Button::Left),
    (Key::Right, Button::Right),
];

fn from_u8_rgb(r: u8, g: u8, b: u8) -> u32 {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    (r << 16) | (g << 8) | b
}

/// Windowed renderer backed by `minifb`. Scaled 4x since a 160x144 window is
/// uncomfortably small on modern displays.
pub struct MinifbRenderer {
    window: Window,
    held: [bool; KEY_MAP.len()],
    buf: Vec<u32>,
}

impl MinifbRenderer {
    pub fn new(title: &str) -> Self {
        let mut window = Window::new(
            title,
            SCREEN_WIDTH * 4,
            SCREEN_HEIGHT * 4,
            WindowOptions {
                resize: false,
                scale_mode: ScaleMode::AspectRatioStretch,
                ..WindowOptions::default()
            },
        )
        .expect("failed to open window");
        window.limit_update_rate(None);
        MinifbRenderer {
            window,
            held: [false; KEY_MAP.len()],
            buf: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }
}

impl Renderer for MinifbRenderer {
    fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    fn present(&mut self, framebuffer: &[u8]) {
        for (i, px) in framebuffer.chunks(3).enumerate() {
            self.buf[i] = from_u8_rgb(px[0], px[1], px[2]);
        }
        self.window
            .update_with_buffer(&self.buf, SCREEN_WIDTH, SCREEN_HEIGHT)
            .expect("failed to present frame");
    }

    fn poll_input(&mut self) -> Vec<(Button, bool)> {
        let mut changes = Vec::new();
        for (i, (key, button)) in KEY_MAP.iter().enumerate() {
            let down = self.window.is_key_down(*key);
            if down != self.held[i] {
                self.held[i] = down;
                changes.push((*button, down));
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_renderer_records_presented_frame() {
        let mut r = HeadlessRenderer::new();
        r.present(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(r.last_frame(), &[1, 2, 3, 4, 5, 6]);
        assert!(r.is_open());
        r.close();
        assert!(!r.is_open());
    }
}
