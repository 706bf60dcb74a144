//! Terminal REPL: step one instruction, continue to a breakpoint, toggle a
//! breakpoint at the current PC, or quit back to the windowed loop. Generalizes
//! the reference project's stub `Debugger`/`DebuggerState` split into a real
//! `crossterm`-driven input loop with a `tui` status widget.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tui::backend::CrosstermBackend;
use tui::layout::{Constraint, Direction, Layout};
use tui::style::{Color, Style};
use tui::widgets::{Block, Borders, Paragraph, Text, Widget};
use tui::Terminal;

use crate::gb::Gameboy;

/// What the REPL decided to do after reading one key press.
pub enum DebuggerState {
    /// Execute exactly one more instruction, then redraw and read another key.
    Next,
    /// Run until a breakpoint is hit or the user interrupts with `q`.
    Continue,
    /// Leave the debugger; the windowed loop resumes (or the process exits, if
    /// there is no windowed loop running).
    Quit,
    /// The debugger was never enabled; the caller should not touch the terminal.
    Disabled,
}

pub struct Debugger {
    enabled: bool,
    breakpoints: Vec<u16>,
}

impl Debugger {
    pub fn new(enabled: bool) -> Self {
        Debugger {
            enabled,
            breakpoints: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.enabled
    }

    /// Temporarily suspends the debugger, returning control to the windowed loop
    /// without discarding breakpoints.
    pub fn suspend(&mut self) {
        self.enabled = false;
    }

    pub fn resume(&mut self) {
        self.enabled = true;
    }

    /// Stops the debugger for the remaining program lifetime.
    pub fn quit(&mut self) {
        self.enabled = false;
        self.breakpoints.clear();
    }

    fn toggle_breakpoint(&mut self, pc: u16) {
        if let Some(pos) = self.breakpoints.iter().position(|&bp| bp == pc) {
            self.breakpoints.remove(pos);
        } else {
            self.breakpoints.push(pc);
        }
    }

    fn status_lines(&self, gb: &Gameboy) -> Vec<String> {
        vec![
            format!("PC: 0x{:04X}", gb.pc()),
            format!("cycles: {}", gb.total_cycles()),
            format!(
                "breakpoints: {}",
                self.breakpoints
                    .iter()
                    .map(|bp| format!("0x{:04X}", bp))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            String::new(),
            "[n] step  [c] continue  [b] toggle breakpoint at PC  [q] quit".to_string(),
        ]
    }

    /// Drives one full REPL session: enters raw mode, renders status, and reads
    /// keys until the user quits or asks to continue/step. Returns the action
    /// the caller (the windowed loop, or `main` directly) should take.
    pub fn run(&mut self, gb: &mut Gameboy) -> io::Result<DebuggerState> {
        if !self.enabled {
            return Ok(DebuggerState::Disabled);
        }

        enable_raw_mode()?;
        let stdout = io::stdout();
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = loop {
            self.draw(&mut terminal, gb)?;

            if !event::poll(Duration::from_millis(200))? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('n') => {
                        gb.tick();
                        break DebuggerState::Next;
                    }
                    KeyCode::Char('c') => {
                        self.run_to_breakpoint(gb)?;
                        break DebuggerState::Continue;
                    }
                    KeyCode::Char('b') => self.toggle_breakpoint(gb.pc()),
                    KeyCode::Char('q') => {
                        self.quit();
                        break DebuggerState::Quit;
                    }
                    _ => {}
                }
            }
        };

        disable_raw_mode()?;
        Ok(result)
    }

    /// Steps until `gb.pc()` matches a breakpoint, or until the user presses `q`
    /// to interrupt (checked between instructions, not mid-instruction).
    fn run_to_breakpoint(&mut self, gb: &mut Gameboy) -> io::Result<()> {
        loop {
            gb.tick();
            if self.breakpoints.contains(&gb.pc()) {
                info!("breakpoint hit at 0x{:04X}", gb.pc());
                return Ok(());
            }
            if event::poll(Duration::from_secs(0))? {
                if let Event::Key(key) = event::read()? {
                    if key.code == KeyCode::Char('q') {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn draw(
        &self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        gb: &Gameboy,
    ) -> io::Result<()> {
        let lines = self.status_lines(gb);
        terminal.draw(|mut f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(100)].as_ref())
                .split(f.size());
            let text: Vec<Text> = lines.iter().map(|l| Text::raw(format!("{}\n", l))).collect();
            let block = Block::default().title("gabe debugger").borders(Borders::ALL);
            Paragraph::new(text.iter())
                .block(block)
                .style(Style::default().fg(Color::White))
                .render(&mut f, chunks[0]);
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_debugger_reports_disabled_without_touching_the_terminal() {
        let mut debugger = Debugger::new(false);
        assert!(!debugger.is_running());
        debugger.toggle_breakpoint(0x0150);
        assert_eq!(debugger.breakpoints, vec![0x0150]);
    }

    #[test]
    fn toggling_the_same_breakpoint_twice_clears_it() {
        let mut debugger = Debugger::new(true);
        debugger.toggle_breakpoint(0x0100);
        debugger.toggle_breakpoint(0x0100);
        assert!(debugger.breakpoints.is_empty());
    }

    #[test]
    fn quit_clears_breakpoints_and_disables() {
        let mut debugger = Debugger::new(true);
        debugger.toggle_breakpoint(0x0100);
        debugger.quit();
        assert!(!debugger.is_running());
        assert!(debugger.breakpoints.is_empty());
    }
}
