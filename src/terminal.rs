use std::io::{self, Stdout, Write};
use std::time::Duration;

use chip8vm::Keypad;
use chip8vm::consts::{KEY_COUNT, SCREEN_WIDTH};
use chip8vm::display::Screen;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::style::Print;
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use log::{debug, warn};

use crate::driver::{AudioSink, DisplaySink, InputSource};

/// left-hand side of a qwerty keyboard laid out like the hex keypad
const CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('1', 0x1),
    ('2', 0x2),
    ('3', 0x3),
    ('4', 0xC),
    ('q', 0x4),
    ('w', 0x5),
    ('e', 0x6),
    ('r', 0xD),
    ('a', 0x7),
    ('s', 0x8),
    ('d', 0x9),
    ('f', 0xE),
    ('z', 0xA),
    ('x', 0x0),
    ('c', 0xB),
    ('v', 0xF),
];

/// Frames a key stays down after a press, for terminals that never report releases.
const KEY_HOLD_FRAMES: u8 = 6;

pub fn map_key(symbol: char) -> Option<u8> {
    let symbol = symbol.to_ascii_lowercase();
    CONVENTIONAL_KEYMAP
        .iter()
        .find(|(c, _)| *c == symbol)
        .map(|(_, key)| *key)
}

/// One text line per pixel row, each pixel `scale` columns wide.
pub fn render_rows(screen: &Screen, scale: usize) -> Vec<String> {
    screen
        .iter()
        .map(|row| {
            let mut line = String::with_capacity(SCREEN_WIDTH * scale * 3);
            for &pixel in row {
                let glyph = if pixel { '█' } else { '░' };
                line.extend(std::iter::repeat_n(glyph, scale));
            }
            line
        })
        .collect()
}

/// Raw-mode terminal acting as screen, keypad and speaker.
pub struct TerminalFrontend {
    stdout: Stdout,
    scale: usize,
    reports_release: bool,
    held: [u8; KEY_COUNT],
}

impl TerminalFrontend {
    pub fn new(scale: u16) -> io::Result<Self> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;

        let reports_release = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if reports_release {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        debug!("terminal ready [key releases reported: {reports_release}]");

        Ok(TerminalFrontend {
            stdout,
            scale: scale as usize,
            reports_release,
            held: [0; KEY_COUNT],
        })
    }

    fn handle_key(&mut self, event: KeyEvent, keypad: &mut Keypad) -> bool {
        if event.code == KeyCode::Esc
            || (event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL))
        {
            return true;
        }

        let KeyCode::Char(symbol) = event.code else {
            return false;
        };
        let Some(key) = map_key(symbol) else {
            debug!("can't map {symbol:?} to a keypad key");
            return false;
        };

        match event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                self.held[key as usize] = KEY_HOLD_FRAMES;
                keypad.press(key);
            }
            KeyEventKind::Release => {
                self.held[key as usize] = 0;
                keypad.release(key);
            }
        }
        false
    }

    fn decay_held_keys(&mut self, keypad: &mut Keypad) {
        for (key, frames) in self.held.iter_mut().enumerate() {
            if *frames > 0 {
                *frames -= 1;
                if *frames == 0 {
                    keypad.release(key as u8);
                }
            }
        }
    }
}

impl Drop for TerminalFrontend {
    fn drop(&mut self) {
        if self.reports_release {
            let _ = execute!(self.stdout, PopKeyboardEnhancementFlags);
        }
        let _ = execute!(self.stdout, Show, LeaveAlternateScreen);
        if let Err(err) = terminal::disable_raw_mode() {
            warn!("could not restore the terminal: {err}");
        }
    }
}

impl DisplaySink for TerminalFrontend {
    fn render(&mut self, screen: &Screen) -> io::Result<()> {
        for (y, line) in render_rows(screen, self.scale).into_iter().enumerate() {
            queue!(self.stdout, MoveTo(0, y as u16), Print(line))?;
        }
        self.stdout.flush()
    }
}

impl InputSource for TerminalFrontend {
    fn poll(&mut self, keypad: &mut Keypad) -> io::Result<bool> {
        if !self.reports_release {
            self.decay_held_keys(keypad);
        }
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key_event) = event::read()? {
                if self.handle_key(key_event, keypad) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl AudioSink for TerminalFrontend {
    fn beep(&mut self) -> io::Result<()> {
        // A simple terminal beep
        queue!(self.stdout, Print('\x07'))?;
        self.stdout.flush()
    }
}
