use std::io::{stdout, Stdout, Write};

use crossterm::cursor::{self, MoveTo};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use chip8_vm::emulator::display::Display;

/// Draws the framebuffer on the terminal.
///
/// Two pixel rows share one line of text using half blocks, so the
/// 128x64 high resolution screen takes 128x32 cells.
pub struct CrosstermOutput {
    stdout: Stdout,
    sounding: bool,
    last_width: usize,
}

impl CrosstermOutput {
    pub fn new() -> crossterm::Result<CrosstermOutput> {
        let mut stdout = stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, cursor::Hide, Clear(ClearType::All))?;
        Ok(CrosstermOutput {
            stdout,
            sounding: false,
            last_width: 0,
        })
    }

    /// Redraw the whole addressable screen, with a border around it.
    pub fn draw(&mut self, display: &Display) -> crossterm::Result<()> {
        let width = display.width();
        let rows: Vec<&[bool]> = display.rows().collect();

        if width != self.last_width {
            queue!(self.stdout, Clear(ClearType::All))?;
            self.last_width = width;
        }

        let horizontal = "━".repeat(width);
        queue!(self.stdout, MoveTo(0, 0), Print(format!("┏{}┓", horizontal)))?;

        for (line, pair) in rows.chunks(2).enumerate() {
            let mut text = String::with_capacity(width * 3 + 6);
            text.push('┃');
            for x in 0..width {
                let top = pair[0][x];
                let bottom = pair.get(1).map_or(false, |row| row[x]);
                text.push(match (top, bottom) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            text.push('┃');
            queue!(self.stdout, MoveTo(0, line as u16 + 1), Print(text))?;
        }

        let bottom_line = rows.len() / 2 + 1;
        queue!(
            self.stdout,
            MoveTo(0, bottom_line as u16),
            Print(format!("┗{}┛", horizontal))
        )?;
        self.stdout.flush()?;
        Ok(())
    }

    /// Ring the terminal bell when the sound timer starts running.
    /// Terminals can't hold a tone, so one bell per sound is the best we can do.
    pub fn sound(&mut self, active: bool) -> crossterm::Result<()> {
        if active && !self.sounding {
            queue!(self.stdout, Print('\x07'))?;
            self.stdout.flush()?;
        }
        self.sounding = active;
        Ok(())
    }

    /// Show a status line below the screen.
    pub fn status(&mut self, line: u16, text: &str) -> crossterm::Result<()> {
        execute!(
            self.stdout,
            MoveTo(0, line),
            Clear(ClearType::CurrentLine),
            Print(text)
        )
    }
}

impl Drop for CrosstermOutput {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, LeaveAlternateScreen, cursor::Show);
        let _ = terminal::disable_raw_mode();
    }
}
