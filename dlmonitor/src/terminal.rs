//! Minimal terminal control used by the interactive dashboard.
//!
//! The dashboard needs only a handful of operations: clear the screen, move
//! to a row, clear a line, and hide or show the cursor. [`Terminal`] captures
//! exactly that so rendering can be tested without a real TTY.
//! [`AnsiTerminal`] implements it with crossterm commands over any writer.
//!
//! Rows are 0-based.

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

/// Terminal operations needed by the interactive dashboard.
pub trait Terminal: Send {
    /// Clear the whole screen and move to the top-left corner.
    fn clear_screen(&mut self) -> io::Result<()>;

    /// Hide the text cursor.
    fn hide_cursor(&mut self) -> io::Result<()>;

    /// Show the text cursor.
    fn show_cursor(&mut self) -> io::Result<()>;

    /// Move to the start of `row`.
    fn move_to_row(&mut self, row: u16) -> io::Result<()>;

    /// Move to the start of `row`, clear it and write `text`.
    fn write_at(&mut self, row: u16, text: &str) -> io::Result<()>;

    /// Write `text` followed by a newline at the cursor.
    fn write_line(&mut self, text: &str) -> io::Result<()>;

    /// Write `text` at the cursor without a newline.
    fn write(&mut self, text: &str) -> io::Result<()>;

    /// Write `text`, clear the rest of the line and return to column 0, so the
    /// next write overwrites it.
    fn write_overwritable(&mut self, text: &str) -> io::Result<()>;

    /// Flush buffered output.
    fn flush(&mut self) -> io::Result<()>;
}

/// ANSI terminal backed by crossterm commands.
#[derive(Debug)]
pub struct AnsiTerminal<W: Write + Send> {
    out: W,
}

impl AnsiTerminal<io::Stdout> {
    /// Terminal writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> AnsiTerminal<W> {
    /// Terminal writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Consume the terminal and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Terminal for AnsiTerminal<W> {
    fn clear_screen(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))
    }

    fn hide_cursor(&mut self) -> io::Result<()> {
        queue!(self.out, Hide)
    }

    fn show_cursor(&mut self) -> io::Result<()> {
        queue!(self.out, Show)
    }

    fn move_to_row(&mut self, row: u16) -> io::Result<()> {
        queue!(self.out, MoveTo(0, row))
    }

    fn write_at(&mut self, row: u16, text: &str) -> io::Result<()> {
        queue!(
            self.out,
            MoveTo(0, row),
            Clear(ClearType::UntilNewLine),
            Print(text)
        )
    }

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, Print(text), Print("\n"))
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, Print(text))
    }

    fn write_overwritable(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, Print(text), Clear(ClearType::UntilNewLine), Print("\r"))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
