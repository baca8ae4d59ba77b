use application::conversation_service::TurnObserver;
use application::prompt::CURSOR_GLYPH;
use colored::Colorize;
use shared::error::ModelRequestError;
use std::io::Write;

/// Streams reply text to a terminal, keeping a cursor glyph after the last
/// character until the reply is final.
pub struct TerminalRenderer<W: Write> {
    out: W,
    cursor_shown: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            cursor_shown: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn erase_cursor(&mut self) {
        if self.cursor_shown {
            let _ = write!(self.out, "\u{8} \u{8}");
            self.cursor_shown = false;
        }
    }
}

impl<W: Write> TurnObserver for TerminalRenderer<W> {
    fn on_text(&mut self, delta: &str, _accumulated: &str) {
        self.erase_cursor();
        let _ = write!(self.out, "{}{}", delta, CURSOR_GLYPH);
        let _ = self.out.flush();
        self.cursor_shown = true;
    }

    fn on_complete(&mut self, _reply: &str) {
        self.erase_cursor();
        let _ = writeln!(self.out);
        let _ = self.out.flush();
    }

    fn on_failed(&mut self, error: &ModelRequestError) {
        self.erase_cursor();
        if !matches!(error, ModelRequestError::Cancelled) {
            let _ = writeln!(self.out);
        }
        let _ = self.out.flush();
    }
}

pub fn print_error(prefix: &str, err: &dyn std::fmt::Display) {
    eprintln!("{} {}", prefix.red().bold(), err.to_string().red());
}
