//! Staging-log formatted [`Reporter`].
//!
//! Steps are printed as `-----> title`, everything else is indented to line
//! up beneath them. Colour is only applied when writing to a terminal.

use std::io::{IsTerminal, Write};
use std::sync::Mutex;

use aptroot_core::Reporter;
use crossterm::style::{Color, Stylize};

use super::theme::ColorScheme;

const STEP_PREFIX: &str = "-----> ";
const INDENT: &str = "       ";

pub struct ConsoleReporter<W: Write + Send> {
    out: Mutex<W>,
    color: bool,
    colors: ColorScheme,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        let out = std::io::stdout();
        let color = out.is_terminal();
        Self::new(out, color)
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out: Mutex::new(out),
            color,
            colors: ColorScheme::default(),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn emit(&self, line: &str) {
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Best effort.
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn step(&self, title: &str) {
        let line = format!("{STEP_PREFIX}{title}");
        self.emit(&self.paint(&line, self.colors.step));
    }

    fn info(&self, msg: &str) {
        self.emit(&format!("{INDENT}{msg}"));
    }

    fn warning(&self, msg: &str) {
        let tag = self.paint("**WARNING**", self.colors.warning);
        self.emit(&format!("{INDENT}{tag} {msg}"));
    }

    fn error(&self, msg: &str) {
        let tag = self.paint("**ERROR**", self.colors.error);
        self.emit(&format!("{INDENT}{tag} {msg}"));
    }

    fn output(&self, captured: &str) {
        for line in captured.lines() {
            self.emit(&self.paint(&format!("{INDENT}{line}"), self.colors.output));
        }
    }
}
