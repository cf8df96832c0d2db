//! Terminal detection and operator-facing status lines

use colored::*;
use is_terminal::IsTerminal;
use std::env;
use std::io::{Write, stderr, stdout};

/// Check if stdout is connected to an interactive terminal
pub fn is_interactive() -> bool {
    stdout().is_terminal() && !is_ci_environment()
}

/// Check if the terminal supports ANSI escape codes for colors
pub fn supports_ansi() -> bool {
    if !is_interactive() {
        return false;
    }

    let term = env::var("TERM").unwrap_or_default();
    term != "dumb" && !term.is_empty()
}

/// Detect if running in a CI environment
fn is_ci_environment() -> bool {
    let ci_vars = [
        "CI",
        "CONTINUOUS_INTEGRATION",
        "GITHUB_ACTIONS",
        "GITLAB_CI",
        "BUILDKITE",
    ];

    ci_vars.iter().any(|var| env::var(var).is_ok())
}

/// Kind of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Step,
    Done,
    Info,
    Warn,
    Error,
}

impl Status {
    fn marker(self) -> &'static str {
        match self {
            Self::Step => ">>",
            Self::Done => "OK",
            Self::Info => "II",
            Self::Warn => "WW",
            Self::Error => "!!",
        }
    }

    fn colored_marker(self) -> ColoredString {
        match self {
            Self::Step | Self::Warn => self.marker().yellow(),
            Self::Done => self.marker().green(),
            Self::Info => self.marker().blue(),
            Self::Error => self.marker().red(),
        }
    }
}

/// Writes `[>>] step`, `[OK] done`, `[II] info` and `[!!] error` lines
///
/// On a color terminal a step stays on the current line so the following
/// done or error line replaces it. Errors go to stderr.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    color: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            color: supports_ansi(),
        }
    }

    /// Reporter that never emits escape codes
    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn step(&self, message: &str) {
        self.emit(Status::Step, message);
    }

    pub fn done(&self, message: &str) {
        self.emit(Status::Done, message);
    }

    pub fn info(&self, message: &str) {
        self.emit(Status::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.emit(Status::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Status::Error, message);
    }

    /// Render a status line, without the trailing newline of a colored step
    pub fn format(&self, status: Status, message: &str) -> String {
        if self.color {
            let line = format!("\x1b[2K\r[{}] {message}", status.colored_marker());
            if status == Status::Step {
                line
            } else {
                line + "\n"
            }
        } else {
            format!("[{}] {message}\n", status.marker())
        }
    }

    fn emit(&self, status: Status, message: &str) {
        let line = self.format(status, message);
        // Write failures on a closed pipe are not worth aborting a rename for
        if status == Status::Error && self.color {
            let _ = stderr().write_all(line.as_bytes());
        } else {
            let mut out = stdout();
            let _ = out.write_all(line.as_bytes());
            let _ = out.flush();
        }
    }
}
