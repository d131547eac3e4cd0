//! Terminal output helpers.
//!
//! Status lines go to stdout, errors to stderr. Diagnostics emitted via
//! `tracing` are separate and off by default; these helpers are the
//! user-facing surface.

use crossterm::style::Stylize;

/// Prints status lines with a consistent icon column.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output;

impl Output {
    /// A step that is starting.
    pub fn step(&self, message: &str) {
        println!("{} {message}", "●".blue());
    }

    /// A step that finished successfully.
    pub fn success(&self, message: &str) {
        println!("{} {message}", "✓".green());
    }

    /// Something worth attention that does not stop the command.
    pub fn warn(&self, message: &str) {
        println!("{} {message}", "⚠".yellow());
    }

    /// Neutral information.
    pub fn info(&self, message: &str) {
        println!("{} {message}", "ℹ".cyan());
    }

    /// A failure. Goes to stderr.
    pub fn error(&self, message: &str) {
        eprintln!("{} {message}", "✗".red());
    }
}
