//! User-facing terminal output.

pub mod output;

pub use output::Output;
