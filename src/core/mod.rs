//! Pure domain logic - no I/O happens in this module tree.

pub mod manifest;
pub mod platform;
pub mod release;
