//! Command implementations - the only layer that decides exit codes.

pub mod checksum;
pub mod install;
pub mod run;
pub mod uninstall;
