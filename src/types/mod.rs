//! Validated newtypes shared across the crate.

pub mod digest;

pub use digest::{DigestError, Sha256Digest};
