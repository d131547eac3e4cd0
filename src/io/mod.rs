//! IO modules - everything with side effects (network, filesystem).

pub mod fetch;
pub mod verify;
