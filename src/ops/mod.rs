//! Operations - the install pipeline and its sibling verbs.

pub mod error;
pub mod flow;
pub mod link;
pub mod lock;
pub mod run;
pub mod uninstall;

pub use error::InstallError;
