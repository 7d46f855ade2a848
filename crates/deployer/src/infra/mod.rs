//! Boundaries to the outside world: artifact and configuration files, the
//! blockchain node and the log output.

pub mod artifacts;
pub mod blockchain;
pub mod observe;
pub mod persistence;
