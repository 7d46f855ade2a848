pub mod arguments;
pub mod domain;
pub mod engine;
pub mod infra;
pub mod processor;
mod run;
pub mod scheduler;

pub use self::run::{run, start};
