//! Deployment data model and the pure rules that operate on it.

pub mod config;
mod error;
pub mod params;

pub use {
    config::{Amount, ContractSpec, DeploymentConfig, Setting, Status},
    error::Error,
    params::{Arguments, EffectiveParams, Resolved},
};

/// The result of one deployment attempt: the address of the created contract
/// or why there is none.
pub type Outcome = Result<alloy::primitives::Address, Error>;
