use std::path::PathBuf;

/// Everything that can go wrong while deploying a single contract. None of
/// these abort more than the contract they concern.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("artifact not found: {0}")]
    ArtifactNotFound(PathBuf),
    #[error("malformed artifact {path}: {reason}")]
    ArtifactMalformed { path: PathBuf, reason: String },
    #[error("invalid {field} amount {raw:?}")]
    InvalidAmount { field: &'static str, raw: String },
    #[error("invalid sender address {0:?}")]
    InvalidAddress(String),
    #[error("cannot encode constructor arguments: {0}")]
    ConstructorArguments(String),
    #[error("deployment reverted: {0}")]
    DeploymentReverted(String),
    #[error("deployment was not confirmed in time")]
    DeploymentTimeout,
    #[error("transport error: {0}")]
    TransportError(String),
}

impl Error {
    /// Short machine friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ArtifactNotFound(_) => "ArtifactNotFound",
            Self::ArtifactMalformed { .. } => "ArtifactMalformed",
            Self::InvalidAmount { .. } => "InvalidAmount",
            Self::InvalidAddress(_) => "InvalidAddress",
            Self::ConstructorArguments(_) => "ConstructorArguments",
            Self::DeploymentReverted(_) => "DeploymentReverted",
            Self::DeploymentTimeout => "DeploymentTimeout",
            Self::TransportError(_) => "TransportError",
        }
    }

    /// The first line of the diagnostic. Node errors tend to carry whole
    /// stack traces which would drown the rest of the output.
    pub fn condensed(&self) -> String {
        self.to_string()
            .lines()
            .next()
            .unwrap_or_default()
            .to_owned()
    }
}
