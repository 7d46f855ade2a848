//! Loading of compiled contracts from disk.

use {
    crate::domain::Error,
    alloy::{json_abi::JsonAbi, primitives::Bytes},
    std::{
        path::{Path, PathBuf},
        str::FromStr,
    },
};

/// Where compiled artifacts live relative to a contract's working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub bin_sub_dir: String,
    pub bin_suffix: String,
    pub abi_sub_dir: String,
    pub abi_suffix: String,
}

/// The interface and creation bytecode of a compiled contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

#[derive(Debug, Clone)]
pub struct Resolver {
    layout: Layout,
}

impl Resolver {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn abi_path(&self, base: &Path, name: &str) -> PathBuf {
        base.join(&self.layout.abi_sub_dir)
            .join(format!("{name}{}", self.layout.abi_suffix))
    }

    pub fn bin_path(&self, base: &Path, name: &str) -> PathBuf {
        base.join(&self.layout.bin_sub_dir)
            .join(format!("{name}{}", self.layout.bin_suffix))
    }

    /// Reads the artifact of contract `name` below `base`. Nothing is cached,
    /// every call hits the file system.
    pub async fn resolve(&self, base: &Path, name: &str) -> Result<Artifact, Error> {
        let abi_path = self.abi_path(base, name);
        let bin_path = self.bin_path(base, name);
        let abi = read(&abi_path).await?;
        let bin = read(&bin_path).await?;

        let abi = serde_json::from_str::<JsonAbi>(&abi).map_err(|err| Error::ArtifactMalformed {
            path: abi_path,
            reason: err.to_string(),
        })?;
        let bytecode = parse_bytecode(&bin).map_err(|reason| Error::ArtifactMalformed {
            path: bin_path,
            reason,
        })?;
        Ok(Artifact { abi, bytecode })
    }
}

async fn read(path: &Path) -> Result<String, Error> {
    tokio::fs::read_to_string(path).await.map_err(|err| {
        tracing::trace!(?err, ?path, "could not read artifact");
        match err.kind() {
            // The file exists but is not text.
            std::io::ErrorKind::InvalidData => Error::ArtifactMalformed {
                path: path.to_owned(),
                reason: err.to_string(),
            },
            _ => Error::ArtifactNotFound(path.to_owned()),
        }
    })
}

/// Bytecode files hold bare hex; the `0x` marker is added before decoding.
fn parse_bytecode(text: &str) -> Result<Bytes, String> {
    let hex = text.trim();
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    if hex.is_empty() {
        return Err("empty bytecode".to_owned());
    }
    Bytes::from_str(&format!("0x{hex}")).map_err(|err| err.to_string())
}
