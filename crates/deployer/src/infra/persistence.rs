//! Reading configuration files and writing them back after a run.

use {
    crate::domain::DeploymentConfig,
    std::{
        io::Write,
        path::{Path, PathBuf},
    },
    tokio::fs,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed configuration {path:?}: {source}")]
    ConfigMalformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Prefix of the temporary files written next to a configuration. A crash
/// may leave one behind; it must never be picked up as a configuration.
const TEMP_PREFIX: &str = ".deployer-";

/// Lists the candidate configuration files of `dir`, sorted by name.
/// Subdirectories and hidden files are ignored.
pub async fn list(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let io = |source| Error::Io {
        path: dir.to_owned(),
        source,
    };
    let mut entries = fs::read_dir(dir).await.map_err(io)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io)? {
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type().await.map_err(io)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Reads and parses one configuration file, remembering where it came from.
pub async fn load(path: &Path) -> Result<DeploymentConfig, Error> {
    let data = fs::read_to_string(path).await.map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;
    let mut config: DeploymentConfig =
        serde_json::from_str(&data).map_err(|source| Error::ConfigMalformed {
            path: path.to_owned(),
            source,
        })?;
    config.path = path.to_owned();
    Ok(config)
}

/// Writes the whole configuration back to the file it was loaded from.
///
/// The data goes to a temporary file next to the original which then
/// replaces it, so readers see either the old or the new contents.
pub async fn store(config: &DeploymentConfig) -> Result<(), Error> {
    let path = config.path.clone();
    let data = serde_json::to_vec_pretty(config).map_err(|source| Error::ConfigMalformed {
        path: path.clone(),
        source,
    })?;
    tokio::task::spawn_blocking(move || {
        write_atomically(&path, &data).map_err(|source| Error::Io { path, source })
    })
    .await
    .map_err(|err| Error::Io {
        path: config.path.clone(),
        source: std::io::Error::other(err),
    })?
}

fn write_atomically(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".tmp")
        .tempfile_in(dir)?;
    file.write_all(data)?;
    file.write_all(b"\n")?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::domain::Status,
        serde_json::{Value, json},
        tempfile::TempDir,
    };

    #[tokio::test]
    async fn lists_files_only() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let files = list(dir.path()).await.unwrap();
        assert_eq!(
            files,
            [dir.path().join("a.json"), dir.path().join("b.json")]
        );
    }

    #[tokio::test]
    async fn skips_leftover_temporary_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.json"), "{\"contracts\": []}").unwrap();
        let leftover = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(dir.path())
            .unwrap()
            .keep()
            .unwrap()
            .1;
        std::fs::write(&leftover, "{\"contracts\": []}").unwrap();
        std::fs::write(dir.path().join(".hidden.json"), "{}").unwrap();

        assert_eq!(list(dir.path()).await.unwrap(), [dir.path().join("a.json")]);
    }

    #[tokio::test]
    async fn missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = list(&dir.path().join("missing")).await.unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[tokio::test]
    async fn malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ \"contracts\": [").unwrap();

        let err = load(&path).await.unwrap_err();
        assert!(matches!(err, Error::ConfigMalformed { .. }));
    }

    #[tokio::test]
    async fn round_trip_changes_only_outcome() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let original = json!({
            "home": "/work/",
            "gas": 800000,
            "value": "none",
            "label": { "team": "core" },
            "contracts": [
                { "name": "A", "gas": "none", "payable": false, "param_Values": "none" },
                { "name": "B", "deployed": 1, "address": "0x00000000000000000000000000000000000000bb" },
            ],
        });
        std::fs::write(&path, serde_json::to_string(&original).unwrap()).unwrap();

        let mut config = load(&path).await.unwrap();
        assert_eq!(config.path, path);
        config.contracts[0].deployed = Status::Failed;
        store(&config).await.unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let mut expected = original;
        expected["contracts"][0]["deployed"] = json!(0);
        assert_eq!(written, expected);
        assert_eq!(load(&path).await.unwrap(), config);

        // No temporary files are left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
