//! Ruleset definition files.
//!
//! Definitions live as `*.json` files in one directory, each holding a
//! single ruleset as exported from GitHub. Files are read in file-name
//! order on every sync; nothing is cached between syncs.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::RulesetDocument;

/// Errors from reading definition files.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", file.display())]
    ReadError {
        file: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode ruleset definition {}: {source}", file.display())]
    DecodeError {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// The file (or directory) the error concerns.
    pub fn file(&self) -> &Path {
        match self {
            StoreError::ReadError { file, .. } | StoreError::DecodeError { file, .. } => file,
        }
    }
}

/// A directory of ruleset definition files.
#[derive(Debug, Clone)]
pub struct RulesetStore {
    dir: PathBuf,
}

impl RulesetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        RulesetStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists the definition files, sorted by file name.
    pub fn definition_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let read_error = |source| StoreError::ReadError {
            file: self.dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(read_error)? {
            let path = entry.map_err(read_error)?.path();
            if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Loads every definition.
    ///
    /// The outer error means the directory itself could not be listed. Each
    /// file is loaded independently, so one bad file doesn't hide the rest.
    pub fn load_candidates(&self) -> Result<Vec<Result<RulesetDocument, StoreError>>, StoreError> {
        let files = self.definition_files()?;
        tracing::debug!(dir = %self.dir.display(), count = files.len(), "Loading ruleset definitions");
        Ok(files.iter().map(|file| load_definition(file)).collect())
    }
}

/// Reads and decodes one definition file.
pub fn load_definition(file: &Path) -> Result<RulesetDocument, StoreError> {
    let contents = std::fs::read(file).map_err(|source| StoreError::ReadError {
        file: file.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&contents).map_err(|source| StoreError::DecodeError {
        file: file.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn definition(name: &str) -> String {
        format!(
            r#"{{"name": "{}", "source": "source-org", "enforcement": "active", "rules": [], "bypass_actors": []}}"#,
            name
        )
    }

    #[test]
    fn loads_json_files_in_name_order() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("20-protect-dev.json"), definition("protect-dev")).unwrap();
        std::fs::write(dir.path().join("10-protect-main.json"), definition("protect-main")).unwrap();
        std::fs::write(dir.path().join("README.md"), "not a ruleset").unwrap();
        std::fs::create_dir(dir.path().join("archive.json")).unwrap();

        let store = RulesetStore::new(dir.path());
        let names: Vec<String> = store
            .load_candidates()
            .unwrap()
            .into_iter()
            .map(|doc| doc.unwrap().name)
            .collect();

        assert_eq!(names, vec!["protect-main", "protect-dev"]);
    }

    #[test]
    fn malformed_file_is_reported_alongside_good_ones() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("b.json"), definition("protect-main")).unwrap();

        let loaded = RulesetStore::new(dir.path()).load_candidates().unwrap();
        assert_eq!(loaded.len(), 2);

        match &loaded[0] {
            Err(err @ StoreError::DecodeError { .. }) => {
                assert_eq!(err.file(), dir.path().join("a.json"));
                assert!(err.to_string().contains("a.json"));
            }
            other => panic!("expected decode error, got {:?}", other),
        }
        assert_eq!(loaded[1].as_ref().unwrap().name, "protect-main");
    }

    #[test]
    fn missing_directory_is_a_read_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = RulesetStore::new(&missing).load_candidates().unwrap_err();
        assert!(matches!(err, StoreError::ReadError { ref file, .. } if *file == missing));
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        let err = load_definition(&dir.path().join("gone.json")).unwrap_err();
        assert!(matches!(err, StoreError::ReadError { .. }));
    }
}
