//! TOML manifest file reading.
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::ManifestError;

/// Read `path` and deserialize it into `T`.
///
/// Both syntax errors and type mismatches against `T` are reported as
/// [`ManifestError::Parse`].
///
/// # Errors
///
/// Returns [`ManifestError::NotFound`] if the file does not exist,
/// [`ManifestError::Read`] if it cannot be read, and
/// [`ManifestError::Parse`] if it does not deserialize.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, ManifestError> {
    if !path.is_file() {
        return Err(ManifestError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config(&content).map_err(|e| ManifestError::Parse {
        path: path.to_path_buf(),
        message: e.to_string().trim_end().to_string(),
    })
}

/// Deserialize TOML text into `T`.
///
/// # Errors
///
/// Returns the parser error if `content` is not valid TOML or does not
/// match `T`.
pub fn parse_config<T: DeserializeOwned>(content: &str) -> Result<T, toml::de::Error> {
    toml::from_str(content)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config::<toml::Table>(&dir.path().join("config.toml")).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
    }

    #[test]
    fn directory_is_not_a_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config::<toml::Table>(dir.path()).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "packages = [").unwrap();
        let err = load_config::<toml::Table>(&path).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn type_mismatch_is_parse_error() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Named {
            name: String,
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "name = 1\n").unwrap();
        let err = load_config::<Named>(&path).unwrap_err();
        let ManifestError::Parse { message, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert!(message.contains("invalid type"), "{message}");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        assert!(parse_config::<toml::Table>("[config_files]\na = \"/x\"\na = \"/y\"\n").is_err());
    }

    #[test]
    fn table_preserves_key_order() {
        let table: toml::Table = parse_config("[t]\nzeta = 1\nalpha = 2\nmid = 3\n").unwrap();
        let inner = table.get("t").and_then(toml::Value::as_table).unwrap();
        let keys: Vec<&str> = inner.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }
}
