//! The user-authored manifest: package categories and config-file mappings.
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::toml_loader;
use crate::error::ManifestError;

/// Package manager executable used when the manifest does not override it.
pub const DEFAULT_PACMAN: &str = "pacman";

const TABLE: &str = "table";
const STRING: &str = "a string";
const STRING_ARRAY: &str = "an array of strings";

/// Manifest as written, before entry validation.
///
/// `packages` and `config_files` stay as order-preserving tables so that
/// declaration order survives deserialization; their entries are checked
/// individually by [`Manifest::from_raw`].
#[derive(Debug, Deserialize)]
pub struct RawManifest {
    /// `[packages]`: category name to package list.
    pub packages: Option<toml::Table>,
    /// `[config_files]`: config name to absolute system path.
    pub config_files: Option<toml::Table>,
    /// Repositories that must be enabled in `pacman.conf`.
    #[serde(default)]
    pub required_repos: Vec<String>,
    /// Package manager executable override.
    pub pacman: Option<String>,
    /// Backup directory override.
    pub configs_dir: Option<PathBuf>,
}

/// A named group of packages to install together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCategory {
    /// Category name (the TOML key under `[packages]`).
    pub name: String,
    /// Package (or group) names in declaration order.
    pub packages: Vec<String>,
}

/// A config file tracked in the backup directory.
///
/// `name` is both the key in `[config_files]` and the file's path relative
/// to the backup directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Logical name, used as the relative backup path.
    pub name: String,
    /// Absolute live location of the file or directory.
    pub system_path: PathBuf,
}

impl ConfigFile {
    /// Create a config file entry.
    #[must_use]
    pub fn new(name: impl Into<String>, system_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            system_path: system_path.into(),
        }
    }

    /// Location of the backup copy inside `backup_dir`.
    #[must_use]
    pub fn backup_path(&self, backup_dir: &Path) -> PathBuf {
        backup_dir.join(&self.name)
    }
}

/// Validated manifest contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Package categories in declaration order.
    pub packages: Vec<PackageCategory>,
    /// Config files in declaration order.
    pub config_files: Vec<ConfigFile>,
    /// Repositories that must be enabled in `pacman.conf` before installing.
    pub required_repos: Vec<String>,
    /// Package manager executable override (e.g. an AUR helper).
    pub pacman: Option<String>,
    /// Backup directory override, relative to the manifest's directory.
    pub configs_dir: Option<PathBuf>,
}

impl Manifest {
    /// Load and validate the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`ManifestError`] if the file is missing, unreadable, not
    /// valid TOML, or does not match the manifest schema.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        Self::from_raw(toml_loader::load_config(path)?)
    }

    /// Validate deserialized manifest contents.
    ///
    /// # Errors
    ///
    /// Returns a [`ManifestError`] describing the first schema violation.
    pub fn from_raw(raw: RawManifest) -> Result<Self, ManifestError> {
        let packages = required(raw.packages, "packages")?
            .into_iter()
            .map(|(name, value)| -> Result<PackageCategory, ManifestError> {
                let packages = field(value, &format!("packages.{name}"), STRING_ARRAY)?;
                Ok(PackageCategory { name, packages })
            })
            .collect::<Result<Vec<_>, ManifestError>>()?;

        let config_files = required(raw.config_files, "config_files")?
            .into_iter()
            .map(|(name, value)| -> Result<ConfigFile, ManifestError> {
                let path: String = field(value, &format!("config_files.{name}"), STRING)?;
                config_file(name, path)
            })
            .collect::<Result<Vec<_>, ManifestError>>()?;

        Ok(Self {
            packages,
            config_files,
            required_repos: raw.required_repos,
            pacman: raw.pacman,
            configs_dir: raw.configs_dir,
        })
    }

    /// Package manager executable to invoke.
    #[must_use]
    pub fn pacman_program(&self) -> &str {
        self.pacman.as_deref().unwrap_or(DEFAULT_PACMAN)
    }

    /// Look up a category by name.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&PackageCategory> {
        self.packages.iter().find(|c| c.name == name)
    }

    /// Every package name listed in any category.
    #[must_use]
    pub fn listed_packages(&self) -> BTreeSet<String> {
        self.packages
            .iter()
            .flat_map(|c| c.packages.iter().cloned())
            .collect()
    }
}

fn required(table: Option<toml::Table>, field: &str) -> Result<toml::Table, ManifestError> {
    table.ok_or_else(|| ManifestError::MissingField {
        field: field.to_string(),
        expected: TABLE,
    })
}

/// Deserialize one entry of an order-preserving table.
fn field<T: DeserializeOwned>(
    value: toml::Value,
    name: &str,
    expected: &'static str,
) -> Result<T, ManifestError> {
    value.try_into().map_err(|_| ManifestError::WrongShape {
        field: name.to_string(),
        expected,
    })
}

fn config_file(name: String, path: String) -> Result<ConfigFile, ManifestError> {
    validate_name(&name)?;
    if !Path::new(&path).is_absolute() {
        return Err(ManifestError::RelativePath { name, path });
    }
    Ok(ConfigFile::new(name, path))
}

/// A config name must stay inside the backup directory when joined to it.
fn validate_name(name: &str) -> Result<(), ManifestError> {
    let invalid = |reason| ManifestError::InvalidName {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    let path = Path::new(name);
    if path.is_absolute() {
        return Err(invalid("name must be a relative path"));
    }
    if path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(invalid("name must not leave the backup directory"));
    }
    Ok(())
}
