//! Manifest loading and validation.
pub mod manifest;
pub mod toml_loader;

pub use manifest::{ConfigFile, Manifest, PackageCategory, RawManifest};

/// Manifest file name looked up in the current directory by default.
pub const DEFAULT_MANIFEST: &str = "config.toml";

/// Backup directory name used when neither the CLI nor the manifest names one.
pub const DEFAULT_CONFIGS_DIR: &str = "config_files";
