//! Filesystem and package-manager primitives.
//!
//! - [`fs`]: the backup-preserving [`safe_copy`](fs::safe_copy)
//! - [`config_file`]: read-only backup/system [`reconcile`](config_file::reconcile)
//! - [`package`]: the [`Pacman`](package::Pacman) client
pub mod config_file;
pub mod fs;
pub mod package;
