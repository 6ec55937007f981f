//! Directory resolution abstraction for platform-specific paths.
//!
//! The packager only needs the user's home directory (for the default archive
//! location) and the directory of the running executable (for the default
//! source directory). Both sit behind [`BaseDirs`] so configuration can be
//! resolved in tests without touching the real environment.

use std::path::PathBuf;

/// Source of the base directories the packager consults.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Return the current user's home directory, if one can be determined.
    fn home_dir(&self) -> Option<PathBuf>;

    /// Return the directory containing the running executable.
    fn executable_dir(&self) -> Option<PathBuf>;
}

/// [`BaseDirs`] backed by `directories-next` and the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        directories_next::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
    }

    fn executable_dir(&self) -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.canonicalize().ok())
            .and_then(|exe| exe.parent().map(std::path::Path::to_path_buf))
    }
}
