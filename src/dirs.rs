//! Home-directory resolution abstraction.
//!
//! The default credential location lives under the user's home directory;
//! resolving it goes through a trait so tests can substitute a fixed
//! location without touching the real environment.

use camino::Utf8PathBuf;

/// Resolver for the user's home directory.
pub trait UserDirs {
    /// The user's home directory, when one can be determined.
    fn home_dir(&self) -> Option<Utf8PathBuf>;
}

/// Resolves directories from the host environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemUserDirs;

impl UserDirs for SystemUserDirs {
    fn home_dir(&self) -> Option<Utf8PathBuf> {
        directories_next::UserDirs::new()
            .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.home_dir().to_path_buf()).ok())
    }
}

/// The well-known credential location: `~/.kaggle/kaggle.json`.
///
/// Returns `None` when no home directory can be determined.
#[must_use]
pub fn default_credentials_path(dirs: &dyn UserDirs) -> Option<Utf8PathBuf> {
    dirs.home_dir()
        .map(|home| home.join(".kaggle").join("kaggle.json"))
}
