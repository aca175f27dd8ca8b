use std::path::PathBuf;

/// An error produced while parsing the owner/group or mode arguments. These are always fatal to the
/// whole invocation and are raised before any file is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid user: '{0}'")]
    InvalidUser(String),
    #[error("invalid group: '{0}'")]
    InvalidGroup(String),
    #[error("invalid mode: '{0}'")]
    InvalidMode(String),
}

/// An error that occurred while processing a single path. It is isolated to that path (and, for
/// [ChangeError::Access], to the subtree under it).
#[derive(Debug, thiserror::Error)]
pub enum ChangeError {
    #[error("cannot stat '{}': {source}", .path.display())]
    Stat { path: PathBuf, source: std::io::Error },
    #[error("cannot access '{}': {source}", .path.display())]
    Access { path: PathBuf, source: std::io::Error },
    #[error("changing ownership of '{}': {source}", .path.display())]
    Chown { path: PathBuf, source: std::io::Error },
    #[error("changing permissions of '{}': {source}", .path.display())]
    Chmod { path: PathBuf, source: std::io::Error },
}

impl ChangeError {
    /// The path the failed operation was performed on.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ChangeError::Stat { path, .. }
            | ChangeError::Access { path, .. }
            | ChangeError::Chown { path, .. }
            | ChangeError::Chmod { path, .. } => path,
        }
    }
}
