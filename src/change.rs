use std::{
    os::unix::fs::MetadataExt,
    path::{Path, PathBuf},
};

use crate::{
    error::ChangeError,
    identity::OwnershipSpec,
    mode::{ModeSpec, PERMISSION_BITS},
    report::Reporter,
    syscall,
};

/// The immutable configuration of a run, shared by every processed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Options {
    /// Descend into directories.
    pub recursive: bool,
    /// Report every processed path.
    pub verbose: bool,
    /// Report only paths whose ownership or permissions actually changed.
    pub changes_only: bool,
    /// Suppress per-path error messages. Failures still count towards the outcome of the run.
    pub quiet: bool,
    /// Inspect and modify the targets of symbolic links rather than the links themselves.
    pub follow_symlinks: bool,
    /// Whether a mode argument was supplied. Without it, a requested [ModeSpec] is ignored.
    pub apply_permissions: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            recursive: false,
            verbose: false,
            changes_only: false,
            quiet: false,
            follow_symlinks: true,
            apply_permissions: false,
        }
    }
}

/// The compiled arguments of a run: who should own each path and how its mode should change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeRequest {
    pub ownership: OwnershipSpec,
    pub mode: ModeSpec,
}

impl ChangeRequest {
    pub fn new(ownership: OwnershipSpec, mode: ModeSpec) -> Self {
        Self { ownership, mode }
    }
}

/// A snapshot of a path's metadata captured right before it is changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileState {
    pub uid: u32,
    pub gid: u32,
    /// The full `st_mode`, including file-type bits.
    pub mode: u32,
    pub is_directory: bool,
    pub is_symlink: bool,
}

impl FileState {
    /// Read the state of the given path, following a final symlink only if `follow_symlinks` is set.
    pub fn read(path: &Path, follow_symlinks: bool) -> Result<Self, std::io::Error> {
        let metadata = match follow_symlinks {
            true => std::fs::metadata(path)?,
            false => std::fs::symlink_metadata(path)?,
        };
        let file_type = metadata.file_type();

        Ok(Self {
            uid: metadata.uid(),
            gid: metadata.gid(),
            mode: metadata.mode(),
            is_directory: file_type.is_dir(),
            is_symlink: file_type.is_symlink(),
        })
    }
}

/// The ownership and mode a path has after being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileAttributes {
    pub uid: u32,
    pub gid: u32,
    pub mode: u32,
}

/// The outcome of processing a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub path: PathBuf,
    pub old: FileState,
    pub new: FileAttributes,
    pub ownership_changed: bool,
    pub permissions_changed: bool,
    /// Whether a permission change was part of the request, regardless of whether it changed anything.
    pub permissions_requested: bool,
}

impl ChangeRecord {
    #[inline]
    pub fn is_change(&self) -> bool {
        self.ownership_changed || self.permissions_changed
    }
}

/// Apply the requested ownership and mode to a single path and report the outcome according to the given
/// [Options]. Errors are handed to the [Reporter] unless the run is quiet, and are returned either way.
pub fn apply_change(
    path: &Path,
    request: &ChangeRequest,
    options: &Options,
    reporter: &mut impl Reporter,
) -> Result<ChangeRecord, ChangeError> {
    match change_path(path, request, options) {
        Ok(record) => {
            if options.verbose || (options.changes_only && record.is_change()) {
                reporter.change(&record);
            }
            Ok(record)
        }
        Err(err) => {
            report_failure(&err, options, reporter);
            Err(err)
        }
    }
}

pub(crate) fn report_failure(error: &ChangeError, options: &Options, reporter: &mut impl Reporter) {
    if options.quiet {
        log::warn!("Silenced: {error}");
    } else {
        reporter.failure(error);
    }
}

fn change_path(path: &Path, request: &ChangeRequest, options: &Options) -> Result<ChangeRecord, ChangeError> {
    let old = FileState::read(path, options.follow_symlinks).map_err(|source| ChangeError::Stat {
        path: path.to_owned(),
        source,
    })?;
    log::debug!("Processing {} ({:?})", path.display(), old);

    let ownership = request.ownership;
    let new_uid = ownership.user.unwrap_or(old.uid);
    let new_gid = ownership.group.unwrap_or(old.gid);

    let permissions_requested = options.apply_permissions && request.mode.is_change();
    // a link's own mode can't be changed, and chmod would edit the target based on the link's mode
    let apply_mode = permissions_requested && !old.is_symlink;
    if permissions_requested && !apply_mode {
        log::debug!("Not changing permissions of symlink {}", path.display());
    }

    let new_mode = match apply_mode {
        true => request.mode.resolve(old.mode).unwrap_or(old.mode),
        false => old.mode,
    };
    log::trace!("Resolved mode of {} from {:o} to {:o}", path.display(), old.mode, new_mode);

    if ownership.is_requested() {
        let result = match options.follow_symlinks {
            true => syscall::chown(path, ownership.user, ownership.group),
            false => syscall::lchown(path, ownership.user, ownership.group),
        };
        result.map_err(|source| ChangeError::Chown {
            path: path.to_owned(),
            source,
        })?;
    }

    if apply_mode {
        syscall::chmod(path, new_mode & PERMISSION_BITS).map_err(|source| ChangeError::Chmod {
            path: path.to_owned(),
            source,
        })?;
    }

    Ok(ChangeRecord {
        path: path.to_owned(),
        old,
        new: FileAttributes {
            uid: new_uid,
            gid: new_gid,
            mode: new_mode,
        },
        ownership_changed: old.uid != new_uid || old.gid != new_gid,
        permissions_changed: apply_mode && old.mode != new_mode,
        permissions_requested,
    })
}
