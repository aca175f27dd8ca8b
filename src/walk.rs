//! Recursive application of a [ChangeRequest] to directory trees.
//!
//! The walk is depth-first and pre-order: a directory is changed before its entries. Whether to descend is
//! decided from the entry itself and never from a symlink's target, so links can't lead the walk into cycles.

use std::{ops::AddAssign, path::Path};

use crate::{
    change::{ChangeRequest, Options, apply_change, report_failure},
    error::ChangeError,
    report::Reporter,
};

/// Counters aggregated over one or more processed operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WalkSummary {
    /// Paths the change was attempted on.
    pub processed: usize,
    /// Failures of any kind: unreadable or unchangeable paths and directories that couldn't be listed.
    pub failed: usize,
}

impl WalkSummary {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    #[inline]
    fn record(&mut self, success: bool) {
        self.processed += 1;
        if !success {
            self.failed += 1;
        }
    }
}

impl AddAssign for WalkSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.processed += rhs.processed;
        self.failed += rhs.failed;
    }
}

/// Process one operand: walk it when the run is recursive, otherwise change only the path itself.
pub fn process(path: &Path, request: &ChangeRequest, options: &Options, reporter: &mut impl Reporter) -> WalkSummary {
    if options.recursive {
        return walk_tree(path, request, options, reporter);
    }

    let mut summary = WalkSummary::default();
    summary.record(apply_change(path, request, options, reporter).is_ok());
    summary
}

/// Apply the request to the given path and, if it is a directory, to everything below it. A failing entry
/// never stops the rest of the walk.
pub fn walk_tree(path: &Path, request: &ChangeRequest, options: &Options, reporter: &mut impl Reporter) -> WalkSummary {
    let mut summary = WalkSummary::default();
    walk_into(path, request, options, reporter, &mut summary);
    summary
}

fn walk_into(
    path: &Path,
    request: &ChangeRequest,
    options: &Options,
    reporter: &mut impl Reporter,
    summary: &mut WalkSummary,
) {
    let applied = apply_change(path, request, options, reporter).is_ok();
    summary.record(applied);

    let is_directory = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata.file_type().is_dir(),
        // a failed change has already reported its stat error, a successful one means the path vanished since
        Err(source) if applied => {
            access_failure(path, source, options, reporter, summary);
            return;
        }
        Err(_) => false,
    };
    if !is_directory {
        return;
    }

    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(source) => {
            access_failure(path, source, options, reporter, summary);
            return;
        }
    };

    for entry in entries {
        match entry {
            Ok(entry) => walk_into(&entry.path(), request, options, reporter, summary),
            Err(source) => access_failure(path, source, options, reporter, summary),
        }
    }
}

fn access_failure(
    path: &Path,
    source: std::io::Error,
    options: &Options,
    reporter: &mut impl Reporter,
    summary: &mut WalkSummary,
) {
    let error = ChangeError::Access {
        path: path.to_owned(),
        source,
    };
    report_failure(&error, options, reporter);
    summary.failed += 1;
}
