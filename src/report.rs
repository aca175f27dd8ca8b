//! Rendering of change records and per-path errors. Lines follow the classic `chown -v`/`chmod -v` wording,
//! with owners shown by name where the [IdentityDatabase] knows them and modes as both rwx and octal.

use std::io::Write;

use crate::{change::ChangeRecord, error::ChangeError, identity::IdentityDatabase};

/// A [Reporter] receives the outcome of every processed path that the run's options decide to surface: change
/// records for verbose/changes-only output and errors that aren't silenced.
pub trait Reporter {
    /// Called with the record of a path whose change should be shown.
    fn change(&mut self, record: &ChangeRecord);

    /// Called with a per-path error that should be shown.
    fn failure(&mut self, error: &ChangeError);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn change(&mut self, record: &ChangeRecord) {
        (**self).change(record);
    }

    fn failure(&mut self, error: &ChangeError) {
        (**self).failure(error);
    }
}

/// A [Reporter] that writes human-readable change lines to one writer and diagnostics to another, resolving
/// owner and group names through an [IdentityDatabase].
#[derive(Debug)]
pub struct StreamReporter<D, O, E> {
    database: D,
    output: O,
    errors: E,
}

impl<D: IdentityDatabase, O: Write, E: Write> StreamReporter<D, O, E> {
    pub fn new(database: D, output: O, errors: E) -> Self {
        Self {
            database,
            output,
            errors,
        }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.output, self.errors)
    }
}

impl<D: IdentityDatabase, O: Write, E: Write> Reporter for StreamReporter<D, O, E> {
    fn change(&mut self, record: &ChangeRecord) {
        let line = format_change(record, &self.database);
        if let Err(err) = writeln!(self.output, "{line}") {
            log::warn!("Writing a change line for {} failed: {err}", record.path.display());
        }
    }

    fn failure(&mut self, error: &ChangeError) {
        if let Err(err) = writeln!(self.errors, "chperm: {error}") {
            log::warn!("Writing a diagnostic for {} failed: {err}", error.path().display());
        }
    }
}

/// Render the nine rwx characters of the given mode, e.g. `rwxr-xr--`.
pub fn permission_string(mode: u32) -> String {
    const SYMBOLS: [char; 3] = ['r', 'w', 'x'];

    (0..9)
        .map(|i| {
            if mode & (0o400 >> i) != 0 {
                SYMBOLS[i % 3]
            } else {
                '-'
            }
        })
        .collect()
}

/// Render a [ChangeRecord] as a single line without the trailing newline.
pub fn format_change(record: &ChangeRecord, database: &impl IdentityDatabase) -> String {
    let path = record.path.display();
    let owners = |uid: u32, gid: u32| {
        format!(
            "{}:{}",
            database.user_name(uid).unwrap_or_else(|| uid.to_string()),
            database.group_name(gid).unwrap_or_else(|| gid.to_string())
        )
    };
    let permissions = |mode: u32| format!("{} ({:04o})", permission_string(mode), mode & 0o7777);
    // only an unfollowed link is recorded as a symlink, and its mode is never changed
    let link_mode_skipped = record.permissions_requested && record.old.is_symlink;
    const LINK_MODE_SKIPPED: &str = " (permissions of symbolic link not changed)";

    match (record.ownership_changed, record.permissions_changed) {
        (false, false) => {
            let mut line = format!(
                "ownership and permissions of '{path}' retained as {}",
                owners(record.new.uid, record.new.gid)
            );
            if link_mode_skipped {
                line.push_str(LINK_MODE_SKIPPED);
            } else if record.permissions_requested {
                line.push_str(&format!(" with permissions {}", permissions(record.new.mode)));
            }
            line
        }
        (true, false) => {
            let mut line = format!(
                "'{path}' ownership changed from {} to {}",
                owners(record.old.uid, record.old.gid),
                owners(record.new.uid, record.new.gid)
            );
            if link_mode_skipped {
                line.push_str(LINK_MODE_SKIPPED);
            }
            line
        }
        (false, true) => format!(
            "'{path}' permissions changed from {} to {}",
            permissions(record.old.mode),
            permissions(record.new.mode)
        ),
        (true, true) => format!(
            "'{path}' ownership changed from {} to {}, permissions changed from {} to {}",
            owners(record.old.uid, record.old.gid),
            owners(record.new.uid, record.new.gid),
            permissions(record.old.mode),
            permissions(record.new.mode)
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{Reporter, StreamReporter, format_change, permission_string};
    use crate::{
        change::{ChangeRecord, FileAttributes, FileState},
        error::ChangeError,
        identity::IdentityDatabase,
    };

    struct NamedDatabase;

    impl IdentityDatabase for NamedDatabase {
        fn user_id(&self, _name: &str) -> Option<u32> {
            None
        }

        fn group_id(&self, _name: &str) -> Option<u32> {
            None
        }

        fn user_name(&self, uid: u32) -> Option<String> {
            (uid == 0).then(|| "root".to_string())
        }

        fn group_name(&self, gid: u32) -> Option<String> {
            (gid == 50).then(|| "staff".to_string())
        }
    }

    fn record(old: (u32, u32, u32), new: (u32, u32, u32), permissions_requested: bool) -> ChangeRecord {
        ChangeRecord {
            path: PathBuf::from("/srv/file"),
            old: FileState {
                uid: old.0,
                gid: old.1,
                mode: 0o100000 | old.2,
                is_directory: false,
                is_symlink: false,
            },
            new: FileAttributes {
                uid: new.0,
                gid: new.1,
                mode: 0o100000 | new.2,
            },
            ownership_changed: old.0 != new.0 || old.1 != new.1,
            permissions_changed: permissions_requested && old.2 != new.2,
            permissions_requested,
        }
    }

    #[test]
    fn permission_string_renders_each_class() {
        assert_eq!(permission_string(0o755), "rwxr-xr-x");
        assert_eq!(permission_string(0o100640), "rw-r-----");
        assert_eq!(permission_string(0), "---------");
        assert_eq!(permission_string(0o4777), "rwxrwxrwx");
    }

    #[test]
    fn both_changes_are_reported_on_one_line() {
        assert_eq!(
            format_change(&record((1000, 100, 0o644), (0, 50, 0o755), true), &NamedDatabase),
            "'/srv/file' ownership changed from 1000:100 to root:staff, permissions changed from rw-r--r-- (0644) to rwxr-xr-x (0755)"
        );
    }

    #[test]
    fn ownership_only_change_is_reported() {
        assert_eq!(
            format_change(&record((1000, 100, 0o644), (0, 100, 0o644), true), &NamedDatabase),
            "'/srv/file' ownership changed from 1000:100 to root:100"
        );
    }

    #[test]
    fn permissions_only_change_is_reported() {
        assert_eq!(
            format_change(&record((0, 50, 0o600), (0, 50, 0o4600), true), &NamedDatabase),
            "'/srv/file' permissions changed from rw------- (0600) to rw------- (4600)"
        );
    }

    #[test]
    fn retained_state_mentions_permissions_only_when_requested() {
        assert_eq!(
            format_change(&record((0, 50, 0o644), (0, 50, 0o644), true), &NamedDatabase),
            "ownership and permissions of '/srv/file' retained as root:staff with permissions rw-r--r-- (0644)"
        );
        assert_eq!(
            format_change(&record((0, 50, 0o644), (0, 50, 0o644), false), &NamedDatabase),
            "ownership and permissions of '/srv/file' retained as root:staff"
        );
    }

    #[test]
    fn unfollowed_symlink_notes_its_untouched_permissions() {
        let mut link = record((1000, 50, 0o777), (1000, 50, 0o777), true);
        link.path = PathBuf::from("/srv/link");
        link.old.mode = 0o120777;
        link.old.is_symlink = true;
        link.new.mode = 0o120777;
        assert_eq!(
            format_change(&link, &NamedDatabase),
            "ownership and permissions of '/srv/link' retained as 1000:staff (permissions of symbolic link not changed)"
        );

        link.new.uid = 0;
        link.ownership_changed = true;
        assert_eq!(
            format_change(&link, &NamedDatabase),
            "'/srv/link' ownership changed from 1000:staff to root:staff (permissions of symbolic link not changed)"
        );

        link.permissions_requested = false;
        assert_eq!(
            format_change(&link, &NamedDatabase),
            "'/srv/link' ownership changed from 1000:staff to root:staff"
        );
    }

    #[test]
    fn stream_reporter_splits_changes_and_failures() {
        let mut reporter = StreamReporter::new(NamedDatabase, Vec::new(), Vec::new());
        reporter.change(&record((0, 50, 0o644), (0, 50, 0o600), true));
        reporter.failure(&ChangeError::Stat {
            path: PathBuf::from("/missing"),
            source: std::io::Error::from_raw_os_error(2),
        });

        let (output, errors) = reporter.into_inner();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "'/srv/file' permissions changed from rw-r--r-- (0644) to rw------- (0600)\n"
        );
        let errors = String::from_utf8(errors).unwrap();
        assert!(errors.starts_with("chperm: cannot stat '/missing': "));
        assert!(errors.ends_with('\n'));
    }
}
