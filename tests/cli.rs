use std::process::{Command, Output};

use test_framework::{TestTree, current_ids, mode_of};


fn chperm(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_chperm"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn own_ids() -> String {
    let (uid, gid) = current_ids();
    format!("{uid}:{gid}")
}

#[test]
fn help_and_version_exit_successfully() {
    let help = chperm(&["--help"]);
    assert!(help.status.success());
    assert!(stdout(&help).contains("[OWNER][:[GROUP]] [MODE] FILE..."));
    assert!(stdout(&help).contains("--no-dereference"));

    let version = chperm(&["--version"]);
    assert!(version.status.success());
    assert!(stdout(&version).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn conflicting_dereference_flags_fail_before_touching_files() {
    let tree = TestTree::new();
    let file = tree.file("file", 0o600);

    let output = chperm(&["-h", "-L", &own_ids(), "644", file.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(mode_of(&file), 0o600);
}

#[test]
fn missing_operand_is_a_usage_error() {
    let output = chperm(&["root"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn invalid_mode_aborts_the_whole_run() {
    let tree = TestTree::new();
    let file = tree.file("file", 0o600);

    let output = chperm(&[&own_ids(), "798", file.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stderr(&output).trim_end(), "chperm: invalid mode: '798'");
    assert_eq!(mode_of(&file), 0o600);
}

#[test]
fn invalid_user_aborts_the_whole_run() {
    let tree = TestTree::new();
    let file = tree.file("file", 0o600);

    let output = chperm(&["no-such-user-for-chperm", "644", file.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stderr(&output).trim_end(), "chperm: invalid user: 'no-such-user-for-chperm'");
    assert_eq!(mode_of(&file), 0o600);
}

#[test]
fn mode_operand_is_applied_and_reported_with_changes() {
    let tree = TestTree::new();
    let changed = tree.file("changed", 0o600);
    let unchanged = tree.file("unchanged", 0o640);

    let output = chperm(&[
        "-c",
        &own_ids(),
        "g+r",
        changed.to_str().unwrap(),
        unchanged.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    assert_eq!(mode_of(&changed), 0o640);
    assert_eq!(mode_of(&unchanged), 0o640);
    let stdout = stdout(&output);
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.contains("permissions changed from rw------- (0600) to rw-r----- (0640)"));
    assert!(stdout.contains(changed.to_str().unwrap()));
}

#[test]
fn last_operand_is_never_taken_for_a_mode() {
    let tree = TestTree::new();
    let lone = tree.file("a-b", 0o600);

    let output = chperm(&["-v", &own_ids(), lone.to_str().unwrap()]);

    assert!(output.status.success());
    assert_eq!(mode_of(&lone), 0o600);
    assert!(stdout(&output).contains("retained as"));
}

#[test]
fn failing_operand_sets_exit_status_but_others_are_processed() {
    let tree = TestTree::new();
    let missing = tree.path("missing");
    let present = tree.file("present", 0o600);

    let output = chperm(&[&own_ids(), "755", missing.to_str().unwrap(), present.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(mode_of(&present), 0o755);
    assert!(stderr(&output).starts_with(&format!("chperm: cannot stat '{}'", missing.display())));
}

#[test]
fn silent_hides_errors_but_keeps_exit_status() {
    let tree = TestTree::new();
    let missing = tree.path("missing");

    let output = chperm(&["-f", &own_ids(), "755", missing.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).is_empty());
}

#[test]
fn recursive_flag_walks_the_tree() {
    let tree = TestTree::new();
    let root = tree.dir("root", 0o700);
    let nested = tree.dir("root/nested", 0o700);
    let file = tree.file("root/nested/file", 0o600);

    let output = chperm(&["-R", &own_ids(), "a+rX,go-w,u=rwx", root.to_str().unwrap()]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(mode_of(&root), 0o744);
    assert_eq!(mode_of(&nested), 0o744);
    assert_eq!(mode_of(&file), 0o744);
}
