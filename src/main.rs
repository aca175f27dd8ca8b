use std::{path::PathBuf, process::ExitCode};

use chperm::{
    change::{ChangeRequest, Options},
    error::ParseError,
    identity::{SystemIdentityDatabase, resolve_ownership},
    mode::{compile_mode, looks_like_mode},
    report::StreamReporter,
    walk::{WalkSummary, process},
};
use clap::{ArgAction, Parser, error::ErrorKind};

#[derive(Parser, Debug)]
#[command(
    name = "chperm",
    version,
    about = "Change the owner, group, and/or permissions of each FILE.",
    override_usage = "chperm [OPTION]... [OWNER][:[GROUP]] [MODE] FILE...",
    after_help = "MODE is either octal (755, 0644) or symbolic (u+x, g-w, o=r, a+rw, ...).",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// Like verbose but report only when a change is made
    #[arg(short = 'c', long = "changes")]
    changes: bool,
    /// Suppress most error messages
    #[arg(short = 'f', long = "silent", visible_alias = "quiet")]
    silent: bool,
    /// Output a diagnostic for every file processed
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
    /// Operate on files and directories recursively
    #[arg(short = 'R', long = "recursive")]
    recursive: bool,
    /// Affect symbolic links instead of any referenced file
    #[arg(short = 'h', long = "no-dereference", conflicts_with = "dereference")]
    no_dereference: bool,
    /// Dereference all symbolic links
    #[arg(short = 'L', long = "dereference")]
    dereference: bool,
    /// Display this help and exit
    #[arg(long = "help", action = ArgAction::Help)]
    help: Option<bool>,
    /// Output version information and exit
    #[arg(long = "version", action = ArgAction::Version)]
    version: Option<bool>,
    /// [OWNER][:[GROUP]]
    #[arg(value_name = "OWNER[:GROUP]")]
    owner: String,
    /// An optional MODE followed by one or more FILEs
    #[arg(value_name = "FILE", required = true, num_args = 1..)]
    operands: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if let Err(print_err) = err.print() {
                log::warn!("Printing the usage message failed: {print_err}");
            }
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let (mode_text, files) = match cli.operands.as_slice() {
        [candidate, files @ ..] if !files.is_empty() && looks_like_mode(candidate) => (Some(candidate.as_str()), files),
        files => (None, files),
    };

    let request = match parse_request(&cli.owner, mode_text) {
        Ok(request) => request,
        Err(err) => {
            eprintln!("chperm: {err}");
            return ExitCode::FAILURE;
        }
    };

    let options = Options {
        recursive: cli.recursive,
        verbose: cli.verbose,
        changes_only: cli.changes,
        quiet: cli.silent,
        follow_symlinks: cli.dereference || !cli.no_dereference,
        apply_permissions: mode_text.is_some(),
    };
    log::debug!("Running with {options:?} and {request:?}");

    let mut reporter = StreamReporter::new(SystemIdentityDatabase, std::io::stdout().lock(), std::io::stderr());
    let mut summary = WalkSummary::default();
    for file in files {
        summary += process(&PathBuf::from(file), &request, &options, &mut reporter);
    }
    log::debug!("Processed {} paths with {} failures", summary.processed, summary.failed);

    match summary.is_success() {
        true => ExitCode::SUCCESS,
        false => ExitCode::FAILURE,
    }
}

fn parse_request(owner: &str, mode: Option<&str>) -> Result<ChangeRequest, ParseError> {
    Ok(ChangeRequest::new(
        resolve_ownership(owner, &SystemIdentityDatabase)?,
        compile_mode(mode)?,
    ))
}
