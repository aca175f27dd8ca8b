//! Change the ownership and permission bits of files and directory trees in a single pass.
//!
//! The owner/group and mode arguments are parsed once with [identity::resolve_ownership] and [mode::compile_mode]
//! into a [change::ChangeRequest], which is then applied to each operand with [walk::process].

pub mod change;
pub mod error;
pub mod identity;
pub mod mode;
pub mod report;
pub mod syscall;
pub mod walk;
