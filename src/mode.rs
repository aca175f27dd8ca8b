//! Compilation of permission arguments and evaluation of symbolic edits.
//!
//! A mode argument is compiled once per invocation into a [ModeSpec]. Absolute modes are final as soon as they
//! are compiled, while symbolic modes stay a list of [SymbolicClause]s that are only evaluated once the existing
//! mode of each individual target is known.

use bitflags::bitflags;

use crate::error::ParseError;

/// The bits that a mode change is allowed to touch: rwx for all three classes plus setuid, setgid and sticky.
pub const PERMISSION_BITS: u32 = 0o7777;

bitflags! {
    /// The classes of users a [SymbolicClause] applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Who: u8 {
        const USER = 0b001;
        const GROUP = 0b010;
        const OTHER = 0b100;
    }
}

bitflags! {
    /// The permissions a [SymbolicClause] adds, removes or sets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u8 {
        const READ = 0b100;
        const WRITE = 0b010;
        const EXECUTE = 0b001;
    }
}

impl Who {
    /// The rwx triplet of every selected class, e.g. `0o770` for user and group.
    pub fn class_mask(self) -> u32 {
        self.permission_mask(Permissions::all())
    }

    /// Map each requested permission onto the corresponding bit of every selected class.
    pub fn permission_mask(self, permissions: Permissions) -> u32 {
        let triplet = u32::from(permissions.bits());
        let mut mask = 0;

        if self.contains(Who::USER) {
            mask |= triplet << 6;
        }
        if self.contains(Who::GROUP) {
            mask |= triplet << 3;
        }
        if self.contains(Who::OTHER) {
            mask |= triplet;
        }

        mask
    }
}

/// The operator of a [SymbolicClause].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `+`
    Add,
    /// `-`
    Remove,
    /// `=`
    Set,
}

/// A single comma-separated clause of a symbolic mode, such as `ug+rw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolicClause {
    pub who: Who,
    pub operation: Operation,
    pub permissions: Permissions,
}

impl SymbolicClause {
    /// Apply this clause to the given mode. Bits outside the rwx triplets of the selected classes are kept.
    pub fn apply(&self, mode: u32) -> u32 {
        let who = if self.who.is_empty() { Who::all() } else { self.who };
        let permission_mask = who.permission_mask(self.permissions);

        match self.operation {
            Operation::Add => mode | permission_mask,
            Operation::Remove => mode & !permission_mask,
            Operation::Set => (mode & !who.class_mask()) | permission_mask,
        }
    }
}

/// Evaluate a sequence of clauses left to right, each one against the mode produced by the previous ones.
pub fn evaluate_symbolic(clauses: &[SymbolicClause], mode: u32) -> u32 {
    clauses.iter().fold(mode, |mode, clause| clause.apply(mode))
}

/// A compiled mode argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ModeSpec {
    /// No mode argument was given, so permissions stay as they are.
    #[default]
    NoChange,
    /// An octal mode in `0..=0o7777` replacing the permission bits outright.
    Absolute(u32),
    /// Symbolic edits that are evaluated against each target's existing mode.
    Symbolic(Vec<SymbolicClause>),
}

impl ModeSpec {
    /// Whether this spec requests a permission change at all.
    #[inline]
    pub fn is_change(&self) -> bool {
        !matches!(self, ModeSpec::NoChange)
    }

    /// Compute the full new mode for a file whose current mode is `old_mode`, or [None] for [ModeSpec::NoChange].
    /// File-type bits of `old_mode` are carried over unchanged.
    pub fn resolve(&self, old_mode: u32) -> Option<u32> {
        match self {
            ModeSpec::NoChange => None,
            ModeSpec::Absolute(bits) => Some((old_mode & !PERMISSION_BITS) | (bits & PERMISSION_BITS)),
            ModeSpec::Symbolic(clauses) => Some(evaluate_symbolic(clauses, old_mode)),
        }
    }
}

/// Compile an optional mode argument. All-digit text is read as octal, anything else as a symbolic mode.
pub fn compile_mode(text: Option<&str>) -> Result<ModeSpec, ParseError> {
    let Some(text) = text else {
        return Ok(ModeSpec::NoChange);
    };

    if is_all_digits(text) {
        return match u32::from_str_radix(text, 8) {
            Ok(bits) if bits <= PERMISSION_BITS => Ok(ModeSpec::Absolute(bits)),
            _ => Err(ParseError::InvalidMode(text.to_string())),
        };
    }

    let mut clauses = Vec::new();
    for clause in text.split(',').filter(|clause| !clause.is_empty()) {
        clauses.push(compile_clause(clause).ok_or_else(|| ParseError::InvalidMode(text.to_string()))?);
    }

    if clauses.is_empty() {
        return Err(ParseError::InvalidMode(text.to_string()));
    }

    Ok(ModeSpec::Symbolic(clauses))
}

fn compile_clause(clause: &str) -> Option<SymbolicClause> {
    let mut chars = clause.chars().peekable();

    let mut who = Who::empty();
    while let Some(class) = chars.peek().and_then(|c| match c {
        'u' => Some(Who::USER),
        'g' => Some(Who::GROUP),
        'o' => Some(Who::OTHER),
        'a' => Some(Who::all()),
        _ => None,
    }) {
        who |= class;
        chars.next();
    }

    if who.is_empty() {
        who = Who::all();
    }

    let operation = match chars.next()? {
        '+' => Operation::Add,
        '-' => Operation::Remove,
        '=' => Operation::Set,
        _ => return None,
    };

    // the permission run ends at the first character that isn't r, w or x; the rest of the clause is ignored
    let mut permissions = Permissions::empty();
    while let Some(permission) = chars.next().and_then(|c| match c {
        'r' => Some(Permissions::READ),
        'w' => Some(Permissions::WRITE),
        'x' => Some(Permissions::EXECUTE),
        _ => None,
    }) {
        permissions |= permission;
    }

    Some(SymbolicClause {
        who,
        operation,
        permissions,
    })
}

/// The heuristic used to tell a mode operand apart from a file operand: it is all digits, or contains one of the
/// symbolic operators. A file named e.g. `a-b` is therefore taken for a mode.
pub fn looks_like_mode(text: &str) -> bool {
    is_all_digits(text) || text.contains(['+', '-', '='])
}

#[inline]
fn is_all_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}
