use notify::op::{self, Op};
use std::path::{Path, PathBuf};

/// Info about a path and its corresponding `notify` event
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct PathOp {
    pub path: PathBuf,
    pub op: Op,
}

/// Event kinds selectable by name, in the order they are listed to users.
pub const OP_NAMES: &[(&str, Op)] = &[
    ("create", op::CREATE),
    ("write", op::WRITE),
    ("remove", op::REMOVE),
    ("rename", op::RENAME),
    ("chmod", op::CHMOD),
];

impl PathOp {
    pub fn new(path: &Path, op: Op) -> Self {
        Self {
            path: path.to_path_buf(),
            op,
        }
    }

    pub fn is_create(op_: Op) -> bool {
        op_.contains(op::CREATE)
    }
}

/// Looks up an event kind by its user-facing name.
pub fn op_from_name(name: &str) -> Option<Op> {
    OP_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, op_)| op_)
}

/// Renders the named kinds contained in `op_`, e.g. `create|write`.
pub fn op_to_names(op_: Op) -> String {
    let names: Vec<&str> = OP_NAMES
        .iter()
        .filter(|(_, o)| op_.contains(*o))
        .map(|&(n, _)| n)
        .collect();

    if names.is_empty() {
        "none".to_string()
    } else {
        names.join("|")
    }
}
