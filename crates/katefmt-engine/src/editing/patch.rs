use crate::editing::{Position, Range};

/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Range now occupied by the inserted text
    pub changed: Range,
    pub new_cursor: Position,
    pub version: u64,
}
