//! Bracket scanning around a cursor.
//!
//! - **`template`**: heuristic classification of `<`/`>`
//! - **`locator`**: bidirectional stack scan producing a [`RangeTopology`]

pub mod locator;
pub mod template;

pub use locator::{BracketKind, BreakChars, LocateError, RangeTopology, locate};
pub use template::looks_like_template_angle_bracket;
