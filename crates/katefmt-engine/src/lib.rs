//! Editing engine behind `katefmt`: the bracket/template-aware range
//! locator, the boost-style parameter formatter and the companion editing
//! actions, all written against a small host interface.
//!
//! ```rust
//! use katefmt_engine::actions::{Action, Outcome, Settings, run};
//! use katefmt_engine::editing::{Document, EditorView, Position};
//!
//! let mut doc = Document::from_text("foo(a, b, c)");
//! doc.set_cursor_position(Position::new(0, 5));
//! let outcome = run(&mut doc, Action::BoostFormat, &Settings::default()).unwrap();
//! assert_eq!(outcome, Outcome::Applied);
//! assert_eq!(doc.text_content(), "foo(\n    a\n  , b\n  , c\n)");
//! ```

pub mod actions;
pub mod editing;
pub mod formatting;
pub mod scanning;

// Re-export key types for easier usage
pub use actions::{Action, ActionError, Outcome, Settings, run};
pub use editing::{Cmd, Document, EditorView, Patch, Position, Range, TextDocument};
pub use scanning::{BracketKind, BreakChars, LocateError, RangeTopology, locate};
