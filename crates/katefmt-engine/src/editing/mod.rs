/*!
 * # Editing Core Module
 *
 * Host-side model the actions operate on.
 *
 * ## Host interface
 *
 * Actions never see concrete editor types. They are generic over
 * [`EditorView`], a narrow capability set:
 *
 * - line access (`line_count`, `line`, `character_at`, `text`)
 * - one mutation primitive (`replace`), grouped by `begin_edit`/`end_edit`
 * - cursor and selection access
 *
 * An editor integration implements these traits over its own document/view
 * objects. [`Document`] is the in-memory implementation used by the CLI and
 * the tests.
 *
 * ## Command-Based Editing
 *
 * - All edits to a [`Document`] are [`Cmd`]s compiled to xi-rope `Delta`s
 * - Applying a command yields a [`Patch`] with the changed range, the
 *   carried-through cursor and the new version
 * - Each command records its inverse; a transaction's inverses form one
 *   undo step
 *
 * ## Module Structure
 *
 * - **`position`**: `Position`/`Range` value types (character columns)
 * - **`host`**: `TextDocument` and `EditorView` traits plus small text helpers
 * - **`document`**: xi-rope backed `Document`
 * - **`commands`**: `Cmd` enum and delta compilation
 * - **`patch`**: edit result metadata
 */

pub mod commands;
pub mod document;
pub mod host;
pub mod patch;
pub mod position;

// Public API re-exports
pub use commands::Cmd;
pub use document::Document;
pub use host::{EditorView, TextDocument};
pub use patch::Patch;
pub use position::{Position, Range};
