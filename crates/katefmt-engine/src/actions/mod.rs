/*!
 * # Editing Actions
 *
 * Every user-triggerable action of the collection, written against the
 * [`EditorView`] host interface.
 *
 * ## Module Structure
 *
 * - **`lines`**: copy characters from neighbouring lines, kill line halves
 * - **`preproc`**: `#if`/`#else`/`#endif` block map and block actions
 * - **`comments`**: inline comment alignment, doxygen style conversion,
 *   comment paragraph rewrapping
 * - **`expand`**: word expansion with optional call-style arguments
 *
 * Boost-style parameter formatting lives in [`crate::formatting`] and is
 * dispatched from here as well.
 *
 * ## Outcomes
 *
 * Actions report what they did through [`Outcome`]. A failed action leaves
 * the document untouched and returns an [`ActionError`] whose message is
 * meant for the user.
 */

pub mod comments;
pub mod expand;
pub mod lines;
pub mod preproc;

use std::fmt;
use std::str::FromStr;

use log::{debug, info};

use crate::editing::EditorView;
use crate::formatting;
use crate::scanning::LocateError;

pub use comments::CommentSettings;
pub use expand::{ExpandError, Expansions};

/// What an action did to the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The document text changed
    Applied,
    /// Nothing to do; document, cursor and selection are untouched
    Unchanged,
    /// Only the cursor moved
    CursorMoved,
    /// Only the selection changed
    Selected,
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Failed to parse C++ expression: {0}")]
    Locate(#[from] LocateError),

    #[error("Didn't find anything to format")]
    NothingToFormat,

    #[error("Unknown comment style for document type '{0}'")]
    UnknownCommentStyle(String),

    #[error("{action} only applies to C and C++ documents, not '{document_type}'")]
    UnsupportedDocumentType {
        action: Action,
        document_type: String,
    },

    #[error(transparent)]
    Expand(#[from] ExpandError),
}

/// Indentation unit used when expansions are inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentSettings {
    pub width: usize,
    pub use_tabs: bool,
}

impl Default for IndentSettings {
    fn default() -> Self {
        Self {
            width: 4,
            use_tabs: false,
        }
    }
}

impl IndentSettings {
    /// Text of one indentation level
    pub fn unit(&self) -> String {
        if self.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.width)
        }
    }
}

/// Everything actions read besides the view
#[derive(Debug)]
pub struct Settings {
    pub comment: CommentSettings,
    pub indent: IndentSettings,
    /// Host document type, e.g. `C++` or `Python`; picks the comment leader
    pub document_type: String,
    pub expansions: Expansions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            comment: CommentSettings::default(),
            indent: IndentSettings::default(),
            document_type: "C++".to_string(),
            expansions: Expansions::default(),
        }
    }
}

impl Settings {
    pub fn for_document_type(document_type: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            ..Self::default()
        }
    }

    /// Preprocessor block actions need a C-family document
    fn require_c_family(&self, action: Action) -> Result<(), ActionError> {
        if matches!(self.document_type.as_str(), "C++" | "C") {
            return Ok(());
        }
        Err(ActionError::UnsupportedDocumentType {
            action,
            document_type: self.document_type.clone(),
        })
    }

    fn comment_leader(&self) -> Result<&'static str, ActionError> {
        comments::comment_leader(&self.document_type)
            .ok_or_else(|| ActionError::UnknownCommentStyle(self.document_type.clone()))
    }
}

/// Every action of the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    BoostFormat,
    BoostUnformat,
    InsertCharFromAbove,
    InsertCharFromBelow,
    KillAfterCursor,
    KillBeforeCursor,
    InlineComment,
    MoveCommentAbove,
    MoveCommentInline,
    TransformDoxygen,
    ShrinkParagraph,
    ExtendParagraph,
    CommentBlock,
    ToggleBlock,
    RemoveBlock,
    SelectBlock,
    Expand,
}

impl Action {
    pub const ALL: [Action; 17] = [
        Action::BoostFormat,
        Action::BoostUnformat,
        Action::InsertCharFromAbove,
        Action::InsertCharFromBelow,
        Action::KillAfterCursor,
        Action::KillBeforeCursor,
        Action::InlineComment,
        Action::MoveCommentAbove,
        Action::MoveCommentInline,
        Action::TransformDoxygen,
        Action::ShrinkParagraph,
        Action::ExtendParagraph,
        Action::CommentBlock,
        Action::ToggleBlock,
        Action::RemoveBlock,
        Action::SelectBlock,
        Action::Expand,
    ];

    /// Kebab-case name used on the command line
    pub fn name(self) -> &'static str {
        match self {
            Action::BoostFormat => "boost-format",
            Action::BoostUnformat => "boost-unformat",
            Action::InsertCharFromAbove => "insert-char-from-above",
            Action::InsertCharFromBelow => "insert-char-from-below",
            Action::KillAfterCursor => "kill-after-cursor",
            Action::KillBeforeCursor => "kill-before-cursor",
            Action::InlineComment => "inline-comment",
            Action::MoveCommentAbove => "move-comment-above",
            Action::MoveCommentInline => "move-comment-inline",
            Action::TransformDoxygen => "transform-doxygen",
            Action::ShrinkParagraph => "shrink-paragraph",
            Action::ExtendParagraph => "extend-paragraph",
            Action::CommentBlock => "comment-block",
            Action::ToggleBlock => "toggle-block",
            Action::RemoveBlock => "remove-block",
            Action::SelectBlock => "select-block",
            Action::Expand => "expand",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Run `action` in `view`
pub fn run<V>(view: &mut V, action: Action, settings: &Settings) -> Result<Outcome, ActionError>
where
    V: EditorView,
{
    debug!("running {action} at {}", view.cursor_position());
    let outcome = match action {
        Action::BoostFormat => formatting::boost_format(view)?,
        Action::BoostUnformat => formatting::boost_unformat(view)?,
        Action::InsertCharFromAbove => lines::insert_char_from_line_above(view),
        Action::InsertCharFromBelow => lines::insert_char_from_line_below(view),
        Action::KillAfterCursor => lines::kill_after_cursor(view),
        Action::KillBeforeCursor => lines::kill_before_cursor(view),
        Action::InlineComment => {
            comments::inline_comment(view, settings.comment_leader()?, &settings.comment)
        }
        Action::MoveCommentAbove => comments::move_comment_above(view, settings.comment_leader()?),
        Action::MoveCommentInline => {
            comments::move_comment_inline(view, settings.comment_leader()?, &settings.comment)
        }
        Action::TransformDoxygen => comments::transform_doxygen(view),
        Action::ShrinkParagraph => comments::shrink_paragraph(view),
        Action::ExtendParagraph => comments::extend_paragraph(view),
        Action::CommentBlock => {
            settings.require_c_family(action)?;
            preproc::comment_block(view)
        }
        Action::ToggleBlock => {
            settings.require_c_family(action)?;
            preproc::toggle_block(view)
        }
        Action::RemoveBlock => {
            settings.require_c_family(action)?;
            preproc::remove_block(view)
        }
        Action::SelectBlock => {
            settings.require_c_family(action)?;
            preproc::select_block(view)
        }
        Action::Expand => expand::expand_at_cursor(view, &settings.expansions, &settings.indent)?,
    };
    info!("{action}: {outcome:?}");
    Ok(outcome)
}
