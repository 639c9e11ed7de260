use xi_rope::Rope;

use crate::editing::host::end_of_insertion;
use crate::editing::{Cmd, EditorView, Patch, Position, Range, TextDocument};

/// In-memory editor state: text, cursor, selection and undo history.
///
/// The whole text lives in one `xi_rope::Rope`. Every change is expressed as
/// a [`Cmd`], compiled to a `Delta` and applied to the rope; [`Document::apply`]
/// returns a [`Patch`] describing the result.
///
/// ## Transactions
///
/// Commands applied between [`TextDocument::begin_edit`] and
/// [`TextDocument::end_edit`] are grouped into one undo step, the way a host
/// editor groups an action's edits. Commands applied outside a transaction
/// are undone one by one.
///
/// ```rust
/// # use katefmt_engine::editing::{Cmd, Document, Position, TextDocument};
/// let mut doc = Document::from_text("foo(a, b)");
/// doc.apply(Cmd::InsertText { at: Position::new(0, 4), text: "x, ".into() });
/// assert_eq!(doc.text_content(), "foo(x, a, b)");
/// doc.undo();
/// assert_eq!(doc.text_content(), "foo(a, b)");
/// ```
#[derive(Clone, Debug)]
pub struct Document {
    /// Document text as UTF-8
    pub(crate) buffer: Rope,
    pub(crate) cursor: Position,
    pub(crate) selection: Option<Range>,
    /// Incremented on each applied command
    pub(crate) version: u64,
    history: Vec<UndoStep>,
    open_step: Option<UndoStep>,
    /// Nesting depth of begin_edit/end_edit
    edit_depth: usize,
    /// First line ends with `\r\n`; host replacements follow suit
    crlf: bool,
}

/// Inverse commands of one transaction, in application order
#[derive(Clone, Debug, Default)]
struct UndoStep {
    inverse: Vec<Cmd>,
    cursor_before: Position,
}

impl Document {
    /// Create a new document from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_text(text))
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            buffer: Rope::from(text),
            cursor: Position::default(),
            selection: None,
            version: 0,
            history: Vec::new(),
            open_step: None,
            edit_depth: 0,
            crlf: text
                .find('\n')
                .is_some_and(|newline| text[..newline].ends_with('\r')),
        }
    }

    /// Get the document's content as raw bytes (exact round-trip)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer.to_string().into_bytes()
    }

    /// Get the current text content
    pub fn text_content(&self) -> String {
        self.buffer.to_string()
    }

    /// Get the current version
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Apply command to document
    ///
    /// The command is compiled to a delta against the current buffer, the
    /// inverse command is recorded for undo, then the cursor and selection
    /// are carried through the edit.
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        let (range, text) = crate::editing::commands::as_replacement(self, &cmd);
        let removed = self
            .buffer
            .slice_to_cow(self.offset_of(range.start)..self.offset_of(range.end))
            .into_owned();
        let delta = self.compile_command(&cmd);

        let new_cursor = self.transform_position(self.cursor, &cmd);
        let new_selection = self.selection.map(|selection| {
            Range::new(
                self.transform_position(selection.start, &cmd),
                self.transform_position(selection.end, &cmd),
            )
        });

        self.buffer = delta.apply(&self.buffer);

        let changed = Range::new(range.start, end_of_insertion(range.start, &text));
        self.record_inverse(Cmd::ReplaceRange {
            range: changed,
            text: removed,
        });

        self.cursor = new_cursor;
        self.selection = new_selection.filter(|selection| !selection.is_empty());
        self.version += 1;

        Patch {
            changed,
            new_cursor,
            version: self.version,
        }
    }

    /// Revert the most recent undo step; returns false when there is none
    pub fn undo(&mut self) -> bool {
        let Some(step) = self.history.pop() else {
            return false;
        };
        for cmd in step.inverse.into_iter().rev() {
            let delta = self.compile_command(&cmd);
            self.buffer = delta.apply(&self.buffer);
            self.version += 1;
        }
        self.cursor = self.clamp(step.cursor_before);
        self.selection = None;
        true
    }

    /// Number of undo steps available
    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    /// Byte offset of a position, clamped to the document
    pub(crate) fn offset_of(&self, at: Position) -> usize {
        let at = self.clamp(at);
        let line_start = self.buffer.offset_of_line(at.line);
        let line = self.line(at.line).unwrap_or_default();
        let in_line = line
            .char_indices()
            .nth(at.column)
            .map_or(line.len(), |(offset, _)| offset);
        line_start + in_line
    }

    /// Get the buffer length
    pub(crate) fn len(&self) -> usize {
        self.buffer.len()
    }

    fn clamp(&self, at: Position) -> Position {
        let last = self.line_count() - 1;
        if at.line > last {
            return self.end_position();
        }
        at.with_column(at.column.min(self.line_length(at.line)))
    }

    fn record_inverse(&mut self, inverse: Cmd) {
        match self.open_step.as_mut() {
            Some(step) => step.inverse.push(inverse),
            None => self.history.push(UndoStep {
                inverse: vec![inverse],
                cursor_before: self.cursor,
            }),
        }
    }

    // Forward declarations for methods implemented in other modules
    pub(crate) fn compile_command(&self, cmd: &Cmd) -> xi_rope::Delta<xi_rope::RopeInfo> {
        crate::editing::commands::compile_command(self, cmd)
    }

    pub(crate) fn transform_position(&self, at: Position, cmd: &Cmd) -> Position {
        crate::editing::commands::transform_position_for_command(self, at, cmd)
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl TextDocument for Document {
    fn line_count(&self) -> usize {
        self.buffer.line_of_offset(self.buffer.len()) + 1
    }

    fn line(&self, index: usize) -> Option<String> {
        let count = self.line_count();
        if index >= count {
            return None;
        }
        let start = self.buffer.offset_of_line(index);
        let end = if index + 1 < count {
            // Exclude the terminator
            self.buffer.offset_of_line(index + 1) - 1
        } else {
            self.buffer.len()
        };
        let line = self.buffer.slice_to_cow(start..end);
        Some(line.strip_suffix('\r').unwrap_or(&line).to_string())
    }

    fn replace(&mut self, range: Range, text: &str) {
        let text = if self.crlf {
            text.replace("\r\n", "\n").replace('\n', "\r\n")
        } else {
            text.to_string()
        };
        self.apply(Cmd::ReplaceRange { range, text });
    }

    fn begin_edit(&mut self) {
        if self.edit_depth == 0 {
            self.open_step = Some(UndoStep {
                inverse: Vec::new(),
                cursor_before: self.cursor,
            });
        }
        self.edit_depth += 1;
    }

    fn end_edit(&mut self) {
        self.edit_depth = self.edit_depth.saturating_sub(1);
        if self.edit_depth == 0
            && let Some(step) = self.open_step.take()
            && !step.inverse.is_empty()
        {
            self.history.push(step);
        }
    }
}

impl EditorView for Document {
    fn cursor_position(&self) -> Position {
        self.cursor
    }

    fn set_cursor_position(&mut self, at: Position) {
        self.cursor = self.clamp(at);
    }

    fn selection_range(&self) -> Option<Range> {
        self.selection.filter(|selection| !selection.is_empty())
    }

    fn set_selection(&mut self, range: Option<Range>) {
        self.selection = range
            .map(|selection| Range::new(self.clamp(selection.start), self.clamp(selection.end)))
            .filter(|selection| !selection.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lines_exclude_terminators() {
        let doc = Document::from_text("first\r\nsecond\n");
        assert_eq!(doc.line_count(), 3);
        assert_eq!(doc.line(0).as_deref(), Some("first"));
        assert_eq!(doc.line(1).as_deref(), Some("second"));
        assert_eq!(doc.line(2).as_deref(), Some(""));
        assert_eq!(doc.line(3), None);
    }

    #[test]
    fn empty_document_has_one_line() {
        let doc = Document::from_text("");
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.end_position(), Position::new(0, 0));
    }

    #[test]
    fn character_at_uses_char_columns() {
        let doc = Document::from_text("äb(c)");
        assert_eq!(doc.character_at(Position::new(0, 2)), Some('('));
        assert_eq!(doc.character_at(Position::new(0, 5)), None);
    }

    #[test]
    fn text_spans_multiple_lines() {
        let doc = Document::from_text("foo(\n  a,\n  b)");
        let range = Range::new(Position::new(0, 4), Position::new(2, 3));
        assert_eq!(doc.text(range), "\n  a,\n  b");
    }

    #[test]
    fn replace_moves_cursor_after_edit() {
        let mut doc = Document::from_text("foo(a, b);");
        doc.set_cursor_position(Position::new(0, 10));
        let patch = doc.apply(Cmd::ReplaceRange {
            range: Range::new(Position::new(0, 4), Position::new(0, 8)),
            text: "x".into(),
        });
        assert_eq!(doc.text_content(), "foo(x);");
        assert_eq!(patch.new_cursor, Position::new(0, 7));
        assert_eq!(patch.version, 1);
    }

    #[test]
    fn transaction_undoes_as_one_step() {
        let mut doc = Document::from_text("a\nb\nc");
        doc.transaction(|doc| {
            doc.apply(Cmd::RemoveLines { lines: 1..2 });
            doc.apply(Cmd::InsertLines {
                at_line: 1,
                lines: vec!["B".into()],
            });
        });
        assert_eq!(doc.text_content(), "a\nB\nc");
        assert_eq!(doc.undo_depth(), 1);

        assert!(doc.undo());
        assert_eq!(doc.text_content(), "a\nb\nc");
        assert!(!doc.undo());
    }

    #[test]
    fn undo_restores_crlf_terminators() {
        let mut doc = Document::from_text("foo(a,\r\n    b);\r\n");
        doc.replace(Range::new(Position::new(0, 4), Position::new(1, 5)), "a, b");
        assert_eq!(doc.text_content(), "foo(a, b);\r\n");

        assert!(doc.undo());
        assert_eq!(doc.to_bytes(), b"foo(a,\r\n    b);\r\n");
    }

    #[test]
    fn replace_keeps_crlf_line_endings() {
        let mut doc = Document::from_text("foo(a, b);\r\nbar();\r\n");
        doc.replace(
            Range::new(Position::new(0, 4), Position::new(0, 8)),
            "\n    a\n  , b\n",
        );
        assert_eq!(
            doc.text_content(),
            "foo(\r\n    a\r\n  , b\r\n);\r\nbar();\r\n"
        );
        assert_eq!(doc.line(3).as_deref(), Some(");"));
    }

    #[test]
    fn lf_documents_keep_lf() {
        let mut doc = Document::from_text("a\nb");
        doc.replace(Range::new(Position::new(0, 1), Position::new(0, 1)), "\nx");
        assert_eq!(doc.text_content(), "a\nx\nb");
    }

    #[test]
    fn selection_is_clamped_to_document() {
        let mut doc = Document::from_text("int a;\nint b;");
        doc.set_selection(Some(Range::new(Position::new(0, 0), Position::new(6, 0))));
        assert_eq!(
            doc.selection_range(),
            Some(Range::new(Position::new(0, 0), Position::new(1, 6)))
        );

        doc.set_selection(Some(Range::new(Position::new(4, 0), Position::new(9, 3))));
        assert_eq!(doc.selection_range(), None);
    }

    #[test]
    fn multibyte_offsets() {
        let mut doc = Document::from_text("ééé");
        doc.replace(Range::new(Position::new(0, 1), Position::new(0, 2)), "x");
        assert_eq!(doc.text_content(), "éxé");
    }
}
