use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::host::{end_of_insertion, lines_insertion, lines_removal};
use crate::editing::{Document, Position, Range};

/// Commands that can be applied to the document
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText {
        at: Position,
        text: String,
    },
    DeleteRange {
        range: Range,
    },
    ReplaceRange {
        range: Range,
        text: String,
    },
    /// Insert whole lines before `at_line` (appends when past the last line)
    InsertLines {
        at_line: usize,
        lines: Vec<String>,
    },
    /// Remove whole lines `lines.start..lines.end` including their terminators
    RemoveLines {
        lines: std::ops::Range<usize>,
    },
}

/// Lower any command to a single replacement of a range by a text
pub(crate) fn as_replacement(doc: &Document, cmd: &Cmd) -> (Range, String) {
    match cmd {
        Cmd::InsertText { at, text } => (Range::new(*at, *at), text.clone()),
        Cmd::DeleteRange { range } => (*range, String::new()),
        Cmd::ReplaceRange { range, text } => (*range, text.clone()),
        Cmd::InsertLines { at_line, lines } => lines_insertion(doc, *at_line, lines),
        Cmd::RemoveLines { lines } => lines_removal(doc, lines.clone()),
    }
}

/// Compile a command into a delta
pub(crate) fn compile_command(doc: &Document, cmd: &Cmd) -> Delta<RopeInfo> {
    let (range, text) = as_replacement(doc, cmd);
    let start = doc.offset_of(range.start);
    let end = doc.offset_of(range.end).max(start);

    let mut builder = Builder::new(doc.len());
    if text.is_empty() {
        builder.delete(start..end);
    } else {
        builder.replace(start..end, Rope::from(text));
    }
    builder.build()
}

/// Transform a position through the replacement a command performs
pub(crate) fn transform_position_for_command(doc: &Document, at: Position, cmd: &Cmd) -> Position {
    let (range, text) = as_replacement(doc, cmd);
    let new_end = end_of_insertion(range.start, &text);

    if at < range.start || (at == range.start && !range.is_empty()) {
        // Before the edit - no change
        at
    } else if at >= range.end {
        if at.line == range.end.line {
            new_end.with_column(new_end.column + (at.column - range.end.column))
        } else {
            Position::new(at.line - range.end.line + new_end.line, at.column)
        }
    } else {
        // Inside replaced text - collapse to the edit point
        range.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(text: &str) -> Document {
        Document::from_text(text)
    }

    #[test]
    fn insert_lines_before_existing_line() {
        let d = doc("a\nb");
        let cmd = Cmd::InsertLines {
            at_line: 1,
            lines: vec!["x".into(), "y".into()],
        };
        let (range, text) = as_replacement(&d, &cmd);
        assert_eq!(range, Range::lines(1, 1));
        assert_eq!(text, "x\ny\n");
    }

    #[test]
    fn insert_lines_past_end_appends() {
        let d = doc("a\nb");
        let cmd = Cmd::InsertLines {
            at_line: 2,
            lines: vec!["c".into()],
        };
        let (range, text) = as_replacement(&d, &cmd);
        assert_eq!(range.start, Position::new(1, 1));
        assert_eq!(text, "\nc");
    }

    #[test]
    fn remove_last_line_takes_previous_terminator() {
        let d = doc("a\nb\nc");
        let (range, _) = as_replacement(&d, &Cmd::RemoveLines { lines: 2..3 });
        assert_eq!(range, Range::new(Position::new(1, 1), Position::new(2, 1)));
    }

    #[test]
    fn position_after_edit_on_same_line_shifts() {
        let d = doc("foo(a, b)");
        let cmd = Cmd::ReplaceRange {
            range: Range::new(Position::new(0, 4), Position::new(0, 8)),
            text: "\n  a\n, b\n".into(),
        };
        let moved = transform_position_for_command(&d, Position::new(0, 9), &cmd);
        assert_eq!(moved, Position::new(3, 1));
    }

    #[test]
    fn position_inside_deleted_range_collapses() {
        let d = doc("hello world");
        let cmd = Cmd::DeleteRange {
            range: Range::new(Position::new(0, 2), Position::new(0, 8)),
        };
        let moved = transform_position_for_command(&d, Position::new(0, 5), &cmd);
        assert_eq!(moved, Position::new(0, 2));
    }

    #[test]
    fn insertion_at_cursor_moves_cursor_past_text() {
        let d = doc("ab");
        let cmd = Cmd::InsertText {
            at: Position::new(0, 1),
            text: "x".into(),
        };
        let moved = transform_position_for_command(&d, Position::new(0, 1), &cmd);
        assert_eq!(moved, Position::new(0, 2));
    }
}
