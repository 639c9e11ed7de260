//! Narrow host interface the editing actions are written against.
//!
//! An editor integration implements [`TextDocument`] (line access plus one
//! replacement primitive) and [`EditorView`] (cursor and selection). The
//! in-memory [`Document`](crate::editing::Document) implements both.

use crate::editing::{Position, Range};

/// Line-oriented read access plus a single replacement primitive.
pub trait TextDocument {
    /// Number of lines; an empty document has one empty line
    fn line_count(&self) -> usize;

    /// Text of a line without its terminator, `None` past the last line
    fn line(&self, index: usize) -> Option<String>;

    /// Replace `range` with `text`. Callers wrap related replacements in
    /// [`TextDocument::begin_edit`]/[`TextDocument::end_edit`].
    fn replace(&mut self, range: Range, text: &str);

    /// Start an atomic edit (one undo step)
    fn begin_edit(&mut self) {}

    /// Finish the edit started by [`TextDocument::begin_edit`]
    fn end_edit(&mut self) {}

    /// Run `edit` as a single transaction
    fn transaction<R>(&mut self, edit: impl FnOnce(&mut Self) -> R) -> R
    where
        Self: Sized,
    {
        self.begin_edit();
        let result = edit(self);
        self.end_edit();
        result
    }

    /// Replace whole lines `lines` by `new_lines`; removes them when
    /// `new_lines` is empty
    fn replace_lines(&mut self, lines: std::ops::Range<usize>, new_lines: &[String]) {
        let (range, text) = if new_lines.is_empty() {
            lines_removal(self, lines)
        } else {
            lines_replacement(self, lines, new_lines)
        };
        self.replace(range, &text);
    }

    /// Insert `new_lines` before line `at_line`, appending past the end
    fn insert_lines(&mut self, at_line: usize, new_lines: &[String]) {
        let (range, text) = lines_insertion(self, at_line, new_lines);
        self.replace(range, &text);
    }

    /// Length of a line in characters (0 past the last line)
    fn line_length(&self, index: usize) -> usize {
        self.line(index).map_or(0, |line| line.chars().count())
    }

    /// Character right after `at`, `None` at or past the end of the line
    fn character_at(&self, at: Position) -> Option<char> {
        self.line(at.line)?.chars().nth(at.column)
    }

    /// Position past the last character of the document
    fn end_position(&self) -> Position {
        let last = self.line_count().saturating_sub(1);
        Position::new(last, self.line_length(last))
    }

    /// Text covered by `range`, lines joined with `\n`
    fn text(&self, range: Range) -> String {
        let last = self.line_count().saturating_sub(1);
        let mut out = String::new();
        for index in range.start.line..=range.end.line.min(last) {
            let line = self.line(index).unwrap_or_default();
            let from = if index == range.start.line {
                range.start.column
            } else {
                0
            };
            let to = if index == range.end.line {
                range.end.column
            } else {
                usize::MAX
            };
            if index != range.start.line {
                out.push('\n');
            }
            out.push_str(&char_slice(&line, from, to));
        }
        out
    }
}

/// Cursor and selection of the view an action was triggered in.
pub trait EditorView: TextDocument {
    fn cursor_position(&self) -> Position;

    fn set_cursor_position(&mut self, at: Position);

    /// Current selection, `None` when nothing is selected
    fn selection_range(&self) -> Option<Range>;

    fn set_selection(&mut self, range: Option<Range>);
}

/// Replacement inserting `new_lines` before `at_line`
pub fn lines_insertion<D>(doc: &D, at_line: usize, new_lines: &[String]) -> (Range, String)
where
    D: TextDocument + ?Sized,
{
    if at_line < doc.line_count() {
        lines_replacement(doc, at_line..at_line, new_lines)
    } else {
        // Appending: the new lines follow a fresh terminator
        let end = doc.end_position();
        (Range::new(end, end), format!("\n{}", new_lines.join("\n")))
    }
}

/// Replacement removing `lines` together with their terminators
pub fn lines_removal<D>(doc: &D, lines: std::ops::Range<usize>) -> (Range, String)
where
    D: TextDocument + ?Sized,
{
    if lines.end < doc.line_count() {
        (Range::lines(lines.start, lines.end), String::new())
    } else if lines.start > 0 {
        // Last lines go together with the terminator before them
        let previous = lines.start - 1;
        let start = Position::new(previous, doc.line_length(previous));
        (Range::new(start, doc.end_position()), String::new())
    } else {
        (
            Range::new(Position::default(), doc.end_position()),
            String::new(),
        )
    }
}

/// Replacement of `lines` by a non-empty set of lines
pub fn lines_replacement<D>(
    doc: &D,
    lines: std::ops::Range<usize>,
    new_lines: &[String],
) -> (Range, String)
where
    D: TextDocument + ?Sized,
{
    let start = Position::new(lines.start, 0);
    if lines.end < doc.line_count() {
        let mut text = new_lines.join("\n");
        text.push('\n');
        (Range::new(start, Position::new(lines.end, 0)), text)
    } else {
        (Range::new(start, doc.end_position()), new_lines.join("\n"))
    }
}

/// Characters `from..to` of `line`, clamped to the line
pub fn char_slice(line: &str, from: usize, to: usize) -> String {
    line.chars()
        .skip(from)
        .take(to.saturating_sub(from))
        .collect()
}

/// Width of the leading whitespace of `line`, in characters
pub fn indentation_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Position reached after writing `text` starting at `start`
pub fn end_of_insertion(start: Position, text: &str) -> Position {
    match text.rfind('\n') {
        None => start.with_column(start.column + text.chars().count()),
        Some(last_newline) => Position::new(
            start.line + text.matches('\n').count(),
            text[last_newline + 1..].chars().count(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn char_slice_clamps() {
        assert_eq!(char_slice("héllo", 1, 3), "él");
        assert_eq!(char_slice("abc", 2, 10), "c");
        assert_eq!(char_slice("abc", 5, 10), "");
    }

    #[test]
    fn insertion_end_spans_lines() {
        let start = Position::new(2, 4);
        assert_eq!(end_of_insertion(start, "xy"), Position::new(2, 6));
        assert_eq!(end_of_insertion(start, "x\n  yz"), Position::new(3, 4));
        assert_eq!(end_of_insertion(start, "\n"), Position::new(3, 0));
    }

    #[test]
    fn indentation_counts_tabs_and_spaces() {
        assert_eq!(indentation_width("\t  foo"), 3);
        assert_eq!(indentation_width("foo"), 0);
    }
}
