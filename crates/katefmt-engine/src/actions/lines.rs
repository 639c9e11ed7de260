//! Small line editing helpers.

use crate::actions::Outcome;
use crate::editing::host::{char_slice, indentation_width};
use crate::editing::{EditorView, Position, Range};

/// Copy the character above the cursor to the cursor
pub fn insert_char_from_line_above<V: EditorView>(view: &mut V) -> Outcome {
    let cursor = view.cursor_position();
    match cursor.line.checked_sub(1) {
        Some(above) => insert_char_from(view, above, cursor),
        None => Outcome::Unchanged,
    }
}

/// Copy the character below the cursor to the cursor
pub fn insert_char_from_line_below<V: EditorView>(view: &mut V) -> Outcome {
    let cursor = view.cursor_position();
    insert_char_from(view, cursor.line + 1, cursor)
}

fn insert_char_from<V: EditorView>(view: &mut V, source_line: usize, cursor: Position) -> Outcome {
    let Some(ch) = view.character_at(Position::new(source_line, cursor.column)) else {
        return Outcome::Unchanged;
    };
    view.transaction(|view| view.replace(Range::new(cursor, cursor), &ch.to_string()));
    Outcome::Applied
}

/// Remove everything from the cursor to the end of its line
pub fn kill_after_cursor<V: EditorView>(view: &mut V) -> Outcome {
    let cursor = view.cursor_position();
    let length = view.line_length(cursor.line);
    if cursor.column >= length {
        return Outcome::Unchanged;
    }
    view.transaction(|view| {
        view.replace(Range::new(cursor, cursor.with_column(length)), "");
    });
    Outcome::Applied
}

/// Remove everything before the cursor, keeping the line's indentation
pub fn kill_before_cursor<V: EditorView>(view: &mut V) -> Outcome {
    let cursor = view.cursor_position();
    let line = view.line(cursor.line).unwrap_or_default();
    let indent = indentation_width(&line);
    if cursor.column <= indent {
        return Outcome::Unchanged;
    }

    let rest = char_slice(&line, cursor.column, usize::MAX);
    let new_line = format!("{}{rest}", " ".repeat(indent));
    let whole = Range::new(
        cursor.with_column(0),
        cursor.with_column(line.chars().count()),
    );
    view.transaction(|view| {
        view.replace(whole, &new_line);
        view.set_cursor_position(cursor.with_column(indent));
    });
    Outcome::Applied
}
