//! Text transforms between the one-line and the boost-style layout of a
//! parameter list.

use std::iter;

use crate::editing::{Position, Range, TextDocument};

/// Lay out the items of `inner` one per line, separators leading.
///
/// `inner` is the text between the brackets, `breaks` the separator
/// positions inside it and `indent` the indentation of the line holding the
/// opening bracket. The first item gets two extra spaces in place of a
/// separator so the items line up; continuation lines of a multi-line item
/// are indented past the separator column. The returned text ends with the
/// indentation of the closing bracket.
pub fn expand_text<D>(document: &D, inner: Range, breaks: &[Position], indent: usize) -> String
where
    D: TextDocument + ?Sized,
{
    let pad = " ".repeat(indent + 2);
    let continuation = format!("\n{}", " ".repeat(indent + 4));

    let mut out = String::from("\n");
    let mut from = inner.start;
    let mut separator = None;
    for stop in breaks.iter().copied().chain(iter::once(inner.end)) {
        let chunk = document.text(Range::new(from, stop));
        let item = chunk
            .trim()
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(&continuation);

        out.push_str(&pad);
        match separator {
            None => out.push_str("  "),
            Some(sep) => {
                out.push(sep);
                out.push(' ');
            }
        }
        out.push_str(&item);
        out.push('\n');

        separator = document.character_at(stop);
        from = stop.next_column();
    }
    out.push_str(&" ".repeat(indent));
    out
}

/// Join the lines of a parameter list back together, dropping the leading
/// whitespace of every line.
pub fn collapse_text(text: &str) -> String {
    text.lines().map(str::trim_start).collect()
}
