//! Inline comment alignment, doxygen comment conversion and comment
//! paragraph rewrapping.

use log::debug;

use crate::actions::Outcome;
use crate::actions::preproc::{condition_for, is_else_or_endif};
use crate::editing::host::indentation_width;
use crate::editing::{EditorView, Position, TextDocument};

/// Where inline comments go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSettings {
    /// Column inline comments are aligned to
    pub position: usize,
    /// Comment-only lines indented past this column are realigned to
    /// `position`
    pub threshold: usize,
}

impl Default for CommentSettings {
    fn default() -> Self {
        Self {
            position: 60,
            threshold: 50,
        }
    }
}

/// Single-line comment leader for a host document type
pub fn comment_leader(document_type: &str) -> Option<&'static str> {
    match document_type {
        "C" | "C++" | "ObjC" | "ObjC++" | "Java" | "JavaScript" | "Rust" => Some("//"),
        "Python" | "Perl" | "CMake" | "Bash" | "Ruby" => Some("#"),
        _ => None,
    }
}

fn width(text: &str) -> usize {
    text.chars().count()
}

fn spaces(count: usize) -> String {
    " ".repeat(count)
}

/// Split at the first `leader`: code before, comment text after
fn partition<'a>(line: &'a str, leader: &str) -> (&'a str, Option<&'a str>) {
    match line.find(leader) {
        Some(index) => (&line[..index], Some(&line[index + leader.len()..])),
        None => (line, None),
    }
}

/// `///<` and `//!<` trailing comments become plain `///` comments
fn plain_doxygen(after: &str) -> String {
    match after.strip_prefix("/<").or_else(|| after.strip_prefix("!<")) {
        Some(rest) => format!("/{rest}"),
        None => after.to_string(),
    }
}

/// Lines replacing `line` after aligning its inline comment, and the column
/// the cursor goes to in the first of them
fn align_line(
    line: &str,
    leader: &str,
    settings: &CommentSettings,
    condition: Option<String>,
) -> (Vec<String>, usize) {
    let position = settings.position;
    let mut column = position;
    let (before, after) = partition(line, leader);
    let code = before.trim_end();
    let code_width = width(code);

    let mut lines = Vec::new();
    match after {
        Some(after) if !code.is_empty() => {
            if code_width <= position {
                lines.push(format!(
                    "{code}{}{leader}{}",
                    spaces(position - code_width),
                    after.trim_end()
                ));
            } else {
                // Too long to fit: comment goes above at the code's indentation
                column = indentation_width(before);
                let after = plain_doxygen(after);
                lines.push(format!("{}{leader}{}", spaces(column), after.trim_end()));
                lines.push(code.to_string());
            }
        }
        Some(after) => {
            if width(before) > settings.threshold {
                lines.push(format!("{}{leader}{}", spaces(position), after.trim_end()));
            } else {
                column = width(before);
                lines.push(line.trim_end().to_string());
            }
        }
        None if !code.is_empty() => {
            if code_width > position {
                column = indentation_width(before);
                lines.push(format!("{}{leader} ", spaces(column)));
                lines.push(code.to_string());
            } else {
                lines.push(format!("{code}{}{leader} ", spaces(position - code_width)));
            }
            if let Some(condition) = condition {
                lines[0].push_str(&condition);
            }
        }
        None => lines.push(format!("{}{leader} ", spaces(position))),
    }
    (lines, column + width(leader) + 1)
}

/// Condition to annotate `#else`/`#endif` lines with
fn directive_condition<D>(document: &D, index: usize, line: &str) -> Option<String>
where
    D: TextDocument + ?Sized,
{
    if is_else_or_endif(line) {
        condition_for(document, index)
    } else {
        None
    }
}

/// Lines `first..end` covered by a selection, whole lines only
fn selected_lines<V: EditorView>(view: &V) -> Option<std::ops::Range<usize>> {
    let selection = view.selection_range()?;
    let end = if selection.end.column == 0 && selection.end.line > selection.start.line {
        selection.end.line
    } else {
        selection.end.line + 1
    };
    Some(selection.start.line..end.min(view.line_count()))
}

fn lines_of<D>(document: &D, lines: std::ops::Range<usize>) -> Vec<String>
where
    D: TextDocument + ?Sized,
{
    lines
        .map(|index| document.line(index).unwrap_or_default())
        .collect()
}

/// Add or align the inline comment of the cursor line or of every selected
/// line
pub fn inline_comment<V: EditorView>(
    view: &mut V,
    leader: &str,
    settings: &CommentSettings,
) -> Outcome {
    let lines = selected_lines(view).unwrap_or_else(|| {
        let line = view.cursor_position().line;
        line..line + 1
    });
    let first = lines.start;

    let old_lines = lines_of(view, lines.clone());
    let mut new_lines = Vec::new();
    let mut cursor_column = 0;
    for (offset, line) in old_lines.iter().enumerate() {
        let condition = directive_condition(view, first + offset, line);
        let (aligned, column) = align_line(line, leader, settings, condition);
        if offset == 0 {
            cursor_column = column;
        }
        new_lines.extend(aligned);
    }
    let cursor = Position::new(first, cursor_column);

    if new_lines == old_lines {
        view.set_selection(None);
        view.set_cursor_position(cursor);
        return Outcome::CursorMoved;
    }
    view.transaction(|view| {
        view.replace_lines(lines, &new_lines);
        view.set_selection(None);
        view.set_cursor_position(cursor);
    });
    Outcome::Applied
}

/// Move the inline comment of the cursor line onto its own line above
pub fn move_comment_above<V: EditorView>(view: &mut V, leader: &str) -> Outcome {
    if view.selection_range().is_some() {
        return Outcome::Unchanged;
    }
    let index = view.cursor_position().line;
    let line = view.line(index).unwrap_or_default();
    let (before, after) = partition(&line, leader);
    let code = before.trim_end();
    let indent = indentation_width(before);

    let (comment, cursor_column) = match after {
        Some(_) if code.trim().is_empty() => return Outcome::Unchanged,
        Some(after) => {
            let doxygen = after.starts_with("/<") || after.starts_with("!<");
            let after = plain_doxygen(after);
            let column = indent + width(leader) + usize::from(doxygen);
            (
                format!("{}{leader}{}", spaces(indent), after.trim_end()),
                column,
            )
        }
        None if code.is_empty() => return Outcome::Unchanged,
        None => (
            format!("{}{leader} ", spaces(indent)),
            indent + width(leader) + 1,
        ),
    };

    let new_lines = vec![comment, code.to_string()];
    view.transaction(|view| {
        view.replace_lines(index..index + 1, &new_lines);
        view.set_cursor_position(Position::new(index, cursor_column));
    });
    Outcome::Applied
}

/// Move the comment-only cursor line onto the next line as its inline
/// comment, when that line has none and its code fits before the comment
/// column
pub fn move_comment_inline<V: EditorView>(
    view: &mut V,
    leader: &str,
    settings: &CommentSettings,
) -> Outcome {
    let index = view.cursor_position().line;
    if index + 1 >= view.line_count() {
        return Outcome::Unchanged;
    }
    let line = view.line(index).unwrap_or_default();
    let (before, after) = partition(&line, leader);
    let Some(after) = after else {
        return Outcome::Unchanged;
    };
    if !before.trim().is_empty() {
        return Outcome::Unchanged;
    }

    let next = view.line(index + 1).unwrap_or_default();
    let (next_before, next_after) = partition(&next, leader);
    let code = next_before.trim_end();
    if code.trim().is_empty() || next_after.is_some() || width(code) > settings.position {
        return Outcome::Unchanged;
    }

    let (after, doxygen_offset) = match after.strip_prefix("/ ") {
        Some(rest) => (format!("/< {rest}"), 2),
        None => (after.to_string(), 0),
    };
    let merged = format!(
        "{code}{}{leader}{}",
        spaces(settings.position - width(code)),
        after.trim_end()
    );
    let column = settings.position + width(leader) + 1 + doxygen_offset;
    view.transaction(|view| {
        view.replace_lines(index..index + 2, &[merged]);
        view.set_cursor_position(Position::new(index, column));
    });
    Outcome::Applied
}

fn trimmed_line<D>(document: &D, index: usize) -> String
where
    D: TextDocument + ?Sized,
{
    document
        .line(index)
        .map(|line| line.trim().to_string())
        .unwrap_or_default()
}

/// Lines `first..end` around `line` whose trimmed text satisfies `member`
fn run_around<D>(document: &D, line: usize, member: impl Fn(&str) -> bool) -> std::ops::Range<usize>
where
    D: TextDocument + ?Sized,
{
    let mut first = line;
    while first > 0 && member(&trimmed_line(document, first - 1)) {
        first -= 1;
    }
    let mut end = line + 1;
    while end < document.line_count() && member(&trimmed_line(document, end)) {
        end += 1;
    }
    first..end
}

fn is_doxygen_line(trimmed: &str) -> bool {
    trimmed.starts_with("///") || trimmed.starts_with("//!")
}

/// Convert between a run of `///` lines and a `/** ... */` block, depending
/// on the style found at the cursor
pub fn transform_doxygen<V: EditorView>(view: &mut V) -> Outcome {
    let line = trimmed_line(view, view.cursor_position().line);
    if is_doxygen_line(&line) {
        to_block_comment(view)
    } else if line.starts_with('*') || line.starts_with("/*") {
        to_line_comments(view)
    } else {
        Outcome::Unchanged
    }
}

fn to_block_comment<V: EditorView>(view: &mut V) -> Outcome {
    let lines = selected_lines(view)
        .unwrap_or_else(|| run_around(view, view.cursor_position().line, is_doxygen_line));
    let first = lines.start;
    let align = spaces(indentation_width(&view.line(first).unwrap_or_default()));

    let mut new_lines = vec![format!("{align}/**")];
    for index in lines.clone() {
        let text = trimmed_line(view, index);
        let body = match text.strip_prefix("///").or_else(|| text.strip_prefix("//!")) {
            Some(rest) => format!(" *{rest}"),
            None => text,
        };
        new_lines.push(format!("{align}{body}"));
    }
    new_lines.push(format!("{align} */"));

    let cursor = Position::new(first + 1, width(&align) + 3);
    view.transaction(|view| {
        view.replace_lines(lines, &new_lines);
        view.set_selection(None);
        view.set_cursor_position(cursor);
    });
    Outcome::Applied
}

/// First and last line of the `/* ... */` block around `line`
fn block_comment_bounds<D>(document: &D, line: usize) -> Option<(usize, usize)>
where
    D: TextDocument + ?Sized,
{
    let mut start = line;
    loop {
        let text = trimmed_line(document, start);
        if text.starts_with("/*") {
            break;
        }
        if !text.starts_with('*') || start == 0 {
            return None;
        }
        start -= 1;
    }

    let mut end = line.max(start);
    loop {
        let text = trimmed_line(document, end);
        if text.ends_with("*/") {
            break;
        }
        end += 1;
        if end >= document.line_count() || !trimmed_line(document, end).starts_with('*') {
            return None;
        }
    }
    Some((start, end))
}

fn to_line_comments<V: EditorView>(view: &mut V) -> Outcome {
    let Some((start, end)) = block_comment_bounds(view, view.cursor_position().line) else {
        return Outcome::Unchanged;
    };
    let align = spaces(indentation_width(&view.line(start).unwrap_or_default()));

    let new_lines: Vec<String> = (start..=end)
        .map(|index| trimmed_line(view, index))
        .filter(|text| !text.starts_with("/*") && !text.starts_with("*/"))
        .filter_map(|text| {
            text.strip_prefix('*')
                .map(|rest| format!("{align}///{rest}"))
        })
        .collect();
    if new_lines.is_empty() {
        return Outcome::Unchanged;
    }

    let cursor = Position::new(start, width(&align) + 3);
    view.transaction(|view| {
        view.replace_lines(start..end + 1, &new_lines);
        view.set_cursor_position(cursor);
    });
    Outcome::Applied
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reflow {
    Shrink,
    Extend,
}

/// Reflow the comment paragraph around the cursor one word narrower
pub fn shrink_paragraph<V: EditorView>(view: &mut V) -> Outcome {
    reflow_paragraph(view, Reflow::Shrink)
}

/// Reflow the comment paragraph around the cursor one word wider
pub fn extend_paragraph<V: EditorView>(view: &mut V) -> Outcome {
    reflow_paragraph(view, Reflow::Extend)
}

/// Text after a comment marker, `None` for separator lines
fn comment_body(trimmed: &str) -> Option<&str> {
    let body = trimmed.trim_start_matches(['/', '*', '!', '<']).trim();
    let is_comment = trimmed.starts_with("//")
        || (trimmed.starts_with('*') && !trimmed.starts_with("*/"));
    (is_comment && !body.is_empty()).then_some(body)
}

fn comment_marker(trimmed: &str) -> &str {
    let body_start = trimmed
        .find(|c| !matches!(c, '/' | '*' | '!' | '<'))
        .unwrap_or(trimmed.len());
    &trimmed[..body_start]
}

/// Width of the longest line plus the first word of the line following it
fn extended_width(bodies: &[String]) -> usize {
    let mut longest = 0;
    let mut after_longest = false;
    let mut extra = 0;
    for body in bodies {
        if after_longest {
            extra = body.split_whitespace().next().map_or(0, width) + 1;
        }
        let size = width(body);
        after_longest = longest < size;
        if after_longest {
            longest = size;
        }
    }
    longest + extra
}

/// Greedy word wrap; words longer than `limit` get a line of their own
pub fn wrap_words(text: &str, limit: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for word in text.split_whitespace() {
        let word_width = width(word);
        if !current.is_empty() && current_width + 1 + word_width > limit {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_width += 1;
        }
        current.push_str(word);
        current_width += word_width;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn reflow_paragraph<V: EditorView>(view: &mut V, reflow: Reflow) -> Outcome {
    let cursor_line = view.cursor_position().line;
    if comment_body(&trimmed_line(view, cursor_line)).is_none() {
        return Outcome::Unchanged;
    }
    let lines = run_around(view, cursor_line, |text| comment_body(text).is_some());
    let first = lines.start;

    let old_lines = lines_of(view, lines.clone());
    let indent = indentation_width(&old_lines[0]);
    let marker = comment_marker(old_lines[0].trim()).to_string();
    let bodies: Vec<String> = old_lines
        .iter()
        .filter_map(|line| comment_body(line.trim()))
        .map(str::to_string)
        .collect();

    let limit = match reflow {
        Reflow::Shrink => match bodies.iter().map(|body| width(body)).max() {
            Some(longest) if longest > 1 => longest - 1,
            _ => return Outcome::Unchanged,
        },
        Reflow::Extend => extended_width(&bodies),
    };
    debug!("reflow lines {first}..{} to width {limit}", lines.end);

    let prefix = format!("{}{marker} ", spaces(indent));
    let new_lines: Vec<String> = wrap_words(&bodies.join(" "), limit)
        .into_iter()
        .map(|line| format!("{prefix}{line}"))
        .collect();
    if new_lines == old_lines {
        return Outcome::Unchanged;
    }

    let cursor = Position::new(first, width(&prefix));
    view.transaction(|view| {
        view.replace_lines(lines, &new_lines);
        view.set_cursor_position(cursor);
    });
    Outcome::Applied
}
