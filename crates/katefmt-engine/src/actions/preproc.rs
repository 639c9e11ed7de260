//! `#if` / `#else` / `#endif` block handling.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::actions::Outcome;
use crate::editing::{EditorView, Position, Range, TextDocument};

/// One preprocessor conditional, by line index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfBlock {
    /// Line of the `#if`/`#ifdef`/`#ifndef`
    pub start: usize,
    /// Line of the `#endif`
    pub end: usize,
    pub else_line: Option<usize>,
    /// `Some(false)` for `#if 0`, `Some(true)` for `#if 1`
    pub switch: Option<bool>,
}

impl IfBlock {
    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }
}

fn if_regex() -> &'static Regex {
    static IF_REGEX: OnceLock<Regex> = OnceLock::new();
    IF_REGEX.get_or_init(|| Regex::new(r"^\s*#\s*if").expect("Invalid #if regex"))
}

fn switch_regex() -> &'static Regex {
    static SWITCH_REGEX: OnceLock<Regex> = OnceLock::new();
    SWITCH_REGEX.get_or_init(|| {
        Regex::new(r"^\s*#\s*if\s*(0|1|false|true)\s*$").expect("Invalid #if switch regex")
    })
}

fn else_regex() -> &'static Regex {
    static ELSE_REGEX: OnceLock<Regex> = OnceLock::new();
    ELSE_REGEX.get_or_init(|| Regex::new(r"^\s*#\s*else").expect("Invalid #else regex"))
}

fn endif_regex() -> &'static Regex {
    static ENDIF_REGEX: OnceLock<Regex> = OnceLock::new();
    ENDIF_REGEX.get_or_init(|| Regex::new(r"^\s*#\s*endif").expect("Invalid #endif regex"))
}

fn condition_regex() -> &'static Regex {
    static CONDITION_REGEX: OnceLock<Regex> = OnceLock::new();
    CONDITION_REGEX.get_or_init(|| {
        Regex::new(r"^\s*#\s*if(?:n?def)?\s+(.*?)\s*$").expect("Invalid #if condition regex")
    })
}

/// Is `line` an `#else` or `#endif` directive?
pub fn is_else_or_endif(line: &str) -> bool {
    else_regex().is_match(line) || endif_regex().is_match(line)
}

/// Pair up the conditionals of `document`.
///
/// Blocks are listed in the order their `#endif` appears, so an inner
/// block always comes before the block enclosing it. Unbalanced directives
/// are ignored.
pub fn build_if_endif_map<D>(document: &D) -> Vec<IfBlock>
where
    D: TextDocument + ?Sized,
{
    let mut open: Vec<IfBlock> = Vec::new();
    let mut blocks = Vec::new();
    for index in 0..document.line_count() {
        let Some(line) = document.line(index) else {
            break;
        };
        if if_regex().is_match(&line) {
            let switch = switch_regex()
                .captures(&line)
                .map(|caps| matches!(&caps[1], "1" | "true"));
            open.push(IfBlock {
                start: index,
                end: index,
                else_line: None,
                switch,
            });
        } else if else_regex().is_match(&line) {
            if let Some(block) = open.last_mut() {
                block.else_line = Some(index);
            }
        } else if endif_regex().is_match(&line)
            && let Some(mut block) = open.pop()
        {
            block.end = index;
            blocks.push(block);
        }
    }
    debug!("found {} preprocessor blocks", blocks.len());
    blocks
}

/// Innermost block containing `line`; plain conditionals only count when
/// `include_conditionals` is set.
pub fn locate_block(blocks: &[IfBlock], line: usize, include_conditionals: bool) -> Option<IfBlock> {
    blocks
        .iter()
        .find(|block| block.contains(line) && (include_conditionals || block.switch.is_some()))
        .copied()
}

/// Condition text of the conditional whose `#else`/`#endif` is `line`
pub fn condition_for<D>(document: &D, line: usize) -> Option<String>
where
    D: TextDocument + ?Sized,
{
    let blocks = build_if_endif_map(document);
    let block = locate_block(&blocks, line, true)?;
    let start = document.line(block.start)?;
    let caps = condition_regex().captures(&start)?;
    Some(caps[1].to_string())
}

/// Wrap the selected lines (or the cursor line) in `#if 0` / `#endif`
pub fn comment_block<V: EditorView>(view: &mut V) -> Outcome {
    let (first, last) = match view.selection_range() {
        Some(selection) => {
            let last = if selection.end.column == 0 && selection.end.line > selection.start.line {
                selection.end.line - 1
            } else {
                selection.end.line
            };
            (selection.start.line, last)
        }
        None => {
            let line = view.cursor_position().line;
            (line, line)
        }
    };

    view.transaction(|view| {
        view.insert_lines(last + 1, &["#endif".to_string()]);
        view.insert_lines(first, &["#if 0".to_string()]);
        view.set_selection(None);
    });
    Outcome::Applied
}

/// Flip the `#if 0`/`#if 1` of the block under the cursor
pub fn toggle_block<V: EditorView>(view: &mut V) -> Outcome {
    let line = view.cursor_position().line;
    let blocks = build_if_endif_map(view);
    let Some(block) = locate_block(&blocks, line, false) else {
        return Outcome::Unchanged;
    };
    let Some(text) = view.line(block.start) else {
        return Outcome::Unchanged;
    };
    let Some(value) = switch_regex().captures(&text).and_then(|caps| caps.get(1)) else {
        return Outcome::Unchanged;
    };

    let flipped = match value.as_str() {
        "0" | "false" => "1",
        _ => "0",
    };
    let from = text[..value.start()].chars().count();
    let to = text[..value.end()].chars().count();
    let range = Range::new(Position::new(block.start, from), Position::new(block.start, to));
    view.transaction(|view| view.replace(range, flipped));
    Outcome::Applied
}

/// Resolve the `#if 0`/`#if 1` block under the cursor, keeping only the
/// branch that is compiled in
pub fn remove_block<V: EditorView>(view: &mut V) -> Outcome {
    let line = view.cursor_position().line;
    let blocks = build_if_endif_map(view);
    let Some(block) = locate_block(&blocks, line, false) else {
        return Outcome::Unchanged;
    };
    let enabled = block.switch == Some(true);

    // Later lines first so earlier indices stay valid
    view.transaction(|view| match (enabled, block.else_line) {
        (false, Some(else_line)) => {
            view.replace_lines(block.end..block.end + 1, &[]);
            view.replace_lines(block.start..else_line + 1, &[]);
        }
        (false, None) => view.replace_lines(block.start..block.end + 1, &[]),
        (true, Some(else_line)) => {
            view.replace_lines(else_line..block.end + 1, &[]);
            view.replace_lines(block.start..block.start + 1, &[]);
        }
        (true, None) => {
            view.replace_lines(block.end..block.end + 1, &[]);
            view.replace_lines(block.start..block.start + 1, &[]);
        }
    });
    Outcome::Applied
}

/// Select all lines of the `#if 0`/`#if 1` block under the cursor
pub fn select_block<V: EditorView>(view: &mut V) -> Outcome {
    let line = view.cursor_position().line;
    let blocks = build_if_endif_map(view);
    let Some(block) = locate_block(&blocks, line, false) else {
        return Outcome::Unchanged;
    };
    let end = if block.end + 1 < view.line_count() {
        Position::new(block.end + 1, 0)
    } else {
        view.end_position()
    };
    view.set_selection(Some(Range::new(Position::new(block.start, 0), end)));
    Outcome::Selected
}
