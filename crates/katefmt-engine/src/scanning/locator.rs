//! Bracket/template-aware range locator.
//!
//! Finds the innermost `(...)` or template `<...>` around a cursor by
//! scanning backward to the unmatched opener and forward to the unmatched
//! closer. Balanced sub-expressions met on the way are reported as nested
//! ranges; separators seen at nesting depth zero are reported as break
//! positions.

use log::debug;

use crate::editing::{Position, Range, TextDocument};
use crate::scanning::template::is_template_bracket;

/// Which bracket pair delimits a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    /// `(` and `)`
    Round,
    /// Template `<` and `>`
    Angle,
}

impl BracketKind {
    pub fn open_char(self) -> char {
        match self {
            BracketKind::Round => '(',
            BracketKind::Angle => '<',
        }
    }

    pub fn close_char(self) -> char {
        match self {
            BracketKind::Round => ')',
            BracketKind::Angle => '>',
        }
    }
}

/// Characters that separate items when met outside nested brackets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakChars {
    /// `,`
    #[default]
    Commas,
    /// `,` and `;`, for `for (init; cond; step)` headers
    CommasAndSemicolons,
}

impl BreakChars {
    pub fn contains(self, ch: char) -> bool {
        match self {
            BreakChars::Commas => ch == ',',
            BreakChars::CommasAndSemicolons => ch == ',' || ch == ';',
        }
    }
}

/// What the locator found around the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeTopology {
    /// Text between the delimiters, delimiters excluded
    pub range: Range,
    pub kind: BracketKind,
    /// Balanced sub-expressions inside `range`, delimiters included
    pub nested: Vec<Range>,
    /// Separators at depth zero, in document order
    pub breaks: Vec<Position>,
}

impl RangeTopology {
    /// Position of the opening delimiter
    pub fn open_position(&self) -> Position {
        Position::new(self.range.start.line, self.range.start.column - 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocateError {
    #[error("Misbalanced brackets: '{open}' @{open_at} and '{close}' @{close_at}")]
    Misbalanced {
        open: char,
        open_at: Position,
        close: char,
        close_at: Position,
    },
}

/// Locate the range enclosing `cursor`.
///
/// Returns `Ok(None)` when either scan reaches the document boundary
/// without meeting an unmatched delimiter.
pub fn locate<D>(
    document: &D,
    cursor: Position,
    break_chars: BreakChars,
) -> Result<Option<RangeTopology>, LocateError>
where
    D: TextDocument + ?Sized,
{
    let mut scanner = Scanner::new(document, break_chars);

    let Some(open) = scanner.backward(cursor)? else {
        debug!("no opening bracket before {cursor}");
        return Ok(None);
    };
    debug_assert!(scanner.stack.is_empty(), "backward scan left brackets open");
    let mut breaks = std::mem::take(&mut scanner.breaks);
    breaks.reverse();

    let Some(close) = scanner.forward(cursor)? else {
        debug!("no closing bracket after {cursor}");
        return Ok(None);
    };
    debug_assert!(scanner.stack.is_empty(), "forward scan left brackets open");
    breaks.append(&mut scanner.breaks);

    if open.kind != close.kind {
        return Err(LocateError::Misbalanced {
            open: open.kind.open_char(),
            open_at: open.at,
            close: close.kind.close_char(),
            close_at: close.at,
        });
    }

    Ok(Some(RangeTopology {
        range: Range::new(open.at.next_column(), close.at),
        kind: open.kind,
        nested: scanner.nested,
        breaks,
    }))
}

/// A bracket character and where it is
#[derive(Debug, Clone, Copy)]
struct Delimiter {
    at: Position,
    kind: BracketKind,
}

struct Scanner<'a, D: ?Sized> {
    document: &'a D,
    break_chars: BreakChars,
    /// Unmatched closers (backward) or openers (forward)
    stack: Vec<Delimiter>,
    nested: Vec<Range>,
    breaks: Vec<Position>,
}

impl<'a, D> Scanner<'a, D>
where
    D: TextDocument + ?Sized,
{
    fn new(document: &'a D, break_chars: BreakChars) -> Self {
        Self {
            document,
            break_chars,
            stack: Vec::new(),
            nested: Vec::new(),
            breaks: Vec::new(),
        }
    }

    fn line_chars(&self, index: usize) -> Vec<char> {
        self.document
            .line(index)
            .map(|line| line.chars().collect())
            .unwrap_or_default()
    }

    /// Walk from just before `cursor` towards the document start
    fn backward(&mut self, cursor: Position) -> Result<Option<Delimiter>, LocateError> {
        let last_line = self.document.line_count().saturating_sub(1);
        let first_line = cursor.line.min(last_line);

        for line_index in (0..=first_line).rev() {
            let line = self.line_chars(line_index);
            let from = if line_index == cursor.line {
                cursor.column.min(line.len())
            } else {
                line.len()
            };

            for column in (0..from).rev() {
                let at = Position::new(line_index, column);
                match line[column] {
                    ')' => self.push(at, BracketKind::Round),
                    '(' => {
                        if let Some(found) = self.open_backward(at, BracketKind::Round)? {
                            return Ok(Some(found));
                        }
                    }
                    '>' => {
                        if is_template_bracket(&line, column) {
                            self.push(at, BracketKind::Angle);
                        } else {
                            debug!("'>' @{at} doesn't look like a template");
                        }
                    }
                    '<' => {
                        if !is_template_bracket(&line, column) {
                            debug!("'<' @{at} doesn't look like a template");
                        } else if let Some(found) = self.open_backward(at, BracketKind::Angle)? {
                            return Ok(Some(found));
                        }
                    }
                    ch if self.break_chars.contains(ch) && self.stack.is_empty() => {
                        self.breaks.push(at);
                    }
                    _ => {}
                }
            }
        }
        Ok(None)
    }

    /// Walk from `cursor` towards the document end
    fn forward(&mut self, cursor: Position) -> Result<Option<Delimiter>, LocateError> {
        let line_count = self.document.line_count();

        for line_index in cursor.line..line_count {
            let line = self.line_chars(line_index);
            let from = if line_index == cursor.line {
                cursor.column.min(line.len())
            } else {
                0
            };

            for column in from..line.len() {
                let at = Position::new(line_index, column);
                match line[column] {
                    '(' => self.push(at, BracketKind::Round),
                    ')' => {
                        if let Some(found) = self.close_forward(at, BracketKind::Round)? {
                            return Ok(Some(found));
                        }
                    }
                    '<' => {
                        if is_template_bracket(&line, column) {
                            self.push(at, BracketKind::Angle);
                        } else {
                            debug!("'<' @{at} doesn't look like a template");
                        }
                    }
                    '>' => {
                        if !is_template_bracket(&line, column) {
                            debug!("'>' @{at} doesn't look like a template");
                        } else if let Some(found) = self.close_forward(at, BracketKind::Angle)? {
                            return Ok(Some(found));
                        }
                    }
                    ch if self.break_chars.contains(ch) && self.stack.is_empty() => {
                        self.breaks.push(at);
                    }
                    _ => {}
                }
            }
        }
        Ok(None)
    }

    fn push(&mut self, at: Position, kind: BracketKind) {
        debug!("push {kind:?} @{at}");
        self.stack.push(Delimiter { at, kind });
    }

    /// An opener met while walking backward: either it closes a nested
    /// range or, with nothing pending, it is the outer range's start.
    fn open_backward(
        &mut self,
        at: Position,
        kind: BracketKind,
    ) -> Result<Option<Delimiter>, LocateError> {
        let Some(pending) = self.stack.pop() else {
            debug!("found opening '{}' @{at}", kind.open_char());
            return Ok(Some(Delimiter { at, kind }));
        };
        debug!("pop {:?} @{}", pending.kind, pending.at);
        if pending.kind != kind {
            return Err(LocateError::Misbalanced {
                open: kind.open_char(),
                open_at: at,
                close: pending.kind.close_char(),
                close_at: pending.at,
            });
        }
        self.nested.push(Range::new(at, pending.at.next_column()));
        Ok(None)
    }

    /// A closer met while walking forward, mirror of `open_backward`
    fn close_forward(
        &mut self,
        at: Position,
        kind: BracketKind,
    ) -> Result<Option<Delimiter>, LocateError> {
        let Some(pending) = self.stack.pop() else {
            debug!("found closing '{}' @{at}", kind.close_char());
            return Ok(Some(Delimiter { at, kind }));
        };
        debug!("pop {:?} @{}", pending.kind, pending.at);
        if pending.kind != kind {
            return Err(LocateError::Misbalanced {
                open: pending.kind.open_char(),
                open_at: pending.at,
                close: kind.close_char(),
                close_at: at,
            });
        }
        self.nested.push(Range::new(pending.at, at.next_column()));
        Ok(None)
    }
}
