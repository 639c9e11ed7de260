//! Word expansion.
//!
//! The word before the cursor names an expansion; an optional `(...)`
//! argument list right after the word (or right before the cursor) is
//! parsed into positional and `key=value` arguments. The expansion's text
//! replaces word and arguments in one edit.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use log::debug;
use regex::{Captures, Regex};

use crate::actions::{ActionError, IndentSettings, Outcome};
use crate::editing::host::{end_of_insertion, indentation_width};
use crate::editing::{EditorView, Position, Range, TextDocument};

/// Marks where the cursor goes in an expansion's text
pub const CURSOR_MARKER: &str = "%{cursor}";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Expansion \"{0}\" not found")]
    UnknownExpansion(String),

    #[error("Expansion argument \"{0}\" is missing")]
    MissingArgument(String),

    #[error("Expansion \"{name}\" failed: {reason}")]
    Failed { name: String, reason: String },
}

/// Arguments given to an expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    pub positional: Vec<String>,
    pub named: BTreeMap<String, String>,
}

impl Arguments {
    /// Argument by position (`"0"`, `"1"`, ...) or by name
    pub fn get(&self, key: &str) -> Option<&str> {
        match key.parse::<usize>() {
            Ok(index) => self.positional.get(index).map(String::as_str),
            Err(_) => self.named.get(key).map(String::as_str),
        }
    }
}

/// Produces replacement text from arguments
pub trait Expansion {
    fn expand(&self, arguments: &Arguments) -> Result<String, String>;
}

impl<F> Expansion for F
where
    F: Fn(&Arguments) -> Result<String, String>,
{
    fn expand(&self, arguments: &Arguments) -> Result<String, String> {
        self(arguments)
    }
}

/// Text with `{0}`, `{1}`, `{name}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(pub String);

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_REGEX
        .get_or_init(|| Regex::new(r"(%?)\{(\w+)\}").expect("Invalid placeholder regex"))
}

impl Expansion for Template {
    fn expand(&self, arguments: &Arguments) -> Result<String, String> {
        let mut missing = None;
        let text = placeholder_regex().replace_all(&self.0, |caps: &Captures<'_>| {
            // `%{cursor}` and friends are markers, not placeholders
            if !caps[1].is_empty() {
                return caps[0].to_string();
            }
            match arguments.get(&caps[2]) {
                Some(value) => value.to_string(),
                None => {
                    missing.get_or_insert_with(|| caps[2].to_string());
                    String::new()
                }
            }
        });
        match missing {
            Some(name) => Err(ExpandError::MissingArgument(name).to_string()),
            None => Ok(text.into_owned()),
        }
    }
}

/// Name to expansion registry
#[derive(Default)]
pub struct Expansions {
    entries: BTreeMap<String, Box<dyn Expansion + Send + Sync>>,
}

impl fmt::Debug for Expansions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

impl Expansions {
    pub fn register(
        &mut self,
        name: impl Into<String>,
        expansion: impl Expansion + Send + Sync + 'static,
    ) {
        self.entries.insert(name.into(), Box::new(expansion));
    }

    pub fn get(&self, name: &str) -> Option<&(dyn Expansion + Send + Sync)> {
        self.entries.get(name).map(|expansion| expansion.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Expansions
where
    K: Into<String>,
    V: Into<String>,
{
    /// Templates from name/text pairs
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut expansions = Self::default();
        for (name, text) in iter {
            expansions.register(name, Template(text.into()));
        }
        expansions
    }
}

fn is_word_boundary(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t'
            | '"'
            | '\''
            | ';'
            | '['
            | ']'
            | '{'
            | '}'
            | '('
            | ')'
            | '#'
            | ':'
            | '/'
            | '\\'
            | ','
            | '+'
            | '='
            | '!'
            | '?'
            | '%'
            | '^'
            | '|'
            | '&'
            | '*'
            | '~'
            | '`'
    )
}

/// Column span `start..end` of the word at or right before `column`
pub fn word_at(line: &str, column: usize) -> (usize, usize) {
    let chars: Vec<char> = line.chars().collect();
    let column = column.min(chars.len());

    let mut start = column;
    if start == chars.len() || is_word_boundary(chars[start]) {
        // Cursor right after the word
        if start == 0 {
            return (0, 0);
        }
        start -= 1;
        if is_word_boundary(chars[start]) {
            return (column, column);
        }
    }
    while start > 0 && !is_word_boundary(chars[start - 1]) {
        start -= 1;
    }

    let mut end = column;
    while end < chars.len() && !is_word_boundary(chars[end]) {
        end += 1;
    }
    (start, end)
}

/// Which way [`matching_parenthesis`] scans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From an opening `(` to its `)`
    Forward,
    /// From a closing `)` to its `(`
    Backward,
}

/// Position of the parenthesis matching the one at `at`.
///
/// Scanning forward, the result is the position right after the `)`;
/// scanning backward it is the position of the `(`. Parentheses inside
/// quoted strings are skipped; a string may not span lines.
pub fn matching_parenthesis<D>(
    document: &D,
    at: Position,
    direction: Direction,
) -> Result<Position, ExpandError>
where
    D: TextDocument + ?Sized,
{
    let (opening, closing) = match direction {
        Direction::Forward => ('(', ')'),
        Direction::Backward => (')', '('),
    };

    let mut line: Vec<char> = line_chars(document, at.line)?;
    let mut position = at;
    let mut level = 0usize;
    let mut quote: Option<char> = None;
    loop {
        if let Some(&ch) = line.get(position.column) {
            match quote {
                Some(open_quote) => {
                    if ch == open_quote {
                        quote = None;
                    }
                }
                None if ch == opening => level += 1,
                None if ch == closing => {
                    level = level.saturating_sub(1);
                    if level == 0 {
                        return Ok(match direction {
                            Direction::Forward => position.next_column(),
                            Direction::Backward => position,
                        });
                    }
                }
                None if ch == '"' || ch == '\'' => quote = Some(ch),
                None => {}
            }
        }

        // Step to the next character, crossing line ends
        let stepped = match direction {
            Direction::Forward if position.column + 1 < line.len() => Some(position.next_column()),
            Direction::Backward if position.column > 0 => {
                Some(position.with_column(position.column - 1))
            }
            _ => None,
        };
        if let Some(stepped) = stepped {
            position = stepped;
            continue;
        }
        if let Some(open_quote) = quote {
            return Err(ExpandError::Parse(format!(
                "end of line while searching for {open_quote}"
            )));
        }
        let next_line = match direction {
            Direction::Forward => position.line + 1,
            Direction::Backward => position
                .line
                .checked_sub(1)
                .ok_or_else(|| ExpandError::Parse("end of file reached".to_string()))?,
        };
        line = line_chars(document, next_line)?;
        let column = match direction {
            Direction::Forward => 0,
            Direction::Backward => line.len().saturating_sub(1),
        };
        position = Position::new(next_line, column);
    }
}

fn line_chars<D>(document: &D, index: usize) -> Result<Vec<char>, ExpandError>
where
    D: TextDocument + ?Sized,
{
    document
        .line(index)
        .map(|line| line.chars().collect())
        .ok_or_else(|| ExpandError::Parse("end of file reached".to_string()))
}

/// Range of the word before `cursor` and of its `( ... )` argument list,
/// which either follows the word or ends right before the cursor
pub fn word_and_argument_ranges<D>(
    document: &D,
    cursor: Position,
) -> Result<(Range, Option<Range>), ExpandError>
where
    D: TextDocument + ?Sized,
{
    let mut anchor = cursor;
    let mut arguments = None;

    let line = document.line(cursor.line).unwrap_or_default();
    let before_cursor = cursor
        .column
        .checked_sub(1)
        .and_then(|index| line.chars().nth(index));
    if before_cursor == Some(')') {
        let close = cursor.with_column(cursor.column - 1);
        let open = matching_parenthesis(document, close, Direction::Backward)?;
        arguments = Some(Range::new(open, cursor));
        anchor = open;
    }

    let line = document.line(anchor.line).unwrap_or_default();
    let (start, end) = word_at(&line, anchor.column);
    let word = Range::new(anchor.with_column(start), anchor.with_column(end));

    if arguments.is_none() && start < end && line.chars().nth(end) == Some('(') {
        let open = anchor.with_column(end);
        let close = matching_parenthesis(document, open, Direction::Forward)?;
        arguments = Some(Range::new(open, close));
    }
    Ok((word, arguments))
}

/// Parse `(a, b, key=value)` into arguments; empty items are dropped
pub fn parse_arguments(text: &str) -> Arguments {
    let inner = text.trim();
    let inner = inner.strip_prefix('(').unwrap_or(inner);
    let inner = inner.strip_suffix(')').unwrap_or(inner);

    let mut arguments = Arguments::default();
    for item in inner.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        match item.split_once('=') {
            Some((key, value)) => {
                arguments
                    .named
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
            None => arguments.positional.push(item.to_string()),
        }
    }
    arguments
}

/// Leading tabs of continuation lines become indentation units
fn convert_leading_tabs(text: &str, unit: &str) -> String {
    let mut lines = text.split('\n');
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push('\n');
        let body = line.trim_start_matches([' ', '\t']);
        let leading = &line[..line.len() - body.len()];
        for ch in leading.chars() {
            if ch == '\t' {
                out.push_str(unit);
            } else {
                out.push(ch);
            }
        }
        out.push_str(body);
    }
    out
}

/// Expand the word before the cursor
pub fn expand_at_cursor<V: EditorView>(
    view: &mut V,
    expansions: &Expansions,
    indent: &IndentSettings,
) -> Result<Outcome, ActionError> {
    let cursor = view.cursor_position();
    let (word_range, argument_range) = word_and_argument_ranges(view, cursor)?;
    let word = view.text(word_range);
    let expansion = expansions
        .get(&word)
        .ok_or_else(|| ExpandError::UnknownExpansion(word.clone()))?;
    let arguments = argument_range
        .map(|range| parse_arguments(&view.text(range)))
        .unwrap_or_default();
    debug!("expanding {word} with {arguments:?}");

    let text = expansion.expand(&arguments).map_err(|reason| ExpandError::Failed {
        name: word.clone(),
        reason,
    })?;

    let line = view.line(word_range.start.line).unwrap_or_default();
    let leading: String = line.chars().take(indentation_width(&line)).collect();
    let text = convert_leading_tabs(&text, &indent.unit()).replace('\n', &format!("\n{leading}"));

    let (text, cursor_offset) = match text.find(CURSOR_MARKER) {
        Some(index) => (text.replacen(CURSOR_MARKER, "", 1), Some(index)),
        None => (text, None),
    };

    let replaced = Range::new(
        word_range.start,
        argument_range.map_or(word_range.end, |range| range.end),
    );
    view.transaction(|view| {
        view.replace(replaced, &text);
        if let Some(offset) = cursor_offset {
            view.set_cursor_position(end_of_insertion(word_range.start, &text[..offset]));
        }
    });
    Ok(Outcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::Document;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn pos(line: usize, column: usize) -> Position {
        Position::new(line, column)
    }

    fn doc_at(text: &str, line: usize, column: usize) -> Document {
        let mut doc = Document::from_text(text);
        doc.set_cursor_position(pos(line, column));
        doc
    }

    fn fori() -> Expansions {
        [(
            "fori",
            "for (int {0} = 0; {0} < {1}; ++{0})\n{\n\t%{cursor}\n}",
        )]
        .into_iter()
        .collect()
    }

    #[rstest]
    #[case("foo bar", 3, (0, 3))]
    #[case("foo bar", 5, (4, 7))]
    #[case("foo bar", 7, (4, 7))]
    #[case("  x.size()", 10, (10, 10))]
    #[case("call(arg", 8, (5, 8))]
    #[case("", 0, (0, 0))]
    #[case("a::b", 4, (3, 4))]
    fn word_spans(#[case] line: &str, #[case] column: usize, #[case] expected: (usize, usize)) {
        assert_eq!(word_at(line, column), expected);
    }

    #[test]
    fn matches_forward_across_lines_and_quotes() {
        let doc = Document::from_text("f(a, \")\",\n  g(b))");
        assert_eq!(
            matching_parenthesis(&doc, pos(0, 1), Direction::Forward),
            Ok(pos(1, 7))
        );
    }

    #[test]
    fn matches_backward() {
        let doc = Document::from_text("x = f(a, (b))");
        assert_eq!(
            matching_parenthesis(&doc, pos(0, 12), Direction::Backward),
            Ok(pos(0, 5))
        );
    }

    #[test]
    fn unbalanced_parenthesis_hits_end_of_file() {
        let doc = Document::from_text("f(a,\n\nb");
        assert_eq!(
            matching_parenthesis(&doc, pos(0, 1), Direction::Forward),
            Err(ExpandError::Parse("end of file reached".into()))
        );
    }

    #[test]
    fn unterminated_quote_fails_at_line_end() {
        let doc = Document::from_text("f(\"a)\nb)");
        assert_eq!(
            matching_parenthesis(&doc, pos(0, 1), Direction::Forward),
            Err(ExpandError::Parse("end of line while searching for \"".into()))
        );
    }

    #[test]
    fn argument_list_after_word() {
        let doc = Document::from_text("fori(i, n)");
        let (word, arguments) = word_and_argument_ranges(&doc, pos(0, 2)).unwrap();
        assert_eq!(word, Range::new(pos(0, 0), pos(0, 4)));
        assert_eq!(arguments, Some(Range::new(pos(0, 4), pos(0, 10))));
    }

    #[test]
    fn argument_list_before_cursor() {
        let doc = Document::from_text("  fori(i, n)");
        let (word, arguments) = word_and_argument_ranges(&doc, pos(0, 12)).unwrap();
        assert_eq!(word, Range::new(pos(0, 2), pos(0, 6)));
        assert_eq!(arguments, Some(Range::new(pos(0, 6), pos(0, 12))));
    }

    #[test]
    fn parses_positional_and_named_arguments() {
        let arguments = parse_arguments("(i, , n, step = 2)");
        assert_eq!(arguments.positional, vec!["i", "n"]);
        assert_eq!(arguments.get("step"), Some("2"));
        assert_eq!(arguments.get("1"), Some("n"));
        assert_eq!(arguments.get("2"), None);
    }

    #[test]
    fn template_fills_placeholders_and_keeps_markers() {
        let template = Template("{0} < {max}; %{cursor}".into());
        let arguments = parse_arguments("(i, max=n)");
        assert_eq!(template.expand(&arguments), Ok("i < n; %{cursor}".into()));
        assert_eq!(
            template.expand(&Arguments::default()),
            Err("Expansion argument \"0\" is missing".into())
        );
    }

    #[test]
    fn expands_template_with_indent_and_cursor() {
        let mut doc = doc_at("    fori(i, n)\nrest", 0, 6);
        let outcome = expand_at_cursor(&mut doc, &fori(), &IndentSettings::default()).unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(
            doc.text_content(),
            "    for (int i = 0; i < n; ++i)\n    {\n        \n    }\nrest"
        );
        assert_eq!(doc.cursor_position(), pos(2, 8));
        assert_eq!(doc.undo_depth(), 1);
    }

    #[test]
    fn closure_expansion_without_arguments() {
        let mut expansions = Expansions::default();
        expansions.register("now", |_: &Arguments| Ok::<_, String>("2024".to_string()));
        let mut doc = doc_at("year = now;", 0, 10);
        expand_at_cursor(&mut doc, &expansions, &IndentSettings::default()).unwrap();
        assert_eq!(doc.text_content(), "year = 2024;");
    }

    #[test]
    fn unknown_word_is_an_error() {
        let mut doc = doc_at("nope", 0, 4);
        let err = expand_at_cursor(&mut doc, &fori(), &IndentSettings::default()).unwrap_err();
        assert_eq!(err.to_string(), "Expansion \"nope\" not found");
        assert_eq!(doc.text_content(), "nope");
    }

    #[test]
    fn failing_expansion_reports_name() {
        let mut doc = doc_at("fori", 0, 4);
        let err = expand_at_cursor(&mut doc, &fori(), &IndentSettings::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expansion \"fori\" failed: Expansion argument \"0\" is missing"
        );
    }

    #[test]
    fn tabs_follow_indent_unit() {
        let unit = IndentSettings {
            width: 2,
            use_tabs: false,
        }
        .unit();
        assert_eq!(convert_leading_tabs("a\n\t\tb\n \tc", &unit), "a\n    b\n   c");
    }
}
