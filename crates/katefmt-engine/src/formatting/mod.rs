/*!
 * # Parameter Formatting
 *
 * Boost-style layout of the parameter list (or template argument list)
 * around the cursor:
 *
 * ```text
 * foo(a, b, c)      foo(
 *                       a
 *              <=>    , b
 *                     , c
 *                   )
 * ```
 *
 * [`boost_format`] expands the innermost enclosing list, [`boost_unformat`]
 * joins it back onto one line. Both edit through the host traits inside a
 * single transaction and leave the document untouched when the result
 * would be identical.
 */

pub mod params;

use log::debug;

use crate::actions::{ActionError, Outcome};
use crate::editing::host::{char_slice, indentation_width};
use crate::editing::{EditorView, Range, TextDocument};
use crate::scanning::{BreakChars, RangeTopology, locate};

pub use params::{collapse_text, expand_text};

/// Lay the list around the cursor out one item per line
pub fn boost_format<V>(view: &mut V) -> Result<Outcome, ActionError>
where
    V: EditorView,
{
    let topology = locate_list(view)?;
    let inner = topology.range;
    if topology.breaks.is_empty() && view.text(inner).trim().is_empty() {
        return Ok(Outcome::Unchanged);
    }

    let indent = list_indentation(view, &topology);
    let replacement = expand_text(view, inner, &topology.breaks, indent);
    debug!("boost_format {inner} with indent {indent}");
    Ok(replace_if_changed(view, inner, &replacement))
}

/// Join the list around the cursor back onto one line
pub fn boost_unformat<V>(view: &mut V) -> Result<Outcome, ActionError>
where
    V: EditorView,
{
    let inner = locate_list(view)?.range;
    let replacement = collapse_text(&view.text(inner));
    debug!("boost_unformat {inner}");
    Ok(replace_if_changed(view, inner, &replacement))
}

/// Locate the list to format; `for` headers are rescanned with `;` as an
/// additional separator.
fn locate_list<D>(view: &D) -> Result<RangeTopology, ActionError>
where
    D: EditorView + ?Sized,
{
    let cursor = view.cursor_position();
    let topology =
        locate(view, cursor, BreakChars::Commas)?.ok_or(ActionError::NothingToFormat)?;
    if !opens_for_header(view, &topology) {
        return Ok(topology);
    }
    debug!("for header at {}", topology.open_position());
    locate(view, cursor, BreakChars::CommasAndSemicolons)?.ok_or(ActionError::NothingToFormat)
}

fn opens_for_header<D>(document: &D, topology: &RangeTopology) -> bool
where
    D: TextDocument + ?Sized,
{
    let open = topology.open_position();
    let line = document.line(open.line).unwrap_or_default();
    let before = char_slice(&line, 0, open.column);
    before.trim_end().strip_suffix("for").is_some_and(|head| {
        !head
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
    })
}

/// Indentation of the line holding the opening bracket; a line that starts
/// with a leading separator counts the separator too.
fn list_indentation<D>(document: &D, topology: &RangeTopology) -> usize
where
    D: TextDocument + ?Sized,
{
    let line = document
        .line(topology.range.start.line)
        .unwrap_or_default();
    let indent = indentation_width(&line);
    if line.trim_start().starts_with(", ") {
        indent + 2
    } else {
        indent
    }
}

fn replace_if_changed<V>(view: &mut V, range: Range, replacement: &str) -> Outcome
where
    V: EditorView,
{
    if view.text(range) == replacement {
        return Outcome::Unchanged;
    }
    view.transaction(|view| view.replace(range, replacement));
    Outcome::Applied
}
