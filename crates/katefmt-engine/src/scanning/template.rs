//! Local heuristic telling template angle brackets from operators.
//!
//! Only the characters around the bracket and the start of its line are
//! inspected. Shift operators in unusual spacing or angle brackets inside
//! complex expressions can be misclassified; the locator reports the
//! resulting imbalance instead of guessing.

/// Does the `<` or `>` at `column` of `line` look like a template bracket?
///
/// `column` counts characters. Returns `false` when the character at
/// `column` is not an angle bracket.
pub fn looks_like_template_angle_bracket(line: &str, column: usize) -> bool {
    let chars: Vec<char> = line.chars().collect();
    is_template_bracket(&chars, column)
}

pub(crate) fn is_template_bracket(line: &[char], column: usize) -> bool {
    let left = column
        .checked_sub(1)
        .and_then(|index| line.get(index))
        .copied();
    let right = line.get(column + 1).copied();

    match line.get(column) {
        Some('<') => {
            // `<<` anywhere on either side
            if left == Some('<') || right == Some('<') {
                return false;
            }
            // ` <=`
            if left == Some(' ') && right == Some('=') {
                return false;
            }
            let before: String = line[..column].iter().collect();
            if before.trim().starts_with("template") {
                return true;
            }
            // Bare ` < ` reads as a comparison
            !(left == Some(' ') && right == Some(' '))
        }
        Some('>') => {
            // Continuation line of a multi-line `<...>` closing construct
            if line.iter().find(|c| !c.is_whitespace()) == Some(&'>') {
                return true;
            }
            if left == Some(' ') && right == Some(' ') {
                return false;
            }
            // ` >=`
            if left == Some(' ') && right == Some('=') {
                return false;
            }
            // `->`
            left != Some('-')
        }
        _ => false,
    }
}
