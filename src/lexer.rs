//! Lexical analysis of a single input line.
//!
//! The grammar is deliberately flat: tokens are maximal runs of characters
//! other than the space character. There is no quoting, escaping, or
//! substitution, so a token never spans a space.

use crate::command::ParsedInput;
use log::trace;

const DELIMITER: char = ' ';

/// Splits `line` into whitespace-delimited tokens.
///
/// Runs of spaces collapse, leading and trailing spaces are ignored, and an
/// empty or all-space line yields a [`ParsedInput`] with no tokens. The token
/// vector grows as needed and has no fixed capacity limit.
///
/// A trailing line terminator (`\n` or `\r\n`) is stripped before splitting.
pub fn split_into_tokens(line: &str) -> ParsedInput {
    let line = line.trim_end_matches(['\n', '\r']);
    let tokens: Vec<String> = line
        .split(DELIMITER)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect();
    trace!("tokenized {:?} into {:?}", line, tokens);
    ParsedInput::new(tokens)
}
