//! Tokenizer for the ssh-requested command string.
//!
//! This is deliberately not a shell: no expansion, no substitution, no
//! globbing. Plain spaces separate tokens, single quotes are literal
//! spans, double quotes allow `\"` escapes, and quoted spans concatenate
//! with adjacent literal spans into a single token (`a"b c"d` is `ab cd`).

use thiserror::Error;

/// Errors from [`tokenize`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenizeError {
    /// A single or double quote was opened and never closed.
    #[error("invalid command: unclosed quote")]
    UnclosedQuote,

    /// The command string contains no tokens at all.
    #[error("invalid command: empty command")]
    EmptyCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Spaces,
    Literal,
    SingleQuote,
    DoubleQuote,
    DoubleQuoteEscape,
}

/// Split a command string into an argument vector.
///
/// The first token is the verb, the rest are its arguments. An
/// unterminated quote fails the whole command; there are no partial
/// results.
pub fn tokenize(command: &str) -> Result<Vec<String>, TokenizeError> {
    let mut state = State::Spaces;
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in command.chars() {
        state = match state {
            State::Spaces => match c {
                ' ' => State::Spaces,
                '\'' => State::SingleQuote,
                '"' => State::DoubleQuote,
                _ => {
                    current.push(c);
                    State::Literal
                }
            },
            State::Literal => match c {
                ' ' => {
                    tokens.push(std::mem::take(&mut current));
                    State::Spaces
                }
                '\'' => State::SingleQuote,
                '"' => State::DoubleQuote,
                _ => {
                    current.push(c);
                    State::Literal
                }
            },
            State::SingleQuote => match c {
                '\'' => State::Literal,
                _ => {
                    current.push(c);
                    State::SingleQuote
                }
            },
            State::DoubleQuote => match c {
                '"' => State::Literal,
                '\\' => State::DoubleQuoteEscape,
                _ => {
                    current.push(c);
                    State::DoubleQuote
                }
            },
            State::DoubleQuoteEscape => {
                current.push(c);
                State::DoubleQuote
            }
        };
    }

    match state {
        State::Spaces => {}
        State::Literal => tokens.push(current),
        State::SingleQuote | State::DoubleQuote | State::DoubleQuoteEscape => {
            return Err(TokenizeError::UnclosedQuote);
        }
    }

    if tokens.is_empty() {
        return Err(TokenizeError::EmptyCommand);
    }

    Ok(tokens)
}
