//! Tokenizer for custom-style inlists.
//!
//! Words are runs of ASCII alphanumerics, `_` and the value punctuation
//! `.-[],()`. Quote characters open a quoted token only at a word boundary;
//! the token keeps its quotes so the typer can see them. `%` comments run to
//! the end of the line. Every other character is a token on its own.

use crate::domain::error::DomainError;

pub const COMMENT_CHAR: char = '%';
const QUOTE_CHARS: [char; 2] = ['\'', '"'];
const EXTRA_WORD_CHARS: &str = ".-[],()";

/// A lexical token and the line it starts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub line: usize,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Quoted,
    Punct,
}

pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || EXTRA_WORD_CHARS.contains(c)
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

enum State {
    Between,
    Word,
    Quote(char),
}

/// Split inlist text into tokens
pub fn tokenize(text: &str) -> Result<Vec<Token>, DomainError> {
    let mut tokens = Vec::new();
    let mut state = State::Between;
    let mut current = String::new();
    let mut start_line = 1;
    let mut line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Between => {
                if is_space(c) {
                    // nothing pending
                } else if c == COMMENT_CHAR {
                    skip_comment(&mut chars);
                } else if QUOTE_CHARS.contains(&c) {
                    current.push(c);
                    start_line = line;
                    state = State::Quote(c);
                } else if is_word_char(c) {
                    current.push(c);
                    start_line = line;
                    state = State::Word;
                } else {
                    tokens.push(Token {
                        text: c.to_string(),
                        line,
                        kind: TokenKind::Punct,
                    });
                }
            }
            State::Word => {
                if is_word_char(c) || QUOTE_CHARS.contains(&c) {
                    current.push(c);
                } else {
                    tokens.push(Token {
                        text: std::mem::take(&mut current),
                        line: start_line,
                        kind: TokenKind::Word,
                    });
                    state = State::Between;
                    if c == COMMENT_CHAR {
                        skip_comment(&mut chars);
                    } else if !is_space(c) {
                        tokens.push(Token {
                            text: c.to_string(),
                            line,
                            kind: TokenKind::Punct,
                        });
                    }
                }
            }
            State::Quote(q) => {
                current.push(c);
                if c == q {
                    tokens.push(Token {
                        text: std::mem::take(&mut current),
                        line: start_line,
                        kind: TokenKind::Quoted,
                    });
                    state = State::Between;
                }
            }
        }
        if c == '\n' {
            line += 1;
        }
    }

    match state {
        State::Quote(_) => Err(DomainError::unterminated_quote(start_line)),
        State::Word => {
            tokens.push(Token {
                text: current,
                line: start_line,
                kind: TokenKind::Word,
            });
            Ok(tokens)
        }
        State::Between => Ok(tokens),
    }
}

// Leaves the newline in place so line counting stays in one spot.
fn skip_comment<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) {
    while chars.next_if(|&c| c != '\n').is_some() {}
}
