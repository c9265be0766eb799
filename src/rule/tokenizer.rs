//! Rule text tokenizer

use std::fmt;

/// Lexical token of a rule expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    OpenParen,
    CloseParen,
    And,
    Or,
    /// Field name, comparator symbol or literal value
    Word(&'a str),
}

impl<'a> Token<'a> {
    pub fn as_str(&self) -> &'a str {
        match *self {
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::And => "AND",
            Token::Or => "OR",
            Token::Word(word) => word,
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split rule text into tokens.
///
/// Parentheses always stand alone; everything else is split on whitespace.
/// No quoting is understood, so a literal can never contain a space.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();

    for fragment in text.split_whitespace() {
        let mut rest = fragment;
        while let Some(pos) = rest.find(|c: char| c == '(' || c == ')') {
            if pos > 0 {
                tokens.push(classify(&rest[..pos]));
            }
            tokens.push(if rest.as_bytes()[pos] == b'(' {
                Token::OpenParen
            } else {
                Token::CloseParen
            });
            rest = &rest[pos + 1..];
        }
        if !rest.is_empty() {
            tokens.push(classify(rest));
        }
    }

    tokens
}

fn classify(word: &str) -> Token<'_> {
    match word {
        "AND" => Token::And,
        "OR" => Token::Or,
        _ => Token::Word(word),
    }
}
