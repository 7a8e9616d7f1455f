//! Error types for the three fatal failure modes of the interpreter.

use thiserror::Error;

/// A malformed token: unterminated string/comment or an unrecognized character.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {message}")]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

impl LexError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        LexError {
            line,
            message: message.into(),
        }
    }
}

/// A grammar, type, or scope violation discovered while parsing.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        ParseError {
            line,
            message: message.into(),
        }
    }
}

/// A failure discovered while evaluating an already-checked AST.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("channel closed")]
    ChannelClosed,

    #[error("socket I/O failure: {0}")]
    Io(String),

    #[error("cannot convert {value:?} to {target}")]
    Conversion { value: String, target: &'static str },

    #[error("undeclared identifier: {0}")]
    UndeclaredIdentifier(String),

    #[error("internal invariant breach: {0}")]
    Internal(String),
}

impl RuntimeError {
    pub fn conversion(value: impl Into<String>, target: &'static str) -> Self {
        RuntimeError::Conversion {
            value: value.into(),
            target,
        }
    }
}

/// Unifies the three fatal error kinds for the CLI's exit-code mapping.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MiniparError {
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl MiniparError {
    /// The CLI exit code this error maps to (spec §6).
    pub fn exit_code(&self) -> i32 {
        match self {
            MiniparError::Lex(_) => 1,
            MiniparError::Parse(_) => 2,
            MiniparError::Runtime(_) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_spec() {
        assert_eq!(MiniparError::from(LexError::new(1, "x")).exit_code(), 1);
        assert_eq!(MiniparError::from(ParseError::new(1, "x")).exit_code(), 2);
        assert_eq!(
            MiniparError::from(RuntimeError::DivisionByZero).exit_code(),
            3
        );
    }

    #[test]
    fn messages_include_line() {
        let e = LexError::new(7, "bad char");
        assert_eq!(e.to_string(), "line 7: bad char");
    }
}
