//! Byte stream -> token stream, tracking source line numbers.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::LexError;
use crate::token::{keyword_tag, Token, TokenTag};

pub struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.char_indices().peekable(),
            line: 1,
        }
    }

    /// Tokenizes the whole input, ending with a single `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.tag == TokenTag::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') => {
                    // might be the start of a /* ... */ block comment
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if matches!(lookahead.peek(), Some(&(_, '*'))) {
                        let start_line = self.line;
                        self.bump(); // '/'
                        self.bump(); // '*'
                        let mut closed = false;
                        while let Some(c) = self.bump() {
                            if c == '*' && self.peek_char() == Some('/') {
                                self.bump();
                                closed = true;
                                break;
                            }
                        }
                        if !closed {
                            return Err(LexError::new(start_line, "unterminated block comment"));
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace_and_comments()?;

        let line = self.line;
        let c = match self.peek_char() {
            None => return Ok(Token::new("", TokenTag::Eof, line)),
            Some(c) => c,
        };

        if c.is_ascii_digit() {
            return self.lex_number(line);
        }
        if c == '"' {
            return self.lex_string(line);
        }
        if c == '_' || c.is_alphabetic() {
            return Ok(self.lex_identifier(line));
        }

        self.lex_operator(line)
    }

    fn lex_number(&mut self, line: usize) -> Result<Token, LexError> {
        let mut lexeme = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                lexeme.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if self.peek_char() == Some('.') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if matches!(lookahead.peek(), Some(&(_, c)) if c.is_ascii_digit()) {
                lexeme.push('.');
                self.bump();
                while let Some(c) = self.peek_char() {
                    if c.is_ascii_digit() {
                        lexeme.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }
        let value: f64 = lexeme
            .parse()
            .map_err(|_| LexError::new(line, format!("malformed number literal '{}'", lexeme)))?;
        Ok(Token::new(lexeme, TokenTag::Number(value), line))
    }

    fn lex_string(&mut self, line: usize) -> Result<Token, LexError> {
        self.bump(); // opening quote
        let mut content = String::new();
        loop {
            match self.bump() {
                None => return Err(LexError::new(line, "unterminated string literal")),
                Some('"') => break,
                Some('\n') => {
                    return Err(LexError::new(line, "newline inside string literal"));
                }
                Some(c) => content.push(c),
            }
        }
        Ok(Token::new(content.clone(), TokenTag::String(content), line))
    }

    fn lex_identifier(&mut self, line: usize) -> Token {
        let mut lexeme = String::new();
        while let Some(c) = self.peek_char() {
            if c == '_' || c.is_alphanumeric() {
                lexeme.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let tag = keyword_tag(&lexeme).unwrap_or(TokenTag::Identifier);
        Token::new(lexeme, tag, line)
    }

    fn lex_operator(&mut self, line: usize) -> Result<Token, LexError> {
        let c = self.bump().expect("checked by caller");
        let two_char = |this: &mut Self, second: char, two: TokenTag, one: TokenTag| {
            if this.peek_char() == Some(second) {
                this.bump();
                two
            } else {
                one
            }
        };

        let tag = match c {
            '+' => TokenTag::Plus,
            '-' => {
                if self.peek_char() == Some('>') {
                    self.bump();
                    TokenTag::Arrow
                } else {
                    TokenTag::Minus
                }
            }
            '*' => TokenTag::Star,
            '/' => TokenTag::Slash,
            '%' => TokenTag::Percent,
            '=' => two_char(self, '=', TokenTag::EqEq, TokenTag::Assign),
            '!' => two_char(self, '=', TokenTag::NotEq, TokenTag::Bang),
            '<' => two_char(self, '=', TokenTag::LtEq, TokenTag::Lt),
            '>' => two_char(self, '=', TokenTag::GtEq, TokenTag::Gt),
            '&' if self.peek_char() == Some('&') => {
                self.bump();
                TokenTag::AndAnd
            }
            '|' if self.peek_char() == Some('|') => {
                self.bump();
                TokenTag::OrOr
            }
            '(' => TokenTag::LParen,
            ')' => TokenTag::RParen,
            '{' => TokenTag::LBrace,
            '}' => TokenTag::RBrace,
            ',' => TokenTag::Comma,
            ':' => TokenTag::Colon,
            ';' => TokenTag::Semicolon,
            other => {
                return Err(LexError::new(
                    line,
                    format!("unexpected character '{}'", other),
                ))
            }
        };
        Ok(Token::new(c.to_string(), tag, line))
    }
}

/// Convenience entry point: tokenizes `source` from scratch.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}
