//! Lexical tokens produced by the lexer and consumed by the parser.

use std::fmt;

/// The closed set of lexical categories a [`Token`] can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenTag {
    Identifier,
    Number(f64),
    String(String),

    // type keywords
    KwNumber,
    KwString,
    KwBool,
    KwVoid,

    // reserved keywords
    KwFunc,
    KwIf,
    KwElse,
    KwWhile,
    KwBreak,
    KwContinue,
    KwReturn,
    KwTrue,
    KwFalse,
    KwPar,
    KwSeq,
    KwCChannel,
    KwSChannel,

    // operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
    Assign,
    Arrow,

    // punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,

    Eof,
}

impl fmt::Display for TokenTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenTag::Identifier => "IDENTIFIER",
            TokenTag::Number(_) => "NUMBER",
            TokenTag::String(_) => "STRING",
            TokenTag::KwNumber => "KW_NUMBER",
            TokenTag::KwString => "KW_STRING",
            TokenTag::KwBool => "KW_BOOL",
            TokenTag::KwVoid => "KW_VOID",
            TokenTag::KwFunc => "KW_FUNC",
            TokenTag::KwIf => "KW_IF",
            TokenTag::KwElse => "KW_ELSE",
            TokenTag::KwWhile => "KW_WHILE",
            TokenTag::KwBreak => "KW_BREAK",
            TokenTag::KwContinue => "KW_CONTINUE",
            TokenTag::KwReturn => "KW_RETURN",
            TokenTag::KwTrue => "KW_TRUE",
            TokenTag::KwFalse => "KW_FALSE",
            TokenTag::KwPar => "KW_PAR",
            TokenTag::KwSeq => "KW_SEQ",
            TokenTag::KwCChannel => "KW_C_CHANNEL",
            TokenTag::KwSChannel => "KW_S_CHANNEL",
            TokenTag::Plus => "PLUS",
            TokenTag::Minus => "MINUS",
            TokenTag::Star => "STAR",
            TokenTag::Slash => "SLASH",
            TokenTag::Percent => "PERCENT",
            TokenTag::EqEq => "EQ_EQ",
            TokenTag::NotEq => "NOT_EQ",
            TokenTag::Lt => "LT",
            TokenTag::LtEq => "LT_EQ",
            TokenTag::Gt => "GT",
            TokenTag::GtEq => "GT_EQ",
            TokenTag::AndAnd => "AND_AND",
            TokenTag::OrOr => "OR_OR",
            TokenTag::Bang => "BANG",
            TokenTag::Assign => "ASSIGN",
            TokenTag::Arrow => "ARROW",
            TokenTag::LParen => "LPAREN",
            TokenTag::RParen => "RPAREN",
            TokenTag::LBrace => "LBRACE",
            TokenTag::RBrace => "RBRACE",
            TokenTag::Comma => "COMMA",
            TokenTag::Colon => "COLON",
            TokenTag::Semicolon => "SEMICOLON",
            TokenTag::Eof => "EOF",
        };
        f.write_str(name)
    }
}

/// A single lexeme with its category and originating source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub lexeme: String,
    pub tag: TokenTag,
    pub line: usize,
}

impl Token {
    pub fn new(lexeme: impl Into<String>, tag: TokenTag, line: usize) -> Self {
        Token {
            lexeme: lexeme.into(),
            tag,
            line,
        }
    }
}

impl fmt::Display for Token {
    /// Matches the token dump format: `({lexeme, TAG}, line) | line: N`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({{{}, {}}}, {}) | line: {}",
            self.lexeme, self.tag, self.line, self.line
        )
    }
}

/// Maps a reserved-word lexeme to its keyword tag, if any.
pub fn keyword_tag(word: &str) -> Option<TokenTag> {
    Some(match word {
        "number" => TokenTag::KwNumber,
        "string" => TokenTag::KwString,
        "bool" => TokenTag::KwBool,
        "void" => TokenTag::KwVoid,
        "func" => TokenTag::KwFunc,
        "if" => TokenTag::KwIf,
        "else" => TokenTag::KwElse,
        "while" => TokenTag::KwWhile,
        "break" => TokenTag::KwBreak,
        "continue" => TokenTag::KwContinue,
        "return" => TokenTag::KwReturn,
        "true" => TokenTag::KwTrue,
        "false" => TokenTag::KwFalse,
        "par" => TokenTag::KwPar,
        "seq" => TokenTag::KwSeq,
        "c_channel" => TokenTag::KwCChannel,
        "s_channel" => TokenTag::KwSChannel,
        _ => return None,
    })
}
