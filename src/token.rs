use std::collections::HashMap;

use once_cell::sync::Lazy;

/// The kind of a lexical token. Carries no payload; the literal text lives
/// alongside it in [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,

    Ident,
    Int,
    Str,

    Assign,
    Plus,
    Minus,
    Bang,
    Asterisk,
    Slash,
    Percent,

    PlusAssign,
    MinusAssign,
    AsteriskAssign,
    SlashAssign,
    PercentAssign,

    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    NotEq,

    Comma,
    Semicolon,
    Colon,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Function,
    Let,
    Return,
    If,
    Else,
    True,
    False,
    Null,
    While,
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>) -> Self {
        Self {
            kind,
            literal: literal.into(),
        }
    }
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("fn", TokenKind::Function);
    m.insert("let", TokenKind::Let);
    m.insert("return", TokenKind::Return);
    m.insert("if", TokenKind::If);
    m.insert("else", TokenKind::Else);
    m.insert("true", TokenKind::True);
    m.insert("false", TokenKind::False);
    m.insert("null", TokenKind::Null);
    m.insert("while", TokenKind::While);
    m.insert("break", TokenKind::Break);
    m.insert("continue", TokenKind::Continue);
    m
});

/// Resolves an identifier-shaped lexeme to a keyword kind, falling back to
/// `Ident` when it isn't one of the reserved words.
pub fn lookup_ident(ident: &str) -> TokenKind {
    KEYWORDS.get(ident).copied().unwrap_or(TokenKind::Ident)
}
