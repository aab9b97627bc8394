use std::fmt;

/// A position in the source text. Both lines and columns start at 1.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub const START: SourceLocation = SourceLocation { line: 1, column: 1 };

    pub const fn new(line: u32, column: u32) -> SourceLocation {
        SourceLocation { line, column }
    }

    /// Attaches this location to the given value.
    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned {
            location: self,
            inner,
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        SourceLocation::START
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub location: SourceLocation,
    pub inner: T,
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.inner)
    }
}

impl<T: std::error::Error> std::error::Error for Spanned<T> {}

/// A classified, located unit of source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: TokenKind,
    /// Literal text. Numbers are normalized (hex decoded, implicit float
    /// digits filled in) and strings are unescaped.
    pub text: String,
    pub location: SourceLocation,
}

impl Lexeme {
    pub fn new(kind: TokenKind, text: impl Into<String>, location: SourceLocation) -> Lexeme {
        Lexeme {
            kind,
            text: text.into(),
            location,
        }
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == keyword
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier
            | TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::Operator
            | TokenKind::Keyword => write!(f, "{} '{}'", self.kind, self.text),
            TokenKind::StringLiteral => write!(f, "{} {:?}", self.kind, self.text),
            _ => self.kind.fmt(f),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    Operator,
    Keyword,
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Comma,
    Colon,
    Semicolon,
    /// Reserved for member access. Dots are scanned as operators first.
    MemberAccess,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::Identifier => "identifier",
            TokenKind::IntLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Operator => "operator",
            TokenKind::Keyword => "keyword",
            TokenKind::OpenParen => "'('",
            TokenKind::CloseParen => "')'",
            TokenKind::OpenBrace => "'{'",
            TokenKind::CloseBrace => "'}'",
            TokenKind::OpenBracket => "'['",
            TokenKind::CloseBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::MemberAccess => "'.'",
        })
    }
}

pub static KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    "fn",
    "let",
    "val",
    "var",
};

/// Identifier-shaped spellings that lex as operators.
pub static WORD_OPERATORS: phf::Set<&'static str> = phf::phf_set! {
    "export",
};

pub static OPERATORS_3: phf::Set<&'static str> = phf::phf_set! {
    "==>", "<<=", ">>=",
};

pub static OPERATORS_2: phf::Set<&'static str> = phf::phf_set! {
    "->", "=>", "==", "!=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=",
    "<=", ">=", "&&", "||", "<<", ">>",
};

pub static PUNCTUATION: phf::Map<char, TokenKind> = phf::phf_map! {
    '(' => TokenKind::OpenParen,
    ')' => TokenKind::CloseParen,
    '{' => TokenKind::OpenBrace,
    '}' => TokenKind::CloseBrace,
    '[' => TokenKind::OpenBracket,
    ']' => TokenKind::CloseBracket,
    ',' => TokenKind::Comma,
    ':' => TokenKind::Colon,
    ';' => TokenKind::Semicolon,
    '.' => TokenKind::MemberAccess,
};

pub fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '!' | '%' | '&' | '*' | '+' | '-' | '.' | '/' | '<' | '=' | '>' | '?' | '^' | '|' | '~'
    )
}
