use tracing::debug;

use crate::{
    source::Cursor,
    token::{
        is_operator_char, Lexeme, SourceLocation, Spanned, TokenKind, KEYWORDS, OPERATORS_2,
        OPERATORS_3, PUNCTUATION, WORD_OPERATORS,
    },
};

pub const SUGGESTED_LEXEMES_CAPACITY: usize = 1_024;

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Lexes the provided string with the default options.
pub fn lex(src: &str) -> Result<Vec<Lexeme>> {
    lex_with(src, &Options::default())
}

pub fn lex_with(src: &str, options: &Options) -> Result<Vec<Lexeme>> {
    let lexemes = Lexer::new(src, *options).lex()?;
    debug!(lexemes = lexemes.len(), "lexed source");
    Ok(lexemes)
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub decimal_points: DecimalPoints,
}

/// What to do with a second decimal point inside a float literal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DecimalPoints {
    /// End the number before the second point; the point starts a new lexeme.
    #[default]
    Terminate,
    /// Fail with [`Error::RepeatedDecimalPoint`].
    Reject,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unknown escape sequence '\\{0}'")]
    UnknownEscape(char),
    #[error("malformed number literal '{0}'")]
    MalformedNumber(Box<str>),
    #[error("number literal '{0}' is out of range")]
    NumberOutOfRange(Box<str>),
    #[error("repeated decimal point in number literal '{0}'")]
    RepeatedDecimalPoint(Box<str>),
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
}

/// Scanning rules, in priority order. The first rule whose predicate holds at
/// the cursor scans the next lexeme.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Rule {
    BlockComment,
    LineComment,
    Identifier,
    String,
    Number,
    Operator,
    Punctuation,
}

impl Rule {
    const ORDER: [Rule; 7] = [
        Rule::BlockComment,
        Rule::LineComment,
        Rule::Identifier,
        Rule::String,
        Rule::Number,
        Rule::Operator,
        Rule::Punctuation,
    ];

    fn applies(self, cursor: &Cursor<'_>) -> bool {
        let Some(c) = cursor.peek() else {
            return false;
        };
        match self {
            Rule::BlockComment => cursor.starts_with("/*"),
            Rule::LineComment => cursor.starts_with("//"),
            Rule::Identifier => c.is_ascii_alphabetic() || c == '_',
            Rule::String => matches!(c, '"' | '\''),
            Rule::Number => {
                c.is_ascii_digit()
                    || (c == '.' && cursor.peek_nth(1).is_some_and(|d| d.is_ascii_digit()))
            }
            Rule::Operator => is_operator_char(c),
            Rule::Punctuation => PUNCTUATION.contains_key(&c),
        }
    }
}

struct Lexer<'src> {
    cursor: Cursor<'src>,
    options: Options,
    start: SourceLocation,
    lexemes: Vec<Lexeme>,
}

impl Lexer<'_> {
    fn new(src: &str, options: Options) -> Lexer<'_> {
        Lexer {
            cursor: Cursor::new(src),
            options,
            start: SourceLocation::START,
            lexemes: Vec::with_capacity(SUGGESTED_LEXEMES_CAPACITY),
        }
    }

    /// Scans until the input is exhausted or the first error.
    fn lex(mut self) -> Result<Vec<Lexeme>> {
        loop {
            self.cursor.skip_while(char::is_whitespace);
            let Some(c) = self.cursor.peek() else {
                break;
            };
            self.start = self.cursor.location();
            let Some(rule) = Rule::ORDER.into_iter().find(|r| r.applies(&self.cursor)) else {
                return Err(self.error(Error::UnexpectedChar(c)));
            };
            if let Some(lexeme) = self.scan(rule)? {
                self.lexemes.push(lexeme);
            }
        }
        Ok(self.lexemes)
    }

    fn scan(&mut self, rule: Rule) -> Result<Option<Lexeme>> {
        match rule {
            Rule::BlockComment => self.block_comment().map(|()| None),
            Rule::LineComment => {
                self.cursor.skip_while(|c| c != '\n');
                Ok(None)
            }
            Rule::Identifier => Ok(Some(self.identifier())),
            Rule::String => self.string().map(Some),
            Rule::Number => self.number().map(Some),
            Rule::Operator => Ok(Some(self.operator())),
            Rule::Punctuation => Ok(self.punctuation()),
        }
    }

    fn block_comment(&mut self) -> Result<()> {
        self.cursor.skip(2);
        loop {
            if self.cursor.starts_with("*/") {
                self.cursor.skip(2);
                return Ok(());
            }
            if self.cursor.read().is_none() {
                return Err(self.error(Error::UnterminatedComment));
            }
        }
    }

    fn identifier(&mut self) -> Lexeme {
        let text = self
            .cursor
            .take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let kind = if KEYWORDS.contains(text) {
            TokenKind::Keyword
        } else if WORD_OPERATORS.contains(text) {
            TokenKind::Operator
        } else {
            TokenKind::Identifier
        };
        self.produce(kind, text)
    }

    /// Scans a string delimited by either quote character, decoding escapes
    /// as it goes.
    fn string(&mut self) -> Result<Lexeme> {
        let Some(delimiter) = self.cursor.read() else {
            return Err(self.error(Error::UnterminatedString));
        };
        let mut text = String::new();
        loop {
            match self.cursor.read() {
                None => return Err(self.error(Error::UnterminatedString)),
                Some(c) if c == delimiter => break,
                Some('\\') => {
                    let escape_location = self.cursor.location();
                    let Some(escaped) = self.cursor.read() else {
                        return Err(self.error(Error::UnterminatedString));
                    };
                    let Some(decoded) = unescape(escaped) else {
                        return Err(escape_location.wrap(Error::UnknownEscape(escaped)));
                    };
                    text.push(decoded);
                }
                Some(c) => text.push(c),
            }
        }
        Ok(self.produce(TokenKind::StringLiteral, text))
    }

    fn number(&mut self) -> Result<Lexeme> {
        if self.cursor.starts_with("0x") {
            return self.hex_number();
        }

        let mut text = String::new();
        let mut is_float = false;
        while let Some(c) = self.cursor.peek() {
            match c {
                '0'..='9' => {
                    text.push(c);
                    self.cursor.skip(1);
                }
                '.' if !is_float => {
                    self.cursor.skip(1);
                    is_float = true;
                    if text.is_empty() {
                        text.push('0');
                    }
                    text.push('.');
                    // A trailing point closes the literal.
                    if !self.cursor.peek().is_some_and(|d| d.is_ascii_digit()) {
                        text.push('0');
                        break;
                    }
                }
                '.' => match self.options.decimal_points {
                    DecimalPoints::Terminate => break,
                    DecimalPoints::Reject => {
                        return Err(self.error(Error::RepeatedDecimalPoint(text.into())));
                    }
                },
                _ => break,
            }
        }

        if is_float {
            if text.parse::<f64>().is_err() {
                return Err(self.error(Error::MalformedNumber(text.into())));
            }
            Ok(self.produce(TokenKind::FloatLiteral, text))
        } else {
            if text.parse::<u64>().is_err() {
                return Err(self.error(Error::NumberOutOfRange(text.into())));
            }
            Ok(self.produce(TokenKind::IntLiteral, text))
        }
    }

    /// Scans a `0x` literal, producing its decimal spelling. Scanning stops at
    /// the first non hex digit.
    fn hex_number(&mut self) -> Result<Lexeme> {
        self.cursor.skip(2);
        let digits = self.cursor.take_while(|c| c.is_ascii_hexdigit());
        if digits.is_empty() {
            return Err(self.error(Error::MalformedNumber("0x".into())));
        }
        match u64::from_str_radix(digits, 16) {
            Ok(value) => Ok(self.produce(TokenKind::IntLiteral, value.to_string())),
            Err(_) => Err(self.error(Error::NumberOutOfRange(format!("0x{digits}").into()))),
        }
    }

    /// Longest match against the operator catalogue.
    fn operator(&mut self) -> Lexeme {
        for (len, table) in [(3, &OPERATORS_3), (2, &OPERATORS_2)] {
            let candidate = self.cursor.lookahead(len);
            if candidate.chars().count() == len && table.contains(candidate) {
                self.cursor.skip(len);
                return self.produce(TokenKind::Operator, candidate);
            }
        }
        let text = self.cursor.lookahead(1);
        self.cursor.skip(1);
        self.produce(TokenKind::Operator, text)
    }

    fn punctuation(&mut self) -> Option<Lexeme> {
        let c = self.cursor.read()?;
        let kind = *PUNCTUATION.get(&c)?;
        Some(self.produce(kind, c.to_string()))
    }
}

impl Lexer<'_> {
    fn produce(&self, kind: TokenKind, text: impl Into<String>) -> Lexeme {
        Lexeme::new(kind, text, self.start)
    }

    /// Locates an error at the start of the current lexeme.
    fn error(&self, error: Error) -> Spanned<Error> {
        self.start.wrap(error)
    }
}

fn unescape(c: char) -> Option<char> {
    Some(match c {
        '"' => '"',
        '\'' => '\'',
        '\\' => '\\',
        '0' => '\0',
        'a' => '\x07',
        'b' => '\x08',
        'f' => '\x0c',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        _ => return None,
    })
}
