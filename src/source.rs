use crate::token::SourceLocation;

/// Character cursor over a source string with bounded lookahead.
///
/// Tracks the line and column of the next character to be read.
#[derive(Clone, Debug)]
pub struct Cursor<'src> {
    src: &'src str,
    offset: usize,
    line: u32,
    column: u32,
}

impl<'src> Cursor<'src> {
    pub fn new(src: &'src str) -> Cursor<'src> {
        Cursor {
            src,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Location of the next character.
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.src.len()
    }

    /// Returns the next character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Returns the character `n` positions ahead (`0` is the next one).
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Returns up to `n` upcoming characters as a slice.
    pub fn lookahead(&self, n: usize) -> &'src str {
        let rest = self.rest();
        let end = rest.char_indices().nth(n).map_or(rest.len(), |(i, _)| i);
        &rest[..end]
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Consumes and returns the next character.
    pub fn read(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consumes up to `n` characters.
    pub fn skip(&mut self, n: usize) {
        for _ in 0..n {
            if self.read().is_none() {
                break;
            }
        }
    }

    pub fn skip_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while self.peek().is_some_and(&mut pred) {
            self.read();
        }
    }

    /// Consumes characters while `pred` holds, returning the consumed slice.
    pub fn take_while(&mut self, pred: impl FnMut(char) -> bool) -> &'src str {
        let start = self.offset;
        self.skip_while(pred);
        &self.src[start..self.offset]
    }

    fn rest(&self) -> &'src str {
        &self.src[self.offset..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd");
        assert_eq!(cursor.location(), SourceLocation::new(1, 1));
        cursor.skip(2);
        assert_eq!(cursor.location(), SourceLocation::new(1, 3));
        assert_eq!(cursor.read(), Some('\n'));
        assert_eq!(cursor.location(), SourceLocation::new(2, 1));
        assert_eq!(cursor.take_while(|c| c.is_ascii_alphabetic()), "cd");
        assert!(cursor.is_eof());
        assert_eq!(cursor.read(), None);
    }

    #[test]
    fn bounded_lookahead() {
        let cursor = Cursor::new("==>x");
        assert_eq!(cursor.lookahead(3), "==>");
        assert_eq!(cursor.lookahead(10), "==>x");
        assert_eq!(cursor.peek_nth(2), Some('>'));
        assert_eq!(cursor.peek_nth(4), None);
        assert!(cursor.starts_with("=="));
    }
}
