//! C# lexical scanning
//!
//! Splits source text into whitespace, newlines, comments, literals,
//! preprocessor directives and runs of other text. Every byte of the input
//! belongs to exactly one token, so concatenating token texts reproduces
//! the source.

use serde::Serialize;
use std::fmt;

/// Kind of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    WhiteSpace,
    NewLine,
    SingleLineComment,
    MultiLineComment,
    Text,
    String,
    VerbatimString,
    InterpolatedString,
    InterpolatedVerbatimString,
    Char,
    PreprocessorDirective,
}

impl TokenKind {
    /// Whitespace, newlines and comments carry no meaning for the compiler
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::WhiteSpace | Self::NewLine | Self::SingleLineComment | Self::MultiLineComment
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{:?}", self))
    }
}

/// 1-based line and column of a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A token with its byte span and positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub offset: usize,
    /// Byte length
    pub length: usize,
    pub start: Position,
    /// Position just past the last character
    pub end: Position,
}

impl Token {
    /// Text of this token within `source`
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.offset..self.offset + self.length]
    }
}

/// Lazily scan `source` into tokens
pub fn tokenize(source: &str) -> Tokens<'_> {
    Tokens {
        source,
        offset: 0,
        position: Position { line: 1, col: 1 },
        line_is_blank: true,
    }
}

/// Iterator over the tokens of a source
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    source: &'a str,
    offset: usize,
    position: Position,
    line_is_blank: bool,
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let rest = &self.source[self.offset..];
        let first = rest.chars().next()?;

        let (kind, length) = match first {
            '\r' if rest.starts_with("\r\n") => (TokenKind::NewLine, 2),
            '\r' | '\n' => (TokenKind::NewLine, 1),
            c if c.is_whitespace() => (
                TokenKind::WhiteSpace,
                prefix_len(rest, |c| c.is_whitespace() && c != '\r' && c != '\n'),
            ),
            '/' if rest.starts_with("//") => (TokenKind::SingleLineComment, line_len(rest)),
            '/' if rest.starts_with("/*") => (
                TokenKind::MultiLineComment,
                rest[2..].find("*/").map_or(rest.len(), |at| at + 4),
            ),
            '#' if self.line_is_blank => (TokenKind::PreprocessorDirective, line_len(rest)),
            '"' => (TokenKind::String, quoted_len(rest, 1, '"')),
            '\'' => (TokenKind::Char, quoted_len(rest, 1, '\'')),
            _ if rest.starts_with("@\"") => (TokenKind::VerbatimString, verbatim_len(rest, 2)),
            _ if rest.starts_with("$@\"") || rest.starts_with("@$\"") => {
                (TokenKind::InterpolatedVerbatimString, verbatim_len(rest, 3))
            }
            _ if rest.starts_with("$\"") => (TokenKind::InterpolatedString, quoted_len(rest, 2, '"')),
            _ => (TokenKind::Text, text_len(rest)),
        };

        let text = &rest[..length];
        let start = self.position;
        self.advance(text);
        self.offset += length;

        match kind {
            TokenKind::NewLine => self.line_is_blank = true,
            TokenKind::WhiteSpace => {}
            _ => self.line_is_blank = false,
        }

        Some(Token {
            kind,
            offset: self.offset - length,
            length,
            start,
            end: self.position,
        })
    }
}

impl Tokens<'_> {
    fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.position.line += 1;
                self.position.col = 1;
            } else if c != '\r' {
                self.position.col += 1;
            }
        }
    }
}

fn prefix_len(s: &str, pred: impl Fn(char) -> bool) -> usize {
    s.find(|c: char| !pred(c)).unwrap_or(s.len())
}

/// Length up to, not including, the line break
fn line_len(s: &str) -> usize {
    s.find(['\r', '\n']).unwrap_or(s.len())
}

/// Length of a `\`-escaped literal opened by `open` bytes and closed by
/// `quote`. An unterminated literal stops at the end of the line.
fn quoted_len(s: &str, open: usize, quote: char) -> usize {
    let mut chars = s[open..].char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '\r' | '\n' => return open + i,
            c if c == quote => return open + i + 1,
            _ => {}
        }
    }
    s.len()
}

/// Length of a verbatim string where `""` is an escaped quote
fn verbatim_len(s: &str, open: usize) -> usize {
    let bytes = s.as_bytes();
    let mut i = open;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            if bytes.get(i + 1) == Some(&b'"') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    s.len()
}

fn starts_token(s: &str) -> bool {
    let Some(c) = s.chars().next() else {
        return true;
    };
    c.is_whitespace()
        || c == '"'
        || c == '\''
        || s.starts_with("//")
        || s.starts_with("/*")
        || s.starts_with("@\"")
        || s.starts_with("$\"")
        || s.starts_with("$@\"")
        || s.starts_with("@$\"")
}

/// Length of a run of text up to the start of another kind of token
fn text_len(s: &str) -> usize {
    let mut chars = s.char_indices();
    // the first character always belongs to the run
    chars.next();
    for (i, _) in chars {
        if starts_token(&s[i..]) {
            return i;
        }
    }
    s.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_texts(source: &str) -> Vec<(TokenKind, &str)> {
        tokenize(source).map(|t| (t.kind, t.text(source))).collect()
    }

    #[test]
    fn test_tokens_cover_the_source() {
        let source = "using System; // hi\r\n/* a\nb */ class C { string s = @\"x\"\"y\"; }\n";
        let joined: String = tokenize(source).map(|t| t.text(source)).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn test_token_kinds() {
        let tokens = kinds_and_texts("x = \"a\\\"b\"; // c\n");

        assert_eq!(
            tokens,
            vec![
                (TokenKind::Text, "x"),
                (TokenKind::WhiteSpace, " "),
                (TokenKind::Text, "="),
                (TokenKind::WhiteSpace, " "),
                (TokenKind::String, "\"a\\\"b\""),
                (TokenKind::Text, ";"),
                (TokenKind::WhiteSpace, " "),
                (TokenKind::SingleLineComment, "// c"),
                (TokenKind::NewLine, "\n"),
            ]
        );
    }

    #[test]
    fn test_literals() {
        let tokens = kinds_and_texts("'\\'' @\"a\"\"b\" $\"{x}\" $@\"p\"");
        let literals: Vec<_> = tokens.into_iter().filter(|(k, _)| !k.is_trivia()).collect();

        assert_eq!(
            literals,
            vec![
                (TokenKind::Char, "'\\''"),
                (TokenKind::VerbatimString, "@\"a\"\"b\""),
                (TokenKind::InterpolatedString, "$\"{x}\""),
                (TokenKind::InterpolatedVerbatimString, "$@\"p\""),
            ]
        );
    }

    #[test]
    fn test_preprocessor_only_at_line_start() {
        let tokens = kinds_and_texts("  #if DEBUG\nx#y");

        assert_eq!(tokens[1], (TokenKind::PreprocessorDirective, "#if DEBUG"));
        assert_eq!(tokens[3], (TokenKind::Text, "x#y"));
    }

    #[test]
    fn test_positions() {
        let source = "a\n  bc";
        let tokens: Vec<_> = tokenize(source).collect();
        let bc = tokens.last().unwrap();

        assert_eq!(bc.text(source), "bc");
        assert_eq!(bc.start, Position { line: 2, col: 3 });
        assert_eq!(bc.end, Position { line: 2, col: 5 });
        assert_eq!(bc.offset, 4);
    }

    #[test]
    fn test_unterminated_comment_runs_to_end() {
        let tokens = kinds_and_texts("x /* open");
        assert_eq!(tokens.last().unwrap(), &(TokenKind::MultiLineComment, "/* open"));
    }
}
