//! C# minification
//!
//! The transforms applied to each resolved source: lexing, minifying and
//! hashing. Commands treat these as opaque functions of the source text.

pub mod token;

pub use token::{Position, Token, TokenKind, Tokens, tokenize};

use sha2::{Digest, Sha256};
use std::collections::VecDeque;

/// One unit of minified output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// Text to emit verbatim
    Text(&'a str),
    /// A line break
    NewLine,
}

/// Lazily minify `source`.
///
/// Whitespace and comments are dropped. A single space is kept only where
/// two tokens would otherwise run together, and preprocessor directives
/// stay on lines of their own.
pub fn minify(source: &str) -> Minify<'_> {
    Minify {
        source,
        tokens: tokenize(source),
        pending: VecDeque::new(),
        last: None,
    }
}

/// Iterator over the fragments of a minified source
#[derive(Debug, Clone)]
pub struct Minify<'a> {
    source: &'a str,
    tokens: Tokens<'a>,
    pending: VecDeque<Fragment<'a>>,
    /// Last character emitted on the current line
    last: Option<char>,
}

impl<'a> Iterator for Minify<'a> {
    type Item = Fragment<'a>;

    fn next(&mut self) -> Option<Fragment<'a>> {
        while self.pending.is_empty() {
            let token = self.tokens.next()?;
            if token.kind.is_trivia() {
                continue;
            }

            let text = token.text(self.source);
            if token.kind == TokenKind::PreprocessorDirective {
                if self.last.is_some() {
                    self.pending.push_back(Fragment::NewLine);
                }
                self.pending.push_back(Fragment::Text(text.trim_end()));
                self.pending.push_back(Fragment::NewLine);
                self.last = None;
                continue;
            }

            if let (Some(last), Some(first)) = (self.last, text.chars().next()) {
                if needs_space(last, first) {
                    self.pending.push_back(Fragment::Text(" "));
                }
            }
            self.pending.push_back(Fragment::Text(text));
            self.last = text.chars().last();
        }

        self.pending.pop_front()
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_operator(c: char) -> bool {
    "+-*/%&|^!~=<>?:".contains(c)
}

/// Whether `left` followed directly by `right` would change how they lex
fn needs_space(left: char, right: char) -> bool {
    (is_word(left) && (is_word(right) || matches!(right, '@' | '$' | '"' | '\'')))
        || (is_operator(left) && is_operator(right))
}

/// Render the minified form of `source` as a single string
pub fn minified(source: &str) -> String {
    let mut text = String::with_capacity(source.len());
    for fragment in minify(source) {
        match fragment {
            Fragment::Text(s) => text.push_str(s),
            Fragment::NewLine => text.push('\n'),
        }
    }
    text
}

/// SHA-256 of the minified form, as lowercase hex.
///
/// Sources differing only in whitespace and comments hash the same.
pub fn hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    for fragment in minify(source) {
        match fragment {
            Fragment::Text(s) => hasher.update(s.as_bytes()),
            Fragment::NewLine => hasher.update(b"\n"),
        }
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_drops_trivia() {
        let source = "class A\n{\n    // comment\n    int x = 1; /* more */\n}\n";
        assert_eq!(minified(source), "class A{int x=1;}");
    }

    #[test]
    fn test_minify_keeps_separating_spaces() {
        assert_eq!(minified("a + +b"), "a+ +b");
        assert_eq!(minified("x = y / *p"), "x=y/ *p");
        assert_eq!(minified("return \"s\""), "return \"s\"");
        assert_eq!(minified("return @\"s\""), "return @\"s\"");
        assert_eq!(minified("f ( a , b )"), "f(a,b)");
    }

    #[test]
    fn test_directives_on_own_lines() {
        let source = "int a;\n#if DEBUG\nint b;\n#endif\n";
        let fragments: Vec<_> = minify(source).collect();

        assert_eq!(
            fragments,
            vec![
                Fragment::Text("int"),
                Fragment::Text(" "),
                Fragment::Text("a;"),
                Fragment::NewLine,
                Fragment::Text("#if DEBUG"),
                Fragment::NewLine,
                Fragment::Text("int"),
                Fragment::Text(" "),
                Fragment::Text("b;"),
                Fragment::NewLine,
                Fragment::Text("#endif"),
                Fragment::NewLine,
            ]
        );
    }

    #[test]
    fn test_literals_are_untouched() {
        assert_eq!(minified("s = \"a  // b\";"), "s=\"a  // b\";");
    }

    #[test]
    fn test_hash_ignores_formatting() {
        let compact = "class A{int x;}";
        let spaced = "class A\n{\n    int x; // field\n}\n";

        assert_eq!(hash(compact), hash(spaced));
        assert_ne!(hash(compact), hash("class B{int x;}"));
        assert_eq!(hash("").len(), 64);
    }
}
