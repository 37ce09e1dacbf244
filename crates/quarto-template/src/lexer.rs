/*
 * lexer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tokenizer for template source.
//!
//! Text outside delimiters becomes [`TokenKind::Text`]. Inside `{{ }}` and
//! `{% %}` the source is split into names, numbers, strings, operators and
//! punctuation. `{# #}` comments are dropped.
//!
//! A `-` just inside a delimiter (`{{-`, `-%}`) trims whitespace from the
//! adjacent text.
//!
//! Symbolic operators are not hard-coded: the lexer is given the symbols
//! known to the extension registry and matches the longest one. Word
//! operators such as `and` are lexed as names.

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    PrintStart,
    PrintEnd,
    ExecuteStart,
    ExecuteEnd,
    Name,
    Number,
    String,
    Operator,
    Punctuation,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            line,
        }
    }

    pub fn is(&self, kind: TokenKind, value: &str) -> bool {
        self.kind == kind && self.value == value
    }
}

const PRINT_OPEN: &str = "{{";
const PRINT_CLOSE: &str = "}}";
const EXECUTE_OPEN: &str = "{%";
const EXECUTE_CLOSE: &str = "%}";
const COMMENT_OPEN: &str = "{#";
const COMMENT_CLOSE: &str = "#}";
const PUNCTUATION: &str = "()[]{},.|:=?";

/// Split `source` into tokens. The last token is always [`TokenKind::Eof`].
pub fn tokenize(
    source: &str,
    template_name: &str,
    operators: &[&str],
) -> Result<Vec<Token>, ParseError> {
    let mut symbols: Vec<&str> = operators
        .iter()
        .copied()
        .filter(|op| !op.is_empty() && !op.chars().all(|c| c.is_alphanumeric() || c == '_'))
        .collect();
    symbols.sort_by_key(|op| std::cmp::Reverse(op.len()));

    let mut lexer = Lexer {
        source,
        template_name,
        symbols,
        pos: 0,
        line: 1,
        trim_next_text: false,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    source: &'a str,
    template_name: &'a str,
    symbols: Vec<&'a str>,
    pos: usize,
    line: usize,
    trim_next_text: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.line, self.template_name)
    }

    fn advance(&mut self, len: usize) {
        let consumed = &self.source[self.pos..self.pos + len];
        self.line += consumed.matches('\n').count();
        self.pos += len;
    }

    fn push(&mut self, kind: TokenKind, value: impl Into<String>, line: usize) {
        self.tokens.push(Token::new(kind, value, line));
    }

    fn next_delimiter(&self) -> Option<(usize, &'static str)> {
        let rest = self.rest();
        let mut offset = 0;
        while let Some(i) = rest[offset..].find('{') {
            let at = offset + i;
            for open in [PRINT_OPEN, EXECUTE_OPEN, COMMENT_OPEN] {
                if rest[at..].starts_with(open) {
                    return Some((at, open));
                }
            }
            offset = at + 1;
        }
        None
    }

    fn run(&mut self) -> Result<(), ParseError> {
        loop {
            let Some((offset, open)) = self.next_delimiter() else {
                let text = self.rest();
                self.push_text(text, false);
                self.advance(text.len());
                break;
            };

            let text = &self.rest()[..offset];
            let trims_before = self.rest()[offset + open.len()..].starts_with('-');
            self.push_text(text, trims_before);
            self.advance(offset);

            let line = self.line;
            self.advance(open.len() + usize::from(trims_before));
            match open {
                COMMENT_OPEN => self.skip_comment()?,
                PRINT_OPEN => {
                    self.push(TokenKind::PrintStart, PRINT_OPEN, line);
                    self.lex_expression(PRINT_CLOSE, TokenKind::PrintEnd)?;
                }
                _ => {
                    self.push(TokenKind::ExecuteStart, EXECUTE_OPEN, line);
                    self.lex_expression(EXECUTE_CLOSE, TokenKind::ExecuteEnd)?;
                }
            }
        }
        let line = self.line;
        self.push(TokenKind::Eof, "", line);
        Ok(())
    }

    fn push_text(&mut self, text: &str, trim_end: bool) {
        let mut trimmed = text;
        let mut leading = 0;
        if std::mem::take(&mut self.trim_next_text) {
            trimmed = trimmed.trim_start();
            leading = text.len() - trimmed.len();
        }
        if trim_end {
            trimmed = trimmed.trim_end();
        }
        if !trimmed.is_empty() {
            let line = self.line + text[..leading].matches('\n').count();
            self.push(TokenKind::Text, trimmed, line);
        }
    }

    fn skip_comment(&mut self) -> Result<(), ParseError> {
        let Some(end) = self.rest().find(COMMENT_CLOSE) else {
            return Err(self.error("Unclosed comment"));
        };
        self.advance(end + COMMENT_CLOSE.len());
        Ok(())
    }

    fn lex_expression(&mut self, close: &str, close_kind: TokenKind) -> Result<(), ParseError> {
        loop {
            let whitespace = self.rest().len() - self.rest().trim_start().len();
            self.advance(whitespace);

            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(format!("Unclosed tag; expected \"{}\"", close)));
            }
            if rest.starts_with('-') && rest[1..].starts_with(close) {
                self.trim_next_text = true;
                let line = self.line;
                self.advance(1 + close.len());
                self.push(close_kind, close, line);
                return Ok(());
            }
            if rest.starts_with(close) {
                let line = self.line;
                self.advance(close.len());
                self.push(close_kind, close, line);
                return Ok(());
            }

            let line = self.line;
            let Some(c) = rest.chars().next() else {
                continue;
            };
            if c.is_alphabetic() || c == '_' {
                let len = rest
                    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .unwrap_or(rest.len());
                self.push(TokenKind::Name, &rest[..len], line);
                self.advance(len);
            } else if c.is_ascii_digit() {
                let len = number_length(rest);
                self.push(TokenKind::Number, &rest[..len], line);
                self.advance(len);
            } else if c == '"' || c == '\'' {
                let (value, len) = self.lex_string(rest, c)?;
                self.push(TokenKind::String, value, line);
                self.advance(len);
            } else if let Some(symbol) = self.symbols.iter().find(|op| rest.starts_with(**op)) {
                let symbol = *symbol;
                self.push(TokenKind::Operator, symbol, line);
                self.advance(symbol.len());
            } else if PUNCTUATION.contains(c) {
                self.push(TokenKind::Punctuation, c.to_string(), line);
                self.advance(c.len_utf8());
            } else {
                return Err(self.error(format!("Unexpected character '{}'", c)));
            }
        }
    }

    /// Returns the unescaped string and the number of bytes consumed.
    fn lex_string(&self, rest: &str, quote: char) -> Result<(String, usize), ParseError> {
        let mut value = String::new();
        let mut chars = rest.char_indices().skip(1);
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                c if c == quote => return Ok((value, i + c.len_utf8())),
                c => value.push(c),
            }
        }
        Err(self.error("Unclosed string literal"))
    }
}

fn number_length(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    let mut len = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if bytes.get(len) == Some(&b'.') && bytes.get(len + 1).is_some_and(u8::is_ascii_digit) {
        len += 1;
        len += bytes[len..].iter().take_while(|b| b.is_ascii_digit()).count();
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const OPERATORS: &[&str] = &["==", "<=", "<", "+", "-", "*", "and", "~"];

    fn kinds(tokens: &[Token]) -> Vec<(TokenKind, &str)> {
        tokens.iter().map(|t| (t.kind, t.value.as_str())).collect()
    }

    #[test]
    fn test_text_and_print() {
        let tokens = tokenize("Hello {{ name }}!", "t", OPERATORS).unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::Text, "Hello "),
                (TokenKind::PrintStart, "{{"),
                (TokenKind::Name, "name"),
                (TokenKind::PrintEnd, "}}"),
                (TokenKind::Text, "!"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_longest_operator_wins() {
        let tokens = tokenize("{{ a <= 1.5 and b == 'x' }}", "t", OPERATORS).unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::PrintStart, "{{"),
                (TokenKind::Name, "a"),
                (TokenKind::Operator, "<="),
                (TokenKind::Number, "1.5"),
                (TokenKind::Name, "and"),
                (TokenKind::Name, "b"),
                (TokenKind::Operator, "=="),
                (TokenKind::String, "x"),
                (TokenKind::PrintEnd, "}}"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_comments_are_dropped_and_lines_tracked() {
        let tokens = tokenize("a\n{# note\n #}\n{% if x %}", "t", OPERATORS).unwrap();
        let execute = tokens
            .iter()
            .find(|t| t.kind == TokenKind::ExecuteStart)
            .unwrap();
        assert_eq!(execute.line, 4);
        assert_eq!(tokens[0].value, "a\n");
    }

    #[test]
    fn test_whitespace_control() {
        let tokens = tokenize("a  {{- x -}}  b", "t", OPERATORS).unwrap();
        assert_eq!(tokens[0].value, "a");
        assert_eq!(tokens[4].value, "b");
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#"{{ "say \"hi\"\n" }}"#, "t", OPERATORS).unwrap();
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert_eq!(tokens[1].value, "say \"hi\"\n");
    }

    #[test]
    fn test_errors() {
        let err = tokenize("{{ name", "page", OPERATORS).unwrap_err();
        assert!(err.message.contains("Unclosed tag"));
        assert_eq!(err.template, "page");

        let err = tokenize("{# open", "page", OPERATORS).unwrap_err();
        assert!(err.message.contains("Unclosed comment"));

        let err = tokenize("{{ a @ b }}", "page", OPERATORS).unwrap_err();
        assert!(err.message.contains("Unexpected character '@'"));
    }
}
