/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parser driver.
//!
//! The parser owns the token stream and builds the node tree. It knows only
//! the generic structure of templates (text, `{{ }}` and `{% %}`); tags are
//! parsed by the [`TokenParser`] registered for their name, and operators
//! come from the extension registry together with their precedence.

pub mod tags;

pub use crate::lexer::{Token, TokenKind};
pub use tags::{
    ForTokenParser, IfTokenParser, IncludeTokenParser, ParallelTokenParser, SetTokenParser,
};

use crate::error::ParseError;
use crate::extension::{Associativity, ExtensionRegistry};
use crate::lexer;
use crate::node::{
    ArgumentsNode, Attribute, BinaryExpression, BodyNode, ContextVariableExpression, Expression,
    FilterExpression, FunctionCallExpression, GetAttributeExpression, ListExpression,
    LiteralExpression, MapExpression, PrintNode, RenderableNode, TestExpression, TextNode,
    UnaryExpression,
};
use crate::value::Value;

/// Binding strength of `x is test`.
pub const TEST_PRECEDENCE: u32 = 35;

/// Parses the body of one tag.
pub trait TokenParser: Send + Sync {
    /// Name of the tag this parser handles, e.g. `"for"`.
    fn tag(&self) -> &str;

    /// Parse the rest of a tag. `token` is the tag name, already consumed.
    fn parse(
        &self,
        token: &Token,
        parser: &mut Parser<'_>,
    ) -> Result<Box<dyn RenderableNode>, ParseError>;
}

/// Tokenize and parse `source` into a node tree.
pub fn parse_template(
    source: &str,
    template_name: &str,
    registry: &ExtensionRegistry,
) -> Result<BodyNode, ParseError> {
    let symbols: Vec<&str> = registry
        .binary_operators()
        .keys()
        .chain(registry.unary_operators().keys())
        .map(String::as_str)
        .collect();
    let tokens = lexer::tokenize(source, template_name, &symbols)?;
    Parser::new(tokens, registry, template_name).parse()
}

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    registry: &'a ExtensionRegistry,
    template_name: &'a str,
}

impl<'a> Parser<'a> {
    /// An [`TokenKind::Eof`] token is appended if `tokens` does not end
    /// with one.
    pub fn new(
        mut tokens: Vec<Token>,
        registry: &'a ExtensionRegistry,
        template_name: &'a str,
    ) -> Self {
        if tokens.last().is_none_or(|token| token.kind != TokenKind::Eof) {
            let line = tokens.last().map_or(1, |token| token.line);
            tokens.push(Token::new(TokenKind::Eof, "", line));
        }
        Self {
            tokens,
            pos: 0,
            registry,
            template_name,
        }
    }

    pub fn template_name(&self) -> &str {
        self.template_name
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        self.registry
    }

    pub fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.current().line, self.template_name)
    }

    // ---- token stream ----

    pub fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    pub fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    /// Consume and return the current token. The final `Eof` is never
    /// consumed.
    pub fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    pub fn test(&self, kind: TokenKind, value: &str) -> bool {
        self.current().is(kind, value)
    }

    pub fn expect(&mut self, kind: TokenKind, value: &str) -> Result<Token, ParseError> {
        if self.test(kind, value) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("\"{}\"", value)))
        }
    }

    pub fn expect_name(&mut self) -> Result<String, ParseError> {
        if self.current().kind == TokenKind::Name {
            Ok(self.advance().value)
        } else {
            Err(self.unexpected("a name"))
        }
    }

    pub fn expect_execute_end(&mut self) -> Result<Token, ParseError> {
        self.expect(TokenKind::ExecuteEnd, "%}")
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        let found = match token.kind {
            TokenKind::Eof => "end of template".to_string(),
            _ => format!("\"{}\"", token.value),
        };
        self.error(format!("Unexpected {}; expected {}", found, expected))
    }

    // ---- bodies ----

    /// Parse the whole token stream.
    pub fn parse(&mut self) -> Result<BodyNode, ParseError> {
        let body = self.subparse(&[])?;
        if self.current().kind != TokenKind::Eof {
            return Err(self.unexpected("end of template"));
        }
        Ok(body)
    }

    /// Parse nodes until a `{% <end> %}` tag with a name in `end_tags`.
    ///
    /// On return the `{%` has been consumed and the current token is the
    /// end tag's name. With no end tags, parses to the end of the stream.
    pub fn subparse(&mut self, end_tags: &[&str]) -> Result<BodyNode, ParseError> {
        let line = self.current().line;
        let mut children: Vec<Box<dyn RenderableNode>> = Vec::new();
        loop {
            let token = self.current().clone();
            match token.kind {
                TokenKind::Eof if end_tags.is_empty() => break,
                TokenKind::Eof => {
                    return Err(self.error(format!(
                        "Unexpected end of template; expected one of: {}",
                        end_tags.join(", ")
                    )));
                }
                TokenKind::Text => {
                    self.advance();
                    children.push(Box::new(TextNode::new(token.value, token.line)));
                }
                TokenKind::PrintStart => {
                    self.advance();
                    let expression = self.parse_expression()?;
                    self.expect(TokenKind::PrintEnd, "}}")?;
                    children.push(Box::new(PrintNode::new(expression, token.line)));
                }
                TokenKind::ExecuteStart => {
                    self.advance();
                    let tag = self.current().clone();
                    if tag.kind != TokenKind::Name {
                        return Err(self.unexpected("a tag name"));
                    }
                    if end_tags.contains(&tag.value.as_str()) {
                        return Ok(BodyNode::new(children, line));
                    }
                    let Some(token_parser) = self.registry.token_parsers().get(&tag.value).cloned()
                    else {
                        return Err(self.error(format!("Unknown tag \"{}\"", tag.value)));
                    };
                    self.advance();
                    children.push(token_parser.parse(&tag, self)?);
                }
                _ => return Err(self.unexpected("text or a tag")),
            }
        }
        Ok(BodyNode::new(children, line))
    }

    // ---- expressions ----

    pub fn parse_expression(&mut self) -> Result<Box<dyn Expression>, ParseError> {
        self.parse_expression_with(0)
    }

    fn is_operator_token(token: &Token) -> bool {
        matches!(token.kind, TokenKind::Operator | TokenKind::Name)
    }

    fn parse_expression_with(&mut self, min_precedence: u32) -> Result<Box<dyn Expression>, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let token = self.current().clone();

            if token.is(TokenKind::Name, "is")
                && !self.registry.binary_operators().contains_key("is")
            {
                if TEST_PRECEDENCE < min_precedence {
                    break;
                }
                self.advance();
                let negated = self.test(TokenKind::Name, "not");
                if negated {
                    self.advance();
                }
                let name = self.expect_name()?;
                let args = self.parse_optional_arguments()?;
                left = Box::new(TestExpression::new(left, name, args, negated, token.line));
                continue;
            }

            if !Self::is_operator_token(&token) {
                break;
            }
            let Some(operator) = self.registry.binary_operators().get(&token.value).cloned() else {
                break;
            };
            let precedence = operator.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let next_min = match operator.associativity() {
                Associativity::Left => precedence + 1,
                Associativity::Right => precedence,
            };
            let right = self.parse_expression_with(next_min)?;
            left = Box::new(BinaryExpression::new(operator, left, right, token.line));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Box<dyn Expression>, ParseError> {
        let token = self.current().clone();
        if Self::is_operator_token(&token) {
            if let Some(operator) = self.registry.unary_operators().get(&token.value).cloned() {
                self.advance();
                let operand = self.parse_expression_with(operator.precedence())?;
                return Ok(Box::new(UnaryExpression::new(operator, operand, token.line)));
            }
        }
        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    fn parse_primary(&mut self) -> Result<Box<dyn Expression>, ParseError> {
        let token = self.current().clone();
        let line = token.line;
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value = if token.value.contains('.') {
                    token.value.parse::<f64>().map(Value::Float).ok()
                } else {
                    token.value.parse::<i64>().map(Value::Integer).ok()
                };
                let value =
                    value.ok_or_else(|| self.error(format!("Invalid number \"{}\"", token.value)))?;
                Ok(Box::new(LiteralExpression::new(value, line)))
            }
            TokenKind::String => {
                self.advance();
                Ok(Box::new(LiteralExpression::new(Value::String(token.value), line)))
            }
            TokenKind::Name => {
                self.advance();
                match token.value.as_str() {
                    "true" => Ok(Box::new(LiteralExpression::new(Value::Bool(true), line))),
                    "false" => Ok(Box::new(LiteralExpression::new(Value::Bool(false), line))),
                    "null" | "none" => Ok(Box::new(LiteralExpression::new(Value::Null, line))),
                    _ if self.test(TokenKind::Punctuation, "(") => {
                        let args = self.parse_arguments()?;
                        Ok(Box::new(FunctionCallExpression::new(token.value, args, line)))
                    }
                    _ => Ok(Box::new(ContextVariableExpression::new(token.value, line))),
                }
            }
            TokenKind::Punctuation if token.value == "(" => {
                self.advance();
                let expression = self.parse_expression()?;
                self.expect(TokenKind::Punctuation, ")")?;
                Ok(expression)
            }
            TokenKind::Punctuation if token.value == "[" => {
                self.advance();
                let mut items = Vec::new();
                while !self.test(TokenKind::Punctuation, "]") {
                    if !items.is_empty() {
                        self.expect(TokenKind::Punctuation, ",")?;
                    }
                    items.push(self.parse_expression()?);
                }
                self.advance();
                Ok(Box::new(ListExpression::new(items, line)))
            }
            TokenKind::Punctuation if token.value == "{" => {
                self.advance();
                let mut entries = Vec::new();
                while !self.test(TokenKind::Punctuation, "}") {
                    if !entries.is_empty() {
                        self.expect(TokenKind::Punctuation, ",")?;
                    }
                    let key = match self.current().kind {
                        TokenKind::String | TokenKind::Name | TokenKind::Number => {
                            self.advance().value
                        }
                        _ => return Err(self.unexpected("a map key")),
                    };
                    self.expect(TokenKind::Punctuation, ":")?;
                    entries.push((key, self.parse_expression()?));
                }
                self.advance();
                Ok(Box::new(MapExpression::new(entries, line)))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_postfix(
        &mut self,
        mut expression: Box<dyn Expression>,
    ) -> Result<Box<dyn Expression>, ParseError> {
        loop {
            let token = self.current().clone();
            if token.kind != TokenKind::Punctuation {
                break;
            }
            match token.value.as_str() {
                "." => {
                    self.advance();
                    let attribute = match self.current().kind {
                        TokenKind::Name | TokenKind::Number => self.advance().value,
                        _ => return Err(self.unexpected("an attribute name")),
                    };
                    let attribute = match attribute.parse::<i64>() {
                        Ok(index) => Attribute::Index(Box::new(LiteralExpression::new(
                            Value::Integer(index),
                            token.line,
                        ))),
                        Err(_) => Attribute::Name(attribute),
                    };
                    expression = Box::new(GetAttributeExpression::new(
                        expression, attribute, token.line,
                    ));
                }
                "[" => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::Punctuation, "]")?;
                    expression = Box::new(GetAttributeExpression::new(
                        expression,
                        Attribute::Index(index),
                        token.line,
                    ));
                }
                "|" => {
                    self.advance();
                    let name = self.expect_name()?;
                    let args = self.parse_optional_arguments()?;
                    expression = Box::new(FilterExpression::new(expression, name, args, token.line));
                }
                _ => break,
            }
        }
        Ok(expression)
    }

    fn parse_optional_arguments(&mut self) -> Result<ArgumentsNode, ParseError> {
        if self.test(TokenKind::Punctuation, "(") {
            self.parse_arguments()
        } else {
            Ok(ArgumentsNode::default())
        }
    }

    /// `(a, b, name=c)`; named arguments must follow positional ones.
    fn parse_arguments(&mut self) -> Result<ArgumentsNode, ParseError> {
        self.expect(TokenKind::Punctuation, "(")?;
        let mut positional = Vec::new();
        let mut named = Vec::new();
        while !self.test(TokenKind::Punctuation, ")") {
            if !positional.is_empty() || !named.is_empty() {
                self.expect(TokenKind::Punctuation, ",")?;
            }
            let is_named = self.current().kind == TokenKind::Name
                && self
                    .peek(1)
                    .is_some_and(|next| next.is(TokenKind::Punctuation, "="));
            if is_named {
                let name = self.advance().value;
                self.advance();
                named.push((name, self.parse_expression()?));
            } else if named.is_empty() {
                positional.push(self.parse_expression()?);
            } else {
                return Err(self.error("Positional arguments must come before named arguments"));
            }
        }
        self.advance();
        Ok(ArgumentsNode::new(positional, named))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::core::CoreExtension;

    fn registry() -> ExtensionRegistry {
        ExtensionRegistry::builder().register(CoreExtension).build()
    }

    #[test]
    fn test_empty_token_stream_is_empty_body() {
        let registry = registry();
        let mut parser = Parser::new(Vec::new(), &registry, "empty");
        assert_eq!(parser.current().kind, TokenKind::Eof);
        assert!(parser.parse().unwrap().is_empty());
    }

    #[test]
    fn test_missing_eof_is_appended() {
        let registry = registry();
        let tokens = vec![Token::new(TokenKind::Text, "hello", 3)];
        let mut parser = Parser::new(tokens, &registry, "text");
        let body = parser.parse().unwrap();
        assert_eq!(body.children().len(), 1);
        assert_eq!(parser.current().kind, TokenKind::Eof);
        assert_eq!(parser.current().line, 3);
    }
}
