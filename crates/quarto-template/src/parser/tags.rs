/*
 * tags.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Token parsers for the built-in tags.

use super::{Parser, Token, TokenKind, TokenParser};
use crate::error::ParseError;
use crate::node::{ForNode, IfNode, IncludeNode, ParallelNode, RenderableNode, SetNode};

/// `{% for item in items %} ... [{% else %} ...] {% endfor %}`
#[derive(Debug, Default)]
pub struct ForTokenParser;

impl TokenParser for ForTokenParser {
    fn tag(&self) -> &str {
        "for"
    }

    fn parse(
        &self,
        token: &Token,
        parser: &mut Parser<'_>,
    ) -> Result<Box<dyn RenderableNode>, ParseError> {
        let variable = parser.expect_name()?;
        parser.expect(TokenKind::Name, "in")?;
        let iterable = parser.parse_expression()?;
        parser.expect_execute_end()?;

        let body = parser.subparse(&["else", "endfor"])?;
        let else_body = if parser.test(TokenKind::Name, "else") {
            parser.advance();
            parser.expect_execute_end()?;
            Some(parser.subparse(&["endfor"])?)
        } else {
            None
        };
        parser.expect(TokenKind::Name, "endfor")?;
        parser.expect_execute_end()?;

        Ok(Box::new(ForNode::new(
            variable, iterable, body, else_body, token.line,
        )))
    }
}

/// `{% if a %} ... [{% elseif b %} ...]* [{% else %} ...] {% endif %}`
#[derive(Debug, Default)]
pub struct IfTokenParser;

impl TokenParser for IfTokenParser {
    fn tag(&self) -> &str {
        "if"
    }

    fn parse(
        &self,
        token: &Token,
        parser: &mut Parser<'_>,
    ) -> Result<Box<dyn RenderableNode>, ParseError> {
        let mut branches = Vec::new();
        let mut else_body = None;

        let mut condition = parser.parse_expression()?;
        parser.expect_execute_end()?;
        loop {
            let body = parser.subparse(&["elseif", "else", "endif"])?;
            branches.push((condition, body));

            match parser.advance().value.as_str() {
                "elseif" => {
                    condition = parser.parse_expression()?;
                    parser.expect_execute_end()?;
                }
                "else" => {
                    parser.expect_execute_end()?;
                    else_body = Some(parser.subparse(&["endif"])?);
                    parser.expect(TokenKind::Name, "endif")?;
                    break;
                }
                _ => break,
            }
        }
        parser.expect_execute_end()?;

        Ok(Box::new(IfNode::new(branches, else_body, token.line)))
    }
}

/// `{% set name = expression %}`
#[derive(Debug, Default)]
pub struct SetTokenParser;

impl TokenParser for SetTokenParser {
    fn tag(&self) -> &str {
        "set"
    }

    fn parse(
        &self,
        token: &Token,
        parser: &mut Parser<'_>,
    ) -> Result<Box<dyn RenderableNode>, ParseError> {
        let name = parser.expect_name()?;
        parser.expect(TokenKind::Punctuation, "=")?;
        let value = parser.parse_expression()?;
        parser.expect_execute_end()?;
        Ok(Box::new(SetNode::new(name, value, token.line)))
    }
}

/// `{% include "name" [with {"key": value}] %}`
#[derive(Debug, Default)]
pub struct IncludeTokenParser;

impl TokenParser for IncludeTokenParser {
    fn tag(&self) -> &str {
        "include"
    }

    fn parse(
        &self,
        token: &Token,
        parser: &mut Parser<'_>,
    ) -> Result<Box<dyn RenderableNode>, ParseError> {
        let name = parser.parse_expression()?;
        let with = if parser.test(TokenKind::Name, "with") {
            parser.advance();
            Some(parser.parse_expression()?)
        } else {
            None
        };
        parser.expect_execute_end()?;
        Ok(Box::new(IncludeNode::new(name, with, token.line)))
    }
}

/// `{% parallel %} ... {% endparallel %}`
#[derive(Debug, Default)]
pub struct ParallelTokenParser;

impl TokenParser for ParallelTokenParser {
    fn tag(&self) -> &str {
        "parallel"
    }

    fn parse(
        &self,
        token: &Token,
        parser: &mut Parser<'_>,
    ) -> Result<Box<dyn RenderableNode>, ParseError> {
        parser.expect_execute_end()?;
        let body = parser.subparse(&["endparallel"])?;
        parser.expect(TokenKind::Name, "endparallel")?;
        parser.expect_execute_end()?;
        Ok(Box::new(ParallelNode::new(body, token.line)))
    }
}
