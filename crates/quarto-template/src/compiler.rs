/*
 * compiler.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Structural output for expression trees.
//!
//! Every expression appends a textual form of itself to a [`Compiler`],
//! asking its operands to do the same through [`Compiler::subcompile`].
//! Composite expressions always emit grouping parentheses, so the output is
//! unambiguous from the tree shape alone.

use crate::node::Expression;

#[derive(Debug, Default)]
pub struct Compiler {
    buffer: String,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text as-is.
    pub fn raw(&mut self, text: &str) -> &mut Self {
        self.buffer.push_str(text);
        self
    }

    /// Append a quoted string literal.
    pub fn string(&mut self, text: &str) -> &mut Self {
        self.buffer.push('"');
        for c in text.chars() {
            match c {
                '"' => self.buffer.push_str("\\\""),
                '\\' => self.buffer.push_str("\\\\"),
                '\n' => self.buffer.push_str("\\n"),
                c => self.buffer.push(c),
            }
        }
        self.buffer.push('"');
        self
    }

    /// Let `expression` append itself.
    pub fn subcompile(&mut self, expression: &dyn Expression) -> &mut Self {
        expression.compile(self);
        self
    }

    pub fn source(&self) -> &str {
        &self.buffer
    }

    pub fn into_source(self) -> String {
        self.buffer
    }
}

/// Compile a single expression to a string.
pub fn compile_expression(expression: &dyn Expression) -> String {
    let mut compiler = Compiler::new();
    compiler.subcompile(expression);
    compiler.into_source()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_and_string() {
        let mut compiler = Compiler::new();
        compiler.raw("say(").string("a \"quote\"\n").raw(")");
        assert_eq!(compiler.source(), r#"say("a \"quote\"\n")"#);
    }
}
