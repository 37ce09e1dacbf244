/*
 * call.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Filter, test and function invocations.

use super::Expression;
use crate::compiler::Compiler;
use crate::error::{ExtensionError, RenderError, RenderResult};
use crate::extension::Arguments;
use crate::node::NodeVisitor;
use crate::runtime::EvaluationContext;
use crate::template::Template;
use crate::value::Value;

fn invalid_argument(
    callable: &str,
    error: ExtensionError,
    line: usize,
    template: &Template,
) -> RenderError {
    RenderError::InvalidArgument {
        callable: callable.to_string(),
        message: error.message,
        line,
        template: template.name().to_string(),
    }
}

/// Arguments as written at a call site: positional first, then named.
#[derive(Debug, Default)]
pub struct ArgumentsNode {
    positional: Vec<Box<dyn Expression>>,
    named: Vec<(String, Box<dyn Expression>)>,
}

impl ArgumentsNode {
    pub fn new(
        positional: Vec<Box<dyn Expression>>,
        named: Vec<(String, Box<dyn Expression>)>,
    ) -> Self {
        Self { positional, named }
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Evaluate the arguments, mapping positional ones onto `names` in order.
    pub fn resolve(
        &self,
        callable: &str,
        names: &[&str],
        line: usize,
        template: &Template,
        ctx: &EvaluationContext,
    ) -> RenderResult<Arguments> {
        let mut args = Arguments::new();
        for (i, expression) in self.positional.iter().enumerate() {
            let Some(name) = names.get(i) else {
                let message = format!(
                    "The argument at position {} is not allowed. Only {} argument(s) are allowed.",
                    i + 1,
                    names.len()
                );
                return Err(invalid_argument(
                    callable,
                    ExtensionError::new(message),
                    line,
                    template,
                ));
            };
            args.insert(*name, expression.evaluate(template, ctx)?);
        }
        for (name, expression) in &self.named {
            args.insert(name.clone(), expression.evaluate(template, ctx)?);
        }
        Ok(args)
    }

    fn compile(&self, compiler: &mut Compiler) {
        compiler.raw("(");
        let mut first = true;
        for expression in &self.positional {
            if !first {
                compiler.raw(", ");
            }
            first = false;
            compiler.subcompile(expression.as_ref());
        }
        for (name, expression) in &self.named {
            if !first {
                compiler.raw(", ");
            }
            first = false;
            compiler.raw(name).raw("=").subcompile(expression.as_ref());
        }
        compiler.raw(")");
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        for expression in &self.positional {
            expression.accept(visitor);
        }
        for (_, expression) in &self.named {
            expression.accept(visitor);
        }
    }
}

/// `input | name(args)`
#[derive(Debug)]
pub struct FilterExpression {
    line: usize,
    input: Box<dyn Expression>,
    name: String,
    args: ArgumentsNode,
}

impl FilterExpression {
    pub fn new(
        input: Box<dyn Expression>,
        name: impl Into<String>,
        args: ArgumentsNode,
        line: usize,
    ) -> Self {
        Self {
            line,
            input,
            name: name.into(),
            args,
        }
    }

    pub fn filter_name(&self) -> &str {
        &self.name
    }
}

impl Expression for FilterExpression {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "filter"
    }

    fn evaluate(&self, template: &Template, ctx: &EvaluationContext) -> RenderResult<Value> {
        let filter = ctx
            .registry()
            .filter(&self.name)
            .cloned()
            .ok_or_else(|| RenderError::UnknownFilter {
                name: self.name.clone(),
                line: self.line,
                template: template.name().to_string(),
            })?;
        let input = self.input.evaluate(template, ctx)?;
        let args = self.args.resolve(
            &self.name,
            filter.argument_names(),
            self.line,
            template,
            ctx,
        )?;
        filter
            .apply(input, &args)
            .map_err(|e| invalid_argument(&self.name, e, self.line, template))
    }

    fn compile(&self, compiler: &mut Compiler) {
        compiler
            .raw("(")
            .subcompile(self.input.as_ref())
            .raw(" | ")
            .raw(&self.name);
        if !self.args.is_empty() {
            self.args.compile(compiler);
        }
        compiler.raw(")");
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_expression(self);
        self.input.accept(visitor);
        self.args.accept(visitor);
    }
}

/// `input is [not] name(args)`
#[derive(Debug)]
pub struct TestExpression {
    line: usize,
    input: Box<dyn Expression>,
    name: String,
    args: ArgumentsNode,
    negated: bool,
}

impl TestExpression {
    pub fn new(
        input: Box<dyn Expression>,
        name: impl Into<String>,
        args: ArgumentsNode,
        negated: bool,
        line: usize,
    ) -> Self {
        Self {
            line,
            input,
            name: name.into(),
            args,
            negated,
        }
    }
}

impl Expression for TestExpression {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "test"
    }

    fn evaluate(&self, template: &Template, ctx: &EvaluationContext) -> RenderResult<Value> {
        let test = ctx
            .registry()
            .test(&self.name)
            .cloned()
            .ok_or_else(|| RenderError::UnknownTest {
                name: self.name.clone(),
                line: self.line,
                template: template.name().to_string(),
            })?;
        let input = self.input.evaluate(template, ctx)?;
        let args = self
            .args
            .resolve(&self.name, test.argument_names(), self.line, template, ctx)?;
        let passed = test
            .apply(&input, &args)
            .map_err(|e| invalid_argument(&self.name, e, self.line, template))?;
        Ok(Value::Bool(passed != self.negated))
    }

    fn compile(&self, compiler: &mut Compiler) {
        compiler
            .raw("(")
            .subcompile(self.input.as_ref())
            .raw(if self.negated { " is not " } else { " is " })
            .raw(&self.name);
        if !self.args.is_empty() {
            self.args.compile(compiler);
        }
        compiler.raw(")");
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_expression(self);
        self.input.accept(visitor);
        self.args.accept(visitor);
    }
}

/// `name(args)`
#[derive(Debug)]
pub struct FunctionCallExpression {
    line: usize,
    name: String,
    args: ArgumentsNode,
}

impl FunctionCallExpression {
    pub fn new(name: impl Into<String>, args: ArgumentsNode, line: usize) -> Self {
        Self {
            line,
            name: name.into(),
            args,
        }
    }
}

impl Expression for FunctionCallExpression {
    fn line_number(&self) -> usize {
        self.line
    }

    fn kind(&self) -> &'static str {
        "function"
    }

    fn evaluate(&self, template: &Template, ctx: &EvaluationContext) -> RenderResult<Value> {
        let function = ctx
            .registry()
            .function(&self.name)
            .cloned()
            .ok_or_else(|| RenderError::UnknownFunction {
                name: self.name.clone(),
                line: self.line,
                template: template.name().to_string(),
            })?;
        let args = self.args.resolve(
            &self.name,
            function.argument_names(),
            self.line,
            template,
            ctx,
        )?;
        function
            .execute(&args)
            .map_err(|e| invalid_argument(&self.name, e, self.line, template))
    }

    fn compile(&self, compiler: &mut Compiler) {
        compiler.raw(&self.name);
        self.args.compile(compiler);
    }

    fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_expression(self);
        self.args.accept(visitor);
    }
}
