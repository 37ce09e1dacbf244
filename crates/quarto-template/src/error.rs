/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for loading, parsing and rendering templates.
//!
//! Evaluation errors always carry the line number and the name of the
//! template they were raised in, because a single render can span several
//! templates composed through `include`.

use thiserror::Error;

/// Errors raised by template loaders.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// No loader could find the template.
    #[error("Could not find template \"{name}\"")]
    NotFound { name: String },

    /// The template exists but could not be read.
    #[error("Failed to read template \"{name}\": {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The configured character encoding is not supported.
    #[error("Unsupported charset: {charset}")]
    UnsupportedCharset { charset: String },
}

impl LoaderError {
    pub fn not_found(name: impl Into<String>) -> Self {
        LoaderError::NotFound { name: name.into() }
    }
}

/// Error raised while turning template source into a node tree.
#[derive(Debug, Error)]
#[error("{message} ({template}:{line})")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub template: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, template: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line,
            template: template.into(),
        }
    }
}

/// Error returned by filters, tests, functions and operators.
///
/// Callables know nothing about where they were invoked; the node that
/// invoked them attaches the position.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ExtensionError {
    pub message: String,
}

impl ExtensionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that abort the render of a template.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Not an iterable object. Value = [{value}] ({template}:{line})")]
    NotIterable {
        value: String,
        line: usize,
        template: String,
    },

    #[error("Variable '{name}' does not exist ({template}:{line})")]
    UndefinedVariable {
        name: String,
        line: usize,
        template: String,
    },

    #[error("Filter '{name}' does not exist ({template}:{line})")]
    UnknownFilter {
        name: String,
        line: usize,
        template: String,
    },

    #[error("Test '{name}' does not exist ({template}:{line})")]
    UnknownTest {
        name: String,
        line: usize,
        template: String,
    },

    #[error("Function '{name}' does not exist ({template}:{line})")]
    UnknownFunction {
        name: String,
        line: usize,
        template: String,
    },

    #[error("Invalid argument to '{callable}': {message} ({template}:{line})")]
    InvalidArgument {
        callable: String,
        message: String,
        line: usize,
        template: String,
    },

    #[error("Operator '{operator}' failed: {message} ({template}:{line})")]
    Operator {
        operator: String,
        message: String,
        line: usize,
        template: String,
    },

    #[error("Failed to include \"{name}\" ({template}:{line}): {source}")]
    Include {
        name: String,
        line: usize,
        template: String,
        #[source]
        source: Box<TemplateError>,
    },

    #[error("Recursive include detected (depth > {max_depth}): {name} ({template}:{line})")]
    RecursiveInclude {
        name: String,
        max_depth: usize,
        line: usize,
        template: String,
    },

    #[error("A parallel task was dropped before completing ({template}:{line})")]
    TaskAborted { line: usize, template: String },

    #[error("Failed to write output: {0}")]
    Write(#[from] std::fmt::Error),
}

impl RenderError {
    /// Line the error was raised on, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            RenderError::NotIterable { line, .. }
            | RenderError::UndefinedVariable { line, .. }
            | RenderError::UnknownFilter { line, .. }
            | RenderError::UnknownTest { line, .. }
            | RenderError::UnknownFunction { line, .. }
            | RenderError::InvalidArgument { line, .. }
            | RenderError::Operator { line, .. }
            | RenderError::Include { line, .. }
            | RenderError::RecursiveInclude { line, .. }
            | RenderError::TaskAborted { line, .. } => Some(*line),
            RenderError::Write(_) => None,
        }
    }

    /// Name of the template the error was raised in, when known.
    pub fn template(&self) -> Option<&str> {
        match self {
            RenderError::NotIterable { template, .. }
            | RenderError::UndefinedVariable { template, .. }
            | RenderError::UnknownFilter { template, .. }
            | RenderError::UnknownTest { template, .. }
            | RenderError::UnknownFunction { template, .. }
            | RenderError::InvalidArgument { template, .. }
            | RenderError::Operator { template, .. }
            | RenderError::Include { template, .. }
            | RenderError::RecursiveInclude { template, .. }
            | RenderError::TaskAborted { template, .. } => Some(template),
            RenderError::Write(_) => None,
        }
    }
}

/// Umbrella error for engine operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for operations that only fail during rendering.
pub type RenderResult<T> = Result<T, RenderError>;

/// Result type for engine operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_template() {
        let err = LoaderError::not_found("missing.tpl");
        assert_eq!(err.to_string(), "Could not find template \"missing.tpl\"");
    }

    #[test]
    fn test_render_error_position() {
        let err = RenderError::NotIterable {
            value: "5".to_string(),
            line: 3,
            template: "page.html".to_string(),
        };
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.template(), Some("page.html"));
        assert!(err.to_string().contains("page.html:3"));
    }

    #[test]
    fn test_write_error_has_no_position() {
        let err = RenderError::from(std::fmt::Error);
        assert_eq!(err.line(), None);
        assert_eq!(err.template(), None);
    }
}
