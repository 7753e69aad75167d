use thiserror::Error;
use std::fmt;

use crate::ast::ExprContext;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CloveError {
    #[error("Lexer error at line {line}, column {column}: {message}")]
    Lexer { line: usize, column: usize, message: String },

    #[error("Reader error at line {line}, column {column}: {message}")]
    Reader { line: usize, column: usize, message: String },

    #[error("Analyzer error: {0}")]
    Analyzer(String),

    #[error("Can't embed {type_name} constant in code for target '{target}'")]
    UnrepresentableConstant { type_name: String, target: String },

    #[error("Invalid use of {context} context: {message}")]
    InvalidContext { context: ExprContext, message: String },

    #[error("Code generation error: {0}")]
    CodeGen(String),

    #[error("Evaluation error: {0}")]
    Eval(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type CloveResult<T> = Result<T, CloveError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl CloveError {
    /// 错误对应的源码位置（只有词法/读取错误携带位置）
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            CloveError::Lexer { line, column, .. } | CloveError::Reader { line, column, .. } => {
                Some(SourceLocation { line: *line, column: *column })
            }
            _ => None,
        }
    }
}

pub fn lexer_error(line: usize, column: usize, message: impl Into<String>) -> CloveError {
    CloveError::Lexer {
        line,
        column,
        message: message.into(),
    }
}

pub fn reader_error(loc: SourceLocation, message: impl Into<String>) -> CloveError {
    CloveError::Reader {
        line: loc.line,
        column: loc.column,
        message: message.into(),
    }
}

pub fn analyzer_error(message: impl Into<String>) -> CloveError {
    CloveError::Analyzer(message.into())
}

pub fn codegen_error(message: impl Into<String>) -> CloveError {
    CloveError::CodeGen(message.into())
}

pub fn eval_error(message: impl Into<String>) -> CloveError {
    CloveError::Eval(message.into())
}

pub fn context_error(context: ExprContext, message: impl Into<String>) -> CloveError {
    CloveError::InvalidContext {
        context,
        message: message.into(),
    }
}

/// 打印错误，并在有位置信息时附带出错的源码行和指示符
pub fn print_error_with_context(error: &CloveError, source: &str, path: &str) {
    eprintln!("error: {}", error);
    let Some(loc) = error.location() else {
        eprintln!("  --> {}", path);
        return;
    };
    eprintln!("  --> {}:{}", path, loc);
    if let Some(line) = source.lines().nth(loc.line.saturating_sub(1)) {
        let gutter = loc.line.to_string().len();
        eprintln!("{} |", " ".repeat(gutter));
        eprintln!("{} | {}", loc.line, line);
        eprintln!(
            "{} | {}^",
            " ".repeat(gutter),
            " ".repeat(loc.column.saturating_sub(1))
        );
    }
}
