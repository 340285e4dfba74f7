use std::fmt;

/// A compilation error tied to the source location that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub message: String,
    pub filename: String,
    pub line: u32,
}

impl CompileError {
    #[must_use]
    pub fn new(message: impl Into<String>, filename: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            filename: filename.into(),
            line,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}:{}", self.message, self.filename, self.line)
    }
}

impl std::error::Error for CompileError {}

/// Errors raised while evaluating an expression or encoding an operand,
/// before a source location is attached by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    UndefinedSymbol(String),
    DuplicateSymbol(String),
    ValueTooHigh(i64),
    InvalidLiteral(String),
    OrgRestoreWithoutSave,
    DefineStartsWithDot(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedSymbol(name) => write!(f, "Symbol '{name}' not defined"),
            Self::DuplicateSymbol(name) => write!(f, "Symbol '{name}' already defined"),
            Self::ValueTooHigh(v) => write!(f, "Value too high: {v}"),
            Self::InvalidLiteral(text) => write!(f, "Invalid literal '{text}'"),
            Self::OrgRestoreWithoutSave => write!(f, "org restore without matching org"),
            Self::DefineStartsWithDot(name) => {
                write!(f, "Define '{name}' may not start with '.'")
            }
        }
    }
}

impl std::error::Error for EvalError {}
