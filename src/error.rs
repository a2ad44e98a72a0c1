//! Error types for xql.

use thiserror::Error;

/// Errors raised while evaluating builder text or checking emitted SQL.
///
/// Building and rendering a [`Query`](crate::ast::Query) never fails; every
/// variant here describes input that came from outside the builder API.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Builder text is not well-formed.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// A method name with no counterpart in the expression or query model.
    #[error("Unsupported method '{method}' on {target}")]
    UnsupportedMethod { target: &'static str, method: String },

    /// A call to a free function the builder namespace does not define.
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    /// A reference to a name that no `const`/`let` binding introduced.
    #[error("Unbound variable '{0}'")]
    UnboundVariable(String),

    /// Arguments of the wrong kind or count.
    #[error("Invalid argument for '{method}': {message}")]
    InvalidArgument { method: String, message: String },

    /// The text evaluated to something other than a query.
    #[error("Evaluated code is not a query (got {0})")]
    NotAQuery(&'static str),

    /// Emitted SQL failed the syntax self-check.
    #[error("Invalid SQL: {0}")]
    InvalidSql(String),
}

impl Error {
    /// Create a parse error at the given byte offset.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create an argument error for the given method.
    pub fn invalid_argument(method: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            method: method.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for xql operations.
pub type Result<T> = std::result::Result<T, Error>;
