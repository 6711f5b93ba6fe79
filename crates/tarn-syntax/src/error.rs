//! Error handling types and utilities for the Tarn language toolchain.
//!
//! This module provides the unified error handling system used throughout all
//! Tarn language components. It includes a structured error type with source
//! location information and convenience functions for error creation and
//! propagation.
//!
//! # Error Philosophy
//!
//! The Tarn error system prioritizes:
//!
//! - **Helpful error messages**: Clear, actionable error descriptions
//! - **Precise location information**: A [`Position`] for source errors
//! - **Consistent formatting**: Uniform error presentation across all stages
//! - **Easy propagation**: Convenient creation and `?`-based handling
//!
//! The first error at any stage — lexical, syntactic, or runtime — aborts the
//! run and surfaces exactly one position-annotated message; there is no
//! multi-error recovery or partial execution mode.
//!
//! # Examples
//!
//! ```rust
//! use tarn_syntax::error::{error, Error, Result};
//! use tarn_syntax::Position;
//!
//! // A plain error and one anchored to a source location
//! let plain = Error::new("something went wrong");
//! let located = Error::at("unexpected token", Position::new(10, 5));
//!
//! fn parse_number(s: &str) -> Result<i32> {
//!     s.parse().map_err(|_| Error::new(format!("invalid number: {}", s)))
//! }
//!
//! fn process_input(input: &str) -> Result<i32> {
//!     let num = parse_number(input)?;
//!     if num < 0 {
//!         error("number must be positive")
//!     } else {
//!         Ok(num * 2)
//!     }
//! }
//! ```

use std::fmt;

use crate::token::Position;

/// An error that occurred during Tarn language processing.
///
/// This structure represents all error classes in the Tarn toolchain, from
/// lexical analysis through interpretation. Each error carries a descriptive
/// message and, when the failure can be located in the source, a
/// [`Position`].
///
/// # Examples
///
/// ```rust
/// use tarn_syntax::{Error, Position};
///
/// let generic = Error::new("file not found");
///
/// let syntax = Error::at("expected '}' to close a block", Position::new(15, 8));
/// assert_eq!(format!("{}", syntax), "expected '}' to close a block at 15:8");
/// ```
#[derive(Debug, Clone)]
pub struct Error {
    /// Human-readable error message
    pub msg: String,

    /// Source location of the violation, when one exists
    pub pos: Option<Position>,
}

impl Error {
    /// Creates a new error without source location information.
    ///
    /// Suitable for failures that cannot be pinned to a source position,
    /// such as I/O problems in embedded functions.
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            pos: None,
        }
    }

    /// Creates a new error anchored at a source location.
    ///
    /// This is the common constructor: lexical, syntax, and runtime errors
    /// all point at the offending rune, token, or expression.
    pub fn at(msg: impl Into<String>, pos: Position) -> Self {
        Self {
            msg: msg.into(),
            pos: Some(pos),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pos) = self.pos {
            write!(f, "{} at {}", self.msg, pos)
        } else {
            write!(f, "{}", self.msg)
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::new(s)
    }
}
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::new(s)
    }
}

/// A specialized `Result` type for Tarn operations.
///
/// This convenience alias uses [`Error`] as the error type and is used
/// throughout the Tarn codebase for consistent error handling.
pub type Result<T> = std::result::Result<T, Error>;

/// Convenience function to create an error result.
///
/// Shorthand for `Err(Error::new(msg))`.
///
/// # Examples
///
/// ```rust
/// use tarn_syntax::error::{error, Result};
///
/// fn validate_input(s: &str) -> Result<()> {
///     if s.is_empty() {
///         error("input cannot be empty")
///     } else {
///         Ok(())
///     }
/// }
/// ```
pub fn error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::new(msg))
}

/// Convenience function to create an error result with a source location.
///
/// Shorthand for `Err(Error::at(msg, pos))`.
///
/// # Examples
///
/// ```rust
/// use tarn_syntax::error::{error_at, Result};
/// use tarn_syntax::Position;
///
/// fn reject_rune(pos: Position) -> Result<String> {
///     error_at(pos, "no token matches '&'")
/// }
/// ```
pub fn error_at<T>(pos: Position, msg: impl Into<String>) -> Result<T> {
    Err(Error::at(msg, pos))
}
