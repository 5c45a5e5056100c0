/*!
 * Filesystem Error Types
 * Structured, type-safe error handling for filesystem operations
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Filesystem operation result
///
/// Filesystem operations can fail and must be handled to prevent data loss
pub type FsResult<T> = Result<T, FsError>;

/// Failure classification shared by every filesystem operation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[error("invalid argument")]
    Invalid,
    #[error("permission denied")]
    PermissionDenied,
    #[error("file already exists")]
    AlreadyExists,
    #[error("file does not exist")]
    NotFound,
    #[error("not a directory")]
    NotADirectory,
    #[error("is a directory")]
    IsADirectory,
    #[error("directory not empty")]
    NotEmpty,
    #[error("file already closed")]
    Closed,
    #[error("too many levels of symbolic links")]
    TooManyLinks,
    #[error("out of space")]
    OutOfSpace,
    #[error("operation not supported")]
    Unsupported,
}

/// Filesystem error: a kind plus the operation/path context it occurred in
///
/// Path-based operations render as `open /foo/bar: file does not exist`;
/// two-path operations (rename, link) carry both paths. Errors raised below
/// the public operation layer are bare kinds until the operation wraps them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FsError {
    kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    op: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    second_path: Option<String>,
}

impl FsError {
    /// Create a bare error with no operation context
    #[inline]
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            op: None,
            path: None,
            second_path: None,
        }
    }

    /// Create a path-context error (`op path: kind`)
    #[must_use]
    pub fn path(op: &str, path: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            kind,
            op: Some(op.to_string()),
            path: Some(path.into()),
            second_path: None,
        }
    }

    /// Create a two-path error (`op old new: kind`) for rename/link
    #[must_use]
    pub fn link(
        op: &str,
        old: impl Into<String>,
        new: impl Into<String>,
        kind: ErrorKind,
    ) -> Self {
        Self {
            kind,
            op: Some(op.to_string()),
            path: Some(old.into()),
            second_path: Some(new.into()),
        }
    }

    /// The failure classification, regardless of context
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The operation that failed, if recorded
    #[must_use]
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Attach operation context unless some is already present
    ///
    /// Errors surfacing from nested resolution keep their original context.
    pub(crate) fn in_op(mut self, op: &str, path: &str) -> Self {
        if self.op.is_none() {
            self.op = Some(op.to_string());
            self.path = Some(path.to_string());
        }
        self
    }

    /// Attach two-path context unless some is already present
    pub(crate) fn in_link_op(mut self, op: &str, old: &str, new: &str) -> Self {
        if self.op.is_none() {
            self.op = Some(op.to_string());
            self.path = Some(old.to_string());
            self.second_path = Some(new.to_string());
        }
        self
    }

    /// Check for `ErrorKind::NotFound`
    #[inline]
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound)
    }

    /// Check for `ErrorKind::PermissionDenied`
    #[inline]
    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self.kind, ErrorKind::PermissionDenied)
    }

    /// Check for `ErrorKind::AlreadyExists`
    #[inline]
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self.kind, ErrorKind::AlreadyExists)
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.op, &self.path, &self.second_path) {
            (Some(op), Some(path), Some(second)) => {
                write!(f, "{op} {path} {second}: {}", self.kind)
            }
            (Some(op), Some(path), None) => write!(f, "{op} {path}: {}", self.kind),
            _ => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<ErrorKind> for FsError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<FsError> for std::io::Error {
    fn from(err: FsError) -> Self {
        let kind = match err.kind() {
            ErrorKind::NotFound => std::io::ErrorKind::NotFound,
            ErrorKind::PermissionDenied => std::io::ErrorKind::PermissionDenied,
            ErrorKind::AlreadyExists => std::io::ErrorKind::AlreadyExists,
            ErrorKind::Invalid | ErrorKind::NotADirectory | ErrorKind::IsADirectory => {
                std::io::ErrorKind::InvalidInput
            }
            ErrorKind::Closed => std::io::ErrorKind::Other,
            ErrorKind::NotEmpty => std::io::ErrorKind::Other,
            ErrorKind::TooManyLinks => std::io::ErrorKind::InvalidData,
            ErrorKind::OutOfSpace => std::io::ErrorKind::Other,
            ErrorKind::Unsupported => std::io::ErrorKind::Unsupported,
        };
        std::io::Error::new(kind, err)
    }
}
