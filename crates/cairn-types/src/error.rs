//! Error type shared by the store, the adapters and the binary.

use std::fmt;

pub type ClResult<T> = std::result::Result<T, Error>;

/// Field-level validation failure
///
/// `field` names the offending part of the document: `key` when the setting
/// key itself is rejected, `value` for value checks, `id` for unresolved
/// entity references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
	pub field: Box<str>,
	pub message: String,
}

impl fmt::Display for ValidationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} (field: {})", self.message, self.field)
	}
}

#[derive(Debug)]
pub enum Error {
	NotFound,
	DbError,
	ConfigError(String),
	ValidationError(ValidationError),

	// externals
	Io(std::io::Error),
}

impl Error {
	pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
		Error::ValidationError(ValidationError { field: field.into(), message: message.into() })
	}

	pub fn invalid_key(message: impl Into<String>) -> Self {
		Self::invalid_field("key", message)
	}

	pub fn invalid_value(message: impl Into<String>) -> Self {
		Self::invalid_field("value", message)
	}

	/// Returns the validation details if this is a validation failure
	pub fn validation(&self) -> Option<&ValidationError> {
		match self {
			Error::ValidationError(err) => Some(err),
			_ => None,
		}
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		tracing::warn!("JSON: {}", err);
		Self::DbError
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::DbError => write!(f, "database error"),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::ValidationError(err) => write!(f, "validation error: {}", err),
			Error::Io(err) => write!(f, "I/O error: {}", err),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::Io(err) => Some(err),
			_ => None,
		}
	}
}


// vim: ts=4
