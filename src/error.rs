//! Error types shared by the enumerator, resolver, and provider binding.

use std::io;
use thiserror::Error;

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Failure kinds for identity resolution and volume enumeration.
///
/// End-of-iteration is never an error: exhausted cursors yield `Ok(None)`.
#[derive(Debug, Error)]
pub enum IdentityError {
	#[error("file not found")]
	NotFound,

	#[error("access denied")]
	AccessDenied,

	/// The filesystem does not expose a stable per-file identifier. Kept
	/// distinct from [`Self::NotFound`] and [`Self::AccessDenied`] so callers
	/// can fall back to weaker identities.
	#[error("filesystem does not expose a stable file identifier")]
	Unsupported,

	/// Opaque OS status passthrough for everything without a kind of its own.
	#[error("io error: {0}")]
	Io(#[from] io::Error),

	/// Recoverable: retry the mount-point query once with a larger buffer.
	#[error("mount point buffer too small ({required_chars} chars required)")]
	BufferTooSmall { required_chars: usize },

	#[error("provider module not found: {0}")]
	ModuleNotFound(String),

	#[error("provider is missing required entry point `{0}`")]
	SymbolMissing(&'static str),

	/// Programming error: a call went through a released provider handle.
	#[error("provider handle has been released")]
	HandleInvalid,

	#[error("invalid argument: {0}")]
	InvalidArgument(String),
}

impl IdentityError {
	/// Maps an [`io::Error`] onto the distinct kinds callers branch on.
	pub fn from_io(err: io::Error) -> Self {
		match err.kind() {
			io::ErrorKind::NotFound => Self::NotFound,
			io::ErrorKind::PermissionDenied => Self::AccessDenied,
			io::ErrorKind::Unsupported => Self::Unsupported,
			_ => Self::Io(err),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn io_kinds_map_to_distinct_errors() {
		let not_found = IdentityError::from_io(io::Error::new(io::ErrorKind::NotFound, "gone"));
		assert!(matches!(not_found, IdentityError::NotFound));

		let denied =
			IdentityError::from_io(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
		assert!(matches!(denied, IdentityError::AccessDenied));

		let other = IdentityError::from_io(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"));
		assert!(matches!(other, IdentityError::Io(_)));
	}

	#[test]
	fn buffer_too_small_reports_requirement() {
		let err = IdentityError::BufferTooSmall { required_chars: 96 };
		assert!(err.to_string().contains("96"));
	}
}
