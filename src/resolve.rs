//! File identity resolution: path to canonical 192-bit identity record.

use crate::error::IdentityResult;
use crate::host::IdentityBackend;
use crate::types::{FileIdentifier, FileIdentity, VolumeId};
use std::path::Path;
use tracing::trace;

/// Resolves paths into [`FileIdentity`] records through an injected backend.
///
/// Stateless and side-effect free beyond the transient read handle: no
/// writes, no caching, one short-lived OS handle per call.
pub struct FileIdentityResolver<B: IdentityBackend> {
	backend: B,
}

impl<B: IdentityBackend> FileIdentityResolver<B> {
	pub fn new(backend: B) -> Self {
		Self { backend }
	}

	/// Derives the canonical identity of the file at `path`.
	///
	/// Fails with `NotFound`, `AccessDenied`, `Unsupported` (the filesystem
	/// exposes no stable identifier), or `Io` for anything else. An all-zero
	/// identifier is returned as-is; only an explicit failed query is an
	/// error.
	pub fn resolve(&self, path: impl AsRef<Path>) -> IdentityResult<FileIdentity> {
		let path = path.as_ref();
		// The handle is scoped to this call; drop closes it on every exit
		// path, error branches included.
		let handle = self.backend.open_read(path)?;
		let raw = handle.query_identity()?;
		let identity = FileIdentity {
			volume_id: VolumeId(raw.volume_serial),
			file_id: FileIdentifier(raw.file_id),
		};
		trace!(path = %path.display(), %identity, "resolved file identity");
		Ok(identity)
	}
}

/// Resolves `path` with the platform backend.
#[cfg(any(unix, windows))]
pub fn resolve(path: impl AsRef<Path>) -> IdentityResult<FileIdentity> {
	FileIdentityResolver::new(crate::platform::OsIdentityBackend::default()).resolve(path)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::IdentityError;
	use crate::host::{FileHandle, RawIdentity};
	use pretty_assertions::assert_eq;
	use std::cell::Cell;
	use std::rc::Rc;

	struct MockHandle {
		result: IdentityResult<RawIdentity>,
		closed: Rc<Cell<u32>>,
	}

	impl FileHandle for MockHandle {
		fn query_identity(&self) -> IdentityResult<RawIdentity> {
			match &self.result {
				Ok(raw) => Ok(*raw),
				Err(_) => Err(IdentityError::Unsupported),
			}
		}
	}

	impl Drop for MockHandle {
		fn drop(&mut self) {
			self.closed.set(self.closed.get() + 1);
		}
	}

	struct MockBackend {
		open_result: Option<RawIdentity>,
		open_fails: Option<IdentityError>,
		closed: Rc<Cell<u32>>,
	}

	impl MockBackend {
		fn ok(raw: RawIdentity) -> Self {
			Self {
				open_result: Some(raw),
				open_fails: None,
				closed: Rc::new(Cell::new(0)),
			}
		}
	}

	impl IdentityBackend for MockBackend {
		fn open_read(&self, _path: &Path) -> IdentityResult<Box<dyn FileHandle + '_>> {
			if let Some(err) = &self.open_fails {
				return Err(match err {
					IdentityError::NotFound => IdentityError::NotFound,
					IdentityError::AccessDenied => IdentityError::AccessDenied,
					_ => IdentityError::HandleInvalid,
				});
			}
			Ok(Box::new(MockHandle {
				result: self
					.open_result
					.ok_or(IdentityError::Unsupported),
				closed: Rc::clone(&self.closed),
			}))
		}
	}

	const RAW: RawIdentity = RawIdentity {
		volume_serial: 0xddcb_0134,
		file_id: [7; 16],
	};

	#[test]
	fn assembles_identity_from_raw_parts() {
		let backend = MockBackend::ok(RAW);
		let resolver = FileIdentityResolver::new(backend);
		let identity = resolver.resolve("/some/file").unwrap();
		assert_eq!(identity.volume_id, VolumeId(0xddcb_0134));
		assert_eq!(identity.file_id, FileIdentifier([7; 16]));
	}

	#[test]
	fn resolve_is_idempotent() {
		let resolver = FileIdentityResolver::new(MockBackend::ok(RAW));
		assert_eq!(
			resolver.resolve("/some/file").unwrap(),
			resolver.resolve("/some/file").unwrap()
		);
	}

	#[test]
	fn handle_is_closed_on_success() {
		let backend = MockBackend::ok(RAW);
		let closed = Rc::clone(&backend.closed);
		let resolver = FileIdentityResolver::new(backend);
		resolver.resolve("/some/file").unwrap();
		assert_eq!(closed.get(), 1);
	}

	#[test]
	fn handle_is_closed_when_the_query_fails() {
		let mut backend = MockBackend::ok(RAW);
		backend.open_result = None;
		let closed = Rc::clone(&backend.closed);
		let resolver = FileIdentityResolver::new(backend);

		let err = resolver.resolve("/some/file").unwrap_err();
		assert!(matches!(err, IdentityError::Unsupported));
		assert_eq!(closed.get(), 1);
	}

	#[test]
	fn open_failure_propagates_its_kind() {
		let mut backend = MockBackend::ok(RAW);
		backend.open_fails = Some(IdentityError::NotFound);
		let resolver = FileIdentityResolver::new(backend);
		assert!(matches!(
			resolver.resolve("/gone").unwrap_err(),
			IdentityError::NotFound
		));
	}

	#[test]
	fn zero_identifier_resolves_successfully() {
		let resolver = FileIdentityResolver::new(MockBackend::ok(RawIdentity {
			volume_serial: 3,
			file_id: [0; 16],
		}));
		let identity = resolver.resolve("/sparse").unwrap();
		assert!(identity.file_id.is_zero());
	}
}
