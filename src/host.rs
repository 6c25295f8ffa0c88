//! Collaborator traits over the host OS surface.
//!
//! The enumerator and resolver consume the operating system exclusively
//! through these traits, so the decoding and identity-assembly logic stays
//! testable against mock hosts. Platform implementations live in
//! [`crate::platform`].

use crate::error::IdentityResult;
use crate::types::DriveKind;
use std::path::Path;

/// Raw per-volume metadata from the host's volume information query.
#[derive(Debug, Clone)]
pub struct RawVolumeInfo {
	pub label: String,
	pub fs_kind_tag: String,
	pub serial: u64,
}

/// Free/total byte pair from the host's space query.
#[derive(Debug, Clone, Copy)]
pub struct SpaceInfo {
	pub total_bytes: u64,
	pub free_bytes: u64,
}

/// Per-file identity exactly as the filesystem reports it.
#[derive(Debug, Clone, Copy)]
pub struct RawIdentity {
	pub volume_serial: u64,
	pub file_id: [u8; 16],
}

/// One in-flight volume enumeration. The OS-level cursor is released on drop,
/// covering early termination as well as natural exhaustion.
pub trait VolumeCursor {
	/// Advances to the next volume name. `Ok(None)` signals end of set; the
	/// cursor must not be advanced again after that.
	fn next_name(&mut self) -> IdentityResult<Option<String>>;
}

/// Host volume namespace: enumeration plus per-volume queries.
pub trait VolumeHost {
	fn enumerate_volumes(&self) -> IdentityResult<Box<dyn VolumeCursor + '_>>;

	/// Returns the packed multi-string mount-point buffer for a volume and
	/// the host-reported result length in characters. Fails with
	/// [`crate::IdentityError::BufferTooSmall`] when `capacity_chars` does
	/// not fit the result.
	fn query_mount_points_raw(
		&self,
		volume_name: &str,
		capacity_chars: usize,
	) -> IdentityResult<(Vec<u16>, usize)>;

	fn query_volume_info(&self, volume_name: &str) -> IdentityResult<RawVolumeInfo>;

	fn query_free_space(&self, volume_name: &str) -> IdentityResult<SpaceInfo>;

	fn drive_kind(&self, volume_name: &str) -> DriveKind;
}

/// A scoped read-only file handle. Closed on drop, on every exit path.
pub trait FileHandle {
	/// Queries the filesystem's per-file identity structure through this
	/// handle. An all-zero identifier is a success value, never a failure
	/// sentinel.
	fn query_identity(&self) -> IdentityResult<RawIdentity>;
}

impl std::fmt::Debug for dyn FileHandle + '_ {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("FileHandle")
	}
}

/// Source of OS-backed file identities.
pub trait IdentityBackend {
	/// Acquires a read-only handle to `path`. Other processes keep shared
	/// read/write access; the backend never takes an exclusive lock.
	fn open_read(&self, path: &Path) -> IdentityResult<Box<dyn FileHandle + '_>>;
}
