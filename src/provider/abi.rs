//! The versioned C ABI shared with identity provider modules.
//!
//! Both sides of the module boundary are built independently, so the record
//! layout and status codes here are a fixed contract: field order, widths,
//! and byte order may not change within an ABI version. A layout mismatch at
//! this boundary corrupts silently, which is why the shape is pinned with
//! compile-time assertions instead of being inferred from a shared struct.

use crate::error::{IdentityError, IdentityResult};
use crate::types::{FileIdentifier, FileIdentity, VolumeId};
use static_assertions::const_assert_eq;
use std::os::raw::c_char;

/// Version of the layout and entry-point contract below.
pub const PROVIDER_ABI_VERSION: u32 = 1;

/// Entry point every provider must export for OS-backed resolution.
pub const RESOLVE_ENTRY_POINT: &str = "resolve";

/// Entry point every provider must export for deterministic fabrication.
pub const FABRICATE_ENTRY_POINT: &str = "fabricate";

/// Signature shared by both required entry points.
///
/// `path` is a NUL-terminated UTF-8 string; `out` is written only when the
/// returned status is [`STATUS_OK`].
pub type ProviderEntryPoint =
	unsafe extern "C" fn(path: *const c_char, out: *mut RawFileIdentity) -> i32;

/// Identity record as it crosses the module boundary.
///
/// 24 bytes, no padding: the 128-bit file identifier first, then the volume
/// serial as a little-endian u64. Byte-for-byte stable across builds of
/// either side.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFileIdentity {
	pub file_id: [u8; 16],
	pub volume_id: u64,
}

const_assert_eq!(std::mem::size_of::<RawFileIdentity>(), 24);
const_assert_eq!(std::mem::align_of::<RawFileIdentity>(), 8);

impl RawFileIdentity {
	pub const fn zeroed() -> Self {
		Self {
			file_id: [0; 16],
			volume_id: 0,
		}
	}

	/// Serialized wire form of the record.
	pub fn to_wire_bytes(&self) -> [u8; 24] {
		let mut bytes = [0u8; 24];
		bytes[..16].copy_from_slice(&self.file_id);
		bytes[16..].copy_from_slice(&self.volume_id.to_le_bytes());
		bytes
	}

	pub fn from_wire_bytes(bytes: &[u8; 24]) -> Self {
		let mut file_id = [0u8; 16];
		file_id.copy_from_slice(&bytes[..16]);
		let mut volume_id = [0u8; 8];
		volume_id.copy_from_slice(&bytes[16..]);
		Self {
			file_id,
			volume_id: u64::from_le_bytes(volume_id),
		}
	}
}

impl From<RawFileIdentity> for FileIdentity {
	fn from(raw: RawFileIdentity) -> Self {
		Self {
			volume_id: VolumeId(raw.volume_id),
			file_id: FileIdentifier(raw.file_id),
		}
	}
}

impl From<FileIdentity> for RawFileIdentity {
	fn from(identity: FileIdentity) -> Self {
		Self {
			file_id: identity.file_id.0,
			volume_id: identity.volume_id.0,
		}
	}
}

// Status codes mirror the Win32 codes the original module boundary carried.
pub const STATUS_OK: i32 = 0;
pub const STATUS_NOT_FOUND: i32 = 2;
pub const STATUS_ACCESS_DENIED: i32 = 5;
pub const STATUS_INTERNAL: i32 = 31;
pub const STATUS_UNSUPPORTED: i32 = 50;
pub const STATUS_INVALID_ARGUMENT: i32 = 87;

/// Maps a provider status code onto the caller-facing error kinds. Unknown
/// codes pass through as opaque OS errors.
pub(crate) fn status_to_result(status: i32) -> IdentityResult<()> {
	match status {
		STATUS_OK => Ok(()),
		STATUS_NOT_FOUND => Err(IdentityError::NotFound),
		STATUS_ACCESS_DENIED => Err(IdentityError::AccessDenied),
		STATUS_UNSUPPORTED => Err(IdentityError::Unsupported),
		STATUS_INVALID_ARGUMENT => {
			Err(IdentityError::InvalidArgument("rejected by provider".into()))
		}
		code => Err(IdentityError::Io(std::io::Error::from_raw_os_error(code))),
	}
}
