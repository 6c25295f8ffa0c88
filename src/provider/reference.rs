//! Reference provider entry points.
//!
//! Built as a cdylib, this crate is itself a loadable provider module:
//! `resolve` delegates to the platform resolver, `fabricate` derives a
//! deterministic identity from the path alone. Both follow the [`super::abi`]
//! contract exactly, so the binding can be exercised end to end against this
//! crate's own artifact.

use super::abi::{self, RawFileIdentity};
use super::EntryPoints;
use crate::error::IdentityError;
use std::ffi::CStr;
use std::os::raw::c_char;

/// Volume serial reported by fabricated identities.
pub const FABRICATED_VOLUME_ID: u64 = 0xddcb_0134;

/// The reference provider's entry points, bindable in-process through
/// [`crate::IdentityProvider::from_entry_points`].
pub fn entry_points() -> EntryPoints {
	EntryPoints { resolve, fabricate }
}

/// # Safety
/// `path` must be a valid NUL-terminated string and `out` a valid pointer to
/// a [`RawFileIdentity`], per the ABI contract.
#[no_mangle]
pub unsafe extern "C" fn resolve(path: *const c_char, out: *mut RawFileIdentity) -> i32 {
	let Some(path) = decode_path(path) else {
		return abi::STATUS_INVALID_ARGUMENT;
	};
	if out.is_null() {
		return abi::STATUS_INVALID_ARGUMENT;
	}
	match crate::resolve::resolve(path) {
		Ok(identity) => {
			out.write(identity.into());
			abi::STATUS_OK
		}
		Err(err) => status_of(&err),
	}
}

/// # Safety
/// Same contract as [`resolve`].
#[no_mangle]
pub unsafe extern "C" fn fabricate(path: *const c_char, out: *mut RawFileIdentity) -> i32 {
	let Some(path) = decode_path(path) else {
		return abi::STATUS_INVALID_ARGUMENT;
	};
	if out.is_null() {
		return abi::STATUS_INVALID_ARGUMENT;
	}
	let digest = blake3::hash(path.as_bytes());
	let mut file_id = [0u8; 16];
	file_id.copy_from_slice(&digest.as_bytes()[..16]);
	out.write(RawFileIdentity {
		file_id,
		volume_id: FABRICATED_VOLUME_ID,
	});
	abi::STATUS_OK
}

unsafe fn decode_path<'a>(path: *const c_char) -> Option<&'a str> {
	if path.is_null() {
		return None;
	}
	match CStr::from_ptr(path).to_str() {
		Ok(path) if !path.is_empty() => Some(path),
		_ => None,
	}
}

fn status_of(err: &IdentityError) -> i32 {
	match err {
		IdentityError::NotFound => abi::STATUS_NOT_FOUND,
		IdentityError::AccessDenied => abi::STATUS_ACCESS_DENIED,
		IdentityError::Unsupported => abi::STATUS_UNSUPPORTED,
		IdentityError::InvalidArgument(_) => abi::STATUS_INVALID_ARGUMENT,
		IdentityError::Io(err) => err.raw_os_error().unwrap_or(abi::STATUS_INTERNAL),
		_ => abi::STATUS_INTERNAL,
	}
}
