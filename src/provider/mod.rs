//! Dynamic identity provider binding.
//!
//! A provider is a module exporting the two [`abi`] entry points. The binding
//! validates both at load time (a provider missing either is rejected before
//! any call) and owns the module mapping for the handle's lifetime. Loading
//! and binding are separable: entry points already linked into the process
//! bind through [`IdentityProvider::from_entry_points`].

pub mod abi;
pub mod reference;

use crate::error::{IdentityError, IdentityResult};
use crate::types::FileIdentity;
use abi::{ProviderEntryPoint, RawFileIdentity};
use libloading::Library;
use std::ffi::{CString, OsStr};
use std::path::Path;
use tracing::debug;

/// The two validated entry points of a provider.
#[derive(Clone, Copy, Debug)]
pub struct EntryPoints {
	pub resolve: ProviderEntryPoint,
	pub fabricate: ProviderEntryPoint,
}

#[derive(Debug)]
struct Bound {
	entry_points: EntryPoints,
	// Keeps the module mapped while the raw entry points are callable; None
	// for in-process providers.
	_module: Option<Library>,
}

/// A loaded, validated identity provider.
///
/// Calls are safe to issue concurrently unless the provider module documents
/// otherwise; the binding imposes no serialization. After [`release`], every
/// call fails with [`IdentityError::HandleInvalid`].
///
/// [`release`]: IdentityProvider::release
#[derive(Debug)]
pub struct IdentityProvider {
	bound: Option<Bound>,
}

impl IdentityProvider {
	/// Loads a provider module and validates both required entry points.
	///
	/// Fails with `ModuleNotFound` when the module cannot be loaded and
	/// `SymbolMissing(name)` when an entry point is absent; never partially
	/// succeeds.
	pub fn load(module_ref: impl AsRef<OsStr>) -> IdentityResult<Self> {
		let module_ref = module_ref.as_ref();
		// SAFETY: loading a module runs its initializers; callers choose
		// which provider modules to trust.
		let module = unsafe { Library::new(module_ref) }.map_err(|err| {
			IdentityError::ModuleNotFound(format!("{}: {err}", module_ref.to_string_lossy()))
		})?;

		let resolve = lookup(&module, abi::RESOLVE_ENTRY_POINT)?;
		let fabricate = lookup(&module, abi::FABRICATE_ENTRY_POINT)?;
		debug!(module = %module_ref.to_string_lossy(), "provider module bound");

		Ok(Self {
			bound: Some(Bound {
				entry_points: EntryPoints { resolve, fabricate },
				_module: Some(module),
			}),
		})
	}

	/// Binds entry points that are already linked into the process to the
	/// same validated call surface.
	pub fn from_entry_points(entry_points: EntryPoints) -> Self {
		Self {
			bound: Some(Bound {
				entry_points,
				_module: None,
			}),
		}
	}

	/// Delegates to the provider's real-identity entry point. Same error
	/// contract as [`crate::FileIdentityResolver::resolve`].
	pub fn resolve_via(&self, path: impl AsRef<Path>) -> IdentityResult<FileIdentity> {
		let bound = self.bound()?;
		call(bound.entry_points.resolve, path.as_ref())
	}

	/// Delegates to the provider's deterministic, non-OS-backed entry point.
	/// An empty path is rejected before crossing the boundary.
	pub fn fabricate_via(&self, path: impl AsRef<Path>) -> IdentityResult<FileIdentity> {
		let bound = self.bound()?;
		let path = path.as_ref();
		if path.as_os_str().is_empty() {
			return Err(IdentityError::InvalidArgument(
				"provider path must not be empty".into(),
			));
		}
		call(bound.entry_points.fabricate, path)
	}

	/// Invalidates the handle and unloads the module. Idempotent.
	pub fn release(&mut self) {
		self.bound = None;
	}

	pub fn is_released(&self) -> bool {
		self.bound.is_none()
	}

	fn bound(&self) -> IdentityResult<&Bound> {
		self.bound.as_ref().ok_or(IdentityError::HandleInvalid)
	}
}

fn lookup(module: &Library, name: &'static str) -> IdentityResult<ProviderEntryPoint> {
	// SAFETY: the symbol is only ever invoked through the fixed ABI
	// signature it was declared with.
	unsafe {
		module
			.get::<ProviderEntryPoint>(name.as_bytes())
			.map(|symbol| *symbol)
			.map_err(|_| IdentityError::SymbolMissing(name))
	}
}

fn call(entry_point: ProviderEntryPoint, path: &Path) -> IdentityResult<FileIdentity> {
	let path = CString::new(path.to_string_lossy().into_owned())
		.map_err(|_| IdentityError::InvalidArgument("path contains an interior NUL".into()))?;
	let mut raw = RawFileIdentity::zeroed();
	// SAFETY: `path` outlives the call and `raw` is a valid out pointer with
	// the ABI's exact layout.
	let status = unsafe { entry_point(path.as_ptr(), &mut raw) };
	abi::status_to_result(status)?;
	Ok(raw.into())
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use std::os::raw::c_char;

	unsafe extern "C" fn echo_len(path: *const c_char, out: *mut RawFileIdentity) -> i32 {
		if path.is_null() || out.is_null() {
			return abi::STATUS_INVALID_ARGUMENT;
		}
		let len = std::ffi::CStr::from_ptr(path).to_bytes().len();
		let mut file_id = [0u8; 16];
		file_id[0] = len as u8;
		out.write(RawFileIdentity {
			file_id,
			volume_id: 0x1000 + len as u64,
		});
		abi::STATUS_OK
	}

	unsafe extern "C" fn always_denied(_: *const c_char, _: *mut RawFileIdentity) -> i32 {
		abi::STATUS_ACCESS_DENIED
	}

	unsafe extern "C" fn exotic_status(_: *const c_char, _: *mut RawFileIdentity) -> i32 {
		1234
	}

	fn echo_provider() -> IdentityProvider {
		IdentityProvider::from_entry_points(EntryPoints {
			resolve: echo_len,
			fabricate: echo_len,
		})
	}

	#[test]
	fn fabricate_is_deterministic_per_input() {
		let provider = echo_provider();
		let first = provider.fabricate_via("some/path").unwrap();
		let second = provider.fabricate_via("some/path").unwrap();
		assert_eq!(first, second);

		let other = provider.fabricate_via("other/longer/path").unwrap();
		assert_ne!(first, other);
	}

	#[test]
	fn fabricate_rejects_empty_path_before_the_boundary() {
		let provider = echo_provider();
		assert!(matches!(
			provider.fabricate_via("").unwrap_err(),
			IdentityError::InvalidArgument(_)
		));
	}

	#[test]
	fn released_handle_fails_every_call() {
		let mut provider = echo_provider();
		provider.release();
		assert!(provider.is_released());
		assert!(matches!(
			provider.resolve_via("anything").unwrap_err(),
			IdentityError::HandleInvalid
		));
		assert!(matches!(
			provider.fabricate_via("anything").unwrap_err(),
			IdentityError::HandleInvalid
		));
		// Releasing twice is fine.
		provider.release();
	}

	#[test]
	fn provider_status_codes_surface_as_error_kinds() {
		let provider = IdentityProvider::from_entry_points(EntryPoints {
			resolve: always_denied,
			fabricate: exotic_status,
		});
		assert!(matches!(
			provider.resolve_via("/x").unwrap_err(),
			IdentityError::AccessDenied
		));
		assert!(matches!(
			provider.fabricate_via("/x").unwrap_err(),
			IdentityError::Io(_)
		));
	}

	#[test]
	fn load_of_missing_module_fails_cleanly() {
		let err = IdentityProvider::load("/no/such/provider-module.so").unwrap_err();
		assert!(matches!(err, IdentityError::ModuleNotFound(_)));
	}

	#[cfg(target_os = "linux")]
	#[test]
	fn module_without_entry_points_is_rejected_at_load() {
		// libc is loadable but exports neither entry point; the binding must
		// reject it at load time, not at first call.
		match IdentityProvider::load("libc.so.6") {
			Err(IdentityError::SymbolMissing(name)) => {
				assert!(name == "resolve" || name == "fabricate");
			}
			Err(other) => panic!("expected SymbolMissing, got {other}"),
			Ok(_) => panic!("libc must not validate as a provider"),
		}
	}
}
