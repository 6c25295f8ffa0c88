//! Stable file identity and volume topology resolution.
//!
//! This crate derives a canonical, rename-resistant identity for a file by
//! pairing the owning volume's serial with the filesystem's opaque per-file
//! identifier, and maps the host's volumes into their mount points and
//! capacity. Three pieces:
//!
//! - [`VolumeEnumerator`]: walks the host's volume namespace and decodes
//!   per-volume mount-point lists from packed multi-string buffers.
//! - [`FileIdentityResolver`]: resolves a path into a 192-bit
//!   [`FileIdentity`] through a scoped read-only handle.
//! - [`IdentityProvider`]: binds identity-producing entry points in a
//!   dynamically loaded module through a fixed, versioned C ABI, so
//!   OS-backed and module-backed resolutions are interchangeable.
//!
//! Identities and volume records are computed from live OS state on every
//! query; nothing is cached or persisted here.

pub mod enumerate;
pub mod error;
pub mod host;
pub mod multistring;
pub mod platform;
pub mod provider;
pub mod resolve;
pub mod types;

pub use enumerate::{VolumeEnumerator, VolumeNames};
pub use error::{IdentityError, IdentityResult};
pub use provider::abi::PROVIDER_ABI_VERSION;
pub use provider::{EntryPoints, IdentityProvider};
#[cfg(any(unix, windows))]
pub use resolve::resolve;
pub use resolve::FileIdentityResolver;
pub use types::{
	DriveKind, EnumeratorConfig, FileIdentifier, FileIdentity, FileSystem, VolumeId, VolumeRecord,
};
