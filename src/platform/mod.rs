//! Platform backends for the collaborator traits in [`crate::host`].

#[cfg(unix)]
pub mod unix;
#[cfg(windows)]
pub mod windows;

#[cfg(unix)]
pub use unix::{OsIdentityBackend, OsVolumeHost};
#[cfg(windows)]
pub use windows::{OsIdentityBackend, OsVolumeHost};
