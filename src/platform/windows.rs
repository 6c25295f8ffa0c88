//! Windows backends over the Win32 volume and file-identity APIs.
//!
//! Volumes are keyed by their `\\?\Volume{guid}\` namespace paths from the
//! `FindFirstVolumeW` family; identity comes from
//! `GetFileInformationByHandleEx(FileIdInfo)`, which reports the 64-bit
//! volume serial and the 128-bit file id in one structure.

use crate::error::{IdentityError, IdentityResult};
use crate::host::{
	FileHandle, IdentityBackend, RawIdentity, RawVolumeInfo, SpaceInfo, VolumeCursor, VolumeHost,
};
use crate::types::DriveKind;
use std::ffi::{c_void, OsStr};
use std::iter::once;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use tracing::trace;
use windows_sys::Win32::Foundation::{
	CloseHandle, GetLastError, ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND,
	ERROR_INVALID_FUNCTION, ERROR_INVALID_PARAMETER, ERROR_MORE_DATA, ERROR_NO_MORE_FILES,
	ERROR_NOT_SUPPORTED, ERROR_PATH_NOT_FOUND, GENERIC_READ, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Storage::FileSystem::{
	CreateFileW, FileIdInfo, FindFirstVolumeW, FindNextVolumeW, FindVolumeClose,
	GetDiskFreeSpaceExW, GetDriveTypeW, GetFileInformationByHandleEx, GetVolumeInformationW,
	GetVolumePathNamesForVolumeNameW, FILE_ATTRIBUTE_NORMAL, FILE_ID_INFO, FILE_SHARE_READ,
	FILE_SHARE_WRITE, OPEN_EXISTING,
};

const NAME_BUF_CHARS: usize = 1024;

fn to_wide(s: &OsStr) -> Vec<u16> {
	s.encode_wide().chain(once(0)).collect()
}

fn wide_to_string(buf: &[u16]) -> String {
	String::from_utf16_lossy(buf)
		.trim_matches(char::from(0))
		.to_string()
}

fn win32_err(code: u32) -> IdentityError {
	match code {
		ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => IdentityError::NotFound,
		ERROR_ACCESS_DENIED => IdentityError::AccessDenied,
		code => IdentityError::Io(std::io::Error::from_raw_os_error(code as i32)),
	}
}

fn last_error() -> IdentityError {
	win32_err(unsafe { GetLastError() })
}

/// Identity backend over `CreateFileW` + `GetFileInformationByHandleEx`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsIdentityBackend;

struct OsFileHandle {
	handle: HANDLE,
}

impl FileHandle for OsFileHandle {
	fn query_identity(&self) -> IdentityResult<RawIdentity> {
		let mut info: FILE_ID_INFO = unsafe { std::mem::zeroed() };
		let ok = unsafe {
			GetFileInformationByHandleEx(
				self.handle,
				FileIdInfo,
				&mut info as *mut FILE_ID_INFO as *mut c_void,
				std::mem::size_of::<FILE_ID_INFO>() as u32,
			)
		};
		if ok == 0 {
			// Filesystems without stable file ids (FAT family) reject the
			// FileIdInfo class; surface that distinctly so callers can fall
			// back.
			return Err(match unsafe { GetLastError() } {
				ERROR_INVALID_FUNCTION | ERROR_INVALID_PARAMETER | ERROR_NOT_SUPPORTED => {
					IdentityError::Unsupported
				}
				code => win32_err(code),
			});
		}
		Ok(RawIdentity {
			volume_serial: info.VolumeSerialNumber,
			file_id: info.FileId.Identifier,
		})
	}
}

impl Drop for OsFileHandle {
	fn drop(&mut self) {
		unsafe {
			CloseHandle(self.handle);
		}
	}
}

impl IdentityBackend for OsIdentityBackend {
	fn open_read(&self, path: &Path) -> IdentityResult<Box<dyn FileHandle + '_>> {
		let wide = to_wide(path.as_os_str());
		// Shared read/write: other processes are never locked out.
		let handle = unsafe {
			CreateFileW(
				wide.as_ptr(),
				GENERIC_READ,
				FILE_SHARE_READ | FILE_SHARE_WRITE,
				std::ptr::null(),
				OPEN_EXISTING,
				FILE_ATTRIBUTE_NORMAL,
				0,
			)
		};
		if handle == INVALID_HANDLE_VALUE {
			return Err(last_error());
		}
		Ok(Box::new(OsFileHandle { handle }))
	}
}

/// Volume host over the `FindFirstVolumeW` enumeration family.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsVolumeHost;

impl OsVolumeHost {
	pub fn new() -> Self {
		Self
	}
}

struct OsVolumeCursor {
	handle: HANDLE,
	closed: bool,
	pending: Option<String>,
}

impl OsVolumeCursor {
	fn close(&mut self) {
		if !self.closed {
			unsafe {
				FindVolumeClose(self.handle);
			}
			self.closed = true;
		}
	}
}

impl VolumeCursor for OsVolumeCursor {
	fn next_name(&mut self) -> IdentityResult<Option<String>> {
		if let Some(first) = self.pending.take() {
			return Ok(Some(first));
		}
		if self.closed {
			return Ok(None);
		}
		let mut buf = [0u16; NAME_BUF_CHARS];
		let ok = unsafe { FindNextVolumeW(self.handle, buf.as_mut_ptr(), buf.len() as u32) };
		if ok == 0 {
			let code = unsafe { GetLastError() };
			self.close();
			return if code == ERROR_NO_MORE_FILES {
				Ok(None)
			} else {
				Err(win32_err(code))
			};
		}
		Ok(Some(wide_to_string(&buf)))
	}
}

impl Drop for OsVolumeCursor {
	fn drop(&mut self) {
		self.close();
	}
}

impl VolumeHost for OsVolumeHost {
	fn enumerate_volumes(&self) -> IdentityResult<Box<dyn VolumeCursor + '_>> {
		let mut buf = [0u16; NAME_BUF_CHARS];
		let handle = unsafe { FindFirstVolumeW(buf.as_mut_ptr(), buf.len() as u32) };
		if handle == INVALID_HANDLE_VALUE {
			let code = unsafe { GetLastError() };
			// A host with no visible volumes ends the set immediately.
			if code == ERROR_NO_MORE_FILES {
				return Ok(Box::new(OsVolumeCursor {
					handle: INVALID_HANDLE_VALUE,
					closed: true,
					pending: None,
				}));
			}
			return Err(win32_err(code));
		}
		trace!("volume enumeration started");
		Ok(Box::new(OsVolumeCursor {
			handle,
			closed: false,
			pending: Some(wide_to_string(&buf)),
		}))
	}

	fn query_mount_points_raw(
		&self,
		volume_name: &str,
		capacity_chars: usize,
	) -> IdentityResult<(Vec<u16>, usize)> {
		let wide = to_wide(OsStr::new(volume_name));
		let mut buf = vec![0u16; capacity_chars.max(1)];
		let mut result_len: u32 = 0;
		let ok = unsafe {
			GetVolumePathNamesForVolumeNameW(
				wide.as_ptr(),
				buf.as_mut_ptr(),
				buf.len() as u32,
				&mut result_len,
			)
		};
		if ok == 0 {
			let code = unsafe { GetLastError() };
			if code == ERROR_MORE_DATA {
				return Err(IdentityError::BufferTooSmall {
					required_chars: result_len as usize,
				});
			}
			return Err(win32_err(code));
		}
		Ok((buf, result_len as usize))
	}

	fn query_volume_info(&self, volume_name: &str) -> IdentityResult<RawVolumeInfo> {
		let wide = to_wide(OsStr::new(volume_name));
		let mut label = [0u16; 256];
		let mut fs_name = [0u16; 256];
		let mut serial: u32 = 0;
		let mut max_component_len: u32 = 0;
		let mut fs_flags: u32 = 0;
		let ok = unsafe {
			GetVolumeInformationW(
				wide.as_ptr(),
				label.as_mut_ptr(),
				label.len() as u32,
				&mut serial,
				&mut max_component_len,
				&mut fs_flags,
				fs_name.as_mut_ptr(),
				fs_name.len() as u32,
			)
		};
		if ok == 0 {
			return Err(last_error());
		}
		Ok(RawVolumeInfo {
			label: wide_to_string(&label),
			fs_kind_tag: wide_to_string(&fs_name),
			serial: serial as u64,
		})
	}

	fn query_free_space(&self, volume_name: &str) -> IdentityResult<SpaceInfo> {
		let wide = to_wide(OsStr::new(volume_name));
		let mut available: u64 = 0;
		let mut total: u64 = 0;
		let mut free: u64 = 0;
		let ok =
			unsafe { GetDiskFreeSpaceExW(wide.as_ptr(), &mut available, &mut total, &mut free) };
		if ok == 0 {
			return Err(last_error());
		}
		Ok(SpaceInfo {
			total_bytes: total,
			free_bytes: free,
		})
	}

	fn drive_kind(&self, volume_name: &str) -> DriveKind {
		let wide = to_wide(OsStr::new(volume_name));
		// GetDriveTypeW's numeric tags match DriveKind discriminants.
		DriveKind::from_tag(unsafe { GetDriveTypeW(wide.as_ptr()) })
	}
}
