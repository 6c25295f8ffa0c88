//! Unix backends: sysinfo disk enumeration plus stdlib metadata identity.
//!
//! Volumes are keyed by device name. The device/inode pair is the stable
//! identity on unix filesystems: the device number doubles as the volume
//! serial and the inode fills the low 8 bytes of the 128-bit identifier.

use crate::error::{IdentityError, IdentityResult};
use crate::host::{
	FileHandle, IdentityBackend, RawIdentity, RawVolumeInfo, SpaceInfo, VolumeCursor, VolumeHost,
};
use crate::multistring;
use crate::types::DriveKind;
use std::fs::File;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use sysinfo::Disks;
use tracing::trace;

/// Identity backend over `open(2)`/`fstat(2)` through the stdlib.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsIdentityBackend;

struct OsFileHandle {
	file: File,
}

impl FileHandle for OsFileHandle {
	fn query_identity(&self) -> IdentityResult<RawIdentity> {
		let meta = self.file.metadata().map_err(IdentityError::from_io)?;
		let mut file_id = [0u8; 16];
		file_id[..8].copy_from_slice(&meta.ino().to_le_bytes());
		Ok(RawIdentity {
			volume_serial: meta.dev(),
			file_id,
		})
	}
}

impl IdentityBackend for OsIdentityBackend {
	fn open_read(&self, path: &Path) -> IdentityResult<Box<dyn FileHandle + '_>> {
		// Read-only; other processes keep full shared access.
		let file = File::open(path).map_err(IdentityError::from_io)?;
		Ok(Box::new(OsFileHandle { file }))
	}
}

/// Volume host over sysinfo's mounted-disk list.
#[derive(Debug, Default, Clone)]
pub struct OsVolumeHost {
	include_virtual: bool,
}

#[derive(Debug, Clone)]
struct DiskEntry {
	name: String,
	mount_point: PathBuf,
	file_system: String,
	total_bytes: u64,
	free_bytes: u64,
	removable: bool,
}

impl OsVolumeHost {
	pub fn new() -> Self {
		Self::default()
	}

	/// Also enumerates virtual filesystems (tmpfs, overlay, ...), which are
	/// skipped by default.
	pub fn with_virtual(include_virtual: bool) -> Self {
		Self { include_virtual }
	}

	// Fresh snapshot per query; records are never cached here.
	fn snapshot(&self) -> Vec<DiskEntry> {
		let disks = Disks::new_with_refreshed_list();
		let mut entries = Vec::new();
		for disk in disks.list() {
			let file_system = disk.file_system().to_string_lossy().into_owned();
			if !self.include_virtual && is_virtual_filesystem(&file_system) {
				continue;
			}
			entries.push(DiskEntry {
				name: disk.name().to_string_lossy().into_owned(),
				mount_point: disk.mount_point().to_path_buf(),
				file_system,
				total_bytes: disk.total_space(),
				free_bytes: disk.available_space(),
				removable: disk.is_removable(),
			});
		}
		entries
	}

	fn find(&self, volume_name: &str) -> IdentityResult<DiskEntry> {
		self.snapshot()
			.into_iter()
			.find(|entry| entry.name == volume_name)
			.ok_or(IdentityError::NotFound)
	}
}

struct SnapshotCursor {
	names: std::vec::IntoIter<String>,
}

impl VolumeCursor for SnapshotCursor {
	fn next_name(&mut self) -> IdentityResult<Option<String>> {
		Ok(self.names.next())
	}
}

impl VolumeHost for OsVolumeHost {
	fn enumerate_volumes(&self) -> IdentityResult<Box<dyn VolumeCursor + '_>> {
		// A device mounted in several places shows up once per mount point;
		// the cursor yields each volume exactly once.
		let mut names: Vec<String> = Vec::new();
		for entry in self.snapshot() {
			if !names.contains(&entry.name) {
				names.push(entry.name);
			}
		}
		trace!(count = names.len(), "unix volume snapshot");
		Ok(Box::new(SnapshotCursor {
			names: names.into_iter(),
		}))
	}

	fn query_mount_points_raw(
		&self,
		volume_name: &str,
		capacity_chars: usize,
	) -> IdentityResult<(Vec<u16>, usize)> {
		let mounts: Vec<String> = self
			.snapshot()
			.into_iter()
			.filter(|entry| entry.name == volume_name)
			.map(|entry| entry.mount_point.to_string_lossy().into_owned())
			.collect();
		// Packed into the same wire shape the windows host reports, so both
		// hosts honor one decoding contract.
		let buf = multistring::encode(&mounts);
		if buf.len() > capacity_chars {
			return Err(IdentityError::BufferTooSmall {
				required_chars: buf.len(),
			});
		}
		let reported_len = buf.len();
		Ok((buf, reported_len))
	}

	fn query_volume_info(&self, volume_name: &str) -> IdentityResult<RawVolumeInfo> {
		let entry = self.find(volume_name)?;
		// The mount point's device number is the serial, keeping volume ids
		// consistent with what the identity backend reports for files.
		let serial = std::fs::metadata(&entry.mount_point)
			.map_err(IdentityError::from_io)?
			.dev();
		Ok(RawVolumeInfo {
			label: entry.name,
			fs_kind_tag: entry.file_system,
			serial,
		})
	}

	fn query_free_space(&self, volume_name: &str) -> IdentityResult<SpaceInfo> {
		let entry = self.find(volume_name)?;
		Ok(SpaceInfo {
			total_bytes: entry.total_bytes,
			free_bytes: entry.free_bytes,
		})
	}

	fn drive_kind(&self, volume_name: &str) -> DriveKind {
		match self.find(volume_name) {
			Ok(entry) if is_remote_filesystem(&entry.file_system) => DriveKind::Remote,
			Ok(entry) if entry.removable => DriveKind::Removable,
			Ok(entry) if is_memory_filesystem(&entry.file_system) => DriveKind::RamDisk,
			Ok(_) => DriveKind::Fixed,
			Err(_) => DriveKind::Unknown,
		}
	}
}

fn is_virtual_filesystem(fs: &str) -> bool {
	matches!(
		fs.to_lowercase().as_str(),
		"devfs" | "sysfs" | "proc" | "procfs" | "tmpfs" | "ramfs" | "devtmpfs" | "overlay"
			| "squashfs" | "cgroup" | "cgroup2"
	)
}

fn is_remote_filesystem(fs: &str) -> bool {
	let fs = fs.to_lowercase();
	fs.starts_with("nfs") || matches!(fs.as_str(), "cifs" | "smbfs" | "sshfs" | "9p")
}

fn is_memory_filesystem(fs: &str) -> bool {
	matches!(fs.to_lowercase().as_str(), "tmpfs" | "ramfs")
}
