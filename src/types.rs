//! Core identity and volume record types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Filesystem-assigned serial number of a mounted volume.
///
/// Stable across files on the same volume for the lifetime of the mount, not
/// guaranteed stable across unmount/remount cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VolumeId(pub u64);

impl fmt::Display for VolumeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:#018x}", self.0)
	}
}

/// 128-bit opaque identifier the filesystem assigns to a file object.
///
/// Stable across renames and moves within the same volume. Hard links share
/// one identifier. An all-zero value is legitimate on some filesystems and is
/// never an error sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileIdentifier(pub [u8; 16]);

impl FileIdentifier {
	pub fn is_zero(&self) -> bool {
		self.0 == [0u8; 16]
	}
}

impl fmt::Display for FileIdentifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for byte in &self.0 {
			write!(f, "{byte:02x}")?;
		}
		Ok(())
	}
}

/// The canonical 192-bit identity record: volume plus per-file identifier.
///
/// Two records are equal iff they refer to the same filesystem object as
/// observed at resolution time. Equality does not survive volume reformatting
/// or cross-volume copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileIdentity {
	pub volume_id: VolumeId,
	pub file_id: FileIdentifier,
}

impl FileIdentity {
	pub fn new(volume_id: VolumeId, file_id: FileIdentifier) -> Self {
		Self { volume_id, file_id }
	}
}

impl fmt::Display for FileIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.volume_id, self.file_id)
	}
}

/// Host drive-type tag for a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriveKind {
	Unknown,
	NoRootDir,
	Removable,
	Fixed,
	Remote,
	CdRom,
	RamDisk,
}

impl DriveKind {
	/// Maps the host's numeric drive-type tag.
	pub fn from_tag(tag: u32) -> Self {
		match tag {
			1 => Self::NoRootDir,
			2 => Self::Removable,
			3 => Self::Fixed,
			4 => Self::Remote,
			5 => Self::CdRom,
			6 => Self::RamDisk,
			_ => Self::Unknown,
		}
	}
}

impl fmt::Display for DriveKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Unknown => "Unknown",
			Self::NoRootDir => "NoRootDir",
			Self::Removable => "Removable",
			Self::Fixed => "Fixed",
			Self::Remote => "Remote",
			Self::CdRom => "CdRom",
			Self::RamDisk => "RamDisk",
		})
	}
}

/// Filesystem kind as reported by the host's volume information query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileSystem {
	Ntfs,
	ReFs,
	Fat32,
	ExFat,
	Ext4,
	Btrfs,
	Zfs,
	Apfs,
	Xfs,
	Other(String),
}

impl FileSystem {
	pub fn from_tag(tag: &str) -> Self {
		match tag.to_lowercase().as_str() {
			"ntfs" => Self::Ntfs,
			"refs" => Self::ReFs,
			"fat32" | "vfat" => Self::Fat32,
			"exfat" => Self::ExFat,
			"ext2" | "ext3" | "ext4" => Self::Ext4,
			"btrfs" => Self::Btrfs,
			"zfs" => Self::Zfs,
			"apfs" => Self::Apfs,
			"xfs" => Self::Xfs,
			_ => Self::Other(tag.to_string()),
		}
	}
}

impl fmt::Display for FileSystem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Ntfs => f.write_str("NTFS"),
			Self::ReFs => f.write_str("ReFS"),
			Self::Fat32 => f.write_str("FAT32"),
			Self::ExFat => f.write_str("exFAT"),
			Self::Ext4 => f.write_str("ext4"),
			Self::Btrfs => f.write_str("Btrfs"),
			Self::Zfs => f.write_str("ZFS"),
			Self::Apfs => f.write_str("APFS"),
			Self::Xfs => f.write_str("XFS"),
			Self::Other(name) => f.write_str(name),
		}
	}
}

/// Snapshot of one mounted volume: name, mount points, kind, capacity.
///
/// Recomputed on every query, never cached here. `mount_points` may be empty
/// for a volume with no assigned mount point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeRecord {
	/// Opaque volume-namespace path the host enumerates volumes under.
	pub volume_name: String,
	/// Human-readable volume label; may be empty.
	pub label: String,
	pub mount_points: Vec<PathBuf>,
	pub drive_kind: DriveKind,
	pub file_system: FileSystem,
	pub serial: VolumeId,
	pub total_bytes: u64,
	pub free_bytes: u64,
	/// Set when the free-space query failed and the space fields above are
	/// zero sentinels rather than measurements.
	pub error_status: Option<String>,
}

impl VolumeRecord {
	/// Whether `path` lives under any of this volume's mount points.
	pub fn contains_path(&self, path: &Path) -> bool {
		self.mount_points.iter().any(|mp| path.starts_with(mp))
	}

	pub fn is_degraded(&self) -> bool {
		self.error_status.is_some()
	}
}

/// Tuning knobs for volume enumeration.
#[derive(Debug, Clone)]
pub struct EnumeratorConfig {
	/// Initial capacity, in characters, requested for the packed mount-point
	/// buffer. An undersized buffer is retried once before failing.
	pub mount_points_capacity_chars: usize,
}

impl Default for EnumeratorConfig {
	fn default() -> Self {
		Self {
			mount_points_capacity_chars: 512,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn record(mount_points: Vec<PathBuf>) -> VolumeRecord {
		VolumeRecord {
			volume_name: r"\\?\Volume{6db54ba2-0000-0000-0000-100000000000}\".to_string(),
			label: "Data".to_string(),
			mount_points,
			drive_kind: DriveKind::Fixed,
			file_system: FileSystem::Ntfs,
			serial: VolumeId(0xddcb_0134),
			total_bytes: 512 * 1024 * 1024 * 1024,
			free_bytes: 100 * 1024 * 1024 * 1024,
			error_status: None,
		}
	}

	#[test]
	fn contains_path_checks_every_mount_point() {
		let record = record(vec![PathBuf::from("/home"), PathBuf::from("/mnt/home")]);
		assert!(record.contains_path(Path::new("/home/user/file.txt")));
		assert!(record.contains_path(Path::new("/mnt/home/user/file.txt")));
		assert!(!record.contains_path(Path::new("/var/log/file.txt")));
	}

	#[test]
	fn empty_mount_point_set_contains_nothing() {
		let record = record(vec![]);
		assert!(!record.contains_path(Path::new("/anything")));
		assert!(!record.is_degraded());
	}

	#[test]
	fn identity_equality_is_componentwise() {
		let a = FileIdentity::new(VolumeId(7), FileIdentifier([1; 16]));
		let b = FileIdentity::new(VolumeId(7), FileIdentifier([1; 16]));
		let other_volume = FileIdentity::new(VolumeId(8), FileIdentifier([1; 16]));
		assert_eq!(a, b);
		assert_ne!(a, other_volume);
	}

	#[test]
	fn zero_identifier_is_a_value_not_a_sentinel() {
		let zero = FileIdentifier([0; 16]);
		assert!(zero.is_zero());
		assert_eq!(zero, FileIdentifier([0; 16]));
		assert_eq!(zero.to_string(), "0".repeat(32));
	}

	#[test]
	fn drive_kind_tag_mapping() {
		assert_eq!(DriveKind::from_tag(3), DriveKind::Fixed);
		assert_eq!(DriveKind::from_tag(5), DriveKind::CdRom);
		assert_eq!(DriveKind::from_tag(0), DriveKind::Unknown);
		assert_eq!(DriveKind::from_tag(42), DriveKind::Unknown);
	}

	#[test]
	fn filesystem_tag_parsing() {
		assert_eq!(FileSystem::from_tag("NTFS"), FileSystem::Ntfs);
		assert_eq!(FileSystem::from_tag("ext4"), FileSystem::Ext4);
		assert_eq!(FileSystem::from_tag("vfat"), FileSystem::Fat32);
		assert!(matches!(FileSystem::from_tag("9p"), FileSystem::Other(_)));
	}

	#[test]
	fn volume_record_serializes() {
		let record = record(vec![PathBuf::from("C:\\")]);
		let json = serde_json::to_string(&record).unwrap();
		let back: VolumeRecord = serde_json::from_str(&json).unwrap();
		assert_eq!(back.serial, record.serial);
		assert_eq!(back.mount_points, record.mount_points);
	}
}
