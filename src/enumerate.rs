//! Volume topology enumeration: volume names, mount points, capacity.

use crate::error::{IdentityError, IdentityResult};
use crate::host::{VolumeCursor, VolumeHost};
use crate::multistring;
use crate::types::{EnumeratorConfig, FileSystem, VolumeId, VolumeRecord};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Walks the host's volume namespace and materializes [`VolumeRecord`]s.
///
/// Stateless between calls: every query is recomputed from live host state.
pub struct VolumeEnumerator<H: VolumeHost> {
	host: H,
	config: EnumeratorConfig,
}

/// Iterator over volume names from one enumeration cursor.
///
/// Dropping it mid-iteration releases the underlying OS cursor.
pub struct VolumeNames<'a> {
	cursor: Box<dyn VolumeCursor + 'a>,
	done: bool,
}

impl Iterator for VolumeNames<'_> {
	type Item = IdentityResult<String>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}
		match self.cursor.next_name() {
			Ok(Some(name)) => Some(Ok(name)),
			Ok(None) => {
				self.done = true;
				None
			}
			Err(err) => {
				self.done = true;
				Some(Err(err))
			}
		}
	}
}

impl<H: VolumeHost> VolumeEnumerator<H> {
	pub fn new(host: H) -> Self {
		Self::with_config(host, EnumeratorConfig::default())
	}

	pub fn with_config(host: H, config: EnumeratorConfig) -> Self {
		Self { host, config }
	}

	/// Begins a volume enumeration. A host with no visible volumes yields an
	/// iterator that ends immediately.
	pub fn volumes(&self) -> IdentityResult<VolumeNames<'_>> {
		let cursor = self.host.enumerate_volumes()?;
		Ok(VolumeNames {
			cursor,
			done: false,
		})
	}

	/// Decodes the mount-point list of one volume. An empty set is valid: the
	/// volume exists but has no assigned mount point.
	pub fn mount_points_of(&self, volume_name: &str) -> IdentityResult<Vec<PathBuf>> {
		let capacity = self.config.mount_points_capacity_chars;
		let (buf, reported_len) = match self.host.query_mount_points_raw(volume_name, capacity) {
			Ok(raw) => raw,
			Err(IdentityError::BufferTooSmall { required_chars }) => {
				// Exactly one resize is allowed; a second undersize is an IO
				// failure, not another retry.
				let retry = required_chars.max(capacity * 2);
				debug!(
					volume = volume_name,
					retry, "mount point buffer too small, retrying"
				);
				match self.host.query_mount_points_raw(volume_name, retry) {
					Ok(raw) => raw,
					Err(IdentityError::BufferTooSmall { required_chars }) => {
						return Err(IdentityError::Io(std::io::Error::new(
							std::io::ErrorKind::Other,
							format!(
								"mount point buffer undersized after retry \
								 ({required_chars} chars required)"
							),
						)));
					}
					Err(err) => return Err(err),
				}
			}
			Err(err) => return Err(err),
		};
		Ok(multistring::decode(&buf, reported_len)
			.into_iter()
			.map(PathBuf::from)
			.collect())
	}

	/// Merges mount points, label, filesystem tag, drive kind, and capacity
	/// into one record.
	///
	/// A failing free-space query does not abort the call: the record comes
	/// back with zeroed space fields and the failure in `error_status`.
	pub fn info_of(&self, volume_name: &str) -> IdentityResult<VolumeRecord> {
		let info = self.host.query_volume_info(volume_name)?;
		let mount_points = self.mount_points_of(volume_name)?;
		let drive_kind = self.host.drive_kind(volume_name);

		let (total_bytes, free_bytes, error_status) =
			match self.host.query_free_space(volume_name) {
				Ok(space) => (space.total_bytes, space.free_bytes, None),
				Err(err) => {
					warn!(volume = volume_name, %err, "free space query failed, record degraded");
					(0, 0, Some(err.to_string()))
				}
			};

		Ok(VolumeRecord {
			volume_name: volume_name.to_string(),
			label: info.label,
			mount_points,
			drive_kind,
			file_system: FileSystem::from_tag(&info.fs_kind_tag),
			serial: VolumeId(info.serial),
			total_bytes,
			free_bytes,
			error_status,
		})
	}

	/// Full walk: one record per visible volume. A single volume's info query
	/// failing is logged and that volume skipped; the rest still enumerate.
	pub fn enumerate_all(&self) -> IdentityResult<Vec<VolumeRecord>> {
		let mut records = Vec::new();
		for name in self.volumes()? {
			let name = name?;
			match self.info_of(&name) {
				Ok(record) => records.push(record),
				Err(err) => {
					warn!(volume = %name, %err, "skipping volume, info query failed");
				}
			}
		}
		debug!(count = records.len(), "enumerated volumes");
		Ok(records)
	}

	/// Finds the volume whose mount-point set contains `path`, preferring the
	/// most specific (longest) mount point when several volumes match.
	pub fn volume_for_path(&self, path: &Path) -> IdentityResult<Option<VolumeRecord>> {
		Ok(self
			.enumerate_all()?
			.into_iter()
			.filter(|record| record.contains_path(path))
			.max_by_key(|record| {
				record
					.mount_points
					.iter()
					.filter(|mp| path.starts_with(mp))
					.map(|mp| mp.as_os_str().len())
					.max()
					.unwrap_or(0)
			}))
	}
}
