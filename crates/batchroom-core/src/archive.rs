//! Archive packager.
//!
//! Collects the named outputs of a batch into one tar blob. Entries appear in
//! the order they were given. Headers are deterministic (mode 0644, mtime 0,
//! uid/gid 0), so identical outputs produce byte-identical archives.
//!
//! Two outputs with the same name collapse into one entry: it stays at the
//! position of the first occurrence and carries the bytes of the last. No
//! renaming happens here; callers wanting unique names must choose them
//! before packing.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path};

use thiserror::Error;
use tracing::{debug, warn};

use crate::engine::TransformOutput;

/// MIME type of a packed archive.
pub const ARCHIVE_MIME_TYPE: &str = "application/x-tar";

/// File extension of a packed archive.
pub const ARCHIVE_EXTENSION: &str = "tar";

/// Base name used when the caller does not choose one.
pub const DEFAULT_ARCHIVE_STEM: &str = "batchroom-export";

/// File name for an archive with the given stem, e.g. `photos.tar`.
pub fn archive_file_name(stem: &str) -> String {
    format!("{stem}.{ARCHIVE_EXTENSION}")
}

/// Errors that can occur while building an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The container refused to write this entry.
    #[error("Cannot add archive entry {name:?}: {source}")]
    Entry {
        name: String,
        #[source]
        source: io::Error,
    },

    /// The name cannot be stored as a relative entry path.
    #[error("Cannot store {name:?} in an archive: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Writing the end-of-archive marker failed.
    #[error("Failed to finish archive: {0}")]
    Finish(#[source] io::Error),
}

/// Check that `name` can be stored as an entry path.
///
/// Entry paths must be relative, non-empty and free of `..` components.
/// Nested names such as `2024/beach.png` are fine.
pub fn validate_entry_name(name: &str) -> Result<(), ArchiveError> {
    let invalid = |reason| ArchiveError::InvalidName {
        name: name.to_string(),
        reason,
    };

    let mut has_file_part = false;
    for component in Path::new(name).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return Err(invalid("path must be relative")),
            Component::ParentDir => return Err(invalid("path must not contain `..`")),
            Component::CurDir => {}
            Component::Normal(_) => has_file_part = true,
        }
    }
    if !has_file_part {
        return Err(invalid("path has no file name"));
    }
    if name.contains('\0') {
        return Err(invalid("path must not contain NUL"));
    }
    Ok(())
}

/// A finished archive: the container bytes plus its entry names in order.
#[derive(Clone, PartialEq, Eq)]
pub struct ArchiveBlob {
    bytes: Vec<u8>,
    entries: Vec<String>,
}

impl ArchiveBlob {
    /// Raw container bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Entry names in archive order.
    pub fn entry_names(&self) -> &[String] {
        &self.entries
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// True when the archive holds no entries. The blob itself is still a
    /// valid (end-marker only) container.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ArchiveBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveBlob")
            .field("bytes", &self.bytes.len())
            .field("entries", &self.entries)
            .finish()
    }
}

/// Pack outputs into a tar archive, in order.
///
/// # Errors
///
/// Returns `ArchiveError::InvalidName` for a name the container cannot
/// store, before anything is written.
pub fn pack<'a, I>(outputs: I) -> Result<ArchiveBlob, ArchiveError>
where
    I: IntoIterator<Item = &'a TransformOutput>,
{
    let mut entries: Vec<(&str, &[u8])> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for output in outputs {
        validate_entry_name(&output.name)?;
        match positions.get(output.name.as_str()) {
            Some(&index) => {
                warn!(name = %output.name, "Duplicate archive entry, keeping last bytes");
                entries[index].1 = output.bytes.as_slice();
            }
            None => {
                positions.insert(output.name.as_str(), entries.len());
                entries.push((output.name.as_str(), output.bytes.as_slice()));
            }
        }
    }

    let mut builder = tar::Builder::new(Vec::new());
    for (name, bytes) in &entries {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);

        builder
            .append_data(&mut header, *name, *bytes)
            .map_err(|source| ArchiveError::Entry {
                name: name.to_string(),
                source,
            })?;
        debug!(name = *name, size = bytes.len(), "Archived entry");
    }

    let bytes = builder.into_inner().map_err(ArchiveError::Finish)?;

    Ok(ArchiveBlob {
        bytes,
        entries: entries.into_iter().map(|(name, _)| name.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::OutputFormat;
    use std::io::Read;

    fn output(name: &str, bytes: &[u8]) -> TransformOutput {
        TransformOutput {
            name: name.to_string(),
            bytes: bytes.to_vec(),
            width: 1,
            height: 1,
            format: OutputFormat::Png,
        }
    }

    /// Read back `(path, contents)` pairs from a tar blob.
    fn read_entries(blob: &ArchiveBlob) -> Vec<(String, Vec<u8>)> {
        let mut archive = tar::Archive::new(blob.as_bytes());
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let path = entry.path().unwrap().to_string_lossy().into_owned();
                let mut data = Vec::new();
                entry.read_to_end(&mut data).unwrap();
                (path, data)
            })
            .collect()
    }

    #[test]
    fn test_pack_preserves_order() {
        let outputs = [output("c.png", b"ccc"), output("a.png", b"a"), output("b.png", b"bb")];
        let blob = pack(&outputs).unwrap();

        assert_eq!(blob.entry_names(), &["c.png", "a.png", "b.png"]);
        assert_eq!(
            read_entries(&blob),
            vec![
                ("c.png".to_string(), b"ccc".to_vec()),
                ("a.png".to_string(), b"a".to_vec()),
                ("b.png".to_string(), b"bb".to_vec()),
            ]
        );
    }

    #[test]
    fn test_pack_empty_is_valid() {
        let blob = pack(std::iter::empty::<&TransformOutput>()).unwrap();
        assert!(blob.is_empty());
        assert_eq!(blob.entry_count(), 0);
        // End-of-archive marker is two zeroed 512-byte blocks
        assert_eq!(blob.as_bytes().len(), 1024);
        assert!(read_entries(&blob).is_empty());
    }

    #[test]
    fn test_duplicate_name_last_write_wins() {
        let outputs = [
            output("dup.jpeg", b"first"),
            output("other.jpeg", b"x"),
            output("dup.jpeg", b"second"),
        ];
        let blob = pack(&outputs).unwrap();

        assert_eq!(blob.entry_count(), 2);
        assert_eq!(
            read_entries(&blob),
            vec![
                ("dup.jpeg".to_string(), b"second".to_vec()),
                ("other.jpeg".to_string(), b"x".to_vec()),
            ]
        );
    }

    #[test]
    fn test_pack_is_deterministic() {
        let outputs = [output("a.webp", &[1, 2, 3]), output("b.webp", &[4, 5])];
        assert_eq!(pack(&outputs).unwrap(), pack(&outputs).unwrap());
    }

    #[test]
    fn test_long_names_survive() {
        let name = format!("{}.jpeg", "n".repeat(180));
        let blob = pack(&[output(&name, b"data")]).unwrap();
        assert_eq!(read_entries(&blob)[0].0, name);
    }

    #[test]
    fn test_archive_file_name() {
        assert_eq!(archive_file_name(DEFAULT_ARCHIVE_STEM), "batchroom-export.tar");
    }

    #[test]
    fn test_parent_dir_name_rejected() {
        let result = pack(&[output("../escape.png", b"x")]);
        assert!(matches!(result, Err(ArchiveError::InvalidName { .. })));
    }

    #[test]
    fn test_validate_entry_name() {
        assert!(validate_entry_name("beach.png").is_ok());
        assert!(validate_entry_name("2024/beach.png").is_ok());
        assert!(validate_entry_name("./beach.png").is_ok());

        for name in ["/albums/summer.png", "../escape.png", "a/../b.png", ".", "", "nul\0.png"] {
            assert!(
                matches!(validate_entry_name(name), Err(ArchiveError::InvalidName { .. })),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_every_valid_name_packs() {
        // Whatever passes the name check must be accepted by the container
        let names = ["beach.png", "2024/beach.png", "./beach.png", "with space.jpeg"];
        for name in names {
            assert!(validate_entry_name(name).is_ok());
            assert!(pack(&[output(name, b"x")]).is_ok(), "{name:?} failed to pack");
        }
    }
}
