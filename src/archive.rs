//! Archive reading - gzip-or-plain tar streams with virtual path stripping.
//!
//! Registry tarballs wrap package contents in one top-level directory, so
//! callers pass `skip_segments = 1` to strip it; raw archives use `0`.
//! Compression is sniffed from the gzip magic bytes, so plain tar streams
//! work transparently.

use crate::error::{Result, SpmError};
use crate::manifest::PACKAGE_MANIFEST;
use flate2::read::GzDecoder;
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tar::Archive;

/// Published packages wrap their contents in one top-level directory
pub const PACKAGE_ARCHIVE_SKIP: usize = 1;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

fn decode(bytes: &[u8]) -> Box<dyn Read + '_> {
    if bytes.starts_with(&GZIP_MAGIC) {
        Box::new(GzDecoder::new(bytes))
    } else {
        Box::new(bytes)
    }
}

/// Strip `skip` leading path segments from an archive entry name.
///
/// Returns `None` when the entry has fewer segments than `skip`. The
/// result is empty when the entry is exactly the wrapper directory.
pub fn strip_segments(entry_name: &str, skip: usize) -> Option<String> {
    let mut name = entry_name.trim_start_matches('/');
    for _ in 0..skip {
        let (_, rest) = name.split_once('/')?;
        name = rest;
    }
    Some(name.to_string())
}

/// Read a single named file out of a tar (or tar.gz) archive.
///
/// Entries are scanned in stream order; the first one whose stripped
/// name equals `file_name` is buffered and returned. Fails with
/// [`SpmError::FileNotFoundInArchive`] when the stream ends without a
/// match.
pub fn read_file_from_archive(
    file_name: &str,
    bytes: &[u8],
    skip_segments: usize,
) -> Result<Vec<u8>> {
    let mut archive = Archive::new(decode(bytes));

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_name = entry.path()?.to_string_lossy().into_owned();

        let Some(stripped) = strip_segments(&entry_name, skip_segments) else {
            continue;
        };
        if stripped != file_name {
            continue;
        }

        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut contents)?;
        return Ok(contents);
    }

    Err(SpmError::FileNotFoundInArchive(file_name.to_string()))
}

/// Extract every entry of a tar (or tar.gz) archive into `target`,
/// preserving directory structure and unix file modes.
///
/// Entries whose stripped name is empty (the wrapper directory itself)
/// are dropped. Symlinks and other special entries are skipped.
pub fn extract_archive_to(bytes: &[u8], target: &Path, skip_segments: usize) -> Result<()> {
    fs::create_dir_all(target)?;

    let mut archive = Archive::new(decode(bytes));

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_name = entry.path()?.to_string_lossy().into_owned();

        let Some(stripped) = strip_segments(&entry_name, skip_segments) else {
            continue;
        };
        if stripped.is_empty() {
            continue;
        }

        let dest = target.join(sanitize_entry_path(&stripped)?);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            fs::create_dir_all(&dest)?;
        } else if entry_type.is_file() {
            let mut file = fs::File::create(&dest)?;
            io::copy(&mut entry, &mut file)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Ok(mode) = entry.header().mode() {
                    let _ = fs::set_permissions(&dest, fs::Permissions::from_mode(mode));
                }
            }
        }
    }

    Ok(())
}

/// Reject absolute paths and parent-directory traversal in entry names.
fn sanitize_entry_path(name: &str) -> Result<PathBuf> {
    let path = Path::new(name);
    if path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(SpmError::IoError(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unsafe archive entry path: {name}"),
        )));
    }
    Ok(path.to_path_buf())
}

/// Pull `package.json` out of a published package archive.
pub fn read_manifest_from_archive(bytes: &[u8]) -> Result<Vec<u8>> {
    read_file_from_archive(PACKAGE_MANIFEST, bytes, PACKAGE_ARCHIVE_SKIP)
}

/// Extract a published package archive into `target`.
pub fn extract_package_to(bytes: &[u8], target: &Path) -> Result<()> {
    extract_archive_to(bytes, target, PACKAGE_ARCHIVE_SKIP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_segments_none() {
        assert_eq!(strip_segments("a/b/c.txt", 0).unwrap(), "a/b/c.txt");
    }

    #[test]
    fn test_strip_segments_one() {
        assert_eq!(strip_segments("package/index.js", 1).unwrap(), "index.js");
        assert_eq!(
            strip_segments("package/lib/util.js", 1).unwrap(),
            "lib/util.js"
        );
    }

    #[test]
    fn test_strip_segments_too_few() {
        assert!(strip_segments("README.md", 1).is_none());
        assert!(strip_segments("a/b", 3).is_none());
    }

    #[test]
    fn test_strip_segments_wrapper_dir_becomes_empty() {
        assert_eq!(strip_segments("package/", 1).unwrap(), "");
    }

    #[test]
    fn test_strip_segments_leading_slash_trimmed() {
        assert_eq!(strip_segments("/package/index.js", 1).unwrap(), "index.js");
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert!(sanitize_entry_path("../escape.txt").is_err());
        assert!(sanitize_entry_path("/etc/passwd").is_err());
        assert!(sanitize_entry_path("lib/../../escape.txt").is_err());
        assert!(sanitize_entry_path("lib/util.js").is_ok());
    }
}
