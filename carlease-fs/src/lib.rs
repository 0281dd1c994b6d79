//! Filesystem helpers for whole-file data stores, built on `cap-std` and
//! `camino`.
//!
//! Every helper resolves a capability handle for the file's parent directory
//! and performs the operation relative to it, so the data directory is the
//! only ambient authority a store needs.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::path::Component;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

/// Resolve an ambient directory for the given path and return the directory
/// with the file name.
///
/// A bare file name resolves against the current directory.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Read `path` as UTF-8, returning `None` when it or its directory does not
/// exist.
///
/// # Examples
///
/// ```
/// # fn main() -> std::io::Result<()> {
/// let missing = camino::Utf8Path::new("no-such-dir/brands.json");
/// assert_eq!(carlease_fs::read_optional(missing)?, None);
/// # Ok(())
/// # }
/// ```
pub fn read_optional(path: &Utf8Path) -> io::Result<Option<String>> {
    let contents = open_dir_and_file(path).and_then(|(dir, name)| dir.read_to_string(name));
    not_found_as_none(contents)
}

/// Read `path` as raw bytes, returning `None` when it or its directory does
/// not exist. Callers decide how to treat bytes that are not UTF-8.
pub fn read_optional_bytes(path: &Utf8Path) -> io::Result<Option<Vec<u8>>> {
    let contents = open_dir_and_file(path).and_then(|(dir, name)| dir.read(name));
    not_found_as_none(contents)
}

fn not_found_as_none<T>(contents: io::Result<T>) -> io::Result<Option<T>> {
    match contents {
        Ok(found) => Ok(Some(found)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Replace `path` with `contents`, creating missing parent directories.
///
/// The bytes are staged in a sibling file and renamed over the target, so
/// readers observe either the old or the new contents, never a partial
/// write.
pub fn write_atomic(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let (dir, name) = open_dir_and_file(path)?;
    let staging = staging_name(&name);
    let staged = dir
        .write(&staging, contents)
        .and_then(|()| dir.rename(&staging, &dir, &name));
    if staged.is_err() {
        // Best effort: the staging file may not exist.
        let _ = dir.remove_file(&staging);
    }
    staged
}

/// Sibling file name unique to this process and call.
fn staging_name(name: &str) -> String {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let call = NEXT.fetch_add(1, Ordering::Relaxed);
    format!(".{name}.{}.{call}.tmp", process::id())
}

/// Ensure the parent directory for `path` exists, handling absolute paths
/// safely for cap-std.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) => ensure_dir(parent),
        None => Ok(()),
    }
}

/// Create `dir` and any missing ancestors.
pub fn ensure_dir(dir: &Utf8Path) -> io::Result<()> {
    if dir.as_str().is_empty() || dir == Utf8Path::new("/") {
        return Ok(());
    }
    let (base_dir, relative) = base_dir_and_relative(dir)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

/// Split an absolute or relative path into an ambient base directory and a
/// relative suffix.
pub fn base_dir_and_relative(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_path = path.as_std_path();

    let (base, relative) = match std_path.components().next() {
        // Windows absolute path with a drive or UNC prefix.
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR_STR);
            let relative = std_path
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_path.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR_STR);
            let relative = std_path
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_path.to_path_buf()),
    };

    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative =
        Utf8PathBuf::from_path_buf(relative).map_err(|_| io::Error::other("non-UTF-8 path"))?;
    Ok((dir, relative))
}
