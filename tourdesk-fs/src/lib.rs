//! Capability-based file helpers for roster snapshots and databases.
//!
//! Paths are UTF-8 (`camino`) and every access goes through a `cap-std`
//! directory handle opened from ambient authority at the path's parent.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::path::Component;

/// Open `path` for reading.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Whether `path` exists and is a regular file.
///
/// A missing path surfaces as an [`io::ErrorKind::NotFound`] error so callers
/// can tell it apart from a directory.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = parent_dir_and_name(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Replace the contents of `path` without exposing a half-written file.
///
/// The bytes land in a hidden sibling first and are renamed over the target,
/// so readers see either the old snapshot or the new one. Missing parent
/// directories are created.
pub fn replace_file(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let (dir, name) = parent_dir_and_name(path)?;
    let staging = format!(".{name}.tmp");
    dir.write(staging.as_str(), contents)?;
    dir.rename(staging.as_str(), &dir, name.as_str())
        .inspect_err(|_| {
            let _ignored = dir.remove_file(staging.as_str());
        })
}

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base_dir, relative) = split_anchor(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

fn parent_dir_and_name(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

// Absolute paths are opened from their root or drive prefix, relative ones
// from the working directory.
fn split_anchor(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_parent = parent.as_std_path();

    let (base, relative) = match std_parent.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_parent.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from parent path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_parent.to_path_buf()),
    };

    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(relative)
        .map_err(|_| io::Error::other("non-UTF-8 parent path"))?;
    Ok((dir, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::io::Read;
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("create temp dir")
    }

    fn utf8(dir: &TempDir, relative: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(relative)).expect("UTF-8 temp path")
    }

    #[rstest]
    fn replace_file_creates_parents_and_overwrites(temp_dir: TempDir) {
        let path = utf8(&temp_dir, "nested/roster.json");
        replace_file(&path, b"first").expect("write first snapshot");
        replace_file(&path, b"second").expect("replace snapshot");

        let mut contents = String::new();
        open_utf8_file(&path)
            .expect("open snapshot")
            .read_to_string(&mut contents)
            .expect("read snapshot");
        assert_eq!(contents, "second");
        let staging = file_is_file(&utf8(&temp_dir, "nested/.roster.json.tmp"))
            .expect_err("staging file should be gone");
        assert_eq!(staging.kind(), io::ErrorKind::NotFound);
    }

    #[rstest]
    fn file_is_file_distinguishes_missing_and_directories(temp_dir: TempDir) {
        let dir_path = utf8(&temp_dir, "sub");
        ensure_parent_dir(&dir_path.join("x")).expect("create sub");
        assert!(!file_is_file(&dir_path).expect("stat directory"));
        let missing = file_is_file(&utf8(&temp_dir, "absent.json")).expect_err("missing file");
        assert_eq!(missing.kind(), io::ErrorKind::NotFound);
    }

    #[rstest]
    fn missing_parent_is_not_found(temp_dir: TempDir) {
        let path = utf8(&temp_dir, "no/such/dir/roster.json");
        let err = file_is_file(&path).expect_err("missing parent");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
