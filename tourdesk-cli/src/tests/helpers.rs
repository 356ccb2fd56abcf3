//! Test helpers for writing roster snapshots and reading command output.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use tempfile::TempDir;
use tourdesk_core::{MemoryTourStore, Roster, test_support::sample_roster};

/// Temporary workspace holding a JSON snapshot of the sample roster.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let workspace = Self { _dir: dir, root };
        write_roster(&workspace.roster(), &sample_roster());
        workspace
    }

    pub(super) fn roster(&self) -> Utf8PathBuf {
        self.root.join("roster.json")
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("db").join("roster.db")
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write file");
}

pub(super) fn write_roster(path: &Utf8Path, roster: &Roster) {
    let mut buffer = Vec::new();
    MemoryTourStore::new(roster.clone())
        .to_writer(&mut buffer)
        .expect("encode roster");
    write_utf8(path, &buffer);
}

pub(super) fn read_roster(path: &Utf8Path) -> Roster {
    crate::store::read_snapshot(path)
        .expect("read roster")
        .into_inner()
        .expect("roster lock")
}

pub(super) fn parse_output(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("output should be JSON")
}
