use std::path::{Path, PathBuf};

pub const STORE_DIR: &str = ".chatterm";
pub const STORE_FILE_NAME: &str = "store.jsonl";

#[must_use]
pub fn store_root(cwd: &Path) -> PathBuf {
    cwd.join(STORE_DIR)
}

#[must_use]
pub fn default_store_path(cwd: &Path) -> PathBuf {
    store_root(cwd).join(STORE_FILE_NAME)
}

#[must_use]
pub(crate) fn compaction_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".compact");
    path.with_file_name(name)
}
