//! Line-oriented byte store for credential and token files.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tusk_common_log::spans::store_span;

/// Where credential files live.
pub trait ByteStore: Send + Sync {
    /// Whether `path` names an existing entry.
    fn exists(&self, path: &Path) -> bool;

    /// Read every line of `path`, without line terminators.
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Replace the contents of `path` with `lines`, one per line.
    fn write_lines(&self, path: &Path, lines: &[&str]) -> io::Result<()>;
}

/// Plain files on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

fn temp_path_for(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    match path.file_name() {
        Some(name) => temp_path.set_file_name(format!(".{}.tmp", name.to_string_lossy())),
        None => temp_path.push(".tmp"),
    }
    temp_path
}

fn write_temp(temp_path: &Path, contents: &[u8]) -> io::Result<()> {
    // The handle is dropped, and the file closed, before this returns.
    let mut file = File::create(temp_path)?;
    file.write_all(contents)?;
    file.sync_all()
}

impl ByteStore for FileStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let _span = store_span("read", &path.to_string_lossy()).entered();
        let contents = fs::read_to_string(path)?;
        Ok(contents
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect())
    }

    fn write_lines(&self, path: &Path, lines: &[&str]) -> io::Result<()> {
        let _span = store_span("write", &path.to_string_lossy()).entered();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut contents = lines.join("\n");
        contents.push('\n');

        let temp_path = temp_path_for(path);
        let result = write_temp(&temp_path, contents.as_bytes())
            .and_then(|()| fs::rename(&temp_path, path));
        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            tracing::debug!(path = %path.display(), error = %e, "credential write failed");
            return Err(e);
        }
        Ok(())
    }
}
