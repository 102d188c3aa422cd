//! Writing rendered reports.
//!
//! File writes go through a temporary file in the destination directory
//! that is renamed over the target once fully written, so a failed write
//! never leaves a truncated report behind. The renamed file keeps the
//! permissions of the report it replaces, or gets 0644 when it is new.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Path that selects standard output instead of a file.
pub const STDOUT_PATH: &str = "-";

/// Mode of a newly created report file.
#[cfg(unix)]
const NEW_REPORT_MODE: u32 = 0o644;

/// A report could not be written.
#[derive(Debug, Error)]
#[error("failed to write report to {}: {source}", .path.display())]
pub struct SinkError {
    pub path: PathBuf,
    pub source: io::Error,
}

/// Write `content` to `path`, or to stdout when `path` is `-`.
pub fn write_report(path: &Path, content: &str) -> Result<(), SinkError> {
    let wrap = |source: io::Error| SinkError {
        path: path.to_path_buf(),
        source,
    };

    if path == Path::new(STDOUT_PATH) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        return write_to(&mut handle, content).map_err(wrap);
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(wrap)?;
    write_to(&mut file, content).map_err(wrap)?;
    apply_report_permissions(file.as_file(), path).map_err(wrap)?;
    file.persist(path).map_err(|e| wrap(e.error))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Give the finished temp file the permissions the report should end up
/// with: those of the file it replaces, if any.
#[cfg(unix)]
fn apply_report_permissions(file: &fs::File, path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = fs::metadata(path)
        .map(|meta| meta.permissions())
        .unwrap_or_else(|_| fs::Permissions::from_mode(NEW_REPORT_MODE));
    file.set_permissions(permissions)
}

#[cfg(not(unix))]
fn apply_report_permissions(_file: &fs::File, _path: &Path) -> io::Result<()> {
    Ok(())
}

/// Write `content` to any writer and flush it.
pub fn write_to<W: Write>(writer: &mut W, content: &str) -> io::Result<()> {
    writer.write_all(content.as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_report_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.txt");

        write_report(&path, "Total Entries: 3\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Total Entries: 3\n");

        write_report(&path, "Total Entries: 0\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Total Entries: 0\n");
    }

    #[test]
    fn test_write_report_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");

        write_report(&path, "Key,Value\n").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_report_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("report.txt");

        let err = write_report(&path, "x").unwrap_err();
        assert_eq!(err.path, path);
        assert!(err.to_string().contains("report.txt"));
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_new_report_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.txt");

        write_report(&path, "Total Entries: 3\n").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        std::fs::write(&path, "old\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        write_report(&path, "Key,Value\n").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Key,Value\n");
    }

    #[test]
    fn test_write_to_buffer() {
        let mut buffer = Vec::new();
        write_to(&mut buffer, "OG10\n").unwrap();
        assert_eq!(buffer, b"OG10\n");
    }
}
