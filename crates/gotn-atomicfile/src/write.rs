//! Crash-safe writes: write to a sibling temp file, fsync it, rename over
//! the target, then fsync the containing directory so the rename itself
//! survives a crash (§4.2 / §5).

use std::fs::File;
use std::io;
use std::path::Path;

/// Atomically replace the contents of `path` with `bytes`.
///
/// The temp file is created in `path`'s parent directory so the final
/// rename is same-filesystem and therefore atomic on POSIX. Three syncs
/// happen in order: the temp file's data, the temp file's rename, and the
/// parent directory's entry — skipping any of the three reopens a window
/// where a crash could leave the old contents, a torn write, or a dangling
/// directory entry.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "atomic_write target has no parent directory",
        )
    })?;
    std::fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    io::Write::write_all(&mut temp, bytes)?;
    temp.as_file().sync_all()?;
    let persisted = temp
        .persist(path)
        .map_err(|persist_err| persist_err.error)?;
    persisted.sync_all()?;

    fsync_dir(parent)?;
    Ok(())
}

/// Append `bytes` to the file at `path`, creating it if absent, then fsync
/// the file. Used by the journal, where every line must survive a crash
/// the instant it's acknowledged but a full rewrite-and-rename per line
/// would be wasteful.
pub fn append_and_sync(path: &Path, bytes: &[u8]) -> io::Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn fsync_dir(dir: &Path) -> io::Result<()> {
    let dir_file = File::open(dir)?;
    dir_file.sync_all()
}

/// Run [`atomic_write`] on a blocking thread, for callers in async contexts.
pub async fn atomic_write_async(path: std::path::PathBuf, bytes: Vec<u8>) -> io::Result<()> {
    tokio::task::spawn_blocking(move || atomic_write(&path, &bytes))
        .await
        .map_err(io::Error::other)?
}

/// Run [`append_and_sync`] on a blocking thread, for callers in async contexts.
pub async fn append_and_sync_async(path: std::path::PathBuf, bytes: Vec<u8>) -> io::Result<()> {
    tokio::task::spawn_blocking(move || append_and_sync(&path, &bytes))
        .await
        .map_err(io::Error::other)?
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_creates_file_with_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("graph.json");
        atomic_write(&path, b"hello").expect("write");
        assert_eq!(std::fs::read(&path).expect("read"), b"hello");
    }

    #[test]
    fn atomic_write_replaces_existing_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("graph.json");
        atomic_write(&path, b"first").expect("write 1");
        atomic_write(&path, b"second").expect("write 2");
        assert_eq!(std::fs::read(&path).expect("read"), b"second");
    }

    #[test]
    fn atomic_write_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/deep/graph.json");
        atomic_write(&path, b"hello").expect("write");
        assert_eq!(std::fs::read(&path).expect("read"), b"hello");
    }

    #[test]
    fn append_and_sync_appends_across_calls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("journal.ndjson");
        append_and_sync(&path, b"line1\n").expect("append 1");
        append_and_sync(&path, b"line2\n").expect("append 2");
        assert_eq!(std::fs::read(&path).expect("read"), b"line1\nline2\n");
    }

    #[tokio::test]
    async fn atomic_write_async_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("graph.json");
        atomic_write_async(path.clone(), b"async".to_vec())
            .await
            .expect("write");
        assert_eq!(std::fs::read(&path).expect("read"), b"async");
    }
}
