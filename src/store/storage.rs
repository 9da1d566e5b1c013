//! Storage backends for persisted vote records
//!
//! A backend hands raw lines to the store on load and receives the complete
//! set of records on every save. Decoding, parsing and validation stay in the
//! store, so one damaged line never hides the others.

use crate::types::VoteRecord;
use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Persistence seam for the ballot store
pub trait RecordStorage: Send + Sync {
    /// Bytes of each persisted line without its `\n`, or `None` when nothing
    /// has been persisted yet
    fn read_lines(&self) -> Result<Option<Vec<Vec<u8>>>>;

    /// Replace the persisted state with exactly `records`
    fn write_records(&self, records: &[VoteRecord]) -> Result<()>;

    /// Human-readable location, used in logs
    fn describe(&self) -> String;
}

/// Flat-file backend: one `<voterId>:<candidateIndex>` line per voter
///
/// Writes go to a temporary sibling file that is synced and then renamed over
/// the target, so a crash mid-write leaves either the old or the new file.
/// There is no cross-process locking: two processes sharing one file can
/// overwrite each other's votes.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "votes".to_string());
        self.path
            .with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()))
    }

    fn write_file(&self, temp_path: &Path, records: &[VoteRecord]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(temp_path)?);
        for record in records {
            writeln!(writer, "{}", record.to_line())?;
        }
        let file = writer.into_inner().map_err(|err| err.into_error())?;
        file.sync_all()?;
        drop(file);

        fs::rename(temp_path, &self.path)
    }
}

impl RecordStorage for FileStorage {
    fn read_lines(&self) -> Result<Option<Vec<Vec<u8>>>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Error::persistence(&self.path, err)),
        };

        let mut lines: Vec<Vec<u8>> = bytes
            .split(|&byte| byte == b'\n')
            .map(<[u8]>::to_vec)
            .collect();
        // splitting leaves an empty chunk after the final newline
        if lines.last().is_some_and(|last| last.is_empty()) {
            lines.pop();
        }

        Ok(Some(lines))
    }

    fn write_records(&self, records: &[VoteRecord]) -> Result<()> {
        let temp_path = self.temp_path();

        if let Err(err) = self.write_file(&temp_path, records) {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::persistence(&self.path, err));
        }

        tracing::debug!(path = %self.path.display(), records = records.len(), "Vote records written");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory backend
///
/// Clone-friendly (cloning shares the same underlying lines), so a test can
/// keep a handle to inspect what the store wrote or to make writes fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    lines: Arc<RwLock<Option<Vec<String>>>>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from already-persisted lines
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let storage = Self::new();
        if let Ok(mut guard) = storage.lines.write() {
            *guard = Some(lines.into_iter().map(Into::into).collect());
        }
        storage
    }

    /// Make subsequent writes fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Currently persisted lines
    pub fn lines(&self) -> Option<Vec<String>> {
        self.lines.read().ok().and_then(|guard| guard.clone())
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl RecordStorage for MemoryStorage {
    fn read_lines(&self) -> Result<Option<Vec<Vec<u8>>>> {
        let guard = self
            .lines
            .read()
            .map_err(|_| Error::internal("memory storage read lock poisoned"))?;
        Ok(guard
            .as_ref()
            .map(|lines| lines.iter().map(|line| line.as_bytes().to_vec()).collect()))
    }

    fn write_records(&self, records: &[VoteRecord]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::persistence(
                self.describe(),
                std::io::Error::other("writes are disabled"),
            ));
        }

        let mut guard = self
            .lines
            .write()
            .map_err(|_| Error::internal("memory storage write lock poisoned"))?;
        *guard = Some(records.iter().map(VoteRecord::to_line).collect());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
