//! Scoped temporary files for uploads in flight.
//!
//! A [`Staging`] is built once at startup and handed to whatever needs to
//! stage data; nothing reaches for a process-wide temp directory on its own.
//! Each [`StagingFile`] is unique to one upload and is deleted when dropped,
//! so every early return and `?` cleans up after itself.

use std::io;
use std::path::{Path, PathBuf};

use dockyard_store::Content;
use tempfile::TempPath;
use tokio::fs;
use tokio::io::AsyncWriteExt;

const FILE_PREFIX: &str = "dockyard-blob-";
const FILE_SUFFIX: &str = ".tmp";

/// Directory in which staging files are created, with an optional cap on
/// how many bytes one staging file may hold.
#[derive(Clone, Debug)]
pub struct Staging {
    dir: PathBuf,
    max_size: Option<u64>,
}

impl Staging {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_size: None,
        }
    }

    /// Refuse writes that would grow a staging file beyond `max_size` bytes.
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn max_size(&self) -> Option<u64> {
        self.max_size
    }

    /// Stage under the operating system's temporary directory.
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create a new, uniquely named, empty staging file.
    pub async fn create(&self) -> io::Result<StagingFile> {
        fs::create_dir_all(&self.dir).await?;
        let dir = self.dir.clone();
        let tmp = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(FILE_PREFIX)
                .suffix(FILE_SUFFIX)
                .tempfile_in(&dir)
        })
        .await
        .map_err(io::Error::other)??;
        let (file, path) = tmp.into_parts();
        Ok(StagingFile {
            file: fs::File::from_std(file),
            path,
            written: 0,
            max_size: self.max_size,
        })
    }
}

impl Default for Staging {
    fn default() -> Self {
        Self::system()
    }
}

/// One upload's staging file. Removed from disk on drop.
#[derive(Debug)]
pub struct StagingFile {
    file: fs::File,
    path: TempPath,
    written: u64,
    max_size: Option<u64>,
}

impl StagingFile {
    /// Append a whole chunk; short writes are retried until every byte is down.
    ///
    /// Fails without writing anything if the chunk would take the file past
    /// the staging size limit.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        if let Some(limit) = self.max_size {
            if self.written + chunk.len() as u64 > limit {
                return Err(io::Error::other(format!(
                    "staged upload exceeds the {limit} byte limit"
                )));
            }
        }
        self.file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flush buffered writes and sync them to disk.
    pub async fn finish(&mut self) -> io::Result<()> {
        self.file.flush().await?;
        self.file.sync_data().await
    }

    /// Stream the staged bytes back from the start of the file.
    ///
    /// The returned content reads through its own handle, so it stays valid
    /// while this `StagingFile` is alive.
    pub async fn content(&self) -> io::Result<Content> {
        let reader = fs::File::open(&self.path).await?;
        Ok(Content::from_file(reader, self.written))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written so far.
    pub fn len(&self) -> u64 {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Delete the file now, reporting any error instead of ignoring it.
    pub fn close(self) -> io::Result<()> {
        drop(self.file);
        self.path.close()
    }
}
