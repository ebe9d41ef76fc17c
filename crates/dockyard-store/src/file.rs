use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::content::Content;
use crate::error::{StoreError, StoreResult};
use crate::key::Key;
use crate::traits::Storage;

/// Prefix of in-flight temporary files next to their destination.
const TMP_PREFIX: &str = ".dockyard-tmp-";

/// Filesystem storage: each key is a file at `<root>/<segment>/.../<segment>`.
///
/// `save` writes into a uniquely named temporary file in the destination
/// directory, syncs it, and renames it over the destination. Readers
/// therefore see either the previous file or the complete new one, and an
/// interrupted save leaves only a temporary file that is removed when its
/// handle drops.
#[derive(Clone, Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path a key maps to.
    pub fn path(&self, key: &Key) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(key.segments());
        path
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn exists(&self, key: &Key) -> StoreResult<bool> {
        match fs::metadata(self.path(key)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn value(&self, key: &Key) -> StoreResult<Content> {
        let file = match fs::File::open(self.path(key)).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(key.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(StoreError::NotFound(key.clone()));
        }
        Ok(Content::from_file(file, meta.len()))
    }

    async fn save(&self, key: &Key, content: Content) -> StoreResult<()> {
        let dest = self.path(key);
        let parent = dest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&parent).await?;

        let dir = parent.clone();
        let tmp = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new().prefix(TMP_PREFIX).tempfile_in(&dir)
        })
        .await
        .map_err(io::Error::other)??;
        let (std_file, tmp_path) = tmp.into_parts();
        let mut file = fs::File::from_std(std_file);

        let mut chunks = content.into_stream();
        let mut written = 0u64;
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        // The rename is only durable once the directory entry is synced too.
        let target = dest.clone();
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            tmp_path.persist(&target)?;
            sync_dir(&parent)
        })
        .await
        .map_err(io::Error::other)??;

        debug!(key = %key, bytes = written, path = %dest.display(), "saved value");
        Ok(())
    }
}

/// Flush a directory's entries to disk.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

/// Directories cannot be opened for syncing here; `persist` is the best
/// available guarantee.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;
    use std::io;

    fn key(path: &str) -> Key {
        Key::parse(path).unwrap()
    }

    fn leftover_temp_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(TMP_PREFIX))
            .count()
    }

    #[tokio::test]
    async fn save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::new(dir.path());
        let k = key("docker/registry/v2/blobs/x/data");

        store.save(&k, Content::from_bytes(&b"payload"[..])).await.unwrap();
        assert!(store.exists(&k).await.unwrap());
        assert!(store.path(&k).is_file());

        let value = store.value(&k).await.unwrap();
        assert_eq!(value.size(), Some(7));
        assert_eq!(value.collect_bytes().await.unwrap(), Bytes::from_static(b"payload"));
    }

    #[tokio::test]
    async fn large_values_stream_in_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::new(dir.path());
        let data: Vec<u8> = (0..(64 * 1024 * 3 + 17)).map(|i| (i % 251) as u8).collect();

        store.save(&key("big"), Content::from_bytes(data.clone())).await.unwrap();
        let mut value = store.value(&key("big")).await.unwrap();
        let mut chunks = 0;
        let mut out = Vec::new();
        while let Some(chunk) = value.next().await {
            out.extend_from_slice(&chunk.unwrap());
            chunks += 1;
        }
        assert!(chunks > 1);
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::new(dir.path());
        assert!(!store.exists(&key("a/b")).await.unwrap());
        assert!(matches!(
            store.value(&key("a/b")).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn directory_is_not_a_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::new(dir.path());
        store.save(&key("a/b/c"), Content::empty()).await.unwrap();
        assert!(!store.exists(&key("a/b")).await.unwrap());
    }

    #[tokio::test]
    async fn failed_stream_leaves_no_value_and_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::new(dir.path());
        let failing = Content::from_stream(stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ]));

        let err = store.save(&key("repo/k"), failing).await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(!store.exists(&key("repo/k")).await.unwrap());
        assert_eq!(leftover_temp_files(&dir.path().join("repo")), 0);
    }

    #[tokio::test]
    async fn save_replaces_existing_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::new(dir.path());
        store.save(&key("link"), Content::from_bytes(&b"first"[..])).await.unwrap();
        store.save(&key("link"), Content::from_bytes(&b"second"[..])).await.unwrap();
        let text = store.value(&key("link")).await.unwrap().into_text().await.unwrap();
        assert_eq!(text, "second");
        assert_eq!(leftover_temp_files(dir.path()), 0);
    }

    #[cfg(unix)]
    #[test]
    fn sync_dir_accepts_directories() {
        let dir = tempfile::tempdir().unwrap();
        sync_dir(dir.path()).unwrap();
        assert!(sync_dir(&dir.path().join("missing")).is_err());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn save_into_fresh_directories_on_single_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::new(dir.path());
        let k = key("docker/registry/v2/repositories/app/_manifests/tags/v1/current/link");

        store.save(&k, Content::from_bytes(&b"sha256:abc"[..])).await.unwrap();
        let parent = store.path(&k).parent().unwrap().to_path_buf();
        assert_eq!(leftover_temp_files(&parent), 0);
        assert_eq!(std::fs::read(store.path(&k)).unwrap(), b"sha256:abc");
    }
}
