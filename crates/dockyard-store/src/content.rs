use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio::io::AsyncReadExt;

use crate::error::StoreResult;

/// Read chunk size when streaming from files.
const FILE_CHUNK_SIZE: usize = 64 * 1024;

/// A value travelling to or from a [`Storage`](crate::Storage): an owned
/// stream of byte chunks with an optional known total size.
///
/// Chunks arrive in order. The stream may fail part-way with an
/// `io::Error`; consumers must treat everything read so far as unusable.
pub struct Content {
    stream: BoxStream<'static, io::Result<Bytes>>,
    size: Option<u64>,
}

impl Content {
    /// Content backed by a single in-memory buffer.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data: Bytes = data.into();
        let size = Some(data.len() as u64);
        let stream = if data.is_empty() {
            stream::empty().boxed()
        } else {
            stream::once(async move { Ok(data) }).boxed()
        };
        Self { stream, size }
    }

    /// Content from an arbitrary chunk stream of unknown length.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            stream: stream.boxed(),
            size: None,
        }
    }

    /// Content made of the given chunks, in order.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self::from_stream(stream::iter(chunks.into_iter().map(Ok)))
    }

    /// Content that streams an open file from its current position in
    /// fixed-size chunks.
    pub fn from_file(file: tokio::fs::File, size: u64) -> Self {
        let chunks = stream::try_unfold(file, |mut file| async move {
            let mut buf = BytesMut::with_capacity(FILE_CHUNK_SIZE);
            let n = file.read_buf(&mut buf).await?;
            if n == 0 {
                Ok::<_, io::Error>(None)
            } else {
                Ok(Some((buf.freeze(), file)))
            }
        });
        Self::from_stream(chunks).with_size(size)
    }

    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    /// Record the total size, if the producer knows it.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Total size in bytes, when known up front.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn into_stream(self) -> BoxStream<'static, io::Result<Bytes>> {
        self.stream
    }

    /// Drain the stream into one contiguous buffer.
    pub async fn collect_bytes(mut self) -> io::Result<Bytes> {
        let capacity = self.size.unwrap_or(0).min(16 * 1024 * 1024) as usize;
        let mut buf = BytesMut::with_capacity(capacity);
        while let Some(chunk) = self.stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }

    /// Drain the stream and decode it as UTF-8 text.
    pub async fn into_text(self) -> StoreResult<String> {
        let bytes = self.collect_bytes().await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

impl Stream for Content {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.stream.poll_next_unpin(cx)
    }
}

impl From<Bytes> for Content {
    fn from(data: Bytes) -> Self {
        Self::from_bytes(data)
    }
}

impl From<Vec<u8>> for Content {
    fn from(data: Vec<u8>) -> Self {
        Self::from_bytes(data)
    }
}

impl From<&'static [u8]> for Content {
    fn from(data: &'static [u8]) -> Self {
        Self::from_bytes(Bytes::from_static(data))
    }
}

impl std::fmt::Debug for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Content").field("size", &self.size).finish_non_exhaustive()
    }
}
