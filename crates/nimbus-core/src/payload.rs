//! Upload payload shared between concurrently running backends.
//!
//! The content is materialised once into an immutable [`Bytes`] buffer. Every
//! backend gets its own [`PayloadReader`], an independent cursor over that
//! buffer, so concurrent uploads never observe each other's read position.

use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

use crate::error::{NimbusError, Result};

/// Immutable upload content. Cloning is cheap (reference counted).
#[derive(Clone, PartialEq, Eq)]
pub struct Payload {
    data: Bytes,
}

impl Payload {
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Read a whole file into memory.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| NimbusError::Payload {
                path: path.display().to_string(),
                source,
            })?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "payload loaded");
        Ok(Self::from_bytes(data))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Hex-encoded SHA-256 of the content.
    pub fn sha256_hex(&self) -> String {
        hex::encode(Sha256::digest(&self.data))
    }

    /// A fresh cursor positioned at the start of the content.
    pub fn reader(&self) -> PayloadReader {
        PayloadReader {
            cursor: Cursor::new(self.data.clone()),
        }
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Payload")
            .field("len", &self.data.len())
            .finish()
    }
}

/// Read cursor over a [`Payload`], owned by exactly one backend call.
pub struct PayloadReader {
    cursor: Cursor<Bytes>,
}

impl PayloadReader {
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Bytes left between the cursor and the end of the content.
    pub fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    /// Seek back to the start, for backends that read the body more than once.
    pub fn rewind(&mut self) {
        self.cursor.set_position(0);
    }

    /// Full content as an owned buffer, independent of the cursor position.
    ///
    /// Zero-copy; meant for SDKs that want the whole body up front.
    pub fn into_bytes(self) -> Bytes {
        self.cursor.into_inner()
    }
}

impl Read for PayloadReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for PayloadReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl AsyncRead for PayloadReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().cursor).poll_read(cx, buf)
    }
}

impl AsyncSeek for PayloadReader {
    fn start_seek(self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.get_mut().cursor).start_seek(position)
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.get_mut().cursor).poll_complete(cx)
    }
}

impl std::fmt::Debug for PayloadReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadReader")
            .field("position", &self.cursor.position())
            .field("len", &self.cursor.get_ref().len())
            .finish()
    }
}
