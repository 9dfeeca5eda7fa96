//! Local filesystem storage for downloaded documents.
//!
//! ## Storage Layout
//!
//! ```text
//! {storage_directory}/
//! ├── Acme Inc_1f3a9c0e_20260118_142501.pdf      # committed document
//! └── Acme Inc_77b0d2aa_20260118_142503.pdf.part # in-flight download
//! ```
//!
//! Bytes are streamed into a `.part` file and renamed into place only when
//! the caller commits. A document that is discarded, fails to commit, or is
//! dropped mid-write leaves nothing behind.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::Result;
use crate::utils::filename::unique_path;

/// Bytes of the body kept in memory for content sniffing.
pub const HEAD_LEN: usize = 1024;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Create the root directory if missing (blocking).
    pub fn ensure_root_blocking(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_dir)?;
        Ok(())
    }

    /// Create the root directory if missing.
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root_dir).await?;
        Ok(())
    }

    /// Start writing `file_name`, picking a free name if it is taken.
    pub async fn begin_document(&self, file_name: &str) -> Result<PartialDocument> {
        let final_path = unique_path(&self.root_dir, file_name);
        let mut part_name = final_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        part_name.push(".part");
        let part_path = final_path.with_file_name(part_name);

        let file = File::create(&part_path).await?;
        Ok(PartialDocument {
            final_path,
            part_path,
            writer: Some(BufWriter::new(file)),
            head: Vec::with_capacity(HEAD_LEN),
            bytes_written: 0,
            settled: false,
        })
    }
}

/// A document being written; see [`LocalStorage::begin_document`].
#[derive(Debug)]
pub struct PartialDocument {
    final_path: PathBuf,
    part_path: PathBuf,
    writer: Option<BufWriter<File>>,
    head: Vec<u8>,
    bytes_written: u64,
    settled: bool,
}

impl PartialDocument {
    /// Append a chunk of the body.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if self.head.len() < HEAD_LEN {
            let take = (HEAD_LEN - self.head.len()).min(chunk.len());
            self.head.extend_from_slice(&chunk[..take]);
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(chunk).await?;
        }
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    /// The first [`HEAD_LEN`] bytes written so far.
    pub fn head(&self) -> &[u8] {
        &self.head
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush to disk and move the file into place.
    pub async fn commit(mut self) -> Result<PathBuf> {
        self.settled = true;
        let result = match self.writer.take() {
            Some(writer) => close_writer(writer).await,
            None => Ok(()),
        };
        let result = match result {
            Ok(()) => tokio::fs::rename(&self.part_path, &self.final_path).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&self.part_path).await;
            return Err(e.into());
        }
        Ok(self.final_path.clone())
    }

    /// Throw the partial file away.
    pub async fn discard(mut self) {
        self.settled = true;
        drop(self.writer.take());
        if let Err(e) = tokio::fs::remove_file(&self.part_path).await {
            log::debug!("Could not remove {}: {}", self.part_path.display(), e);
        }
    }
}

impl Drop for PartialDocument {
    fn drop(&mut self) {
        if !self.settled {
            drop(self.writer.take());
            let _ = std::fs::remove_file(&self.part_path);
        }
    }
}

async fn close_writer(mut writer: BufWriter<File>) -> std::io::Result<()> {
    writer.flush().await?;
    writer.into_inner().sync_all().await
}
