//! Per-request transient storage for the raw upload and its remuxed copy.
//!
//! A [`StagingArea`] owns a freshly created temporary directory. Dropping it removes
//! the directory and everything in it, so every exit path of a request cleans up;
//! [`StagingArea::close`] does the same explicitly and reports failures.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::error::ProcessingError;

const STAGING_PREFIX: &str = "vidkeep-";
const UPLOAD_STEM: &str = "upload";
const PROCESSING_SUFFIX: &str = "processing";
const CHUNK_SIZE: usize = 64 * 1024;

/// Creates staging areas under a configurable root.
#[derive(Debug, Clone, Default)]
pub struct Stager {
    root: Option<PathBuf>,
}

impl Stager {
    /// `root` of `None` stages under the OS temp directory.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Write `reader` into a new staging area, enforcing `max_bytes`.
    ///
    /// The upload file is created exclusively, flushed to disk and rewound before
    /// this returns. Oversize and empty input are rejected and leave nothing behind.
    pub async fn stage<R>(
        &self,
        reader: &mut R,
        extension: &str,
        max_bytes: u64,
    ) -> Result<StagingArea, ProcessingError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        let dir = match &self.root {
            Some(root) => {
                tokio::fs::create_dir_all(root).await?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };

        let upload_path = dir.path().join(format!("{}.{}", UPLOAD_STEM, extension));
        let processing_path = dir
            .path()
            .join(format!("{}.{}.{}", UPLOAD_STEM, extension, PROCESSING_SUFFIX));

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&upload_path)
            .await?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut size: u64 = 0;
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            size += n as u64;
            if size > max_bytes {
                return Err(ProcessingError::TooLarge { limit: max_bytes });
            }
            file.write_all(&buf[..n]).await?;
        }

        if size == 0 {
            return Err(ProcessingError::Empty);
        }

        file.flush().await?;
        file.sync_all().await?;
        file.rewind().await?;

        tracing::debug!(
            staging_dir = %dir.path().display(),
            size_bytes = size,
            "Upload staged"
        );

        Ok(StagingArea {
            dir,
            upload_path,
            processing_path,
            size,
        })
    }
}

/// A staged upload. The directory lives exactly as long as this value.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
    upload_path: PathBuf,
    processing_path: PathBuf,
    size: u64,
}

impl StagingArea {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The raw upload as received.
    pub fn upload_path(&self) -> &Path {
        &self.upload_path
    }

    /// Destination for the remuxed copy.
    pub fn processing_path(&self) -> &Path {
        &self.processing_path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Remove the staging directory now.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}
