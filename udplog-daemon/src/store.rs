//! Append-only log store.
//!
//! One text file, one log-record frame per line. The file is created with
//! mode `0666` (before umask) if absent and is only ever appended to while
//! the daemon runs. A single async mutex serializes the writer (receive
//! loop) against readers (dump), so a dump never observes a half-written
//! line and appends never interleave.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{io_err, DaemonError};

#[derive(Debug)]
pub struct LogStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl LogStore {
    /// Open (creating if needed) the store at `path` for appending.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DaemonError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| io_err(parent, e))?;
            }
        }

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        options.mode(0o666);
        let file = options.open(&path).await.map_err(|e| io_err(&path, e))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one frame while holding exclusive access.
    pub async fn append(&self, frame: &[u8]) -> Result<(), DaemonError> {
        let mut file = self.file.lock().await;
        file.write_all(frame)
            .await
            .map_err(|e| io_err(&self.path, e))?;
        file.flush().await.map_err(|e| io_err(&self.path, e))?;
        Ok(())
    }

    /// Read every stored line. Holds the append lock for the whole pass.
    pub async fn read_lines(&self) -> Result<Vec<String>, DaemonError> {
        let _guard = self.file.lock().await;
        let contents = tokio::fs::read(&self.path)
            .await
            .map_err(|e| io_err(&self.path, e))?;
        Ok(String::from_utf8_lossy(&contents)
            .lines()
            .map(str::to_owned)
            .collect())
    }
}
