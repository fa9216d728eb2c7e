use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Append-only text file holding every received log line.
pub struct LogStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the directory the log file lives in.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir).await,
            _ => Ok(()),
        }
    }

    /// Appends all lines in one write so a request's lines stay together.
    pub async fn append(&self, lines: &[String]) -> io::Result<()> {
        if lines.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        self.ensure_dir().await?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(lines.concat().as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    /// Whole file as text, or `None` if nothing was written yet.
    pub async fn read_to_string(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Raw file bytes, or `None` if nothing was written yet.
    pub async fn read_bytes(&self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
