//! Files uploaded with a request and parked in a temporary location.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result, UploadError};
use crate::stream::Stream;

/// Upload status code meaning the transfer completed.
pub const UPLOAD_OK: u8 = 0;

const MAX_FILE_NAME_LEN: usize = 255;

static TARGET_NAME: OnceLock<Regex> = OnceLock::new();

fn target_name_regex() -> &'static Regex {
    TARGET_NAME.get_or_init(|| Regex::new(r"(?i)^[-0-9A-Z_.]+$").expect("Invalid regex"))
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    client_filename: String,
    media_type: Option<String>,
    temporary_path: PathBuf,
    error: u8,
    size: Option<u64>,
    // shared by every copy of the owning request
    moved: Arc<AtomicBool>,
}

impl UploadedFile {
    /// # Errors
    ///
    /// `InvalidArgument` for an empty client file name or an error code above 8.
    pub fn new(
        client_filename: &str,
        media_type: &str,
        temporary_path: impl Into<PathBuf>,
        error: u8,
        size: Option<u64>,
    ) -> Result<Self> {
        if client_filename.is_empty() {
            return Err(Error::invalid_argument("uploaded file name cannot be empty"));
        }
        if error > 8 {
            return Err(Error::invalid_argument(format!("invalid upload status code {error}")));
        }
        Ok(Self {
            client_filename: client_filename.to_string(),
            media_type: (!media_type.is_empty()).then(|| media_type.to_string()),
            temporary_path: temporary_path.into(),
            error,
            size,
            moved: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn error(&self) -> u8 {
        self.error
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn client_filename(&self) -> &str {
        &self.client_filename
    }

    pub fn client_media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn temporary_path(&self) -> &Path {
        &self.temporary_path
    }

    pub fn has_moved(&self) -> bool {
        self.moved.load(Ordering::SeqCst)
    }

    /// Opens the temporary file read-only.
    pub fn stream(&self) -> Result<Stream> {
        if self.has_moved() {
            return Err(UploadError::AlreadyMoved.into());
        }
        Stream::open(&self.temporary_path, "r")
    }

    /// Moves the temporary file to `target`. Can only succeed once.
    pub fn move_to(&self, target: impl AsRef<Path>) -> Result<()> {
        let target = target.as_ref();
        if self.has_moved() {
            return Err(UploadError::AlreadyMoved.into());
        }
        if self.error != UPLOAD_OK {
            return Err(UploadError::from_code(self.error).into());
        }

        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if !target_name_regex().is_match(name) {
            return Err(Error::invalid_argument(format!(
                "target file name \"{name}\" may only contain letters, digits, '-', '_' and '.'"
            )));
        }
        if name.len() > MAX_FILE_NAME_LEN {
            return Err(Error::invalid_argument(format!(
                "target file name is too long ({MAX_FILE_NAME_LEN} bytes max)"
            )));
        }
        let parent = target.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        if !parent.is_dir() {
            return Err(Error::invalid_argument(format!(
                "target directory \"{}\" does not exist",
                parent.display()
            )));
        }

        if fs::rename(&self.temporary_path, target).is_err() {
            // rename fails across filesystems
            copy_and_remove(&self.temporary_path, target)?;
        }
        self.moved.store(true, Ordering::SeqCst);
        tracing::debug!(
            client_filename = %self.client_filename,
            target = %target.display(),
            "uploaded file moved"
        );
        Ok(())
    }
}

/// Copies `from` to `to`, then removes `from`. Once the copy exists the
/// move has happened; a source that cannot be removed is only logged.
fn copy_and_remove(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).map_err(|_| UploadError::Unexpected)?;
    if let Err(e) = fs::remove_file(from) {
        tracing::warn!(path = %from.display(), error = %e, "temporary upload file left behind");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("chipmunk-copy-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn copy_fallback_removes_source() {
        let dir = scratch("plain");
        let from = dir.join("in.tmp");
        fs::write(&from, "bytes").unwrap();

        copy_and_remove(&from, &dir.join("out.bin")).unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read_to_string(dir.join("out.bin")).unwrap(), "bytes");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn copy_fallback_succeeds_when_source_stays() {
        // procfs entries can be read but not unlinked
        let dir = scratch("stuck");
        let from = Path::new("/proc/self/status");
        let to = dir.join("status.txt");

        copy_and_remove(from, &to).unwrap();

        assert!(from.exists());
        assert!(to.exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
