use crate::error::{Error, Result};
use crate::storage::{SessionStore, StoredSession};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File-based session store.
///
/// Files:
/// - `session.json`: token and user (serde_json)
/// - `session.json.tmp`: temporary file for atomic writes
pub struct FileSessionStore {
    path: PathBuf,
    tmp_path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        let tmp_path = path.with_extension("json.tmp");
        FileSessionStore { path, tmp_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Session(format!("Failed to create session directory: {}", e))
            })?;
        }
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(&self.path)
            .map_err(|e| Error::Session(format!("Failed to read session file: {}", e)))?;

        match serde_json::from_str::<StoredSession>(&data) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                // A corrupt file means "signed out", not a hard failure.
                tracing::warn!(error = %e, path = %self.path.display(), "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    fn save(&mut self, session: &StoredSession) -> Result<()> {
        self.ensure_dir()?;

        let bytes = serde_json::to_vec_pretty(session)
            .map_err(|e| Error::Session(format!("Failed to serialize session: {}", e)))?;

        let mut file = File::create(&self.tmp_path)
            .map_err(|e| Error::Session(format!("Failed to create temp session file: {}", e)))?;
        file.write_all(&bytes)
            .map_err(|e| Error::Session(format!("Failed to write session: {}", e)))?;
        file.sync_all()
            .map_err(|e| Error::Session(format!("Failed to fsync session: {}", e)))?;
        drop(file);

        fs::rename(&self.tmp_path, &self.path)
            .map_err(|e| Error::Session(format!("Failed to replace session file: {}", e)))?;

        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Session(format!("Failed to remove session file: {}", e))),
        }
    }
}
