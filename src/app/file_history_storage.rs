// JSON-file backed history persistence.
use crate::{
    app::history_storage::HistoryStorage,
    history::History,
};
use std::{
    fs,
    io,
    path::{
        Path,
        PathBuf,
    },
    sync::Mutex,
};

#[derive(Debug)]
pub struct FileHistoryStorage {
    path: PathBuf,
    // writers share the temp file
    write_lock: Mutex<()>,
}

impl FileHistoryStorage {
    /// Storage at `path`, creating its parent directory if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl HistoryStorage for FileHistoryStorage {
    fn load(&self) -> crate::Result<Option<History>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let history = History::new();
        history.deserialize(&bytes)?;
        Ok(Some(history))
    }

    fn store(&self, history: &History) -> crate::Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // taken under the lock so the last writer leaves the newest snapshot
        let bytes = history.serialize()?;
        // readers never see a half-written file
        let temp = self.temp_path();
        fs::write(&temp, bytes)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}
