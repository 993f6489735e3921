use crate::{
    Error,
    app::history_storage::HistoryStorage,
    history::History,
};
use std::{
    io,
    sync::{
        Arc,
        Mutex,
        atomic::{
            AtomicBool,
            AtomicUsize,
            Ordering,
        },
    },
};

/// Keeps the serialized history in memory. Clones share the same slot.
#[derive(Clone, Default)]
pub struct InMemoryHistoryStorage {
    stored: Arc<Mutex<Option<Vec<u8>>>>,
    writes: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryHistoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_history(history: &History) -> crate::Result<Self> {
        let storage = Self::new();
        *storage.stored.lock().unwrap() = Some(history.serialize()?);
        Ok(storage)
    }

    pub fn stored(&self) -> Option<Vec<u8>> {
        self.stored.lock().unwrap().clone()
    }

    /// Number of successful `store` calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every following `store` fail, as a full disk would.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl HistoryStorage for InMemoryHistoryStorage {
    fn load(&self) -> crate::Result<Option<History>> {
        let guard = self.stored.lock().unwrap();
        match &*guard {
            Some(bytes) => {
                let history = History::new();
                history.deserialize(bytes)?;
                Ok(Some(history))
            }
            None => Ok(None),
        }
    }

    fn store(&self, history: &History) -> crate::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Io(io::Error::other("no space left on device")));
        }
        let bytes = history.serialize()?;
        *self.stored.lock().unwrap() = Some(bytes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
