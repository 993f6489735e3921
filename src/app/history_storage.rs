use crate::history::History;

pub trait HistoryStorage: Send + Sync + 'static {
    /// retrieve the persisted history, `None` if nothing was stored yet
    fn load(&self) -> crate::Result<Option<History>>;

    /// overwrite the persisted history with a fresh snapshot
    fn store(&self, history: &History) -> crate::Result<()>;
}
