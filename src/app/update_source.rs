use crate::{
    Result,
    updates::Update,
};

pub trait UpdateSource {
    /// Long-poll for updates with an id of at least `offset`, oldest first.
    /// `None` asks for everything the remote still holds.
    fn fetch_updates(
        &self,
        offset: Option<i64>,
    ) -> impl Future<Output = Result<Vec<Update>>> + Send;
}
