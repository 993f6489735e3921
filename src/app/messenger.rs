use crate::{
    Result,
    updates::{
        Message,
        MessageRef,
        ThrowKind,
    },
};

/// Outbound side of the chat platform.
pub trait Messenger: Send + Sync + 'static {
    fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> impl Future<Output = Result<MessageRef>> + Send;

    /// Ask the remote for a random throw. Fails with `Error::RateLimited` when
    /// throttled; callers back off and retry.
    fn send_throw(
        &self,
        chat_id: i64,
        kind: ThrowKind,
        reply_to: Option<i64>,
    ) -> impl Future<Output = Result<Message>> + Send;

    /// Upload a PNG with a caption.
    fn send_image(
        &self,
        chat_id: i64,
        png: Vec<u8>,
        caption: &str,
        reply_to: Option<i64>,
    ) -> impl Future<Output = Result<MessageRef>> + Send;

    /// Send a photo that already lives on the remote.
    fn send_existing_image(
        &self,
        chat_id: i64,
        file_id: &str,
        reply_to: Option<i64>,
    ) -> impl Future<Output = Result<MessageRef>> + Send;
}
