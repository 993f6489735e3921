use crate::{
    Error,
    Result,
    app::{
        messenger::Messenger,
        update_source::UpdateSource,
    },
    updates::{
        Message,
        MessageRef,
        Payload,
        Throw,
        ThrowKind,
        Update,
    },
};
use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{
            AtomicBool,
            AtomicI64,
            Ordering,
        },
    },
};

/// Value thrown when nothing is scripted: three bars, not a jackpot.
pub const DEFAULT_THROW_VALUE: u8 = 1;

/// Everything the fake messenger was asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat_id: i64,
        text: String,
        reply_to: Option<i64>,
    },
    Throw {
        chat_id: i64,
        kind: ThrowKind,
        reply_to: Option<i64>,
    },
    Image {
        chat_id: i64,
        caption: String,
        png_len: usize,
        reply_to: Option<i64>,
    },
    ExistingImage {
        chat_id: i64,
        file_id: String,
        reply_to: Option<i64>,
    },
}

/// Next answer to a throw request.
#[derive(Debug, Clone, Copy)]
pub enum ScriptedThrow {
    Value(u8),
    RateLimited,
    Broken,
}

pub struct FakeMessenger {
    sent: Mutex<Vec<Sent>>,
    throws: Mutex<VecDeque<ScriptedThrow>>,
    throw_attempts: Mutex<usize>,
    next_message_id: AtomicI64,
    fail_sends: AtomicBool,
}

impl Default for FakeMessenger {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeMessenger {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            throws: Mutex::new(VecDeque::new()),
            throw_attempts: Mutex::new(0),
            next_message_id: AtomicI64::new(1000),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Queue answers for upcoming throw requests, of any kind.
    pub fn script_throws(&self, script: impl IntoIterator<Item = ScriptedThrow>) {
        self.throws.lock().unwrap().extend(script);
    }

    /// Make text and image sends fail with a transport-like error.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Throw requests made so far, including rejected ones.
    pub fn throws_sent(&self) -> usize {
        *self.throw_attempts.lock().unwrap()
    }

    fn next_message_id(&self) -> i64 {
        self.next_message_id.fetch_add(1, Ordering::SeqCst)
    }

    fn deliver(&self, sent: Sent, chat_id: i64) -> Result<MessageRef> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(broken());
        }
        self.sent.lock().unwrap().push(sent);
        Ok(MessageRef {
            message_id: self.next_message_id(),
            chat_id,
        })
    }
}

fn broken() -> Error {
    Error::Api {
        code: 500,
        description: "Internal Server Error".to_string(),
    }
}

impl Messenger for FakeMessenger {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<MessageRef> {
        self.deliver(
            Sent::Text {
                chat_id,
                text: text.to_string(),
                reply_to,
            },
            chat_id,
        )
    }

    async fn send_throw(
        &self,
        chat_id: i64,
        kind: ThrowKind,
        reply_to: Option<i64>,
    ) -> Result<Message> {
        *self.throw_attempts.lock().unwrap() += 1;
        let scripted = self
            .throws
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ScriptedThrow::Value(DEFAULT_THROW_VALUE));
        let value = match scripted {
            ScriptedThrow::Value(value) => value,
            ScriptedThrow::RateLimited => {
                return Err(Error::RateLimited {
                    retry_after: Some(60),
                });
            }
            ScriptedThrow::Broken => return Err(broken()),
        };
        self.sent.lock().unwrap().push(Sent::Throw {
            chat_id,
            kind,
            reply_to,
        });
        Ok(Message {
            message_id: self.next_message_id(),
            chat_id,
            sender_id: None,
            payload: Payload::Throw(Throw::new(kind, value)),
        })
    }

    async fn send_image(
        &self,
        chat_id: i64,
        png: Vec<u8>,
        caption: &str,
        reply_to: Option<i64>,
    ) -> Result<MessageRef> {
        self.deliver(
            Sent::Image {
                chat_id,
                caption: caption.to_string(),
                png_len: png.len(),
                reply_to,
            },
            chat_id,
        )
    }

    async fn send_existing_image(
        &self,
        chat_id: i64,
        file_id: &str,
        reply_to: Option<i64>,
    ) -> Result<MessageRef> {
        self.deliver(
            Sent::ExistingImage {
                chat_id,
                file_id: file_id.to_string(),
                reply_to,
            },
            chat_id,
        )
    }
}

/// Next answer to a poll.
pub enum ScriptedBatch {
    Updates(Vec<Update>),
    Broken,
}

/// Update source serving queued batches, then empty polls.
#[derive(Default)]
pub struct ScriptedUpdates {
    batches: Mutex<VecDeque<ScriptedBatch>>,
    offsets: Mutex<Vec<Option<i64>>>,
}

impl ScriptedUpdates {
    pub fn new(batches: impl IntoIterator<Item = ScriptedBatch>) -> Self {
        Self {
            batches: Mutex::new(batches.into_iter().collect()),
            offsets: Mutex::new(Vec::new()),
        }
    }

    /// Offsets asked for so far, oldest first.
    pub fn offsets(&self) -> Vec<Option<i64>> {
        self.offsets.lock().unwrap().clone()
    }
}

impl UpdateSource for ScriptedUpdates {
    async fn fetch_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        self.offsets.lock().unwrap().push(offset);
        match self.batches.lock().unwrap().pop_front() {
            Some(ScriptedBatch::Updates(updates)) => Ok(updates),
            Some(ScriptedBatch::Broken) => Err(broken()),
            None => Ok(Vec::new()),
        }
    }
}

pub fn text_update(update_id: i64, chat_id: i64, sender_id: i64, text: &str) -> Update {
    Update {
        update_id,
        message: Some(Message {
            message_id: update_id * 10,
            chat_id,
            sender_id: Some(sender_id),
            payload: Payload::Text(text.to_string()),
        }),
    }
}

pub fn throw_update(update_id: i64, chat_id: i64, kind: ThrowKind, value: u8) -> Update {
    Update {
        update_id,
        message: Some(Message {
            message_id: update_id * 10,
            chat_id,
            sender_id: Some(1),
            payload: Payload::Throw(Throw::new(kind, value)),
        }),
    }
}
