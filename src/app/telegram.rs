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
use reqwest::{
    RequestBuilder,
    StatusCode,
    multipart::{
        Form,
        Part,
    },
};
use serde::{
    Deserialize,
    Serialize,
    de::DeserializeOwned,
};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Seconds the remote holds a `getUpdates` call open when nothing is pending.
const LONG_POLL_SECS: u64 = 10;
const POLL_TIMEOUT: Duration = Duration::from_secs(LONG_POLL_SECS + 5);
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

const HISTOGRAM_FILE_NAME: &str = "histogram.png";

/// Bot API client. Serves both as the update source and the messenger.
#[derive(Clone)]
pub struct TelegramClient {
    base_url: String,
    http: reqwest::Client,
}

impl TelegramClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_api_url(DEFAULT_API_URL, api_key)
    }

    pub fn with_api_url(api_url: &str, api_key: &str) -> Result<Self> {
        let base_url = format!("{}/bot{}", api_url.trim_end_matches('/'), api_key);
        let http = reqwest::Client::builder().build().map_err(transport)?;
        Ok(Self { base_url, http })
    }

    fn post(&self, method: &str) -> RequestBuilder {
        self.http.post(format!("{}/{}", self.base_url, method))
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let res = request.send().await.map_err(transport)?;
        let status = res.status();
        let bytes = res.bytes().await.map_err(transport)?;
        parse_response(status, &bytes)
    }

    async fn send_message(&self, request: RequestBuilder) -> Result<Message> {
        let dto: MessageDto = self.call(request.timeout(SEND_TIMEOUT)).await?;
        Ok(dto.into())
    }
}

/// The bot token is part of every URL, keep it out of error messages.
fn transport(e: reqwest::Error) -> Error {
    Error::Transport(e.without_url())
}

fn parse_response<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> Result<T> {
    let envelope: EnvelopeDto<T> = match serde_json::from_slice(bytes) {
        Ok(envelope) => envelope,
        Err(_) if status == StatusCode::TOO_MANY_REQUESTS => {
            return Err(Error::RateLimited { retry_after: None });
        }
        Err(e) => {
            return Err(Error::Api {
                code: i64::from(status.as_u16()),
                description: format!("unreadable response: {e}"),
            });
        }
    };
    let retry_after = envelope.parameters.and_then(|p| p.retry_after);
    if status == StatusCode::TOO_MANY_REQUESTS || envelope.error_code == Some(429) {
        return Err(Error::RateLimited { retry_after });
    }
    match envelope.result {
        Some(result) if envelope.ok => Ok(result),
        _ => Err(Error::Api {
            code: envelope
                .error_code
                .unwrap_or_else(|| i64::from(status.as_u16())),
            description: envelope
                .description
                .unwrap_or_else(|| "no description".to_string()),
        }),
    }
}

impl UpdateSource for TelegramClient {
    async fn fetch_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let request = self
            .post("getUpdates")
            .json(&GetUpdatesRequest {
                offset,
                timeout: LONG_POLL_SECS,
            })
            .timeout(POLL_TIMEOUT);
        let dtos: Vec<UpdateDto> = self.call(request).await?;
        Ok(dtos.into_iter().map(Into::into).collect())
    }
}

impl Messenger for TelegramClient {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<MessageRef> {
        let request = self.post("sendMessage").json(&SendMessageRequest {
            chat_id,
            text,
            reply_to_message_id: reply_to,
        });
        Ok(MessageRef::from(&self.send_message(request).await?))
    }

    async fn send_throw(
        &self,
        chat_id: i64,
        kind: ThrowKind,
        reply_to: Option<i64>,
    ) -> Result<Message> {
        let request = self.post("sendDice").json(&SendDiceRequest {
            chat_id,
            emoji: kind.emoji(),
            reply_to_message_id: reply_to,
        });
        self.send_message(request).await
    }

    async fn send_image(
        &self,
        chat_id: i64,
        png: Vec<u8>,
        caption: &str,
        reply_to: Option<i64>,
    ) -> Result<MessageRef> {
        let photo = Part::bytes(png)
            .file_name(HISTOGRAM_FILE_NAME)
            .mime_str("image/png")
            .map_err(transport)?;
        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("photo", photo);
        if let Some(reply_to) = reply_to {
            form = form.text("reply_to_message_id", reply_to.to_string());
        }
        let request = self.post("sendPhoto").multipart(form);
        Ok(MessageRef::from(&self.send_message(request).await?))
    }

    async fn send_existing_image(
        &self,
        chat_id: i64,
        file_id: &str,
        reply_to: Option<i64>,
    ) -> Result<MessageRef> {
        let request = self.post("sendPhoto").json(&SendPhotoRequest {
            chat_id,
            photo: file_id,
            reply_to_message_id: reply_to,
        });
        Ok(MessageRef::from(&self.send_message(request).await?))
    }
}

#[derive(Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
}

#[derive(Serialize)]
struct SendDiceRequest {
    chat_id: i64,
    emoji: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
}

#[derive(Serialize)]
struct SendPhotoRequest<'a> {
    chat_id: i64,
    photo: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
}

#[derive(Deserialize)]
struct EnvelopeDto<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
    parameters: Option<ResponseParametersDto>,
}

#[derive(Deserialize)]
struct ResponseParametersDto {
    retry_after: Option<u64>,
}

#[derive(Deserialize)]
struct UpdateDto {
    update_id: i64,
    message: Option<MessageDto>,
}

#[derive(Deserialize)]
struct MessageDto {
    message_id: i64,
    chat: ChatDto,
    from: Option<UserDto>,
    dice: Option<DiceDto>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChatDto {
    id: i64,
}

#[derive(Deserialize)]
struct UserDto {
    id: i64,
}

#[derive(Deserialize)]
struct DiceDto {
    emoji: String,
    value: u8,
}

impl From<UpdateDto> for Update {
    fn from(dto: UpdateDto) -> Self {
        Update {
            update_id: dto.update_id,
            message: dto.message.map(Into::into),
        }
    }
}

impl From<MessageDto> for Message {
    fn from(dto: MessageDto) -> Self {
        let payload = match (dto.dice, dto.text) {
            (Some(dice), _) => Payload::Throw(Throw {
                emoji: dice.emoji,
                value: dice.value,
            }),
            (None, Some(text)) => Payload::Text(text),
            (None, None) => Payload::Other,
        };
        Message {
            message_id: dto.message_id,
            chat_id: dto.chat.id,
            sender_id: dto.from.map(|user| user.id),
            payload,
        }
    }
}
