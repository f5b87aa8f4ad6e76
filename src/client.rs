use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use teloxide::prelude::*;
use thiserror::Error;
use url::Url;

use crate::error::InitError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Request(#[from] teloxide::RequestError),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Session against the Telegram Bot API. Everything the service asks of
/// Telegram goes through here.
#[async_trait]
pub trait BotClient: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), ClientError>;

    /// Returns whether Telegram accepted the URL as the delivery target.
    async fn register_webhook(&self, url: &Url) -> Result<bool, ClientError>;
}

pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn connect(token: &str) -> Result<Self, InitError> {
        if !is_well_formed_token(token) {
            return Err(InitError::MalformedToken);
        }

        Ok(Self {
            bot: Bot::new(token),
        })
    }
}

#[async_trait]
impl BotClient for TelegramClient {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), ClientError> {
        self.bot.send_message(chat_id, text).await?;

        Ok(())
    }

    async fn register_webhook(&self, url: &Url) -> Result<bool, ClientError> {
        webhook_accepted(self.bot.set_webhook(url.clone()).await)
    }
}

/// Telegram refusing the URL is a rejected registration; transport
/// failures stay errors.
fn webhook_accepted<T>(
    result: Result<T, teloxide::RequestError>,
) -> Result<bool, ClientError> {
    match result {
        Ok(_) => Ok(true),
        Err(teloxide::RequestError::Api(err)) => {
            warn!("Telegram rejected the webhook: {err}");
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}

/// Bot tokens look like `123456789:AAH...`.
fn is_well_formed_token(token: &str) -> bool {
    match token.split_once(':') {
        Some((id, secret)) => {
            !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) && !secret.is_empty()
        }
        None => false,
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every outbound call instead of talking to Telegram.
    #[derive(Default)]
    pub struct RecordingClient {
        pub sent: Mutex<Vec<(ChatId, String)>>,
        pub registered: Mutex<Vec<String>>,
        pub fail_send: bool,
        pub reject_webhook: bool,
        pub delay: Option<Duration>,
    }

    impl RecordingClient {
        pub fn sent(&self) -> Vec<(ChatId, String)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn registered(&self) -> Vec<String> {
            self.registered.lock().unwrap().clone()
        }

        pub fn calls(&self) -> usize {
            self.sent.lock().unwrap().len() + self.registered.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl BotClient for RecordingClient {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), ClientError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_send {
                return Err(teloxide::RequestError::Api(teloxide::ApiError::BotBlocked).into());
            }

            self.sent.lock().unwrap().push((chat_id, text.to_owned()));
            Ok(())
        }

        async fn register_webhook(&self, url: &Url) -> Result<bool, ClientError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            self.registered.lock().unwrap().push(url.to_string());

            let response = if self.reject_webhook {
                Err(teloxide::RequestError::Api(teloxide::ApiError::Unknown(
                    "Bad Request: bad webhook: HTTPS url must be provided".into(),
                )))
            } else {
                Ok(())
            };
            webhook_accepted(response)
        }
    }
}
