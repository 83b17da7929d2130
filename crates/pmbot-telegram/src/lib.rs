//! Telegram adapter (teloxide).
//!
//! Implements the `pmbot-core` MessagingPort over the Telegram Bot API and
//! classifies teloxide's errors into the core transport taxonomy so the
//! error sink never has to inspect description strings.

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode, ApiError, RequestError};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use pmbot_core::{
    domain::ChatId,
    ports::MessagingPort,
    Error, Result, TransportErrorKind,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: RequestError) -> Error {
        Error::Transport {
            kind: classify(&e),
            message: format!("telegram error: {e}"),
        }
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

fn classify(e: &RequestError) -> TransportErrorKind {
    match e {
        RequestError::Api(ApiError::BotBlocked) => TransportErrorKind::Blocked,
        RequestError::Network(_) | RequestError::Io(_) => TransportErrorKind::Unreachable,
        _ => TransportErrorKind::Other,
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .send_message(Self::tg_chat(chat_id), html.to_string())
                .parse_mode(ParseMode::Html)
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_recipient_is_classified_as_blocked() {
        let e = RequestError::Api(ApiError::BotBlocked);
        assert_eq!(classify(&e), TransportErrorKind::Blocked);
    }

    #[test]
    fn other_api_errors_are_unclassified() {
        let e = RequestError::Api(ApiError::MessageNotModified);
        assert_eq!(classify(&e), TransportErrorKind::Other);

        let e = RequestError::Api(ApiError::ChatNotFound);
        assert_eq!(classify(&e), TransportErrorKind::Other);
    }

    #[test]
    fn classification_survives_error_mapping() {
        let err = TelegramMessenger::map_err(RequestError::Api(ApiError::BotBlocked));
        assert_eq!(err.transport_kind(), Some(TransportErrorKind::Blocked));
    }
}
