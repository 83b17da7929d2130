//! Telegram update handling.
//!
//! Translates each inbound message (chat messages and channel posts alike)
//! into a core `RequestContext` and runs it through the middleware
//! pipeline. Anything that escapes the pipeline goes to the error sink; the
//! dispatcher itself always sees success.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use pmbot_core::{
    domain::{ChatId, ChatKind, IncomingChat, MessageId, RequestContext},
    sink,
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let ctx = request_context(&msg, &state);

    if let Err(err) = state.pipeline.handle(ctx.clone()).await {
        sink::report(state.messenger.as_ref(), &ctx, &err).await;
    }

    Ok(())
}

fn request_context(msg: &Message, state: &AppState) -> RequestContext {
    let chat = IncomingChat {
        id: ChatId(msg.chat.id.0),
        kind: chat_kind(&msg.chat),
    };

    RequestContext::new(
        Some(chat),
        Some(MessageId(msg.id.0)),
        msg.text().map(str::to_string),
        state.operators.clone(),
    )
}

fn chat_kind(chat: &teloxide::types::Chat) -> ChatKind {
    if chat.is_private() {
        ChatKind::Private
    } else if chat.is_group() {
        ChatKind::Group
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else {
        ChatKind::Channel
    }
}
