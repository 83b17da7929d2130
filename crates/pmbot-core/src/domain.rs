use std::{collections::HashSet, sync::Arc, time::Instant};

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// Kind of chat an update originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// The immutable set of chat identities allowed to run gated commands.
///
/// Loaded once at startup from config; never mutates afterwards, so it can
/// be shared freely across the dispatcher without locking.
#[derive(Clone, Debug, Default)]
pub struct OperatorSet {
    ids: HashSet<i64>,
}

impl OperatorSet {
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, chat_id: ChatId) -> bool {
        self.ids.contains(&chat_id.0)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A supervised process as reported by the supervisor, one snapshot per
/// `list` call. The status string is passed through verbatim ("online",
/// "stopped", "errored", ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessDescriptor {
    pub name: String,
    pub status: String,
}

/// The originating chat of an update, when the update carried one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IncomingChat {
    pub id: ChatId,
    pub kind: ChatKind,
}

/// Per-update context threaded through the middleware pipeline.
///
/// Created by the transport adapter for each inbound event and discarded
/// once the reply (or the error path) completes. `is_authorized` is set
/// exactly once, by the authorization middleware; `received_at` exactly
/// once, by the timing middleware.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub chat: Option<IncomingChat>,
    pub message_id: Option<MessageId>,
    pub text: Option<String>,
    pub operators: Arc<OperatorSet>,
    pub is_authorized: bool,
    pub received_at: Option<Instant>,
}

impl RequestContext {
    pub fn new(
        chat: Option<IncomingChat>,
        message_id: Option<MessageId>,
        text: Option<String>,
        operators: Arc<OperatorSet>,
    ) -> Self {
        Self {
            chat,
            message_id,
            text,
            operators,
            is_authorized: false,
            received_at: None,
        }
    }

    pub fn chat_id(&self) -> Option<ChatId> {
        self.chat.map(|c| c.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_set_membership() {
        let ops = OperatorSet::new([42, 7]);
        assert!(ops.contains(ChatId(42)));
        assert!(ops.contains(ChatId(7)));
        assert!(!ops.contains(ChatId(43)));
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn empty_operator_set_authorizes_nobody() {
        let ops = OperatorSet::default();
        assert!(ops.is_empty());
        assert!(!ops.contains(ChatId(0)));
    }
}
