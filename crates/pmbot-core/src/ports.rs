use async_trait::async_trait;

use crate::{
    domain::{ChatId, ProcessDescriptor},
    Result,
};

/// Port for the process supervisor the bot operates.
///
/// pm2 is the first implementation; the shape is narrow enough that any
/// daemon with list/restart semantics can fit behind it.
#[async_trait]
pub trait SupervisorPort: Send + Sync {
    /// Verify the supervisor is reachable. A failure here is fatal at
    /// startup; the connection is never retried.
    async fn connect(&self) -> Result<()>;

    /// Snapshot of all supervised processes. Not cached.
    async fn list(&self) -> Result<Vec<ProcessDescriptor>>;

    /// Restart the process with the given id or name.
    async fn restart(&self, id: &str) -> Result<()>;
}

/// Port for the chat transport.
///
/// This bot only ever sends rich-text messages, so the port carries a single
/// operation. Adapters classify their send failures into
/// `Error::Transport { kind, .. }` so the error sink can decide whether a
/// reply is even worth attempting.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<()>;
}
