//! Command router.
//!
//! Dispatches each update on its leading token to one of the bot's actions.
//! Gated actions (`/list`, `/restart`, the fallback) check the
//! authorization decision the middleware attached; `/start` and `/help` are
//! open. Supervisor failures are handled right here with a user-facing
//! error reply, so they never escape to the error sink.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::{
    domain::{ChatKind, IncomingChat, RequestContext},
    formatting::escape_html,
    pipeline::Endpoint,
    ports::{MessagingPort, SupervisorPort},
    Result,
};

pub const WELCOME_TEXT: &str = "<b>Welcome!</b> \u{2728}\n<i>This is a process management bot.</i>";
pub const NOT_PRIVATE_TEXT: &str = "<b>Channels and groups are not supported presently.</b>";
pub const HELP_TEXT: &str = "<b>Process manager bot.</b>\n\n<i>This is a utility bot to manage \
                             supervised processes.\nUnauthorized use is not permitted.\nSee</i> \
                             <a href=\"https://pm2.keymetrics.io\">pm2</a> <i>to deploy your own.</i>";
pub const NOT_AUTHORIZED_TEXT: &str = "<b>You're not authorized to use this bot.</b>\n<i>Please \
                                       request access by contacting the admin(s).</i>";
pub const PROVIDE_ID_TEXT: &str = "<b>Please provide a process ID to restart.</b>";
pub const LIST_FAILED_TEXT: &str = "<b>Error listing processes.</b>";
pub const COMMANDS_TEXT: &str = "<b>Here are the commands available:</b>\n\n<i>/start Start the \
                                 bot\n/help Know more\n/list List processes\n/restart Restart \
                                 [process id]</i>";

/// A recognized command, parsed from the leading token of the message text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    List,
    /// `/restart <id>`; the id is the second whitespace-delimited token.
    Restart(Option<String>),
    /// Anything else, unrecognized commands included.
    Other,
}

impl Command {
    /// Case-sensitive exact match on the leading token. Telegram may send
    /// `/cmd@botname`; the suffix is stripped before matching.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if !trimmed.starts_with('/') {
            return Command::Other;
        }

        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let head = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("");

        let name = head[1..].split('@').next().unwrap_or("");
        match name {
            "start" => Command::Start,
            "help" => Command::Help,
            "list" => Command::List,
            "restart" => Command::Restart(rest.split_whitespace().next().map(str::to_string)),
            _ => Command::Other,
        }
    }
}

pub struct Router {
    supervisor: Arc<dyn SupervisorPort>,
    messenger: Arc<dyn MessagingPort>,
}

impl Router {
    pub fn new(supervisor: Arc<dyn SupervisorPort>, messenger: Arc<dyn MessagingPort>) -> Self {
        Self {
            supervisor,
            messenger,
        }
    }

    async fn handle_start(&self, chat: IncomingChat) -> Result<()> {
        // Only private chats get the welcome; everything else is rejected
        // and processing stops.
        if chat.kind != ChatKind::Private {
            return self.messenger.send_html(chat.id, NOT_PRIVATE_TEXT).await;
        }

        self.messenger.send_html(chat.id, WELCOME_TEXT).await?;
        info!(chat_id = chat.id.0, "new user started the bot");
        Ok(())
    }

    async fn handle_list(&self, chat: IncomingChat) -> Result<()> {
        let processes = match self.supervisor.list().await {
            Ok(p) => p,
            Err(e) => {
                error!("supervisor list failed: {e}");
                return self.messenger.send_html(chat.id, LIST_FAILED_TEXT).await;
            }
        };

        let lines = processes
            .iter()
            .map(|p| format!("{} - {}", escape_html(&p.name), escape_html(&p.status)))
            .collect::<Vec<_>>()
            .join("\n");

        self.messenger
            .send_html(chat.id, &format!("<b>Processes:</b>\n\n<i>{lines}</i>"))
            .await
    }

    async fn handle_restart(&self, chat: IncomingChat, id: Option<&str>) -> Result<()> {
        let Some(id) = id else {
            return self.messenger.send_html(chat.id, PROVIDE_ID_TEXT).await;
        };

        match self.supervisor.restart(id).await {
            Ok(()) => {
                self.messenger
                    .send_html(
                        chat.id,
                        &format!("<b>Restarting process {}</b>", escape_html(id)),
                    )
                    .await
            }
            Err(e) => {
                error!(process_id = id, "supervisor restart failed: {e}");
                self.messenger
                    .send_html(
                        chat.id,
                        &format!("<b>Error restarting process {}.</b>", escape_html(id)),
                    )
                    .await
            }
        }
    }
}

#[async_trait]
impl Endpoint for Router {
    async fn dispatch(&self, ctx: &RequestContext) -> Result<()> {
        let Some(chat) = ctx.chat else {
            // Nowhere to send a notice; such updates are unauthorized by
            // definition and simply dropped.
            debug!("dropping update without a chat");
            return Ok(());
        };

        let text = ctx.text.as_deref().unwrap_or("");
        let command = Command::parse(text);

        // Gated actions reply with the rejection notice and stop.
        let gated = matches!(
            command,
            Command::List | Command::Restart(_) | Command::Other
        );
        if gated && !ctx.is_authorized {
            return self.messenger.send_html(chat.id, NOT_AUTHORIZED_TEXT).await;
        }

        match command {
            Command::Start => self.handle_start(chat).await,
            Command::Help => self.messenger.send_html(chat.id, HELP_TEXT).await,
            Command::List => self.handle_list(chat).await,
            Command::Restart(id) => self.handle_restart(chat, id.as_deref()).await,
            Command::Other => self.messenger.send_html(chat.id, COMMANDS_TEXT).await,
        }
    }
}
