//! Terminal error sink.
//!
//! Any failure that escapes the pipeline lands here, paired with the
//! context that was active. Classification comes from the machine-checkable
//! kind the transport adapter stamped on the error, never from matching on
//! description strings.

use tracing::{error, warn};

use crate::{
    domain::RequestContext,
    ports::MessagingPort,
    Error, TransportErrorKind,
};

pub const GENERIC_ERROR_TEXT: &str = "An error occurred";

/// Log the failure and, where delivery still makes sense, attempt one
/// generic reply. The reply attempt is guarded: its own failure is logged
/// and never fed back into the sink.
pub async fn report(messenger: &dyn MessagingPort, ctx: &RequestContext, err: &Error) {
    match err.transport_kind() {
        Some(TransportErrorKind::Blocked) => {
            // The recipient cannot receive anything further; replying would
            // fail the same way.
            warn!(chat_id = ?ctx.chat_id(), "bot was blocked by the user");
        }
        Some(TransportErrorKind::Unreachable) => {
            error!("could not contact the chat backend: {err}");
        }
        _ => {
            error!(
                message_id = ?ctx.message_id,
                text = ctx.text.as_deref().unwrap_or(""),
                "error while handling update: {err}"
            );

            let Some(chat_id) = ctx.chat_id() else {
                return;
            };
            if let Err(send_err) = messenger.send_html(chat_id, GENERIC_ERROR_TEXT).await {
                warn!("failed to deliver the generic error reply: {send_err}");
            }
        }
    }
}
