use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tracing::info;

use pmbot_core::{
    config::Config,
    domain::OperatorSet,
    pipeline::{AuthMiddleware, Pipeline, TimingMiddleware},
    ports::{MessagingPort, SupervisorPort},
    router::Router,
};

use crate::handlers;
use crate::TelegramMessenger;

/// Process-wide immutable dependencies, shared across updates.
pub struct AppState {
    pub operators: Arc<OperatorSet>,
    pub messenger: Arc<dyn MessagingPort>,
    pub pipeline: Pipeline,
}

pub async fn run_polling(cfg: Arc<Config>, supervisor: Arc<dyn SupervisorPort>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        info!("pmbot started: @{}", me.username());
    }

    let operators = Arc::new(OperatorSet::new(cfg.operator_ids.iter().copied()));
    info!(operators = operators.len(), "operator allowlist loaded");

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));

    // Fixed chain order: authorization annotates first, timing wraps the
    // rest of the handling including reply transmission.
    let pipeline = Pipeline::new(Arc::new(Router::new(supervisor, messenger.clone())))
        .with(Arc::new(AuthMiddleware))
        .with(Arc::new(TimingMiddleware));

    let state = Arc::new(AppState {
        operators,
        messenger,
        pipeline,
    });

    // Channel posts arrive as a separate update kind; they go through the
    // same path so the router can reject non-private origins.
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_message))
        .branch(Update::filter_channel_post().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
