//! Middleware pipeline.
//!
//! Every inbound update flows through an explicit ordered list of middleware
//! before reaching the terminal endpoint (the command router). `before`
//! hooks run in order, then the endpoint dispatches, then `after` hooks run
//! in reverse order. `after` hooks run on the error path too, so the timing
//! middleware always gets to record elapsed time; the dispatch result is
//! returned unchanged either way.

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{domain::RequestContext, Result};

/// A stage in the per-update pipeline.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Runs before the endpoint, in registration order. May annotate the
    /// context; must not reply or reject the update.
    async fn before(&self, ctx: &mut RequestContext) -> Result<()>;

    /// Runs after the endpoint, in reverse registration order, whether the
    /// dispatch succeeded or failed.
    async fn after(&self, _ctx: &RequestContext, _outcome: &Result<()>) -> Result<()> {
        Ok(())
    }
}

/// Terminal stage of the pipeline.
#[async_trait]
pub trait Endpoint: Send + Sync {
    async fn dispatch(&self, ctx: &RequestContext) -> Result<()>;
}

pub struct Pipeline {
    middleware: Vec<Arc<dyn Middleware>>,
    endpoint: Arc<dyn Endpoint>,
}

impl Pipeline {
    pub fn new(endpoint: Arc<dyn Endpoint>) -> Self {
        Self {
            middleware: Vec::new(),
            endpoint,
        }
    }

    pub fn with(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Run one update through the chain. Returns the endpoint's result; a
    /// failing `after` hook is logged but never replaces that result.
    pub async fn handle(&self, mut ctx: RequestContext) -> Result<()> {
        for mw in &self.middleware {
            mw.before(&mut ctx).await?;
        }

        let outcome = self.endpoint.dispatch(&ctx).await;

        for mw in self.middleware.iter().rev() {
            if let Err(e) = mw.after(&ctx, &outcome).await {
                warn!("middleware after hook failed: {e}");
            }
        }

        outcome
    }
}

/// Marks each update as coming from a recognized operator or not.
///
/// Decision only: downstream handlers choose what to do with it. Updates
/// without a chat identity are unauthorized.
pub struct AuthMiddleware;

#[async_trait]
impl Middleware for AuthMiddleware {
    async fn before(&self, ctx: &mut RequestContext) -> Result<()> {
        ctx.is_authorized = ctx
            .chat_id()
            .map(|id| ctx.operators.contains(id))
            .unwrap_or(false);
        Ok(())
    }
}

/// Logs elapsed handling time per update, reply transmission included.
pub struct TimingMiddleware;

#[async_trait]
impl Middleware for TimingMiddleware {
    async fn before(&self, ctx: &mut RequestContext) -> Result<()> {
        ctx.received_at = Some(Instant::now());
        Ok(())
    }

    async fn after(&self, ctx: &RequestContext, outcome: &Result<()>) -> Result<()> {
        if let Some(started) = ctx.received_at {
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                ok = outcome.is_ok(),
                "update handled"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, ChatKind, IncomingChat, OperatorSet};
    use crate::errors::Error;
    use tokio::sync::Mutex;

    fn ctx_for(chat: Option<i64>, operators: &[i64]) -> RequestContext {
        RequestContext::new(
            chat.map(|id| IncomingChat {
                id: ChatId(id),
                kind: ChatKind::Private,
            }),
            None,
            Some("hi".to_string()),
            Arc::new(OperatorSet::new(operators.iter().copied())),
        )
    }

    struct NoopEndpoint;

    #[async_trait]
    impl Endpoint for NoopEndpoint {
        async fn dispatch(&self, _ctx: &RequestContext) -> Result<()> {
            Ok(())
        }
    }

    struct FailingEndpoint;

    #[async_trait]
    impl Endpoint for FailingEndpoint {
        async fn dispatch(&self, _ctx: &RequestContext) -> Result<()> {
            Err(Error::Supervisor("boom".to_string()))
        }
    }

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Middleware for Recorder {
        async fn before(&self, _ctx: &mut RequestContext) -> Result<()> {
            self.log.lock().await.push(format!("{}:before", self.label));
            Ok(())
        }

        async fn after(&self, _ctx: &RequestContext, _outcome: &Result<()>) -> Result<()> {
            self.log.lock().await.push(format!("{}:after", self.label));
            Ok(())
        }
    }

    #[tokio::test]
    async fn auth_middleware_marks_operators() {
        let mut ctx = ctx_for(Some(42), &[42]);
        AuthMiddleware.before(&mut ctx).await.unwrap();
        assert!(ctx.is_authorized);

        let mut ctx = ctx_for(Some(7), &[42]);
        AuthMiddleware.before(&mut ctx).await.unwrap();
        assert!(!ctx.is_authorized);
    }

    #[tokio::test]
    async fn missing_chat_is_unauthorized() {
        let mut ctx = ctx_for(None, &[42]);
        AuthMiddleware.before(&mut ctx).await.unwrap();
        assert!(!ctx.is_authorized);
    }

    #[tokio::test]
    async fn before_in_order_after_reversed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(Arc::new(NoopEndpoint))
            .with(Arc::new(Recorder {
                label: "a",
                log: log.clone(),
            }))
            .with(Arc::new(Recorder {
                label: "b",
                log: log.clone(),
            }));

        pipeline.handle(ctx_for(Some(1), &[])).await.unwrap();

        assert_eq!(
            *log.lock().await,
            vec!["a:before", "b:before", "b:after", "a:after"]
        );
    }

    #[tokio::test]
    async fn endpoint_error_propagates_after_hooks_still_run() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(Arc::new(FailingEndpoint)).with(Arc::new(Recorder {
            label: "a",
            log: log.clone(),
        }));

        let err = pipeline.handle(ctx_for(Some(1), &[])).await.unwrap_err();
        assert!(matches!(err, Error::Supervisor(_)));
        assert_eq!(*log.lock().await, vec!["a:before", "a:after"]);
    }

    #[tokio::test]
    async fn timing_middleware_stamps_context() {
        let mut ctx = ctx_for(Some(1), &[]);
        TimingMiddleware.before(&mut ctx).await.unwrap();
        assert!(ctx.received_at.is_some());
        TimingMiddleware.after(&ctx, &Ok(())).await.unwrap();
    }
}
