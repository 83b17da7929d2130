use std::sync::Arc;

use tracing::error;

use pmbot_core::{config::Config, ports::SupervisorPort, TransportErrorKind};
use pmbot_pm2::Pm2Client;

#[tokio::main]
async fn main() -> Result<(), pmbot_core::Error> {
    pmbot_core::logging::init("pmbot");

    let cfg = Arc::new(Config::load()?);

    let supervisor: Arc<dyn SupervisorPort> = Arc::new(Pm2Client::new(cfg.pm2_path.clone()));

    // The supervisor connection is established once; a failure here is
    // fatal and never retried.
    if let Err(e) = supervisor.connect().await {
        error!("pm2 connect error: {e}");
        std::process::exit(1);
    }

    pmbot_telegram::router::run_polling(cfg, supervisor)
        .await
        .map_err(|e| pmbot_core::Error::Transport {
            kind: TransportErrorKind::Other,
            message: format!("telegram bot failed: {e}"),
        })?;

    Ok(())
}
