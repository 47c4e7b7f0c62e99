//! Ctrl+C driven shutdown
//!
//! Cancelling the root token stops the accept loops of every front-end that
//! runs under one of its child tokens. Sessions that are already open are not
//! cancelled and get the configured grace period to finish.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Root shutdown token, cancelled on Ctrl+C.
///
/// # Example
///
/// ```ignore
/// let shutdown = ShutdownController::with_ctrl_c();
/// simulator.run(shutdown.token()).await?;
/// ```
#[derive(Clone)]
pub struct ShutdownController {
    token: CancellationToken,
}

impl ShutdownController {
    /// Must be called from within a tokio runtime.
    pub fn with_ctrl_c() -> Self {
        let token = CancellationToken::new();
        let on_signal = token.clone();

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, stopping simulator...");
                    on_signal.cancel();
                }
                Err(e) => {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                }
            }
        });

        Self { token }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}
