//! Client supervisor: the outer reconnect loop
//!
//! Runs exactly one tunnel session at a time on its own task, joins
//! it, and after a fixed backoff starts the next attempt. Retries
//! forever with no attempt limit; only [`Supervisor::stop`] ends the
//! loop. Session failures are routine and never fatal to the process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::ClientConfig;
use crate::tunnel::session::TunnelSession;

/// Fixed pause between connection attempts.
pub const RETRY_INTERVAL: Duration = Duration::from_secs(5);

pub struct Supervisor {
    config: Arc<ClientConfig>,
    cancel: CancellationToken,
    retry_interval: Duration,
    attempts: AtomicU64,
}

impl Supervisor {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_retry_interval(config, RETRY_INTERVAL)
    }

    /// Same loop with a non-default backoff; tests shrink it to keep
    /// their timings short.
    pub fn with_retry_interval(config: ClientConfig, retry_interval: Duration) -> Self {
        Self {
            config: Arc::new(config),
            cancel: CancellationToken::new(),
            retry_interval,
            attempts: AtomicU64::new(0),
        }
    }

    /// Connection attempts started so far.
    #[allow(dead_code)]
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Run sessions until stopped. Sessions are strictly sequential:
    /// each spawned task is joined before the next one starts, so a
    /// stop() racing a fresh spawn still finds that session supervised
    /// and cancels it through the child token.
    pub async fn run(&self) {
        while !self.cancel.is_cancelled() {
            self.attempts.fetch_add(1, Ordering::Relaxed);
            info!(
                "begin to establish tunnel with transit server (forward_port={})",
                self.config.forward_port
            );

            let mut session = TunnelSession::new(self.config.clone(), self.cancel.child_token());
            let handle = tokio::spawn(async move { session.run().await });

            match handle.await {
                Ok(Ok(())) => debug!("tunnel session ended"),
                Ok(Err(err)) => {
                    info!("connect to transit server fails, will try to reestablish it ({err})")
                }
                Err(err) => error!("tunnel session task failed: {err}"),
            }

            if self.cancel.is_cancelled() {
                break;
            }
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = time::sleep(self.retry_interval) => {}
            }
        }
        debug!("supervisor loop exited");
    }

    /// Stop the loop: cancel the in-flight session, then wait out one
    /// retry interval so in-flight teardown completes. Afterwards no
    /// session task is running and no tunnel socket is open.
    pub async fn stop(&self) {
        self.cancel.cancel();
        time::sleep(self.retry_interval).await;
    }
}
