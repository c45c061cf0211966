//! Process supervisor for long-running services.
//!
//! App processes run concurrently until one of them fails, all of them finish,
//! or SIGINT/SIGTERM arrives. Closers then run once, bounded by a timeout.
//!
//! ```no_run
//! use lorawan_tracker_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Runner::new()
//!         .with_app_process(|ctx| async move {
//!             ctx.cancelled().await;
//!             Ok(())
//!         })
//!         .with_closer(|| async move { Ok(()) })
//!         .with_closer_timeout(Duration::from_secs(5))
//!         .run()
//!         .await
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type BoxFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

pub type AppProcess = Box<dyn FnOnce(CancellationToken) -> BoxFuture + Send>;

pub type Closer = Box<dyn FnOnce() -> BoxFuture + Send>;

pub const DEFAULT_CLOSER_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Runner {
    app_processes: Vec<AppProcess>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            app_processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: DEFAULT_CLOSER_TIMEOUT,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Add a process. An error from any process cancels all the others.
    pub fn with_app_process<F, Fut>(mut self, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.app_processes
            .push(Box::new(|token| Box::pin(process(token))));
        self
    }

    /// Add a cleanup step. Closers run concurrently after every process has
    /// stopped, whatever the reason.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Use an externally owned token, e.g. to stop the runner from a test
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Run until every process has stopped, then run the closers.
    ///
    /// Returns the first process error, if any.
    pub async fn run(self) -> anyhow::Result<()> {
        let token = self.cancellation_token;
        let mut join_set = JoinSet::new();

        for process in self.app_processes {
            join_set.spawn(process(token.clone()));
        }

        let signal_task = tokio::spawn({
            let token = token.clone();
            async move {
                tokio::select! {
                    _ = shutdown_signal() => {
                        info!("received shutdown signal");
                        token.cancel();
                    }
                    _ = token.cancelled() => {}
                }
            }
        });

        let mut first_error = None;
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(Ok(())) => debug!("app process completed"),
                Ok(Err(err)) => {
                    if first_error.is_none() && !token.is_cancelled() {
                        error!(error = ?err, "app process failed");
                        first_error = Some(err);
                    } else {
                        warn!(error = ?err, "app process failed during shutdown");
                    }
                    token.cancel();
                }
                Err(err) => {
                    error!(error = %err, "app process panicked");
                    if first_error.is_none() {
                        first_error = Some(anyhow::anyhow!("app process panicked: {}", err));
                    }
                    token.cancel();
                }
            }
        }

        token.cancel();
        let _ = signal_task.await;

        run_closers(self.closers, self.closer_timeout).await;

        match first_error {
            Some(err) => Err(err),
            None => {
                info!("all app processes stopped");
                Ok(())
            }
        }
    }
}

async fn run_closers(closers: Vec<Closer>, timeout: Duration) {
    if closers.is_empty() {
        return;
    }

    info!(timeout_ms = timeout.as_millis() as u64, "running closers");

    let mut closer_set = JoinSet::new();
    for closer in closers {
        closer_set.spawn(closer());
    }

    let drain = async {
        while let Some(result) = closer_set.join_next().await {
            match result {
                Ok(Ok(())) => debug!("closer completed"),
                Ok(Err(err)) => error!(error = ?err, "closer failed"),
                Err(err) => error!(error = %err, "closer panicked"),
            }
        }
    };

    if tokio::time::timeout(timeout, drain).await.is_err() {
        error!(timeout_ms = timeout.as_millis() as u64, "closers timed out");
        closer_set.abort_all();
    }
}

/// Resolves on ctrl-c, or on SIGTERM where available
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
