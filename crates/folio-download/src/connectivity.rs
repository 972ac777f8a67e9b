//! Connectivity monitor.
//!
//! Wraps a single network call in a health-check gated retry loop. A
//! recoverable failure parks the caller until a shared probe task sees the
//! health endpoint answer 2xx again; every other failure is returned as is.
//!
//! Only one probe runs at a time, however many callers are waiting. The
//! probe backs off between checks and gives up after `max_retries` failed
//! checks when the policy sets a bound.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use folio_core::{BackoffPolicy, ConnectivityError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::http::HttpBackend;

/// Shared view of the network as seen by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reachability {
    pub reachable: bool,
    /// Failed health checks since the probe started.
    pub failed_checks: u32,
    /// The probe gave up.
    pub exhausted: bool,
}

impl Reachability {
    const ONLINE: Self = Self {
        reachable: true,
        failed_checks: 0,
        exhausted: false,
    };

    const PROBING: Self = Self {
        reachable: false,
        failed_checks: 0,
        exhausted: false,
    };
}

pub struct ConnectivityMonitor {
    backend: Arc<dyn HttpBackend>,
    health_url: String,
    policy: BackoffPolicy,
    probing: AtomicBool,
    state: watch::Sender<Reachability>,
}

impl ConnectivityMonitor {
    pub fn new(
        backend: Arc<dyn HttpBackend>,
        health_url: impl Into<String>,
        policy: BackoffPolicy,
    ) -> Self {
        let (state, _) = watch::channel(Reachability::ONLINE);
        Self {
            backend,
            health_url: health_url.into(),
            policy,
            probing: AtomicBool::new(false),
            state,
        }
    }

    pub const fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Current reachability as last seen by the probe.
    pub fn reachability(&self) -> Reachability {
        *self.state.borrow()
    }

    /// GET the health endpoint. True only on 2xx; errors mean offline.
    pub async fn check_connectivity(&self) -> bool {
        match self.backend.get(&self.health_url).await {
            Ok(response) => {
                debug!(target: "folio.connectivity", status = response.status, "health check answered");
                response.is_success()
            }
            Err(e) => {
                debug!(target: "folio.connectivity", error = %e, "health check failed");
                false
            }
        }
    }

    /// Run `block`, retrying it after connectivity returns whenever it fails
    /// with a recoverable error. `on_retry` runs before each wait.
    pub async fn retry_on_connectivity_failure<T, F, Fut, N>(
        self: &Arc<Self>,
        mut on_retry: N,
        mut block: F,
    ) -> Result<T, ConnectivityError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ConnectivityError>>,
        N: FnMut(),
    {
        loop {
            match block().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_recoverable() => {
                    debug!(target: "folio.connectivity", error = %e, "recoverable failure, waiting for connection");
                    on_retry();
                    self.wait_for_connection().await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Park until the probe sees the network again.
    pub async fn wait_for_connection(self: &Arc<Self>) -> Result<(), ConnectivityError> {
        if self
            .probing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.state.send_replace(Reachability::PROBING);
            let monitor = Arc::clone(self);
            tokio::spawn(async move { monitor.probe().await });
        }

        let mut rx = self.state.subscribe();
        let state = match rx.wait_for(|s| s.reachable || s.exhausted).await {
            Ok(state) => *state,
            Err(_) => return Err(ConnectivityError::unrecoverable("connectivity monitor stopped")),
        };

        if state.reachable {
            Ok(())
        } else {
            Err(ConnectivityError::RetriesExhausted {
                attempts: state.failed_checks,
            })
        }
    }

    async fn probe(&self) {
        let mut attempt = 0;
        loop {
            tokio::time::sleep(self.policy.delay_for(attempt)).await;
            if self.check_connectivity().await {
                info!(target: "folio.connectivity", failed_checks = attempt, "connection restored");
                self.state.send_replace(Reachability::ONLINE);
                break;
            }

            attempt += 1;
            self.state.send_modify(|s| s.failed_checks = attempt);
            if !self.policy.allows(attempt) {
                warn!(target: "folio.connectivity", attempts = attempt, "giving up waiting for connection");
                self.state.send_modify(|s| s.exhausted = true);
                break;
            }
        }
        self.probing.store(false, Ordering::SeqCst);
    }
}
