//! HTTPS listener lifecycle: load certificate material, serve, and
//! hot-swap the listener when material changes.

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::certificate::{self, CertificatePaths};

/// Lifecycle state of the managed listener.
///
/// A serving task runs exactly once; a stopped listener is never restarted.
/// "Restart" always means constructing a fresh instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    NotStarted,
    Running,
    Stopped,
}

/// A single listener instance: the axum-server handle plus its serving task.
struct ListenerHandle {
    handle: Handle,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop accepting, drain in-flight requests up to `grace`, join the task.
    async fn shutdown(self, grace: Duration) {
        self.handle.graceful_shutdown(Some(grace));
        if let Err(e) = self.task.await {
            error!("HTTPS listener task ended abnormally: {}", e);
        }
    }
}

/// Owns the TLS context and the at-most-one HTTPS listener on the service
/// port.
///
/// Mutated only from the renewal scheduler's call chain; cycles are
/// sequential, so no two reloads ever overlap.
pub struct TlsListenerManager {
    addr: SocketAddr,
    app: Router,
    paths: CertificatePaths,
    shutdown_grace: Duration,
    listener: Option<ListenerHandle>,
    generation: u64,
}

impl TlsListenerManager {
    pub fn new(
        addr: SocketAddr,
        app: Router,
        paths: CertificatePaths,
        shutdown_grace: Duration,
    ) -> Self {
        Self {
            addr,
            app,
            paths,
            shutdown_grace,
            listener: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> ListenerState {
        match &self.listener {
            None => ListenerState::NotStarted,
            Some(l) if l.is_alive() => ListenerState::Running,
            Some(_) => ListenerState::Stopped,
        }
    }

    /// Number of listener instances started so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Address the current listener is bound to, once it is listening.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match &self.listener {
            Some(l) => l.handle.listening().await,
            None => None,
        }
    }

    /// Re-read certificate material from disk and (re)start the listener.
    pub async fn reload_and_serve(&mut self) {
        self.try_load_certificate().await;
    }

    /// Attempt to load the certificate/key pair and start serving.
    ///
    /// Absent or unreadable files are non-fatal: the certificate may simply
    /// not exist yet on first run, and the next successful renewal retries.
    pub async fn try_load_certificate(&mut self) {
        match certificate::load(&self.paths).await {
            Ok((config, loaded)) => {
                info!(
                    "Loaded certificate from {} (domains: {:?}, expires: {})",
                    self.paths.chain.display(),
                    loaded.domains,
                    loaded
                        .expires_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "unknown".to_string())
                );
                self.start_listener(config).await;
            }
            Err(e) if e.is_not_ready() => {
                warn!("No certificate file (yet): {}", e);
            }
            Err(e) => {
                warn!("Certificate material not loadable: {}", e);
            }
        }
    }

    /// Ensure exactly one live listener serving with `config`.
    ///
    /// Any prior instance is fully stopped and joined before the new one
    /// binds, so the port never carries two listeners; the gap is bounded
    /// by the stop-plus-start latency.
    async fn start_listener(&mut self, config: RustlsConfig) {
        if let Some(prev) = self.listener.take() {
            if prev.is_alive() {
                info!("Restarting HTTPS listener with fresh certificate");
                prev.shutdown(self.shutdown_grace).await;
            } else {
                warn!("Previous HTTPS listener had already exited, discarding it");
            }
        }

        let handle = Handle::new();
        let task = tokio::spawn(run_listener(
            self.addr,
            config,
            self.app.clone(),
            handle.clone(),
        ));

        self.generation += 1;
        self.listener = Some(ListenerHandle { handle, task });
    }

    /// Gracefully stop the listener if one is running.
    pub async fn shutdown(&mut self) {
        if let Some(l) = self.listener.take() {
            if l.is_alive() {
                info!("Stopping HTTPS listener");
                l.shutdown(self.shutdown_grace).await;
            }
        }
    }
}

/// Bind and serve HTTPS until shut down through the handle.
///
/// Ordinary traffic goes to the application router; the task ends when the
/// handle signals shutdown or the bind fails.
async fn run_listener(addr: SocketAddr, config: RustlsConfig, app: Router, handle: Handle) {
    info!("HTTPS listener starting on {}", addr);
    if let Err(e) = axum_server::bind_rustls(addr, config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
    {
        error!("HTTPS listener error: {}", e);
    }
    info!("HTTPS listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(dir: &std::path::Path) -> TlsListenerManager {
        TlsListenerManager::new(
            "127.0.0.1:0".parse().unwrap(),
            Router::new(),
            CertificatePaths::for_domain(dir, "example.com"),
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn missing_certificate_leaves_listener_unstarted() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(dir.path());

        mgr.try_load_certificate().await;

        assert_eq!(mgr.state(), ListenerState::NotStarted);
        assert_eq!(mgr.generation(), 0);
        assert!(mgr.local_addr().await.is_none());
    }

    #[tokio::test]
    async fn garbage_certificate_is_nonfatal() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("example.com");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(base.join("fullchain.cer"), "garbage").unwrap();
        std::fs::write(base.join("example.com.key"), "garbage").unwrap();

        let mut mgr = manager(dir.path());
        mgr.try_load_certificate().await;

        assert_eq!(mgr.state(), ListenerState::NotStarted);
    }
}
