//! Top-level certificate lifecycle controller.

use axum::Router;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::acme::{self, challenge, AcmeClient, RenewalScheduler, SchedulerConfig, Thumbprint};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::tls::{CertificatePaths, TlsListenerManager};

/// Wires account registration, the challenge route, the TLS listener, and
/// the renewal loop together.
///
/// Construction is `start`: it registers the account (fatal on failure),
/// attempts an initial certificate load, and spawns the background loop.
pub struct CertLifecycle {
    router: Router,
    thumbprint: Thumbprint,
    run_tx: watch::Sender<bool>,
    scheduler: Option<JoinHandle<TlsListenerManager>>,
    listener: Option<TlsListenerManager>,
}

impl CertLifecycle {
    /// Start the certificate lifecycle for the configured domain.
    ///
    /// `app` is the embedder's application router; the challenge route is
    /// merged into it and the result serves on both the plaintext listener
    /// (embedder-owned, see [`CertLifecycle::router`]) and the HTTPS
    /// listener managed here.
    pub async fn start(config: &Config, app: Router) -> Result<Self> {
        info!("Preparing ACME for {}", config.acme.domain);

        let client = AcmeClient::new(&config.acme);
        let thumbprint = acme::register_account(&client, &config.acme.email).await?;

        let router = app.merge(challenge::router(thumbprint.clone()));

        let https_addr: SocketAddr = config
            .https
            .listen_addr
            .parse()
            .map_err(|_| Error::Config(format!("bad https.listen_addr: {}", config.https.listen_addr)))?;

        let paths =
            CertificatePaths::for_domain(&config.acme.account_dir_path(), &config.acme.domain);
        let mut listener = TlsListenerManager::new(
            https_addr,
            router.clone(),
            paths,
            Duration::from_secs(config.https.shutdown_grace_secs),
        );
        listener.try_load_certificate().await;

        let (run_tx, run_rx) = watch::channel(true);
        let scheduler = RenewalScheduler::new(
            client,
            config.acme.domain.clone(),
            listener,
            SchedulerConfig {
                startup_grace: Duration::from_secs(config.acme.startup_grace_secs),
                period: Duration::from_secs(config.acme.renew_interval_secs),
            },
            run_rx,
        )
        .spawn();

        Ok(Self {
            router,
            thumbprint,
            run_tx,
            scheduler: Some(scheduler),
            listener: None,
        })
    }

    /// Application router with the challenge route merged in, for the
    /// embedder's plaintext listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn thumbprint(&self) -> &Thumbprint {
        &self.thumbprint
    }

    /// Stop the renewal loop and wait for it to exit.
    ///
    /// Wakes the loop immediately rather than waiting out the period; a
    /// cycle already talking to the external client runs to completion
    /// first. Deliberately does NOT stop the HTTPS listener: certificates
    /// stop renewing, but established serving continues until
    /// [`CertLifecycle::shutdown_listener`] or process exit.
    pub async fn stop(&mut self) {
        let _ = self.run_tx.send(false);
        if let Some(task) = self.scheduler.take() {
            match task.await {
                Ok(listener) => self.listener = Some(listener),
                Err(e) => error!("Renewal loop task ended abnormally: {}", e),
            }
        }
    }

    /// Full teardown: stop the renewal loop, then gracefully stop the
    /// HTTPS listener as well.
    pub async fn shutdown_listener(&mut self) {
        if self.scheduler.is_some() {
            self.stop().await;
        }
        if let Some(mut listener) = self.listener.take() {
            listener.shutdown().await;
        }
    }
}
