//! Background renewal loop.
//!
//! One cycle per period: renew, interpret the client's output, fall back to
//! stateless issuance for a never-issued domain, and reload the TLS
//! listener when fresh material was written. The inter-cycle sleep is a
//! cancellation-aware timed wait, so `stop` wakes the loop immediately
//! instead of waiting out the period.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::client::AcmeClient;
use super::outcome::{self, RenewalOutcome};
use crate::error::Result;
use crate::tls::listener::TlsListenerManager;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Delay before the first cycle, letting the companion HTTP layer bind.
    pub startup_grace: Duration,
    /// Upper bound on the inter-cycle sleep.
    pub period: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            startup_grace: Duration::from_secs(3),
            period: Duration::from_secs(60 * 60),
        }
    }
}

/// Drives periodic issuance/renewal and owns the TLS listener manager.
///
/// The listener manager is mutated only from this task's call chain; cycles
/// are strictly sequential, so reloads never overlap.
pub struct RenewalScheduler {
    client: AcmeClient,
    domain: String,
    listener: TlsListenerManager,
    config: SchedulerConfig,
    run_rx: watch::Receiver<bool>,
}

impl RenewalScheduler {
    pub fn new(
        client: AcmeClient,
        domain: String,
        listener: TlsListenerManager,
        config: SchedulerConfig,
        run_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            domain,
            listener,
            config,
            run_rx,
        }
    }

    /// Spawn the loop on a background task. The listener manager is handed
    /// back when the loop exits so the controller can tear it down.
    pub fn spawn(self) -> JoinHandle<TlsListenerManager> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) -> TlsListenerManager {
        if self.wait(self.config.startup_grace).await {
            loop {
                match self.run_cycle().await {
                    Ok(RenewalOutcome::UpToDate { next_renewal }) => {
                        info!(
                            "Certificate for {} is up to date, next renewal: {}",
                            self.domain,
                            next_renewal.as_deref().unwrap_or("unknown")
                        );
                    }
                    Ok(outcome) if outcome.requires_reload() => {
                        info!(
                            "Certificate for {} changed ({:?}), reloading listener",
                            self.domain, outcome
                        );
                        self.listener.reload_and_serve().await;
                    }
                    Ok(outcome) => {
                        error!("Renewal cycle ended in unexpected state: {:?}", outcome);
                    }
                    Err(e) => {
                        error!("Renewal cycle for {} failed: {}", self.domain, e);
                    }
                }

                if !self.wait(self.config.period).await {
                    break;
                }
            }
        }
        info!("Renewal loop for {} stopped", self.domain);
        self.listener
    }

    /// One renew/issue exchange with the external client.
    ///
    /// Does not touch the listener; the caller reloads based on the
    /// returned outcome. An in-flight command is never cancelled, so a stop
    /// request during a cycle takes effect at the next wait.
    pub async fn run_cycle(&mut self) -> Result<RenewalOutcome> {
        let outcome = outcome::interpret_renewal(self.client.renew(&self.domain).await)?;

        if outcome == RenewalOutcome::NotIssued {
            info!(
                "{} has no issued certificate yet, requesting stateless issuance",
                self.domain
            );
            let output = self.client.issue_stateless(&self.domain).await?;
            info!("Issued certificate: {}", output.trim());
            return Ok(RenewalOutcome::Issued);
        }

        Ok(outcome)
    }

    /// Sleep up to `period` or until the run flag flips; returns whether
    /// the loop should continue. A dropped controller counts as stop.
    async fn wait(&mut self, period: Duration) -> bool {
        match tokio::time::timeout(period, self.run_rx.changed()).await {
            Ok(Err(_)) => false,
            _ => *self.run_rx.borrow(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_renewal_policy() {
        let config = SchedulerConfig::default();
        assert_eq!(config.period, Duration::from_secs(3600));
        assert_eq!(config.startup_grace, Duration::from_secs(3));
    }
}
