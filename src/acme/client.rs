//! Invocation surface of the external acme.sh client.
//!
//! All command construction lives here. The staging flag is part of this
//! immutable value and is applied to every invocation; nothing downstream
//! ever edits an argument list.

use std::path::PathBuf;

use crate::config::AcmeConfig;
use crate::error::Result;
use crate::shell;

/// Handle on the external ACME client executable.
#[derive(Debug, Clone)]
pub struct AcmeClient {
    client_path: PathBuf,
    staging: bool,
}

impl AcmeClient {
    pub fn new(config: &AcmeConfig) -> Self {
        Self {
            client_path: PathBuf::from(&config.client_path),
            staging: config.staging,
        }
    }

    /// Register (or confirm) the ACME account for `email`.
    ///
    /// Safe to repeat; acme.sh treats re-registration of an existing
    /// account as a no-op and prints the same thumbprint line.
    pub async fn register_account(&self, email: &str) -> Result<String> {
        self.invoke(&["--register-account", "--accountemail", email])
            .await
    }

    /// Renew the certificate for `domain` if it is due.
    pub async fn renew(&self, domain: &str) -> Result<String> {
        self.invoke(&["--renew", "-d", domain]).await
    }

    /// First-time issuance in stateless HTTP-01 mode.
    pub async fn issue_stateless(&self, domain: &str) -> Result<String> {
        self.invoke(&["--issue", "--stateless", "-d", domain]).await
    }

    async fn invoke(&self, args: &[&str]) -> Result<String> {
        shell::run(&self.client_path, &self.build_args(args)).await
    }

    fn build_args(&self, args: &[&str]) -> Vec<String> {
        let mut argv: Vec<String> = Vec::with_capacity(args.len() + 1);
        if self.staging {
            argv.push("--staging".to_string());
        }
        argv.extend(args.iter().map(|s| s.to_string()));
        argv
    }
}
