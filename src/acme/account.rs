//! ACME account registration and thumbprint extraction.

use regex::Regex;
use std::fmt;
use tracing::debug;

use super::client::AcmeClient;
use crate::error::{Error, Result};

/// The account's key-authorization thumbprint, obtained once at startup and
/// immutable for the process lifetime. Challenge responses are computed
/// against it, so it must belong to the account used for the most recent
/// successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbprint(String);

impl Thumbprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
impl From<&str> for Thumbprint {
    fn from(s: &str) -> Self {
        Thumbprint(s.to_string())
    }
}

/// Ensure an ACME account exists for `email` and return its thumbprint.
///
/// Any failure here is fatal to startup; the lifecycle controller refuses
/// to run half-initialized.
pub async fn register_account(client: &AcmeClient, email: &str) -> Result<Thumbprint> {
    let output = client
        .register_account(email)
        .await
        .map_err(|e| Error::Registration {
            reason: "register-account command failed".to_string(),
            source: Some(Box::new(e)),
        })?;

    debug!("register account output: {}", output.trim());

    extract_thumbprint(&output).ok_or_else(|| Error::Registration {
        reason: format!("no thumbprint found in output: {}", output.trim()),
        source: None,
    })
}

/// First `ACCOUNT_THUMBPRINT='...'` token in acme.sh output, if any.
fn extract_thumbprint(output: &str) -> Option<Thumbprint> {
    let re = Regex::new(r"ACCOUNT_THUMBPRINT='([^']+)'").expect("thumbprint pattern");
    re.captures(output)
        .map(|caps| Thumbprint(caps[1].to_string()))
}
