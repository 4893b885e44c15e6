//! Interpretation of acme.sh renewal output.
//!
//! acme.sh communicates outcomes through free-text markers and exit codes.
//! The marker matching is confined to this module; everything downstream
//! deals only with [`RenewalOutcome`].

use crate::error::{Error, Result};

/// Renew exits non-zero with this marker when the certificate is not yet
/// due; the line also carries the next renewal timestamp.
const SKIP_MARKER: &str = "Skip, Next renewal time is";
const NEXT_RENEWAL_PREFIX: &str = "renewal time is: ";
/// Renew succeeds with this marker when the domain was never issued.
const NOT_ISSUED_MARKER: &str = "not a issued domain";

/// Interpreted result of one renewal cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewalOutcome {
    /// Renewal skipped; the current certificate is still valid.
    UpToDate { next_renewal: Option<String> },
    /// The domain has no issued certificate yet; stateless issuance is
    /// required. Never escapes the scheduler cycle.
    NotIssued,
    /// A renewal wrote fresh certificate material.
    Renewed,
    /// First-time stateless issuance wrote fresh certificate material.
    Issued,
}

impl RenewalOutcome {
    /// Whether the TLS listener must reload certificate material.
    pub fn requires_reload(&self) -> bool {
        matches!(self, RenewalOutcome::Renewed | RenewalOutcome::Issued)
    }
}

/// Map the result of a `--renew` invocation onto an outcome.
///
/// A failed command whose output carries the skip marker is the benign
/// "not yet due" case; any other failure propagates to the caller.
pub fn interpret_renewal(result: Result<String>) -> Result<RenewalOutcome> {
    match result {
        Ok(output) if output.contains(NOT_ISSUED_MARKER) => Ok(RenewalOutcome::NotIssued),
        // TODO: distinguish an actual renewal from other success output once
        // acme.sh exposes a stable marker for it.
        Ok(_) => Ok(RenewalOutcome::Renewed),
        Err(Error::Exec { ref output, .. }) if output.contains(SKIP_MARKER) => {
            Ok(RenewalOutcome::UpToDate {
                next_renewal: extract_next_renewal(output),
            })
        }
        Err(e) => Err(e),
    }
}

fn extract_next_renewal(output: &str) -> Option<String> {
    output
        .split(NEXT_RENEWAL_PREFIX)
        .nth(1)
        .map(|rest| rest.lines().next().unwrap_or(rest).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec_failure(output: &str) -> Error {
        Error::Exec {
            command: "acme.sh --renew -d example.com".to_string(),
            code: 2,
            output: output.to_string(),
        }
    }

    #[test]
    fn skip_marker_means_up_to_date() {
        let result = interpret_renewal(Err(exec_failure(
            "Skip, Next renewal time is: 2024-01-01 00:00:00\n",
        )));
        match result.unwrap() {
            RenewalOutcome::UpToDate { next_renewal } => {
                assert_eq!(next_renewal.as_deref(), Some("2024-01-01 00:00:00"));
            }
            other => panic!("expected UpToDate, got {:?}", other),
        }
    }

    #[test]
    fn skip_marker_without_timestamp_still_up_to_date() {
        let result = interpret_renewal(Err(exec_failure("Skip, Next renewal time is")));
        assert_eq!(
            result.unwrap(),
            RenewalOutcome::UpToDate { next_renewal: None }
        );
    }

    #[test]
    fn not_issued_marker_in_success_output() {
        let result = interpret_renewal(Ok("example.com is not a issued domain\n".to_string()));
        assert_eq!(result.unwrap(), RenewalOutcome::NotIssued);
    }

    #[test]
    fn plain_success_means_renewed() {
        let result = interpret_renewal(Ok("Cert success.\n".to_string()));
        assert_eq!(result.unwrap(), RenewalOutcome::Renewed);
    }

    #[test]
    fn other_failures_propagate() {
        let result = interpret_renewal(Err(exec_failure("Verify error: connection refused")));
        assert!(matches!(result, Err(Error::Exec { code: 2, .. })));
    }

    #[test]
    fn up_to_date_requires_no_reload() {
        assert!(!RenewalOutcome::UpToDate { next_renewal: None }.requires_reload());
        assert!(RenewalOutcome::Renewed.requires_reload());
        assert!(RenewalOutcome::Issued.requires_reload());
        assert!(!RenewalOutcome::NotIssued.requires_reload());
    }
}
