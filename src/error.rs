//! Error taxonomy for driving the external ACME client.

use thiserror::Error;

/// Errors produced by the ACME client surface and the lifecycle wiring.
///
/// Certificate load failures are deliberately not part of this enum: a
/// missing certificate is an expected condition handled next to the TLS
/// listener (see `tls::certificate::LoadError`).
#[derive(Debug, Error)]
pub enum Error {
    /// External command exited non-zero. Some exit patterns are benign
    /// ("not yet due for renewal") and are interpreted by the caller.
    #[error("`{command}` exited with code {code}: {output}")]
    Exec {
        command: String,
        /// -1 when the process was terminated by a signal.
        code: i32,
        /// Combined stdout and stderr of the failed command.
        output: String,
    },

    /// External command could not be spawned at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Account registration failed or produced unparseable output.
    /// Fatal at startup: no certificate lifecycle can run without the
    /// account thumbprint.
    #[error("account registration failed: {reason}")]
    Registration {
        reason: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// Configuration value could not be used (bad listen address etc.).
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
