// ACME account, challenge, and renewal orchestration against the external client

pub mod account;
pub mod challenge;
pub mod client;
pub mod outcome;
pub mod scheduler;

pub use account::{register_account, Thumbprint};
pub use client::AcmeClient;
pub use outcome::RenewalOutcome;
pub use scheduler::{RenewalScheduler, SchedulerConfig};
