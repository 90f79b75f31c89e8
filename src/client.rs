//! Shared HTTP client construction.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

pub const USER_AGENT: &str = concat!("travel-assistant/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by all upstream integrations.
///
/// The client-wide timeout is an upper bound, integrations set a tighter
/// per-request timeout from their own config section.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .pool_idle_timeout(Some(Duration::from_secs(600)))
        .build()
        .context("Failed to create HTTP client")
}
