use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const AGENT: &str = concat!("cps_analyst/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    http_client_with_timeout(DEFAULT_TIMEOUT_SECS)
}

/// The first caller fixes the timeout for the life of the process.
pub fn http_client_with_timeout(timeout_secs: u64) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .user_agent(AGENT)
            .build()
            .context("failed to build http client")
    })
}
