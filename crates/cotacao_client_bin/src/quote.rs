use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info};
use quote_model::BidResponse;

use crate::error::ClientError;

pub struct Config {
    pub server_url: String,
    pub output_path: PathBuf,
    pub timeout: Duration,
}

/// Fetches the current bid from the quote server. The whole exchange,
/// body included, has to finish within `timeout`.
pub fn fetch_bid(
    client: &reqwest::blocking::Client,
    url: &str,
    timeout: Duration,
) -> Result<String, ClientError> {
    let started = Instant::now();
    debug!("fetch_bid | url: {} | timeout: {:?}", url, timeout);

    let res = client
        .get(url)
        .timeout(timeout)
        .send()
        .map_err(|e| ClientError::from_reqwest(e, timeout))?;
    if !res.status().is_success() {
        return Err(ClientError::Status(res.status()));
    }
    let body = res
        .text()
        .map_err(|e| ClientError::from_reqwest(e, timeout))?;

    if started.elapsed() > timeout {
        return Err(ClientError::Timeout(timeout));
    }

    let response: BidResponse = serde_json::from_str(&body)?;
    Ok(response.bid)
}

pub fn write_quote(path: &Path, bid: &str) -> io::Result<()> {
    fs::write(path, format!("Dólar: {}", bid))
}

pub fn run(config: &Config) -> Result<String, ClientError> {
    let client = reqwest::blocking::Client::builder()
        .no_proxy()
        .build()
        .map_err(ClientError::Transport)?;

    let bid = fetch_bid(&client, &config.server_url, config.timeout)?;
    write_quote(&config.output_path, &bid)?;
    info!(
        "Quote saved to {} | bid: {}",
        config.output_path.display(),
        bid
    );
    Ok(bid)
}
