use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use quote_model::ExchangeRate;

use crate::error::{ApiError, ApiResult};

const AWESOME_BASE_API_URL: &str = "https://economia.awesomeapi.com.br";
const DEFAULT_PAIR: &str = "USD-BRL";

/// Anything able to produce the latest exchange rate within a deadline.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn get_rate(&self, timeout: Duration) -> ApiResult<ExchangeRate>;
}

#[derive(Clone)]
pub struct AwesomeAPI {
    base_url: String,
    pair: String,
    client: reqwest::Client,
}

impl AwesomeAPI {
    pub fn new() -> Self {
        return AwesomeAPI {
            base_url: AWESOME_BASE_API_URL.to_string(),
            pair: DEFAULT_PAIR.to_string(),
            client: reqwest::Client::new(),
        };
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_pair(mut self, pair: impl Into<String>) -> Self {
        self.pair = pair.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn url(&self) -> String {
        format!("{}/json/last/{}", self.base_url, self.pair)
    }

    // The payload is keyed by the pair without its dash, e.g. "USDBRL".
    fn payload_key(&self) -> String {
        self.pair.replace('-', "")
    }

    fn parse_rate(&self, body: &str) -> ApiResult<ExchangeRate> {
        let mut rates: HashMap<String, ExchangeRate> = serde_json::from_str(body)?;
        let key = self.payload_key();
        rates.remove(&key).ok_or(ApiError::MissingPair(key))
    }
}

impl Default for AwesomeAPI {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateSource for AwesomeAPI {
    async fn get_rate(&self, timeout: Duration) -> ApiResult<ExchangeRate> {
        let url = self.url();

        debug!("get_rate | url: {} | timeout: {:?}", url, timeout);

        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))?;

        let rate = self.parse_rate(&body)?;
        debug!("get_rate | bid: {}", rate.bid);

        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const USDBRL_BODY: &str = r#"{"USDBRL":{"code":"USD","codein":"BRL","name":"Dólar Americano/Real Brasileiro","high":"5.2961","low":"5.2412","varBid":"0.0213","pctChange":"0.41","bid":"5.2854","ask":"5.2864","timestamp":"1718733599","create_date":"2024-06-18 14:59:59"}}"#;

    fn serve_once(status: &'static str, body: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                thread::sleep(delay);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}", addr)
    }

    fn local_api(base_url: String) -> AwesomeAPI {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        AwesomeAPI::new().with_base_url(base_url).with_client(client)
    }

    #[test]
    fn url_pass_default_pair() {
        let api = AwesomeAPI::new();
        assert_eq!(
            api.url(),
            "https://economia.awesomeapi.com.br/json/last/USD-BRL"
        );
        assert_eq!(api.payload_key(), "USDBRL");
    }

    #[test]
    fn url_pass_custom_pair() {
        let api = AwesomeAPI::new().with_pair("EUR-BRL");
        assert!(api.url().ends_with("/json/last/EUR-BRL"));
        assert_eq!(api.payload_key(), "EURBRL");
    }

    #[tokio::test]
    async fn get_rate_pass_returns_bid() {
        let api = local_api(serve_once("200 OK", USDBRL_BODY, Duration::ZERO));
        let rate = api.get_rate(Duration::from_secs(2)).await.unwrap();
        assert_eq!(rate.bid, "5.2854");
        assert_eq!(rate.code, "USD");
        assert_eq!(rate.codein, "BRL");
    }

    #[tokio::test]
    async fn get_rate_fail_timeout() {
        let api = local_api(serve_once(
            "200 OK",
            USDBRL_BODY,
            Duration::from_millis(1000),
        ));
        let err = api.get_rate(Duration::from_millis(200)).await.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {:?}", err);
        assert!(!err.is_parse());
    }

    #[tokio::test]
    async fn get_rate_fail_malformed_json() {
        let api = local_api(serve_once("200 OK", "{not json", Duration::ZERO));
        let err = api.get_rate(Duration::from_secs(2)).await.unwrap_err();
        assert!(err.is_parse(), "expected parse error, got {:?}", err);
        assert!(!err.is_timeout());
    }

    #[tokio::test]
    async fn get_rate_fail_missing_pair() {
        let api = local_api(serve_once("200 OK", USDBRL_BODY, Duration::ZERO)).with_pair("EUR-BRL");
        let err = api.get_rate(Duration::from_secs(2)).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingPair(ref key) if key == "EURBRL"));
        assert!(err.is_parse());
    }

    #[tokio::test]
    async fn get_rate_fail_upstream_status() {
        let api = local_api(serve_once(
            "404 Not Found",
            r#"{"status":404,"code":"CoinNotExists"}"#,
            Duration::ZERO,
        ));
        let err = api.get_rate(Duration::from_secs(2)).await.unwrap_err();
        assert!(matches!(err, ApiError::Status(s) if s.as_u16() == 404));
    }
}
