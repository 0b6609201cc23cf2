//! HTTP client for the controller's I2C query interface

use std::time::Duration;

use async_trait::async_trait;

use crate::config::DeviceConfig;
use crate::error::ReadError;

/// Transport seam for sensor reads. The poller only sees this trait, so
/// tests can script responses without a live controller.
#[async_trait]
pub trait SensorTransport: Send + Sync {
    /// Fetch one raw reading from the bus. The body is trimmed but otherwise
    /// uninterpreted; transport failures come back as
    /// [`ReadError::Transport`].
    async fn read(&self, device: &str, param: Option<&str>) -> Result<String, ReadError>;
}

/// reqwest-backed transport talking to one controller port
pub struct MegaDClient {
    client: reqwest::Client,
    base_url: String,
    port: u16,
    scl: u8,
}

impl MegaDClient {
    pub fn new(config: &DeviceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(3))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: format!("http://{}/{}", config.host, config.password),
            port: config.port,
            scl: config.scl,
        }
    }

    /// Build the device query URL. The controller expects its own
    /// query-string dialect, password as a path segment included.
    fn query_url(&self, device: &str, param: Option<&str>) -> String {
        let mut url = format!(
            "{}/?pt={}&scl={}&i2c_dev={}",
            self.base_url, self.port, self.scl, device
        );
        if let Some(param) = param {
            url.push_str("&i2c_par=");
            url.push_str(param);
        }
        url
    }
}

#[async_trait]
impl SensorTransport for MegaDClient {
    async fn read(&self, device: &str, param: Option<&str>) -> Result<String, ReadError> {
        let url = self.query_url(device, param);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ReadError::Transport("timeout".to_string())
            } else if e.is_connect() {
                ReadError::Transport("connection_failed".to_string())
            } else {
                ReadError::Transport(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(ReadError::Transport(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ReadError::Transport(format!("Failed to read response: {}", e)))?;

        Ok(body.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> MegaDClient {
        MegaDClient::new(&DeviceConfig {
            host: "192.168.0.14".to_string(),
            password: "sec".to_string(),
            port: 30,
            scl: 2,
            timeout_secs: 10,
        })
    }

    #[test]
    fn builds_plain_query_url() {
        let client = test_client();
        assert_eq!(
            client.query_url("max44009", None),
            "http://192.168.0.14/sec/?pt=30&scl=2&i2c_dev=max44009"
        );
    }

    #[test]
    fn builds_query_url_with_sub_parameter() {
        let client = test_client();
        assert_eq!(
            client.query_url("htu21d", Some("1")),
            "http://192.168.0.14/sec/?pt=30&scl=2&i2c_dev=htu21d&i2c_par=1"
        );
    }
}
