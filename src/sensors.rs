/*
 *  sensors.rs
 *
 *  wxpanel - minute-true weather panel
 *	(c) 2020-26 Stuart Hunter
 *
 *	Room climate readings: temperature over a line protocol, CO2 over HTTP
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, header};
use serde::Deserialize;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::SensorConfig;

static TEMPERATURE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)°C.*").expect("static regex"));

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sensor did not answer within {0:?}")]
    Timeout(Duration),
    #[error("malformed sensor response: {0}")]
    Malformed(String),
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sensor returned status {0}")]
    Status(u16),
}

pub trait TemperatureSource {
    /// Current reading in °C.
    fn read_celsius(&self) -> impl Future<Output = Result<f64, SensorError>>;
}

pub trait Co2Source {
    /// Current reading in ppm; None when the sensor answers without one.
    fn read_ppm(&self) -> impl Future<Output = Result<Option<i64>, SensorError>>;
}

/// First line must look like `<number>°C...`.
pub fn parse_temperature(text: &str) -> Result<f64, SensorError> {
    let line = text.lines().next().unwrap_or_default();
    let caps = TEMPERATURE_LINE
        .captures(line)
        .ok_or_else(|| SensorError::Malformed(line.to_string()))?;
    caps[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| SensorError::Malformed(line.to_string()))
}

#[derive(Debug, Deserialize)]
struct Co2Reading {
    co2: Option<i64>,
}

pub fn parse_co2(body: &str) -> Result<Option<i64>, SensorError> {
    let reading: Co2Reading =
        serde_json::from_str(body).map_err(|e| SensorError::Malformed(e.to_string()))?;
    Ok(reading.co2)
}

/// Temperature service that writes one reading and closes the connection.
#[derive(Debug, Clone)]
pub struct LineTemperatureSource {
    host: String,
    port: u16,
    timeout: Duration,
}

impl LineTemperatureSource {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            host: config.temperature_host.clone(),
            port: config.temperature_port,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    async fn read_all(&self) -> Result<String, SensorError> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        let mut text = String::new();
        stream.read_to_string(&mut text).await?;
        Ok(text)
    }
}

impl TemperatureSource for LineTemperatureSource {
    async fn read_celsius(&self) -> Result<f64, SensorError> {
        let text = timeout(self.timeout, self.read_all())
            .await
            .map_err(|_| SensorError::Timeout(self.timeout))??;
        parse_temperature(&text)
    }
}

/// CO2 service answering `{"co2": <ppm>}`.
#[derive(Debug)]
pub struct HttpCo2Source {
    client: Client,
    url: String,
}

impl HttpCo2Source {
    pub fn new(config: &SensorConfig) -> Result<Self, SensorError> {
        let mut headers = header::HeaderMap::new();
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));
        headers.insert("Connection", header::HeaderValue::from_static("close"));

        let timeout = Duration::from_millis(config.timeout_ms);
        let client = Client::builder()
            .connect_timeout(timeout)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, url: config.co2_url.clone() })
    }
}

impl Co2Source for HttpCo2Source {
    async fn read_ppm(&self) -> Result<Option<i64>, SensorError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if status.as_u16() != 200 {
            return Err(SensorError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        parse_co2(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_parse_temperature_line() {
        assert_eq!(parse_temperature("21.4°C\n").unwrap(), 21.4);
        assert_eq!(parse_temperature("-3.0°C (outside)\nsecond line").unwrap(), -3.0);
        assert_eq!(parse_temperature(" 7 °C").unwrap(), 7.0);
    }

    #[test]
    fn test_parse_temperature_malformed() {
        assert!(matches!(parse_temperature("21.4 F"), Err(SensorError::Malformed(_))));
        assert!(matches!(parse_temperature("warm°C"), Err(SensorError::Malformed(_))));
        assert!(matches!(parse_temperature(""), Err(SensorError::Malformed(_))));
    }

    #[test]
    fn test_parse_co2() {
        assert_eq!(parse_co2(r#"{"co2": 812}"#).unwrap(), Some(812));
        assert_eq!(parse_co2(r#"{"humidity": 40}"#).unwrap(), None);
        assert!(parse_co2("<html>").is_err());
    }

    #[tokio::test]
    async fn test_line_source_reads_from_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all("19.5°C 40%\n".as_bytes()).await.unwrap();
        });

        let config = SensorConfig {
            temperature_host: "127.0.0.1".to_string(),
            temperature_port: port,
            ..SensorConfig::default()
        };
        let source = LineTemperatureSource::new(&config);
        assert_eq!(source.read_celsius().await.unwrap(), 19.5);
    }

    #[tokio::test]
    async fn test_line_source_connection_refused() {
        // bind then drop to get a port nobody listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = SensorConfig {
            temperature_host: "127.0.0.1".to_string(),
            temperature_port: port,
            ..SensorConfig::default()
        };
        let source = LineTemperatureSource::new(&config);
        assert!(source.read_celsius().await.is_err());
    }
}
