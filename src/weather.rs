/*
 *  weather.rs
 *
 *  wxpanel - minute-true weather panel
 *	(c) 2020-26 Stuart Hunter
 *
 *	Hourly forecast points and the Dark Sky compatible provider
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
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info};
use reqwest::{Client, header};
use serde::Deserialize;
use thiserror::Error;

use crate::config::{ForecastConfig, LocationConfig};

/// One hourly observation/forecast sample.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    /// °C
    pub temperature: f64,
    /// °C
    pub dew_point: f64,
    /// mm/h
    #[serde(default)]
    pub precip_intensity: f64,
    /// 0..1
    #[serde(default)]
    pub cloud_cover: f64,
}

#[derive(Debug, Error)]
pub enum WeatherApiError {
    #[error("forecast API key required: set {0}")]
    MissingApiKey(String),
    #[error("HTTP request error: {0}")]
    HttpRequestError(#[from] reqwest::Error),
    #[error("forecast API error: {0}")]
    ApiError(String),
    #[error("missing weather data: {0}")]
    MissingData(String),
}

/// Source of hourly forecast points, ascending by time.
pub trait ForecastProvider {
    fn hourly(&self) -> impl Future<Output = Result<Vec<ForecastPoint>, WeatherApiError>>;

    /// False when a fetch is bound to fail for lack of credentials.
    fn has_credentials(&self) -> bool {
        true
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    data: Vec<ForecastPoint>,
}

/// Provider for Dark Sky style `/forecast/{key}/{lat},{lng}` endpoints.
#[derive(Debug)]
pub struct HttpForecastProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
    lat: f64,
    lng: f64,
    units: String,
}

impl HttpForecastProvider {
    pub fn new(
        forecast: &ForecastConfig,
        location: &LocationConfig,
        api_key: Option<String>,
    ) -> Result<Self, WeatherApiError> {
        const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));
        headers.insert("Connection", header::HeaderValue::from_static("close"));

        let timeout = Duration::from_millis(forecast.timeout_ms);
        let client = Client::builder()
            .connect_timeout(timeout)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: forecast.base_url.trim_end_matches('/').to_string(),
            api_key,
            api_key_env: forecast.api_key_env.clone(),
            lat: location.lat,
            lng: location.lng,
            units: forecast.units.clone(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self, key: &str) -> String {
        format!(
            "{}/{}/{},{}?units={}&exclude=currently,minutely,daily,alerts,flags",
            self.base_url, key, self.lat, self.lng, self.units
        )
    }
}

impl ForecastProvider for HttpForecastProvider {
    fn has_credentials(&self) -> bool {
        self.has_api_key()
    }

    async fn hourly(&self) -> Result<Vec<ForecastPoint>, WeatherApiError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| WeatherApiError::MissingApiKey(self.api_key_env.clone()))?;

        let response = self.client.get(self.url(key)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WeatherApiError::ApiError(format!("status {}", status)));
        }
        let body: ForecastResponse = response.json().await?;
        let points = body
            .hourly
            .ok_or_else(|| WeatherApiError::MissingData("no hourly block".to_string()))?
            .data;
        info!("Fetched {} hourly forecast points", points.len());
        Ok(points)
    }
}

/// Slice of `points` covering `start..=end`, widened by one point either
/// side so curves reach both plot edges.
///
/// Keeps from the last point before `start` up to and including the first
/// point after `end`.
pub fn select_window<Tz: TimeZone>(
    points: &[ForecastPoint],
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
) -> Vec<ForecastPoint> {
    if points.is_empty() {
        return Vec::new();
    }
    let mut first = 0;
    let mut last = points.len() - 1;
    for (i, point) in points.iter().enumerate() {
        if point.time < *start {
            first = i;
        }
        if point.time > *end {
            last = i;
            break;
        }
    }
    debug!("Forecast window keeps points {}..={} of {}", first, last, points.len());
    points[first..=last].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn hourly(n: i64) -> Vec<ForecastPoint> {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|h| ForecastPoint {
                time: t0 + TimeDelta::hours(h),
                temperature: h as f64,
                dew_point: 0.0,
                precip_intensity: 0.0,
                cloud_cover: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_parse_dark_sky_hourly() {
        let json = r#"{
            "latitude": 49.58,
            "hourly": { "summary": "Rain", "data": [
                {"time": 1704067200, "temperature": 3.5, "dewPoint": 1.25,
                 "precipIntensity": 0.4, "cloudCover": 0.9, "humidity": 0.8},
                {"time": 1704070800, "temperature": 3.1, "dewPoint": 1.0}
            ]}
        }"#;
        let body: ForecastResponse = serde_json::from_str(json).unwrap();
        let data = body.hourly.unwrap().data;
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].time, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(data[0].dew_point, 1.25);
        assert_eq!(data[0].cloud_cover, 0.9);
        assert_eq!(data[1].precip_intensity, 0.0);
    }

    #[test]
    fn test_select_window_widens_by_one() {
        let points = hourly(72);
        let start = points[0].time + TimeDelta::minutes(90);
        let end = start + TimeDelta::hours(47);
        let shown = select_window(&points, &start, &end);
        // 01:00 is the last point before 01:30, 49:00 the first after 48:30
        assert_eq!(shown.first().unwrap().temperature, 1.0);
        assert_eq!(shown.last().unwrap().temperature, 49.0);
    }

    #[test]
    fn test_select_window_short_series() {
        let points = hourly(10);
        let start = points[3].time;
        let end = start + TimeDelta::hours(47);
        let shown = select_window(&points, &start, &end);
        assert_eq!(shown.first().unwrap().temperature, 2.0);
        assert_eq!(shown.last().unwrap().temperature, 9.0);
        assert!(select_window(&[], &start, &end).is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_fetching() {
        let provider = HttpForecastProvider::new(
            &ForecastConfig::default(),
            &LocationConfig::default(),
            None,
        )
        .unwrap();
        assert!(!provider.has_api_key());
        match provider.hourly().await {
            Err(WeatherApiError::MissingApiKey(env)) => assert_eq!(env, "DARKSKY_API_KEY"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
