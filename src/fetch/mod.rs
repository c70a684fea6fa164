/*
 *  fetch/mod.rs
 *
 *  yrpaper - forecast to e-paper
 *	(c) 2020-26 Stuart Hunter
 *
 *	Forecast acquisition with bounded fixed-delay retry
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
use log::{error, info, warn};
use rand::Rng;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::forecast::{DocumentError, ForecastSnapshot, MIN_PERIODS};

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::{MockTransport, MockTransportState};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Why a single request did not yield a usable document. Always retryable.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AttemptError {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed document: {0}")]
    Invalid(String),
}

impl From<reqwest::Error> for AttemptError {
    fn from(err: reqwest::Error) -> Self {
        AttemptError::Transport(err.to_string())
    }
}

impl From<DocumentError> for AttemptError {
    fn from(err: DocumentError) -> Self {
        AttemptError::Invalid(err.to_string())
    }
}

/// Retries exhausted. Not recoverable, the operator has to look at it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("{what} fetch failed after {attempts} attempts, last error: {last}")]
    Failed {
        what: &'static str,
        attempts: u32,
        last: AttemptError,
    },
}

impl FetchError {
    pub fn attempts(&self) -> u32 {
        match self {
            FetchError::Failed { attempts, .. } => *attempts,
        }
    }
}

/// Raw response handed back by a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }
}

/// Blocking GET. Implemented over reqwest for real use and scripted in tests.
pub trait Transport {
    fn get(&self, url: &str) -> Result<HttpResponse, AttemptError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<HttpResponse, AttemptError> {
        (**self).get(url)
    }
}

/// Fixed-delay retry: no backoff, optional jitter on top of the delay.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
            jitter: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    fn pause(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay;
        }
        let extra = rand::rng().random_range(0..=self.jitter.as_millis() as u64);
        self.delay + Duration::from_millis(extra)
    }
}

/// Run `op` until it succeeds or `policy.max_attempts` attempts have failed.
///
/// `op` receives the 1-based attempt number. Between failures the thread
/// sleeps for the policy delay.
pub fn retry<T, F>(policy: &RetryPolicy, what: &'static str, mut op: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Result<T, AttemptError>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        match op(attempts) {
            Ok(value) => {
                if attempts > 1 {
                    info!("{} retrieved on attempt {} of {}", what, attempts, max_attempts);
                }
                return Ok(value);
            }
            Err(e) => {
                warn!("Error retrieving {}: {}", what, e);
                if attempts >= max_attempts {
                    error!("Giving up on {} after {} attempts, check the network connection", what, attempts);
                    return Err(FetchError::Failed { what, attempts, last: e });
                }
                let pause = policy.pause();
                info!("Retrying in {} seconds. (Attempt {} of {})", pause.as_secs(), attempts, max_attempts);
                thread::sleep(pause);
            }
        }
    }
}

/// Coordinates the forecast is requested for.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub altitude: Option<i32>,
}

impl Location {
    /// Query string, coordinates truncated to the 4 decimals the API accepts.
    pub fn query(&self) -> String {
        let mut query = format!("lat={:.4}&lon={:.4}", self.lat, self.lon);
        if let Some(altitude) = self.altitude {
            query.push_str(&format!("&altitude={}", altitude));
        }
        query
    }
}

/// Fetches and validates forecast snapshots.
pub struct Fetcher<T: Transport> {
    transport: T,
    endpoint: String,
    policy: RetryPolicy,
    min_periods: usize,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, endpoint: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            policy,
            min_periods: MIN_PERIODS,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn url_for(&self, location: &Location) -> String {
        let sep = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.endpoint, sep, location.query())
    }

    /// Fetch a snapshot for `location`; blocks through retries.
    pub fn fetch(&self, location: &Location) -> Result<ForecastSnapshot, FetchError> {
        let url = self.url_for(location);
        let snapshot = retry(&self.policy, "forecast", |attempt| {
            let response = self.transport.get(&url)?;
            if response.status != 200 {
                return Err(AttemptError::Status(response.status));
            }
            let snapshot = ForecastSnapshot::from_json(&response.body, self.min_periods)?;
            log::debug!("forecast attempt {} returned {} periods", attempt, snapshot.len());
            Ok(snapshot)
        })?;
        info!(
            "Weather data retrieved. Weather station update: {}",
            snapshot.updated_at.format("%d.%m.%y %H:%M")
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy { max_attempts, delay: Duration::ZERO, jitter: Duration::ZERO }
    }

    #[test]
    fn test_retry_gives_up_at_cap() {
        let mut calls = 0;
        let result: Result<(), FetchError> = retry(&quick(100), "forecast", |_| {
            calls += 1;
            Err(AttemptError::Status(503))
        });
        assert_eq!(calls, 100);
        let err = result.unwrap_err();
        assert_eq!(err.attempts(), 100);
        assert_eq!(
            err,
            FetchError::Failed { what: "forecast", attempts: 100, last: AttemptError::Status(503) }
        );
    }

    #[test]
    fn test_retry_stops_on_success() {
        let mut seen = Vec::new();
        let result = retry(&quick(100), "forecast", |attempt| {
            seen.push(attempt);
            if attempt < 7 { Err(AttemptError::Transport("reset".into())) } else { Ok(attempt) }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(seen, (1..=7).collect::<Vec<u32>>());
    }

    #[test]
    fn test_zero_cap_still_tries_once() {
        let mut calls = 0;
        let _ = retry::<(), _>(&quick(0), "forecast", |_| {
            calls += 1;
            Err(AttemptError::Status(500))
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_jitter_bounds_pause() {
        let policy = RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(10),
            jitter: Duration::from_millis(5),
        };
        for _ in 0..20 {
            let pause = policy.pause();
            assert!(pause >= Duration::from_millis(10));
            assert!(pause <= Duration::from_millis(15));
        }
    }

    #[test]
    fn test_url_for_location() {
        let fetcher = Fetcher::new(
            MockTransport::new(),
            "https://api.met.no/weatherapi/locationforecast/2.0/complete",
            RetryPolicy::default(),
        );
        let location = Location { lat: 58.847412, lon: 5.716599, altitude: Some(40) };
        assert_eq!(
            fetcher.url_for(&location),
            "https://api.met.no/weatherapi/locationforecast/2.0/complete?lat=58.8474&lon=5.7166&altitude=40"
        );
    }
}
