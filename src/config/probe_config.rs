use std::{collections::BTreeMap, time::Duration};

use reqwest::{
    StatusCode,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::{Deserialize, Deserializer};
use url::Url;

use super::error::ValidationError;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound on virtual users, each one is a tokio task with its own connection.
pub const MAX_CONCURRENCY: usize = 10_000;

/// A single load test scenario as it appears in the scenario file.
/// Every field except the URL has a default, so the smallest useful entry is
/// a URL plus either `iterations` or `duration`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// The URL every virtual user will GET.
    #[serde(default)]
    pub url: String,

    /// Extra request headers. These replace any header of the same name the
    /// client would otherwise send (`Host`, `User-Agent`, ...).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Number of virtual users running in parallel.
    /// Defaults to 1.
    #[serde(default = "default_concurrency", alias = "vus")]
    pub concurrency: usize,

    /// Total number of iterations, shared between all virtual users.
    #[serde(default)]
    pub iterations: Option<u64>,

    /// How long the scenario runs, e.g. `10s` or `1m30s`.
    /// When combined with `iterations` this is the upper bound.
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub duration: Option<Duration>,

    /// The status code a response needs to pass the check.
    /// Defaults to 200 if not specified.
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,

    /// Per request timeout, defaults to 60 seconds.
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub request_timeout: Option<Duration>,

    /// Name of the check in the summary, defaults to `status is <expected_status>`.
    #[serde(default)]
    pub check_name: Option<String>,
}

/// Scenario name to scenario, iterated in name order.
pub type ScenarioFile = BTreeMap<String, ScenarioConfig>;

fn default_concurrency() -> usize {
    1
}

fn default_expected_status() -> u16 {
    200
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Text(String),
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawDuration>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawDuration::Seconds(secs)) => Ok(Some(Duration::from_secs(secs))),
        Some(RawDuration::Text(text)) => humantime::parse_duration(text.trim())
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            headers: BTreeMap::new(),
            concurrency: default_concurrency(),
            iterations: None,
            duration: None,
            expected_status: default_expected_status(),
            request_timeout: None,
            check_name: None,
        }
    }
}

impl ScenarioConfig {
    /// Check every field and produce the immutable config the runner consumes.
    pub fn validate(&self) -> Result<ProbeConfig, ValidationError> {
        let target_url = parse_target_url(&self.url)?;
        let headers = build_header_map(&self.headers)?;

        if self.concurrency == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        if self.concurrency > MAX_CONCURRENCY {
            return Err(ValidationError::ConcurrencyTooHigh {
                concurrency: self.concurrency,
                max: MAX_CONCURRENCY,
            });
        }
        match (self.iterations, self.duration) {
            (None, None) => return Err(ValidationError::MissingRunLength),
            (Some(0), _) => return Err(ValidationError::ZeroIterations),
            (_, Some(d)) if d.is_zero() => return Err(ValidationError::ZeroDuration),
            _ => {}
        }

        let expected_status = StatusCode::from_u16(self.expected_status)
            .map_err(|_| ValidationError::InvalidStatus(self.expected_status))?;

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        if request_timeout.is_zero() {
            return Err(ValidationError::ZeroTimeout);
        }

        let check_name = self
            .check_name
            .clone()
            .unwrap_or_else(|| format!("status is {}", expected_status.as_u16()));

        Ok(ProbeConfig {
            target_url,
            headers,
            concurrency: self.concurrency,
            iterations: self.iterations,
            duration: self.duration,
            expected_status: expected_status.as_u16(),
            request_timeout,
            check_name,
        })
    }
}

fn parse_target_url(raw: &str) -> Result<Url, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingUrl);
    }

    // `http://http://host/...` parses as host "http" with an empty port
    if let Some((_, rest)) = raw.split_once("://") {
        let rest = rest.to_ascii_lowercase();
        if rest.starts_with("http:") || rest.starts_with("https:") {
            return Err(ValidationError::DoubledScheme {
                url: raw.to_string(),
            });
        }
    }

    let url = Url::parse(raw).map_err(|source| ValidationError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme {
            url: raw.to_string(),
            scheme: url.scheme().to_string(),
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::MissingHost {
            url: raw.to_string(),
        });
    }
    Ok(url)
}

fn build_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ValidationError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|source| {
            ValidationError::InvalidHeaderName {
                name: name.clone(),
                source,
            }
        })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|source| ValidationError::InvalidHeaderValue {
                name: name.clone(),
                source,
            })?;
        // header names are case-insensitive
        if map.contains_key(&header_name) {
            return Err(ValidationError::DuplicateHeader { name: name.clone() });
        }
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// A validated scenario. Only obtainable through [`ScenarioConfig::validate`]
/// or [`ProbeConfig::builder`], so at least one of `iterations` and
/// `duration` is always set.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    target_url: Url,
    headers: HeaderMap,
    concurrency: usize,
    iterations: Option<u64>,
    duration: Option<Duration>,
    expected_status: u16,
    request_timeout: Duration,
    check_name: String,
}

impl ProbeConfig {
    pub fn builder(url: impl Into<String>) -> ProbeConfigBuilder {
        ProbeConfigBuilder {
            scenario: ScenarioConfig {
                url: url.into(),
                ..ScenarioConfig::default()
            },
        }
    }

    pub fn target_url(&self) -> &Url {
        &self.target_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn iterations(&self) -> Option<u64> {
        self.iterations
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn expected_status(&self) -> u16 {
        self.expected_status
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn check_name(&self) -> &str {
        &self.check_name
    }

    /// Human readable run length, e.g. `200 iterations` or `10s`.
    pub fn describe_run_length(&self) -> String {
        match (self.iterations, self.duration) {
            (Some(n), Some(d)) => format!(
                "{n} iterations (at most {})",
                humantime::format_duration(d)
            ),
            (Some(n), None) => format!("{n} iterations"),
            (None, Some(d)) => humantime::format_duration(d).to_string(),
            (None, None) => "nothing".to_string(),
        }
    }
}

/// Builds a [`ProbeConfig`] in code, validated the same way as a scenario file entry.
#[derive(Debug, Clone)]
pub struct ProbeConfigBuilder {
    scenario: ScenarioConfig,
}

impl ProbeConfigBuilder {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.scenario.headers.insert(name.into(), value.into());
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.scenario.concurrency = concurrency;
        self
    }

    pub fn iterations(mut self, iterations: u64) -> Self {
        self.scenario.iterations = Some(iterations);
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.scenario.duration = Some(duration);
        self
    }

    pub fn expected_status(mut self, status: u16) -> Self {
        self.scenario.expected_status = status;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.scenario.request_timeout = Some(timeout);
        self
    }

    pub fn check_name(mut self, name: impl Into<String>) -> Self {
        self.scenario.check_name = Some(name.into());
        self
    }

    pub fn build(self) -> Result<ProbeConfig, ValidationError> {
        self.scenario.validate()
    }
}
