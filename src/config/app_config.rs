use std::{env, io, time::Duration};

use reqwest::Client;
use unicode_truncate::UnicodeTruncateStr;

use super::error::ConfigError;
use super::probe_config::{ProbeConfig, ScenarioConfig, ScenarioFile};

const DEFAULT_CONFIG_FILE: &str = "oxyload.yml";
const ENV_ONLY_SCENARIO: &str = "default";
const USER_AGENT: &str = concat!("oxyload/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct AppConfig {
    /// Validated scenarios in the order they will run.
    pub scenarios: Vec<(String, ProbeConfig)>,
    pub max_name_width: usize,
}

/// Load the application configuration from a YAML file and environment variables.
/// The scenario file is read from the location in `CONFIG_FILE` (default `oxyload.yml`).
/// When that file does not exist but `TARGET_URL` is set, a single scenario is built
/// from the environment alone. `SCENARIO` picks one scenario by name, the remaining
/// variables override fields of every selected scenario.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(|key| env::var(key).ok())
}

pub fn load_config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<AppConfig, ConfigError> {
    let location = lookup("CONFIG_FILE").unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    let scenarios = match std::fs::read_to_string(&location) {
        Ok(contents) => serde_yaml::from_str::<ScenarioFile>(&contents).map_err(|source| {
            ConfigError::Parse {
                path: location.clone(),
                source,
            }
        })?,
        Err(e) if e.kind() == io::ErrorKind::NotFound && lookup("TARGET_URL").is_some() => {
            log::info!("No scenario file at {location}, using environment only");
            ScenarioFile::from([(ENV_ONLY_SCENARIO.to_string(), ScenarioConfig::default())])
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: location,
                source,
            });
        }
    };

    let overrides = EnvOverrides::from_lookup(&lookup)?;
    let selected = select_scenarios(scenarios, lookup("SCENARIO").as_deref(), &location)?;

    let mut validated = Vec::with_capacity(selected.len());
    for (name, mut scenario) in selected {
        overrides.apply(&mut scenario);
        let config = scenario
            .validate()
            .map_err(|source| ConfigError::InvalidScenario {
                scenario: name.clone(),
                source,
            })?;
        validated.push((name, config));
    }

    let max_name_width = validated
        .iter()
        .map(|(name, _)| display_width(name))
        .max()
        .unwrap_or(10);

    Ok(AppConfig {
        scenarios: validated,
        max_name_width,
    })
}

/// Terminal columns taken by `text`, the unit `to_fixed_width` pads and truncates in.
fn display_width(text: &str) -> usize {
    text.unicode_truncate(usize::MAX).1
}

fn select_scenarios(
    mut scenarios: ScenarioFile,
    wanted: Option<&str>,
    location: &str,
) -> Result<Vec<(String, ScenarioConfig)>, ConfigError> {
    if scenarios.is_empty() {
        return Err(ConfigError::NoScenarios {
            path: location.to_string(),
        });
    }

    match wanted.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => match scenarios.remove(name) {
            Some(scenario) => Ok(vec![(name.to_string(), scenario)]),
            None => Err(ConfigError::UnknownScenario {
                name: name.to_string(),
                available: scenarios.keys().cloned().collect::<Vec<_>>().join(", "),
            }),
        },
        None => Ok(scenarios.into_iter().collect()),
    }
}

/// Environment variables that override scenario file values.
#[derive(Debug, Default)]
struct EnvOverrides {
    url: Option<String>,
    concurrency: Option<usize>,
    iterations: Option<u64>,
    duration: Option<Duration>,
    expected_status: Option<u16>,
    request_timeout: Option<Duration>,
    headers: Vec<(String, String)>,
}

impl EnvOverrides {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let concurrency = match lookup("CONCURRENCY") {
            Some(value) => Some(parse_env("CONCURRENCY", value)?),
            None => lookup("VUS").map(|value| parse_env("VUS", value)).transpose()?,
        };

        Ok(Self {
            url: lookup("TARGET_URL"),
            concurrency,
            iterations: lookup("ITERATIONS")
                .map(|value| parse_env("ITERATIONS", value))
                .transpose()?,
            duration: lookup("DURATION")
                .map(|value| parse_env_duration("DURATION", value))
                .transpose()?,
            expected_status: lookup("EXPECTED_STATUS")
                .map(|value| parse_env("EXPECTED_STATUS", value))
                .transpose()?,
            request_timeout: lookup("REQUEST_TIMEOUT")
                .map(|value| parse_env_duration("REQUEST_TIMEOUT", value))
                .transpose()?,
            headers: lookup("HEADERS")
                .map(|value| parse_env_headers("HEADERS", value))
                .transpose()?
                .unwrap_or_default(),
        })
    }

    fn apply(&self, scenario: &mut ScenarioConfig) {
        if let Some(url) = &self.url {
            scenario.url = url.clone();
        }
        if let Some(concurrency) = self.concurrency {
            scenario.concurrency = concurrency;
        }
        if let Some(iterations) = self.iterations {
            scenario.iterations = Some(iterations);
        }
        if let Some(duration) = self.duration {
            scenario.duration = Some(duration);
        }
        if let Some(status) = self.expected_status {
            scenario.expected_status = status;
        }
        if let Some(timeout) = self.request_timeout {
            scenario.request_timeout = Some(timeout);
        }
        for (name, value) in &self.headers {
            // Header names are case-insensitive, drop any spelling of the same name first
            scenario
                .headers
                .retain(|existing, _| !existing.trim().eq_ignore_ascii_case(name));
            scenario.headers.insert(name.clone(), value.clone());
        }
    }
}

fn parse_env<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnv {
            var,
            reason: e.to_string(),
            value,
        })
}

fn parse_env_duration(var: &'static str, value: String) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|e| ConfigError::InvalidEnv {
        var,
        reason: e.to_string(),
        value,
    })
}

/// Parses `Name: value; Other-Name: value` pairs.
fn parse_env_headers(
    var: &'static str,
    value: String,
) -> Result<Vec<(String, String)>, ConfigError> {
    let mut headers = Vec::new();
    for pair in value.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((name, header_value)) = pair.split_once(':') else {
            return Err(ConfigError::InvalidEnv {
                var,
                reason: format!("expected 'Name: value', got '{pair}'"),
                value: value.clone(),
            });
        };
        headers.push((name.trim().to_string(), header_value.trim().to_string()));
    }
    Ok(headers)
}

/// Build the HTTP client shared by all virtual users of a scenario.
/// Certificates are not verified, load tests usually target staging hosts by IP.
pub fn build_client(config: &ProbeConfig) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .danger_accept_invalid_certs(true)
        .user_agent(USER_AGENT)
        .build()
}
