use reqwest::header::{InvalidHeaderName, InvalidHeaderValue};
use thiserror::Error;

/// Reasons a single scenario cannot be turned into a runnable [`super::ProbeConfig`].
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no target url configured")]
    MissingUrl,

    #[error("invalid target url '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("target url '{url}' repeats its scheme")]
    DoubledScheme { url: String },

    #[error("unsupported scheme '{scheme}' in '{url}', expected http or https")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("target url '{url}' has no host")]
    MissingHost { url: String },

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("concurrency {concurrency} exceeds the maximum of {max} virtual users")]
    ConcurrencyTooHigh { concurrency: usize, max: usize },

    #[error("either iterations or duration must be set")]
    MissingRunLength,

    #[error("iterations must be at least 1")]
    ZeroIterations,

    #[error("duration must be longer than zero")]
    ZeroDuration,

    #[error("request timeout must be longer than zero")]
    ZeroTimeout,

    #[error("{0} is not a valid HTTP status code")]
    InvalidStatus(u16),

    #[error("invalid header name '{name}'")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: InvalidHeaderName,
    },

    #[error("header '{name}' is configured more than once")]
    DuplicateHeader { name: String },

    #[error("invalid value for header '{name}'")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: InvalidHeaderValue,
    },
}

/// Fatal configuration problems, raised before any request goes out.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scenario file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scenario file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("environment variable {var}={value:?} is invalid: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("unknown scenario '{name}' (available: {available})")]
    UnknownScenario { name: String, available: String },

    #[error("no scenarios defined in {path}")]
    NoScenarios { path: String },

    #[error("scenario '{scenario}' is invalid")]
    InvalidScenario {
        scenario: String,
        #[source]
        source: ValidationError,
    },
}
