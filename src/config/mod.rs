pub mod app_config;
pub mod error;
pub mod probe_config;

pub use app_config::{AppConfig, build_client, load_config};
pub use error::{ConfigError, ValidationError};
pub use probe_config::{ProbeConfig, ProbeConfigBuilder, ScenarioConfig, ScenarioFile};
