use std::path::PathBuf;

use config::{Config, ConfigError};
use gc_backend::BackendConfig;
use gc_command::CommandsConfig;
use gc_telemetry::TelemetryConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GroundControlConfig {
    pub backend: BackendConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub commands: CommandsConfig,
}

impl GroundControlConfig {
    pub fn read_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let mut c = Config::new();

        c.merge(config::File::from(path))?;
        c.merge(config::Environment::with_prefix("GROUND_CONTROL").separator("__"))?;

        c.try_into()
    }
}
