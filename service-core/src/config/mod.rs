use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load from an optional `configuration` file and `APP__*` variables.
    /// Values that cannot be parsed are logged and replaced by defaults.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::load_or_default(Environment::with_prefix("APP").separator("__"))
    }

    pub fn load_or_default(environment: Environment) -> Self {
        Self::load_from(environment).unwrap_or_else(|e| {
            tracing::warn!("Invalid service configuration, using defaults: {}", e);
            Self::default()
        })
    }

    pub fn load_from(environment: Environment) -> Result<Self, AppError> {
        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(environment)
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn app_env(port: &str) -> Environment {
        let vars = HashMap::from([("APP__PORT".to_string(), port.to_string())]);
        Environment::with_prefix("APP")
            .separator("__")
            .source(Some(vars))
    }

    #[test]
    fn default_port_is_8080() {
        assert_eq!(Config::default().port, 8080);
    }

    #[test]
    fn port_is_read_from_environment() {
        let config = Config::load_from(app_env("9000")).unwrap();
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn unparseable_port_is_an_error_for_load_from() {
        let result = Config::load_from(app_env("not-a-port"));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn unparseable_port_falls_back_to_default() {
        for port in ["not-a-port", "70000", "-1"] {
            assert_eq!(Config::load_or_default(app_env(port)).port, 8080, "{port}");
        }
        assert_eq!(Config::load_or_default(app_env("9000")).port, 9000);
    }
}
