use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub fares: FareRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FareRules {
    #[serde(default = "default_min_route_multiplier")]
    pub min_route_multiplier: f64,
    #[serde(default = "default_max_route_multiplier")]
    pub max_route_multiplier: f64,
}

fn default_min_route_multiplier() -> f64 {
    0.5
}

fn default_max_route_multiplier() -> f64 {
    3.0
}

impl From<FareRules> for motus_fleet::fares::FareConfig {
    fn from(rules: FareRules) -> Self {
        Self {
            min_route_multiplier: rules.min_route_multiplier,
            max_route_multiplier: rules.max_route_multiplier,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Base configuration, then the (optional) per-environment file,
            // then an uncommitted local override, then MOTUS__* env vars.
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("MOTUS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
