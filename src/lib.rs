use std::{net::SocketAddr, path::PathBuf};

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, FileFormat};
use serde::Deserialize;

pub mod binding;
pub mod domain;
pub mod infrastructure;

#[derive(Clone, Debug, Deserialize)]
pub struct EcamConfig {
    pub server: Server,
    pub repository: Repository,
    pub soap: Soap,
    pub logger: Logger,
}

impl EcamConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(config::File::with_name("ecam").required(false))
            .add_source(config::Environment::with_prefix("ECAM").separator("_"))
            .build()?
            .try_deserialize::<EcamConfig>()
    }

    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize::<EcamConfig>()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.address", "0.0.0.0:8080")?
            .set_default("repository.seed", 50)?
            .set_default("soap.namespace", "ecam.soap.customer")?
            .set_default("soap.location", "http://localhost:8080/soap")?
            .set_default("logger.level", "INFO")
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    pub address: SocketAddr,
    pub tls: Option<Tls>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Tls {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Repository {
    pub seed: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Soap {
    pub namespace: String,
    pub location: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Logger {
    pub level: Level,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub enum Level {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<&Level> for tracing::Level {
    fn from(value: &Level) -> Self {
        match value {
            Level::TRACE => tracing::Level::TRACE,
            Level::DEBUG => tracing::Level::DEBUG,
            Level::INFO => tracing::Level::INFO,
            Level::WARN => tracing::Level::WARN,
            Level::ERROR => tracing::Level::ERROR,
        }
    }
}
