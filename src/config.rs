use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub jwt_secret: String,
    pub integration_rps: u32,
    pub public_rps: u32,
    pub max_violations: u32,
    pub question_grace_seconds: i64,
    pub runner_timeout_ms: u64,
    pub runner_max_output_bytes: usize,
    pub queue_poll_ms: u64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            jwt_secret: get_env("JWT_SECRET")?,
            integration_rps: get_env_or("INTEGRATION_RPS", 50)?,
            public_rps: get_env_or("PUBLIC_RPS", 100)?,
            max_violations: get_env_or("MAX_VIOLATIONS", 3)?,
            question_grace_seconds: get_env_or("QUESTION_GRACE_SECONDS", 5)?,
            runner_timeout_ms: get_env_or("RUNNER_TIMEOUT_MS", 20_000)?,
            runner_max_output_bytes: get_env_or("RUNNER_MAX_OUTPUT_BYTES", 20_000)?,
            queue_poll_ms: get_env_or("QUEUE_POLL_MS", 250)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
