use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::db::DbConfig;
use crate::timetable::CivilCalendar;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_level: String,
    /// Apply pending migrations at startup.
    pub migrate: bool,
    pub calendar: CivilCalendar,
    pub announce_interval: Duration,
    pub identity: IdentityConfig,
    pub database: DbConfig,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    pub timeout: Duration,
}

fn env_secs(name: &str, default: u64) -> Result<Duration> {
    match std::env::var(name) {
        Ok(value) => {
            let secs: u64 = value
                .parse()
                .with_context(|| format!("{name} must be a number of seconds"))?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("TIMETABLE_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .context("TIMETABLE_LISTEN_ADDR must be host:port")?;

        let log_level = std::env::var("TIMETABLE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let migrate = std::env::var("TIMETABLE_MIGRATE")
            .map(|v| parse_bool(&v))
            .unwrap_or(true);

        let calendar = match std::env::var("TIMETABLE_UTC_OFFSET") {
            Ok(value) => CivilCalendar::new(CivilCalendar::parse_offset(&value)?),
            Err(_) => CivilCalendar::host_local(),
        };

        let announce_interval = env_secs("TIMETABLE_ANNOUNCE_INTERVAL_SECS", 60)?;
        if announce_interval.is_zero() {
            anyhow::bail!("TIMETABLE_ANNOUNCE_INTERVAL_SECS must be positive");
        }

        let base_url = std::env::var("IDENTITY_BASE_URL")
            .context("IDENTITY_BASE_URL must be set")?;
        let identity = IdentityConfig {
            base_url,
            timeout: env_secs("IDENTITY_TIMEOUT_SECS", 5)?,
        };

        let database = DbConfig::from_env()?;

        Ok(Self {
            listen_addr,
            log_level,
            migrate,
            calendar,
            announce_interval,
            identity,
            database,
        })
    }
}
