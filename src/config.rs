use chrono::Duration;
use color_eyre::eyre::{eyre, Report, WrapErr};
use std::{env, str::FromStr};

pub const DEFAULT_ADMIN_IDENTITY: &str = "999999999999";
/// Longest accepted admin session lifetime, 30 days.
pub const MAX_SESSION_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct Config {
    /// Postgres connection string. Without one the server keeps votes in memory.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Identity code that is treated as the administrator.
    pub admin_identity: String,
    pub session_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            host: "127.0.0.1".to_owned(),
            port: 5000,
            admin_identity: DEFAULT_ADMIN_IDENTITY.to_owned(),
            session_ttl: Duration::hours(1),
        }
    }
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, Report> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Report>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let admin_identity = var("ADMIN_IDENTITY").unwrap_or(defaults.admin_identity);
        let session_ttl = match parse::<i64, _>(&var, "SESSION_TTL_SECS")? {
            Some(secs) if secs < 0 => {
                return Err(eyre!("SESSION_TTL_SECS must not be negative"));
            }
            Some(secs) if secs > MAX_SESSION_TTL_SECS => {
                return Err(eyre!(
                    "SESSION_TTL_SECS must be at most {} seconds",
                    MAX_SESSION_TTL_SECS
                ));
            }
            Some(secs) => Duration::seconds(secs),
            None => defaults.session_ttl,
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            max_connections: parse(&var, "DB_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),
            host: var("HOST").unwrap_or(defaults.host),
            port: parse(&var, "PORT")?.unwrap_or(defaults.port),
            admin_identity,
            session_ttl,
        })
    }
}

fn parse<T, F>(var: &F, key: &str) -> Result<Option<T>, Report>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .wrap_err_with(|| format!("{} has an invalid value: {:?}", key, value))
        })
        .transpose()
}
