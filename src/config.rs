use std::env;
use std::str::FromStr;

use crate::error::RelayError;
use crate::events::ActorId;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_HUB_CAPACITY: usize = 100;
const DEV_SOCKET_URL: &str = "ws://localhost:3001/ws";
const PROD_SOCKET_URL: &str = "wss://predictmebro-socket.up.railway.app/ws";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Whether a browser origin may talk to the relay.
    pub fn allows_origin(&self, origin: &str) -> bool {
        match self {
            Environment::Development => {
                origin == "http://localhost:3000" || origin == "http://localhost:3001"
            }
            Environment::Production => {
                origin.contains("vercel.app") || origin.contains("predictmebro.com")
            }
        }
    }
}

impl FromStr for Environment {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(RelayError::Config(format!("unknown RELAY_ENV `{other}`"))),
        }
    }
}

/// Which transport a client relays through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Socket,
    Postgres,
    Memory,
}

impl FromStr for BackendKind {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "socket" | "websocket" => Ok(BackendKind::Socket),
            "postgres" | "database" => Ok(BackendKind::Postgres),
            "memory" => Ok(BackendKind::Memory),
            other => Err(RelayError::Config(format!("unknown RELAY_BACKEND `{other}`"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub environment: Environment,
    pub database_url: Option<String>,
    pub hub_capacity: usize,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend: BackendKind,
    pub socket_url: String,
    pub database_url: Option<String>,
    pub actor: Option<ActorId>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, RelayError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RelayError> {
        Ok(ServerConfig {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            environment: parse_or(&lookup, "RELAY_ENV", Environment::Development)?,
            database_url: non_empty(lookup("DATABASE_URL")),
            hub_capacity: parse_or(&lookup, "HUB_CAPACITY", DEFAULT_HUB_CAPACITY)?,
        })
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, RelayError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RelayError> {
        let environment = parse_or(&lookup, "RELAY_ENV", Environment::Development)?;
        let default_url = match environment {
            Environment::Development => DEV_SOCKET_URL,
            Environment::Production => PROD_SOCKET_URL,
        };
        Ok(ClientConfig {
            backend: parse_or(&lookup, "RELAY_BACKEND", BackendKind::Socket)?,
            socket_url: non_empty(lookup("RELAY_SOCKET_URL"))
                .unwrap_or_else(|| default_url.to_string()),
            database_url: non_empty(lookup("DATABASE_URL")),
            actor: non_empty(lookup("RELAY_ACTOR")).map(ActorId::new),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, RelayError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(lookup(key)) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| RelayError::Config(format!("{key}: {e}"))),
        None => Ok(default),
    }
}
