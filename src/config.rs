use crate::error::SessionError;

pub const DB_ADDR_ENV: &str = "DB_PORT_5432_TCP_ADDR";
pub const DB_PORT_ENV: &str = "DB_PORT_5432_TCP_PORT";

/// Connection settings for the data sink.
///
/// The sink is in-memory, so these values only identify it; they are still
/// validated so a broken environment fails at connect time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub database: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5432,
            user: "postgres".into(),
            database: "postgres".into(),
        }
    }
}

impl SinkConfig {
    /// Builds a config from a key/value lookup. Missing keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(host) = lookup(DB_ADDR_ENV) {
            cfg.host = host.trim().to_string();
        }
        if let Some(port) = lookup(DB_PORT_ENV) {
            cfg.port = port
                .trim()
                .parse::<u16>()
                .map_err(|e| SessionError::InvalidConfig {
                    message: format!("{DB_PORT_ENV}={port:?}: {e}"),
                })?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn with_address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.host.is_empty() {
            return Err(invalid("host must not be empty"));
        }
        if self.port == 0 {
            return Err(invalid("port must be non-zero"));
        }
        if self.user.is_empty() {
            return Err(invalid("user must not be empty"));
        }
        if self.database.is_empty() {
            return Err(invalid("database must not be empty"));
        }
        Ok(())
    }

    pub fn uri(&self) -> String {
        format!(
            "postgresql://{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

fn invalid(message: &str) -> SessionError {
    SessionError::InvalidConfig {
        message: message.to_string(),
    }
}
