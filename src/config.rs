use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::game::constants::room::{MAX_PLAYERS, MIN_PLAYERS};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_address: IpAddr,
    /// WebTransport port
    pub port: u16,
    /// Metrics HTTP port
    pub metrics_port: u16,
    /// Maximum number of concurrent rooms
    pub max_rooms: usize,
    /// Join cap per room
    pub max_players_per_room: usize,
    /// Whether new rooms start with obstacles enabled
    pub obstacles_default: bool,
    /// Path to TLS certificate file (self-signed when unset)
    pub tls_cert_path: Option<String>,
    /// Path to TLS key file (self-signed when unset)
    pub tls_key_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 4433,
            metrics_port: 9090,
            max_rooms: 100,
            max_players_per_room: MAX_PLAYERS,
            obstacles_default: true,
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

/// Parse `name` from the environment; `None` when unset or invalid
fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", name, raw);
            None
        }
    }
}

impl ServerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(addr) = env_parse("BIND_ADDRESS") {
            config.bind_address = addr;
        }

        if let Some(port) = env_parse::<u16>("PORT") {
            if port > 0 {
                config.port = port;
            } else {
                tracing::warn!("PORT must be > 0, using default");
            }
        }

        if let Some(port) = env_parse::<u16>("METRICS_PORT") {
            if port > 0 {
                config.metrics_port = port;
            } else {
                tracing::warn!("METRICS_PORT must be > 0, using default");
            }
        }

        if let Some(max_rooms) = env_parse::<usize>("MAX_ROOMS") {
            if (1..=10000).contains(&max_rooms) {
                config.max_rooms = max_rooms;
            } else {
                tracing::warn!("MAX_ROOMS must be 1-10000, using default");
            }
        }

        if let Some(max_players) = env_parse::<usize>("MAX_PLAYERS_PER_ROOM") {
            if (MIN_PLAYERS..=MAX_PLAYERS).contains(&max_players) {
                config.max_players_per_room = max_players;
            } else {
                tracing::warn!(
                    "MAX_PLAYERS_PER_ROOM must be {}-{}, using default",
                    MIN_PLAYERS,
                    MAX_PLAYERS
                );
            }
        }

        if let Some(enabled) = env_parse("OBSTACLES_DEFAULT") {
            config.obstacles_default = enabled;
        }

        if let Ok(cert_path) = std::env::var("TLS_CERT_PATH") {
            config.tls_cert_path = Some(cert_path);
        }

        if let Ok(key_path) = std::env::var("TLS_KEY_PATH") {
            config.tls_key_path = Some(key_path);
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0".to_string());
        }
        if self.port == self.metrics_port {
            return Err("port and metrics_port must differ".to_string());
        }
        if self.max_rooms == 0 {
            return Err("max_rooms must be at least 1".to_string());
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.max_players_per_room) {
            return Err(format!(
                "max_players_per_room must be between {} and {}",
                MIN_PLAYERS, MAX_PLAYERS
            ));
        }
        if self.tls_cert_path.is_some() != self.tls_key_path.is_some() {
            return Err("TLS_CERT_PATH and TLS_KEY_PATH must be set together".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 4433);
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.max_rooms, 100);
        assert_eq!(config.max_players_per_room, 8);
        assert!(config.obstacles_default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_or_default() {
        let config = ServerConfig::load_or_default();
        assert!(config.port > 0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.max_players_per_room = 1;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.metrics_port = config.port;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.tls_cert_path = Some("cert.pem".to_string());
        assert!(config.validate().is_err());
    }
}
