//! Server configuration loaded from the environment

use std::net::SocketAddr;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:7373";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP/WebSocket server listens on
    pub bind_addr: SocketAddr,
    /// Participants per room, host included
    pub max_participants: usize,
    /// Nicknames are truncated to this many characters
    pub max_nickname_chars: usize,
    /// Per-room snapshot broadcast capacity
    pub snapshot_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 7373))),
            max_participants: 30,
            max_nickname_chars: 20,
            snapshot_buffer: 64,
        }
    }
}

/// Read and parse an env var, warning and falling back when it is malformed
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}={:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

impl AppConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_participants = match env_or("MAX_PARTICIPANTS", defaults.max_participants) {
            n if n < 2 => {
                tracing::warn!("MAX_PARTICIPANTS must allow at least 2, using default");
                defaults.max_participants
            }
            n => n,
        };

        let config = Self {
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr),
            max_participants,
            max_nickname_chars: env_or("MAX_NICKNAME_CHARS", defaults.max_nickname_chars).max(1),
            snapshot_buffer: env_or("SNAPSHOT_BUFFER", defaults.snapshot_buffer).max(1),
        };

        tracing::info!(
            bind_addr = %config.bind_addr,
            max_participants = config.max_participants,
            max_nickname_chars = config.max_nickname_chars,
            snapshot_buffer = config.snapshot_buffer,
            "Config loaded"
        );

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "BIND_ADDR",
        "MAX_PARTICIPANTS",
        "MAX_NICKNAME_CHARS",
        "SNAPSHOT_BUFFER",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = AppConfig::from_env();
        assert_eq!(config.bind_addr.port(), 7373);
        assert_eq!(config.max_participants, 30);
        assert_eq!(config.max_nickname_chars, 20);
        assert_eq!(config.snapshot_buffer, 64);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("BIND_ADDR", "127.0.0.1:9000");
        std::env::set_var("MAX_PARTICIPANTS", "8");
        std::env::set_var("SNAPSHOT_BUFFER", "16");
        let config = AppConfig::from_env();
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.max_participants, 8);
        assert_eq!(config.snapshot_buffer, 16);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("MAX_PARTICIPANTS", "lots");
        std::env::set_var("MAX_NICKNAME_CHARS", "0");
        let config = AppConfig::from_env();
        assert_eq!(config.max_participants, 30);
        assert_eq!(config.max_nickname_chars, 1);

        std::env::set_var("MAX_PARTICIPANTS", "1");
        assert_eq!(AppConfig::from_env().max_participants, 30);
        clear_env();
    }
}
