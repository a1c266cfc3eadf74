use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub market: MarketConfig,
    pub mock: MockConfig,
    pub session: SessionConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    pub tick_secs: u64,
    /// Fixed offset used to read the hour of day. `None` means system local time.
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MockConfig {
    pub fetch_latency_ms: u64,  // simulated GET listings
    pub action_latency_ms: u64, // simulated login / barter submit
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub db_path: String,
    pub allowed_email_domain: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub status_port: u16,
    pub log_level: String,
    pub event_bus_capacity: usize,
}

impl MarketConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs.max(1))
    }
}

impl MockConfig {
    pub fn fetch_latency(&self) -> Duration {
        Duration::from_millis(self.fetch_latency_ms)
    }

    pub fn action_latency(&self) -> Duration {
        Duration::from_millis(self.action_latency_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            market: MarketConfig {
                tick_secs: 60,
                utc_offset_minutes: None,
            },
            mock: MockConfig {
                fetch_latency_ms: 500,
                action_latency_ms: 1000,
            },
            session: SessionConfig {
                db_path: "data/session.db".to_string(),
                allowed_email_domain: "@thapar.edu".to_string(),
            },
            monitoring: MonitoringConfig {
                status_port: 3000,
                log_level: "info".to_string(),
                event_bus_capacity: 256,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let defaults = Config::default();

        Ok(Config {
            market: MarketConfig {
                tick_secs: env::var("MARKET_TICK_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(defaults.market.tick_secs),
                utc_offset_minutes: env::var("MARKET_UTC_OFFSET_MINUTES")
                    .ok()
                    .and_then(|v| v.parse().ok()),
            },
            mock: MockConfig {
                fetch_latency_ms: env::var("MOCK_FETCH_LATENCY_MS")
                    .unwrap_or_else(|_| "500".to_string())
                    .parse()
                    .unwrap_or(defaults.mock.fetch_latency_ms),
                action_latency_ms: env::var("MOCK_ACTION_LATENCY_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()
                    .unwrap_or(defaults.mock.action_latency_ms),
            },
            session: SessionConfig {
                db_path: env::var("SESSION_DB_PATH").unwrap_or(defaults.session.db_path),
                allowed_email_domain: env::var("ALLOWED_EMAIL_DOMAIN")
                    .unwrap_or(defaults.session.allowed_email_domain),
            },
            monitoring: MonitoringConfig {
                status_port: env::var("STATUS_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(defaults.monitoring.status_port),
                log_level: env::var("LOG_LEVEL").unwrap_or(defaults.monitoring.log_level),
                event_bus_capacity: env::var("EVENT_BUS_CAPACITY")
                    .unwrap_or_else(|_| "256".to_string())
                    .parse()
                    .unwrap_or(defaults.monitoring.event_bus_capacity),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.market.tick_interval(), Duration::from_secs(60));
        assert_eq!(config.mock.fetch_latency(), Duration::from_millis(500));
        assert_eq!(config.mock.action_latency(), Duration::from_millis(1000));
        assert_eq!(config.session.allowed_email_domain, "@thapar.edu");
        assert!(config.market.utc_offset_minutes.is_none());
    }

    #[test]
    fn test_tick_interval_never_zero() {
        let market = MarketConfig {
            tick_secs: 0,
            utc_offset_minutes: None,
        };
        assert_eq!(market.tick_interval(), Duration::from_secs(1));
    }
}
