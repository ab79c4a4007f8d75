use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use game::{Rates, Tuning};
use net::rate_limiter::LimiterConfig;
use net::server::NetConfig;
use persistence::WalSyncMode;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub name: String,
    pub id: u32,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: "mmo-world".to_string(),
            id: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: "data/world.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    pub bind_address: String,
    pub tick_period_ms: u64,
    pub in_queue_size: usize,
    pub out_queue_size: usize,
    pub max_packets_per_tick: usize,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:7001".to_string(),
            tick_period_ms: 200,
            in_queue_size: 128,
            out_queue_size: 2048,
            max_packets_per_tick: 32,
            read_timeout_secs: 60,
            write_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceSection {
    /// Batch save cadence; 1500 ticks is five minutes at 200ms/tick.
    pub batch_interval_ticks: u64,
    /// "sync" (crash-safe, default) or "async".
    pub wal_sync_mode: String,
}

impl Default for PersistenceSection {
    fn default() -> Self {
        Self {
            batch_interval_ticks: 1500,
            wal_sync_mode: "sync".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RatesSection {
    pub exp_rate: f64,
    pub drop_rate: f64,
    pub gold_rate: f64,
    pub lawful_rate: f64,
}

impl Default for RatesSection {
    fn default() -> Self {
        Self {
            exp_rate: 1.0,
            drop_rate: 1.0,
            gold_rate: 1.0,
            lawful_rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnchantSection {
    /// Success rate above the safe enchant level.
    pub weapon_chance: f64,
    pub armor_chance: f64,
}

impl Default for EnchantSection {
    fn default() -> Self {
        Self {
            weapon_chance: 0.68,
            armor_chance: 0.52,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldSection {
    pub weather_enabled: bool,
    pub ground_item_expiry_ticks: u64,
    pub party_refresh_ticks: u64,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            weather_enabled: true,
            ground_item_expiry_ticks: 300,
            party_refresh_ticks: 25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameplaySection {
    pub initial_food: i32,
    pub max_exclude_list: usize,
}

impl Default for GameplaySection {
    fn default() -> Self {
        Self {
            initial_food: 40,
            max_exclude_list: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    pub enabled: bool,
    pub login_attempts_per_minute: u32,
    pub packets_per_second: u32,
    pub max_connections_total: usize,
    pub max_connections_per_ip: usize,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            enabled: true,
            login_attempts_per_minute: 10,
            packets_per_second: 60,
            max_connections_total: 1000,
            max_connections_per_ip: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub dir: String,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            dir: "data/tables".to_string(),
        }
    }
}

/// Top-level configuration, loaded once at boot into an immutable
/// snapshot; changes require a restart.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub network: NetworkSection,
    pub persistence: PersistenceSection,
    pub rates: RatesSection,
    pub enchant: EnchantSection,
    pub world: WorldSection,
    pub gameplay: GameplaySection,
    pub logging: LoggingSection,
    pub rate_limit: RateLimitSection,
    pub data: DataSection,
}

impl Config {
    /// Load from an optional TOML file; missing path or file falls back to
    /// defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match config_path {
            Some(path) if Path::new(path).exists() => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };
        Ok(config)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.network.tick_period_ms.max(1))
    }

    pub fn to_net_config(&self) -> NetConfig {
        NetConfig {
            read_timeout: Duration::from_secs(self.network.read_timeout_secs),
            write_timeout: Duration::from_secs(self.network.write_timeout_secs),
            out_queue_size: self.network.out_queue_size.max(1),
            packets_per_second: if self.rate_limit.enabled {
                self.rate_limit.packets_per_second
            } else {
                0
            },
        }
    }

    pub fn to_limiter_config(&self) -> LimiterConfig {
        LimiterConfig {
            enabled: self.rate_limit.enabled,
            max_connections_total: self.rate_limit.max_connections_total,
            max_connections_per_ip: self.rate_limit.max_connections_per_ip,
            packets_per_second: self.rate_limit.packets_per_second,
            login_attempts_per_minute: self.rate_limit.login_attempts_per_minute,
        }
    }

    pub fn to_tuning(&self) -> Tuning {
        Tuning {
            ground_item_expiry_ticks: self.world.ground_item_expiry_ticks,
            party_refresh_ticks: self.world.party_refresh_ticks,
            batch_interval_ticks: self.persistence.batch_interval_ticks,
            initial_food: self.gameplay.initial_food,
            max_exclude_list: self.gameplay.max_exclude_list,
        }
    }

    pub fn to_rates(&self) -> Rates {
        Rates {
            exp_rate: self.rates.exp_rate,
            drop_rate: self.rates.drop_rate,
            gold_rate: self.rates.gold_rate,
            lawful_rate: self.rates.lawful_rate,
        }
    }

    pub fn wal_sync_mode(&self) -> WalSyncMode {
        WalSyncMode::parse(&self.persistence.wal_sync_mode)
    }

    pub fn login_attempts_per_minute(&self) -> u32 {
        if self.rate_limit.enabled {
            self.rate_limit.login_attempts_per_minute
        } else {
            0
        }
    }
}

/// Parse CLI arguments: `--config <path>`.
pub fn parse_cli_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if let Some(val) = args.get(i + 1) {
                    config_path = Some(val.as_str());
                    i += 2;
                } else {
                    eprintln!("--config requires a path argument");
                    std::process::exit(1);
                }
            }
            other => {
                eprintln!("Unknown argument: {other}");
                std::process::exit(1);
            }
        }
    }

    match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.network.bind_address, "0.0.0.0:7001");
        assert_eq!(config.network.tick_period_ms, 200);
        assert_eq!(config.network.in_queue_size, 128);
        assert_eq!(config.network.out_queue_size, 2048);
        assert_eq!(config.network.max_packets_per_tick, 32);
        assert_eq!(config.network.read_timeout_secs, 60);
        assert_eq!(config.network.write_timeout_secs, 10);
        assert_eq!(config.persistence.batch_interval_ticks, 1500);
        assert_eq!(config.persistence.wal_sync_mode, "sync");
        assert_eq!(config.world.ground_item_expiry_ticks, 300);
        assert_eq!(config.rate_limit.packets_per_second, 60);
        assert_eq!(config.rate_limit.login_attempts_per_minute, 10);
        assert!((config.enchant.weapon_chance - 0.68).abs() < 1e-9);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn load_none_returns_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.network.tick_period_ms, 200);
    }

    #[test]
    fn load_nonexistent_file_returns_defaults() {
        let config = Config::load(Some("/tmp/nonexistent_world_config.toml")).unwrap();
        assert_eq!(config.server.id, 1);
    }

    #[test]
    fn load_partial_toml_keeps_other_defaults() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
[network]
tick_period_ms = 100
max_packets_per_tick = 16

[persistence]
wal_sync_mode = "async"

[rates]
exp_rate = 3.0
"#
        )
        .unwrap();

        let config = Config::load(Some(f.path().to_str().unwrap())).unwrap();
        assert_eq!(config.network.tick_period_ms, 100);
        assert_eq!(config.network.max_packets_per_tick, 16);
        assert_eq!(config.network.in_queue_size, 128); // untouched
        assert_eq!(config.wal_sync_mode(), WalSyncMode::Async);
        assert!((config.rates.exp_rate - 3.0).abs() < 1e-9);
        assert!((config.rates.drop_rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disabled_rate_limit_zeroes_throttles() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "[rate_limit]\nenabled = false\n").unwrap();
        let config = Config::load(Some(f.path().to_str().unwrap())).unwrap();
        assert_eq!(config.to_net_config().packets_per_second, 0);
        assert_eq!(config.login_attempts_per_minute(), 0);
    }

    #[test]
    fn tick_period_conversion() {
        let config = Config::default();
        assert_eq!(config.tick_period(), Duration::from_millis(200));
    }
}
