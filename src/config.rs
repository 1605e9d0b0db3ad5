use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::sensor::RainPolarity;

/*** Hardware & Sensor ***/
pub const I2C_HZ: u32 = 100_000;
pub const I2C_TIMEOUT_MS: u32 = 50;
pub const CLIMATE_ADDR: u8 = 0x44; // SHT31, ADDR-Pin auf GND

// Relais-Board schaltet bei LOW am IN-Pin
pub const RELAY_ACTIVE_LOW: bool = true;

// ADC 12 bit @ 11 dB: höherer Rohwert = trockener Boden / leererer Tank
pub const SOIL_DRY_RAW: u16 = 3000;
pub const SOIL_WET_RAW: u16 = 1500;
pub const TANK_EMPTY_RAW: u16 = 3000;
pub const TANK_FULL_RAW: u16 = 800;

// Analoges Regenmodul: nass = kleiner Rohwert
pub const RAIN_THRESHOLD_RAW: u16 = 50;
pub const RAIN_POLARITY: RainPolarity = RainPolarity::ActiveBelow;

/// Mittelung pro Kanal und Lesezyklus
pub const SAMPLES_PER_READ: usize = 3;

// Ersatzwerte wenn der Klimasensor nicht antwortet
pub const DEFAULT_TEMP_C: f32 = 28.0;
pub const DEFAULT_HUMIDITY_PCT: f32 = 65.0;

/*** Automatik ***/
pub const SOIL_DRY_PCT: u8 = 30; // Pumpe an wenn < 30 %
pub const SOIL_WET_PCT: u8 = 80; // Pumpe aus wenn > 80 %
pub const TANK_CRITICAL_PCT: u8 = 20; // Trockenlaufschutz

/*** Manuell ***/
pub const FORCE_WATER_SECS: u64 = 5;
pub const MANUAL_RUN_SECS: u64 = 10;

/*** Loop & HTTP ***/
pub const POLL_INTERVAL_MS: u64 = 1000;
pub const HTTP_IO_TIMEOUT_MS: u64 = 2000;
pub const HTTP_BIND: &str = "0.0.0.0:8080";
pub const LOG_CAPACITY: usize = 10;

// WLAN-Zugangsdaten kommen zur Build-Zeit aus der Umgebung
pub const WIFI_SSID: &str = match option_env!("KISAN_WIFI_SSID") {
    Some(s) => s,
    None => "",
};
pub const WIFI_PASS: &str = match option_env!("KISAN_WIFI_PASS") {
    Some(s) => s,
    None => "",
};
pub const AP_SSID: &str = "KisanGuard-AP";
pub const AP_PASS: &str = "12345678";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{name}: {low} must be below {high}")]
    Order {
        name: &'static str,
        low: u16,
        high: u16,
    },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("{name} = {value} is outside 0..=100")]
    Percent { name: &'static str, value: u8 },
    #[error("translation {language}: key `{key}` is empty")]
    Translation {
        language: &'static str,
        key: &'static str,
    },
}

/// Rohwert-Schwellen und Fallbacks des Sensor-Lesers.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    pub soil_dry_raw: u16,
    pub soil_wet_raw: u16,
    pub tank_empty_raw: u16,
    pub tank_full_raw: u16,
    pub rain_threshold_raw: u16,
    pub rain_polarity: RainPolarity,
    pub samples_per_read: usize,
    pub default_temp_c: f32,
    pub default_humidity_pct: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            soil_dry_raw: SOIL_DRY_RAW,
            soil_wet_raw: SOIL_WET_RAW,
            tank_empty_raw: TANK_EMPTY_RAW,
            tank_full_raw: TANK_FULL_RAW,
            rain_threshold_raw: RAIN_THRESHOLD_RAW,
            rain_polarity: RAIN_POLARITY,
            samples_per_read: SAMPLES_PER_READ,
            default_temp_c: DEFAULT_TEMP_C,
            default_humidity_pct: DEFAULT_HUMIDITY_PCT,
        }
    }
}

/// Schaltschwellen und Laufzeiten des Bewässerungsautomaten.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    pub soil_dry_pct: u8,
    pub soil_wet_pct: u8,
    pub tank_critical_pct: u8,
    pub force_water_secs: u64,
    pub manual_run_secs: u64,
    pub log_capacity: usize,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            soil_dry_pct: SOIL_DRY_PCT,
            soil_wet_pct: SOIL_WET_PCT,
            tank_critical_pct: TANK_CRITICAL_PCT,
            force_water_secs: FORCE_WATER_SECS,
            manual_run_secs: MANUAL_RUN_SECS,
            log_capacity: LOG_CAPACITY,
        }
    }
}

impl ControlConfig {
    pub fn force_water(&self) -> Duration {
        Duration::from_secs(self.force_water_secs)
    }

    pub fn manual_run(&self) -> Duration {
        Duration::from_secs(self.manual_run_secs)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub sensor: SensorConfig,
    pub control: ControlConfig,
    pub node: NodeConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    pub poll_interval_ms: u64,
    pub http_timeout_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: POLL_INTERVAL_MS,
            http_timeout_ms: HTTP_IO_TIMEOUT_MS,
        }
    }
}

impl NodeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

impl Config {
    /// Reads a JSON config file; missing keys keep their compiled-in defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.sensor;
        if s.soil_wet_raw >= s.soil_dry_raw {
            return Err(ConfigError::Order {
                name: "soil_wet_raw/soil_dry_raw",
                low: s.soil_wet_raw,
                high: s.soil_dry_raw,
            });
        }
        if s.tank_full_raw >= s.tank_empty_raw {
            return Err(ConfigError::Order {
                name: "tank_full_raw/tank_empty_raw",
                low: s.tank_full_raw,
                high: s.tank_empty_raw,
            });
        }
        if s.samples_per_read == 0 {
            return Err(ConfigError::Zero("samples_per_read"));
        }

        let c = &self.control;
        for (name, value) in [
            ("soil_dry_pct", c.soil_dry_pct),
            ("soil_wet_pct", c.soil_wet_pct),
            ("tank_critical_pct", c.tank_critical_pct),
        ] {
            if value > 100 {
                return Err(ConfigError::Percent { name, value });
            }
        }
        if c.soil_dry_pct >= c.soil_wet_pct {
            return Err(ConfigError::Order {
                name: "soil_dry_pct/soil_wet_pct",
                low: c.soil_dry_pct.into(),
                high: c.soil_wet_pct.into(),
            });
        }
        if c.force_water_secs == 0 {
            return Err(ConfigError::Zero("force_water_secs"));
        }
        if c.manual_run_secs == 0 {
            return Err(ConfigError::Zero("manual_run_secs"));
        }
        if c.log_capacity == 0 {
            return Err(ConfigError::Zero("log_capacity"));
        }
        if self.node.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("poll_interval_ms"));
        }
        if self.node.http_timeout_ms == 0 {
            return Err(ConfigError::Zero("http_timeout_ms"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: Config = serde_json::from_str(
            r#"{ "sensor": { "rain_polarity": "active_above", "rain_threshold_raw": 1 },
                 "control": { "force_water_secs": 8 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.sensor.rain_polarity, RainPolarity::ActiveAbove);
        assert_eq!(cfg.sensor.rain_threshold_raw, 1);
        assert_eq!(cfg.sensor.soil_dry_raw, SOIL_DRY_RAW);
        assert_eq!(cfg.control.force_water(), Duration::from_secs(8));
        assert_eq!(cfg.control.manual_run_secs, MANUAL_RUN_SECS);
        cfg.validate().unwrap();
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<Config, _> = serde_json::from_str(r#"{ "sensor": { "soil_raw": 1 } }"#);
        assert!(res.is_err());
    }

    #[test]
    fn inverted_soil_thresholds_fail_validation() {
        let mut cfg = Config::default();
        cfg.sensor.soil_wet_raw = 3200;
        assert!(matches!(cfg.validate(), Err(ConfigError::Order { .. })));
    }

    #[test]
    fn zero_force_duration_fails_validation() {
        let mut cfg = Config::default();
        cfg.control.force_water_secs = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Zero("force_water_secs"))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/kisan.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
