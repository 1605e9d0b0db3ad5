use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SensorConfig;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SensorError {
    #[error("sensor bus timeout")]
    Timeout,
    #[error("sensor read failed")]
    ReadFailed,
    #[error("sensor returned invalid data")]
    InvalidData,
}

/// Wie ein Regen-Rohwert zu deuten ist.
///
/// The resistive rain module reads low when wet; its comparator output is a
/// digital 0 when wet (threshold 1). Sensors that drive high on rain use
/// `ActiveAbove`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RainPolarity {
    /// raining when `raw < threshold`
    ActiveBelow,
    /// raining when `raw >= threshold`
    ActiveAbove,
}

impl RainPolarity {
    pub fn is_raining(self, raw: u16, threshold: u16) -> bool {
        match self {
            RainPolarity::ActiveBelow => raw < threshold,
            RainPolarity::ActiveAbove => raw >= threshold,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Climate {
    pub temp_c: f32,
    pub humidity_pct: f32,
}

/// One normalized reading of every field sensor.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorSample {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub soil_raw: u16,
    /// 0..=100, clamped
    pub soil_pct: u8,
    pub tank_raw: u16,
    /// 0..=100, clamped
    pub tank_pct: u8,
    pub rain_active: bool,
}

/// Rohwert-Quelle. Die Hardware (oder Simulation) liefert nur ADC-Werte,
/// Normierung passiert im [`SensorReader`].
pub trait SensorBus {
    fn soil_raw(&mut self) -> Result<u16, SensorError>;
    fn tank_raw(&mut self) -> Result<u16, SensorError>;
    fn rain_raw(&mut self) -> Result<u16, SensorError>;
    fn climate(&mut self) -> Result<Climate, SensorError>;
}

/// Maps a raw reading onto 0..=100 where `empty_raw` (the high end) is 0 %
/// and `full_raw` (the low end) is 100 %.
pub fn scale_percent(raw: u16, empty_raw: u16, full_raw: u16) -> u8 {
    if raw >= empty_raw {
        return 0;
    }
    if raw <= full_raw {
        return 100;
    }
    let span = f32::from(empty_raw - full_raw);
    let pct = (f32::from(empty_raw - raw) / span * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Mittelwert über `n` Messungen; fehlerhafte Samples werden verworfen.
fn average<B: SensorBus>(
    bus: &mut B,
    n: usize,
    read: fn(&mut B) -> Result<u16, SensorError>,
) -> Result<u16, SensorError> {
    let mut acc: u32 = 0;
    let mut cnt: u32 = 0;
    let mut last_err = SensorError::ReadFailed;
    for _ in 0..n.max(1) {
        match read(bus) {
            Ok(v) => {
                acc += u32::from(v);
                cnt += 1;
            }
            Err(e) => last_err = e,
        }
    }
    if cnt == 0 {
        return Err(last_err);
    }
    Ok((acc / cnt) as u16)
}

/// Decodes a 6-byte SHT3x measurement frame (T msb, T lsb, crc, RH msb, RH lsb, crc).
pub fn decode_sht3x(frame: &[u8; 6]) -> Result<Climate, SensorError> {
    if crc8(&frame[0..2]) != frame[2] || crc8(&frame[3..5]) != frame[5] {
        return Err(SensorError::InvalidData);
    }
    let t_raw = f32::from(u16::from_be_bytes([frame[0], frame[1]]));
    let h_raw = f32::from(u16::from_be_bytes([frame[3], frame[4]]));
    Ok(Climate {
        temp_c: -45.0 + 175.0 * t_raw / 65_535.0,
        humidity_pct: (100.0 * h_raw / 65_535.0).clamp(0.0, 100.0),
    })
}

// CRC-8, Polynom 0x31, Init 0xFF (Sensirion)
fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &b in data {
        crc ^= b;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x31 } else { crc << 1 };
        }
    }
    crc
}

/// Turns raw bus readings into a [`SensorSample`]. Never fails: a faulty
/// channel falls back to its last good raw value, or to a value that keeps
/// the pump off when there is none yet.
pub struct SensorReader<B> {
    bus: B,
    cfg: SensorConfig,
    last_soil: Option<u16>,
    last_tank: Option<u16>,
    last_rain: Option<u16>,
}

impl<B: SensorBus> SensorReader<B> {
    pub fn new(bus: B, cfg: SensorConfig) -> Self {
        Self {
            bus,
            cfg,
            last_soil: None,
            last_tank: None,
            last_rain: None,
        }
    }

    pub fn read(&mut self) -> SensorSample {
        let n = self.cfg.samples_per_read;

        let climate = match self.bus.climate() {
            Ok(c) if c.temp_c.is_finite() && c.humidity_pct.is_finite() => c,
            res => {
                let err = res.err().unwrap_or(SensorError::InvalidData);
                log::warn!("climate sensor: {err}, using defaults");
                Climate {
                    temp_c: self.cfg.default_temp_c,
                    humidity_pct: self.cfg.default_humidity_pct,
                }
            }
        };

        let soil_raw = match average(&mut self.bus, n, B::soil_raw) {
            Ok(v) => *self.last_soil.insert(v),
            Err(e) => {
                log::warn!("soil sensor: {e}");
                self.last_soil.unwrap_or(self.cfg.soil_wet_raw)
            }
        };
        let tank_raw = match average(&mut self.bus, n, B::tank_raw) {
            Ok(v) => *self.last_tank.insert(v),
            Err(e) => {
                log::warn!("tank sensor: {e}");
                self.last_tank.unwrap_or(self.cfg.tank_empty_raw)
            }
        };
        let rain_active = match average(&mut self.bus, n, B::rain_raw) {
            Ok(v) => {
                self.last_rain = Some(v);
                self.cfg.rain_polarity.is_raining(v, self.cfg.rain_threshold_raw)
            }
            Err(e) => {
                log::warn!("rain sensor: {e}");
                self.last_rain
                    .map(|v| self.cfg.rain_polarity.is_raining(v, self.cfg.rain_threshold_raw))
                    .unwrap_or(false)
            }
        };

        SensorSample {
            temperature_c: climate.temp_c,
            humidity_pct: climate.humidity_pct,
            soil_raw,
            soil_pct: scale_percent(soil_raw, self.cfg.soil_dry_raw, self.cfg.soil_wet_raw),
            tank_raw,
            tank_pct: scale_percent(tank_raw, self.cfg.tank_empty_raw, self.cfg.tank_full_raw),
            rain_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::VecDeque;

    /// Liefert vorgegebene Werte; leere Queue = Lesefehler.
    #[derive(Default)]
    struct ScriptedBus {
        soil: VecDeque<Result<u16, SensorError>>,
        tank: VecDeque<Result<u16, SensorError>>,
        rain: VecDeque<Result<u16, SensorError>>,
        climate: VecDeque<Result<Climate, SensorError>>,
    }

    impl SensorBus for ScriptedBus {
        fn soil_raw(&mut self) -> Result<u16, SensorError> {
            self.soil.pop_front().unwrap_or(Err(SensorError::Timeout))
        }
        fn tank_raw(&mut self) -> Result<u16, SensorError> {
            self.tank.pop_front().unwrap_or(Err(SensorError::Timeout))
        }
        fn rain_raw(&mut self) -> Result<u16, SensorError> {
            self.rain.pop_front().unwrap_or(Err(SensorError::Timeout))
        }
        fn climate(&mut self) -> Result<Climate, SensorError> {
            self.climate.pop_front().unwrap_or(Err(SensorError::Timeout))
        }
    }

    fn single_sample_cfg() -> SensorConfig {
        SensorConfig {
            samples_per_read: 1,
            ..SensorConfig::default()
        }
    }

    #[test]
    fn soil_thresholds_and_midpoint() {
        assert_eq!(scale_percent(3000, 3000, 1500), 0);
        assert_eq!(scale_percent(4095, 3000, 1500), 0);
        assert_eq!(scale_percent(1500, 3000, 1500), 100);
        assert_eq!(scale_percent(0, 3000, 1500), 100);
        assert_eq!(scale_percent(2250, 3000, 1500), 50);
    }

    #[test]
    fn percent_is_bounded_and_non_increasing() {
        let mut prev = 100u8;
        for raw in 0..=4095u16 {
            let pct = scale_percent(raw, 3000, 1500);
            assert!(pct <= 100);
            assert!(pct <= prev, "raw {raw}: {pct} > {prev}");
            prev = pct;
        }
    }

    #[test]
    fn tank_uses_its_own_thresholds() {
        assert_eq!(scale_percent(800, 3000, 800), 100);
        assert_eq!(scale_percent(1900, 3000, 800), 50);
        assert_eq!(scale_percent(3000, 3000, 800), 0);
    }

    #[test]
    fn rain_polarity_is_explicit() {
        assert!(RainPolarity::ActiveBelow.is_raining(20, 50));
        assert!(!RainPolarity::ActiveBelow.is_raining(50, 50));
        // digitaler Komparator: 0 = nass
        assert!(RainPolarity::ActiveBelow.is_raining(0, 1));
        assert!(!RainPolarity::ActiveBelow.is_raining(1, 1));
        assert!(RainPolarity::ActiveAbove.is_raining(1, 1));
        assert!(!RainPolarity::ActiveAbove.is_raining(0, 1));
    }

    #[test]
    fn reads_and_averages_channels() {
        let bus = ScriptedBus {
            soil: VecDeque::from([Ok(2200), Err(SensorError::ReadFailed), Ok(2300)]),
            tank: VecDeque::from([Ok(800), Ok(800), Ok(800)]),
            rain: VecDeque::from([Ok(4000), Ok(4000), Ok(4000)]),
            climate: VecDeque::from([Ok(Climate {
                temp_c: 31.5,
                humidity_pct: 40.0,
            })]),
        };
        let mut reader = SensorReader::new(bus, SensorConfig::default());
        let s = reader.read();
        assert_eq!(s.soil_raw, 2250);
        assert_eq!(s.soil_pct, 50);
        assert_eq!(s.tank_pct, 100);
        assert!(!s.rain_active);
        assert_relative_eq!(s.temperature_c, 31.5);
        assert_relative_eq!(s.humidity_pct, 40.0);
    }

    #[test]
    fn climate_fault_uses_defaults() {
        let bus = ScriptedBus {
            soil: VecDeque::from([Ok(2250)]),
            tank: VecDeque::from([Ok(800)]),
            rain: VecDeque::from([Ok(10)]),
            climate: VecDeque::from([Err(SensorError::Timeout)]),
        };
        let mut reader = SensorReader::new(bus, single_sample_cfg());
        let s = reader.read();
        assert_relative_eq!(s.temperature_c, 28.0);
        assert_relative_eq!(s.humidity_pct, 65.0);
        assert!(s.rain_active);
    }

    #[test]
    fn nan_climate_counts_as_fault() {
        let bus = ScriptedBus {
            climate: VecDeque::from([Ok(Climate {
                temp_c: f32::NAN,
                humidity_pct: 50.0,
            })]),
            ..ScriptedBus::default()
        };
        let mut reader = SensorReader::new(bus, single_sample_cfg());
        assert_relative_eq!(reader.read().temperature_c, 28.0);
    }

    #[test]
    fn channel_fault_keeps_last_good_value() {
        let bus = ScriptedBus {
            soil: VecDeque::from([Ok(2250)]),
            tank: VecDeque::from([Ok(1900)]),
            rain: VecDeque::from([Ok(10)]),
            ..ScriptedBus::default()
        };
        let mut reader = SensorReader::new(bus, single_sample_cfg());
        let first = reader.read();
        let second = reader.read();
        assert_eq!(second.soil_pct, first.soil_pct);
        assert_eq!(second.tank_pct, 50);
        assert!(second.rain_active);
    }

    #[test]
    fn fault_without_history_keeps_pump_off() {
        let mut reader = SensorReader::new(ScriptedBus::default(), single_sample_cfg());
        let s = reader.read();
        // nass + leerer Tank: weder Automatik noch Trockenlauf
        assert_eq!(s.soil_pct, 100);
        assert_eq!(s.tank_pct, 0);
        assert!(!s.rain_active);
    }

    #[test]
    fn sht3x_frame_decodes() {
        // Datenblatt-Beispiel: 0xBEEF -> CRC 0x92
        assert_eq!(crc8(&[0xBE, 0xEF]), 0x92);
        let t = 0x6666u16.to_be_bytes();
        let h = 0x8000u16.to_be_bytes();
        let frame = [t[0], t[1], crc8(&t), h[0], h[1], crc8(&h)];
        let c = decode_sht3x(&frame).unwrap();
        assert_relative_eq!(c.temp_c, 25.0, epsilon = 0.01);
        assert_relative_eq!(c.humidity_pct, 50.0, epsilon = 0.01);
    }

    #[test]
    fn sht3x_rejects_bad_crc() {
        let frame = [0x66, 0x66, 0x00, 0x80, 0x00, 0x00];
        assert_eq!(decode_sht3x(&frame), Err(SensorError::InvalidData));
    }
}
