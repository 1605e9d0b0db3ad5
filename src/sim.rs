//! Simuliertes Feld für den Betrieb ohne Hardware.
//!
//! Random walk with drift for soil moisture, a tank that drains while the
//! pump runs, rain episodes and the occasional climate sensor dropout. The
//! simulated relay feeds back into the field, so the controller closes the
//! loop against it exactly as it would against the real pump.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::SensorConfig;
use crate::control::Relay;
use crate::sensor::{Climate, SensorBus, SensorError};

const ADC_MAX: f64 = 4095.0;

/// N(0,1) nach Irwin-Hall, reicht für Rauschen
fn std_normal(rng: &mut StdRng) -> f64 {
    (0..12).map(|_| rng.gen::<f64>()).sum::<f64>() - 6.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Scenario {
    /// Mid-range soil drifting towards dry; the pump has work to do.
    Drying,
    /// Hovers in the hysteresis band, nothing should switch.
    Stable,
    /// Frequent rain episodes.
    Rainy,
    /// Tank starts below the dry-run limit.
    DryTank,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scenario::Drying => "drying",
            Scenario::Stable => "stable",
            Scenario::Rainy => "rainy",
            Scenario::DryTank => "dry-tank",
        })
    }
}

struct Profile {
    /// Startwerte als Anteil 0 = nass/voll .. 1 = trocken/leer
    soil_start: f64,
    tank_start: f64,
    drift: f64,
    walk_sigma: f64,
    rain_start_prob: f64,
    rain_stop_prob: f64,
    fault_prob: f64,
}

impl Scenario {
    fn profile(self) -> Profile {
        match self {
            Scenario::Drying => Profile {
                soil_start: 0.5,
                tank_start: 0.2,
                drift: 12.0,
                walk_sigma: 10.0,
                rain_start_prob: 0.002,
                rain_stop_prob: 0.2,
                fault_prob: 0.02,
            },
            Scenario::Stable => Profile {
                soil_start: 0.45,
                tank_start: 0.1,
                drift: 0.0,
                walk_sigma: 4.0,
                rain_start_prob: 0.0,
                rain_stop_prob: 1.0,
                fault_prob: 0.0,
            },
            Scenario::Rainy => Profile {
                soil_start: 0.6,
                tank_start: 0.3,
                drift: 8.0,
                walk_sigma: 10.0,
                rain_start_prob: 0.1,
                rain_stop_prob: 0.05,
                fault_prob: 0.02,
            },
            Scenario::DryTank => Profile {
                soil_start: 0.9,
                tank_start: 0.9,
                drift: 8.0,
                walk_sigma: 10.0,
                rain_start_prob: 0.0,
                rain_stop_prob: 1.0,
                fault_prob: 0.02,
            },
        }
    }
}

pub struct SimField {
    rng: StdRng,
    profile: Profile,
    soil_dry: f64,
    soil_wet: f64,
    tank_empty: f64,
    tank_full: f64,
    soil: f64,
    tank: f64,
    raining: bool,
    temp_c: f64,
    humidity_pct: f64,
    pump_on: bool,
    ticks: u64,
}

impl SimField {
    /// Rohwert-Grenzen kommen aus der Sensor-Kalibrierung, damit die
    /// Prozentwerte im Reader plausibel landen.
    pub fn new(scenario: Scenario, cfg: &SensorConfig, seed: u64) -> Self {
        let profile = scenario.profile();
        let (soil_dry, soil_wet) = (f64::from(cfg.soil_dry_raw), f64::from(cfg.soil_wet_raw));
        let (tank_empty, tank_full) = (f64::from(cfg.tank_empty_raw), f64::from(cfg.tank_full_raw));
        Self {
            rng: StdRng::seed_from_u64(seed),
            soil: soil_wet + profile.soil_start * (soil_dry - soil_wet),
            tank: tank_full + profile.tank_start * (tank_empty - tank_full),
            profile,
            soil_dry,
            soil_wet,
            tank_empty,
            tank_full,
            raining: false,
            temp_c: 28.0,
            humidity_pct: 65.0,
            pump_on: false,
            ticks: 0,
        }
    }

    /// Advances the field by one poll interval.
    pub fn tick(&mut self) {
        self.ticks += 1;
        let p = &self.profile;

        self.raining = if self.raining {
            !self.rng.gen_bool(p.rain_stop_prob.clamp(0.0, 1.0))
        } else {
            self.rng.gen_bool(p.rain_start_prob.clamp(0.0, 1.0))
        };

        // Boden: Verdunstung + Zufall, Pumpe/Regen machen nass
        let walk = p.walk_sigma * std_normal(&mut self.rng);
        let mut delta = p.drift + walk;
        if self.pump_on {
            delta -= 60.0;
        }
        if self.raining {
            delta -= 25.0;
        }
        let span = self.soil_dry - self.soil_wet;
        self.soil = (self.soil + delta).clamp(self.soil_wet - 0.1 * span, self.soil_dry + 0.1 * span);

        if self.pump_on {
            self.tank = (self.tank + 15.0).min(self.tank_empty + 100.0);
        }
        if self.raining {
            // Regenrinne füllt langsam nach
            self.tank = (self.tank - 5.0).max(self.tank_full - 100.0);
        }

        self.temp_c = (self.temp_c + 0.1 * std_normal(&mut self.rng) + 0.01 * (28.0 - self.temp_c)).clamp(5.0, 48.0);
        let target_rh = if self.raining { 95.0 } else { 60.0 };
        self.humidity_pct = (self.humidity_pct + 0.05 * (target_rh - self.humidity_pct)).clamp(5.0, 100.0);
    }

    fn adc(&mut self, base: f64, noise: f64) -> u16 {
        let v = base + noise * std_normal(&mut self.rng);
        v.round().clamp(0.0, ADC_MAX) as u16
    }
}

/// Geteilter Zugriff für Bus und Relais.
#[derive(Clone)]
pub struct SimHandle(Arc<Mutex<SimField>>);

impl SimHandle {
    pub fn new(field: SimField) -> Self {
        Self(Arc::new(Mutex::new(field)))
    }

    pub fn lock(&self) -> MutexGuard<'_, SimField> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn bus(&self) -> SimBus {
        SimBus(self.clone())
    }

    pub fn relay(&self) -> SimRelay {
        SimRelay(self.clone())
    }
}

/// Sensor side. `climate()` is read first in every poll and advances the
/// field by one tick.
pub struct SimBus(SimHandle);

impl SensorBus for SimBus {
    fn soil_raw(&mut self) -> Result<u16, SensorError> {
        let mut f = self.0.lock();
        let base = f.soil;
        Ok(f.adc(base, 15.0))
    }

    fn tank_raw(&mut self) -> Result<u16, SensorError> {
        let mut f = self.0.lock();
        let base = f.tank;
        Ok(f.adc(base, 10.0))
    }

    fn rain_raw(&mut self) -> Result<u16, SensorError> {
        let mut f = self.0.lock();
        // Regensensor zieht bei Nässe nach unten
        let base = if f.raining { 20.0 } else { 3200.0 };
        Ok(f.adc(base, 5.0))
    }

    fn climate(&mut self) -> Result<Climate, SensorError> {
        let mut f = self.0.lock();
        f.tick();
        let fault_prob = f.profile.fault_prob;
        if f.rng.gen_bool(fault_prob) {
            return Err(SensorError::Timeout);
        }
        Ok(Climate {
            temp_c: f.temp_c as f32,
            humidity_pct: f.humidity_pct as f32,
        })
    }
}

pub struct SimRelay(SimHandle);

impl Relay for SimRelay {
    fn set(&mut self, on: bool) -> Result<()> {
        self.0.lock().pump_on = on;
        Ok(())
    }
}
