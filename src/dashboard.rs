//! Cloud-Dashboard (virtuelle Pins). Der Dienst selbst ist extern, hier nur
//! die Schnittstelle: Werte raus per `virtual_write`, zwei Signale rein.

use std::fmt;

use crate::config::ControlConfig;
use crate::sensor::SensorSample;

/// Virtual pin numbers of the dashboard widgets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VirtualPin {
    SoilValue = 0,
    SoilMessage = 1,
    TankValue = 2,
    TankMessage = 3,
    RainMessage = 4,
    Temperature = 5,
    Humidity = 6,
    Pump = 7,
}

impl fmt::Display for VirtualPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", *self as u8)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DashValue {
    Int(i64),
    Float(f32),
    Text(&'static str),
}

impl fmt::Display for DashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashValue::Int(v) => write!(f, "{v}"),
            DashValue::Float(v) => write!(f, "{v:.1}"),
            DashValue::Text(s) => f.write_str(s),
        }
    }
}

pub trait DashboardSink: Send {
    fn virtual_write(&mut self, pin: VirtualPin, value: DashValue);
}

/// Inbound signals from the dashboard app.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DashboardSignal {
    /// V8: 1 = auto
    Mode(bool),
    /// V7: momentary pump button
    Pump(bool),
}

/// Schreibt nur ins Log; Standard wenn kein Dashboard angebunden ist.
#[derive(Debug, Default)]
pub struct LogDashboard;

impl DashboardSink for LogDashboard {
    fn virtual_write(&mut self, pin: VirtualPin, value: DashValue) {
        log::debug!("dashboard {pin} <- {value}");
    }
}

pub fn soil_message(sample: &SensorSample, cfg: &ControlConfig) -> &'static str {
    if sample.soil_pct < cfg.soil_dry_pct {
        "Soil Dry"
    } else if sample.soil_pct > cfg.soil_wet_pct {
        "Soil Wet"
    } else {
        "Soil Moist"
    }
}

pub fn tank_message(sample: &SensorSample, cfg: &ControlConfig) -> &'static str {
    if sample.tank_pct < cfg.tank_critical_pct {
        "Tank Low"
    } else {
        "Tank OK"
    }
}

pub fn rain_message(sample: &SensorSample) -> &'static str {
    if sample.rain_active {
        "Rain"
    } else {
        "No Rain"
    }
}

/// Alle Messwerte eines Zyklus in einem Rutsch.
pub fn publish(
    sink: &mut dyn DashboardSink,
    sample: &SensorSample,
    relay_on: bool,
    cfg: &ControlConfig,
) {
    sink.virtual_write(VirtualPin::SoilValue, DashValue::Int(sample.soil_pct.into()));
    sink.virtual_write(VirtualPin::SoilMessage, DashValue::Text(soil_message(sample, cfg)));
    sink.virtual_write(VirtualPin::TankValue, DashValue::Int(sample.tank_pct.into()));
    sink.virtual_write(VirtualPin::TankMessage, DashValue::Text(tank_message(sample, cfg)));
    sink.virtual_write(VirtualPin::RainMessage, DashValue::Text(rain_message(sample)));
    sink.virtual_write(VirtualPin::Temperature, DashValue::Float(sample.temperature_c));
    sink.virtual_write(VirtualPin::Humidity, DashValue::Float(sample.humidity_pct));
    sink.virtual_write(VirtualPin::Pump, DashValue::Int(relay_on.into()));
}
