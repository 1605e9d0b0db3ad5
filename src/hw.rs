use anyhow::Result;
use esp_idf_hal::adc::attenuation::DB_11;
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::adc::ADC1;
use esp_idf_hal::delay::TickType;
use esp_idf_hal::gpio::{Gpio21, Gpio22, Gpio27, Gpio32, Gpio34, Gpio35, Output, PinDriver, Pins};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver, I2C0};
use esp_idf_hal::units::Hertz;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::{CLIMATE_ADDR, I2C_TIMEOUT_MS, RELAY_ACTIVE_LOW};
use crate::control::Relay;
use crate::sensor::{decode_sht3x, Climate, SensorBus, SensorError};

///  - I2C (SHT31): SDA=GPIO21, SCL=GPIO22
///  - ADC1: Boden=GPIO34, Tank=GPIO35, Regen=GPIO32
///  - Relais: GPIO27

type Adc = Arc<AdcDriver<'static, ADC1>>;

pub struct EspSensorBus {
    i2c: I2cDriver<'static>,
    soil: AdcChannelDriver<'static, Gpio34, Adc>,
    tank: AdcChannelDriver<'static, Gpio35, Adc>,
    rain: AdcChannelDriver<'static, Gpio32, Adc>,
}

fn timeout_ticks() -> u32 {
    TickType::new_millis(u64::from(I2C_TIMEOUT_MS)).ticks()
}

impl SensorBus for EspSensorBus {
    fn soil_raw(&mut self) -> Result<u16, SensorError> {
        self.soil.read_raw().map_err(|_| SensorError::ReadFailed)
    }

    fn tank_raw(&mut self) -> Result<u16, SensorError> {
        self.tank.read_raw().map_err(|_| SensorError::ReadFailed)
    }

    fn rain_raw(&mut self) -> Result<u16, SensorError> {
        self.rain.read_raw().map_err(|_| SensorError::ReadFailed)
    }

    /// SHT3x single shot, high repeatability, no clock stretching
    fn climate(&mut self) -> Result<Climate, SensorError> {
        self.i2c
            .write(CLIMATE_ADDR, &[0x24, 0x00], timeout_ticks())
            .map_err(|_| SensorError::Timeout)?;
        thread::sleep(Duration::from_millis(16));
        let mut buf = [0u8; 6];
        self.i2c
            .read(CLIMATE_ADDR, &mut buf, timeout_ticks())
            .map_err(|_| SensorError::Timeout)?;
        decode_sht3x(&buf)
    }
}

pub struct EspRelay {
    pin: PinDriver<'static, Gpio27, Output>,
}

impl Relay for EspRelay {
    fn set(&mut self, on: bool) -> Result<()> {
        // aktiv-low Module ziehen bei LOW an
        if on != RELAY_ACTIVE_LOW {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        Ok(())
    }
}

pub fn init_hw(pins: Pins, adc1: ADC1, i2c0: I2C0, i2c_hz: u32) -> Result<(EspSensorBus, EspRelay)> {
    // I2C
    let sda: Gpio21 = pins.gpio21;
    let scl: Gpio22 = pins.gpio22;
    let i2c = I2cDriver::new(
        i2c0,
        sda,
        scl,
        &I2cConfig::new().baudrate(Hertz(i2c_hz.max(1))),
    )?;

    // ADC, volle Spanne bis ~3.3 V
    let adc: Adc = Arc::new(AdcDriver::new(adc1)?);
    let ch_cfg = AdcChannelConfig {
        attenuation: DB_11,
        ..Default::default()
    };
    let soil = AdcChannelDriver::new(adc.clone(), pins.gpio34, &ch_cfg)?;
    let tank = AdcChannelDriver::new(adc.clone(), pins.gpio35, &ch_cfg)?;
    let rain = AdcChannelDriver::new(adc, pins.gpio32, &ch_cfg)?;

    // Relais sofort in den AUS-Zustand
    let mut relay = EspRelay {
        pin: PinDriver::output(pins.gpio27)?,
    };
    relay.set(false)?;

    Ok((EspSensorBus { i2c, soil, tank, rain }, relay))
}
