use anyhow::Result;

use kisan_guard::config::{self, Config};
use kisan_guard::control::{IrrigationController, SharedController};
use kisan_guard::dashboard::LogDashboard;
use kisan_guard::i18n;
use kisan_guard::node::Node;
use kisan_guard::sensor::SensorReader;

#[cfg(not(feature = "esp32"))]
mod host {
    use super::*;
    use clap::Parser;
    use kisan_guard::sim::{Scenario, SimField, SimHandle};
    use std::path::PathBuf;

    /// Bewässerungsknoten auf dem Host, Sensoren und Pumpe simuliert.
    #[derive(Parser, Debug)]
    #[command(name = "kisan-guard", version, about)]
    struct Args {
        /// JSON config file; missing keys keep the built-in defaults
        #[arg(long, env = "KISAN_CONFIG")]
        config: Option<PathBuf>,

        /// HTTP listen address
        #[arg(long, env = "KISAN_BIND", default_value = config::HTTP_BIND)]
        bind: String,

        /// Simulated field behaviour
        #[arg(long, env = "KISAN_SCENARIO", value_enum, default_value_t = Scenario::Drying)]
        scenario: Scenario,

        /// RNG seed for a reproducible run
        #[arg(long, env = "KISAN_SEED")]
        seed: Option<u64>,
    }

    pub fn main() -> Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let args = Args::parse();

        let cfg = match &args.config {
            Some(path) => Config::load(path)?,
            None => {
                let cfg = Config::default();
                cfg.validate()?;
                cfg
            }
        };
        i18n::validate()?;

        let seed = args.seed.unwrap_or_else(rand::random);
        log::info!("simulated field: scenario {}, seed {seed}", args.scenario);
        let field = SimHandle::new(SimField::new(args.scenario, &cfg.sensor, seed));

        let ctrl = SharedController::new(IrrigationController::new(
            cfg.control.clone(),
            Box::new(field.relay()),
            Some(Box::new(LogDashboard)),
        ));
        let reader = SensorReader::new(field.bus(), cfg.sensor.clone());
        let node = Node::bind(args.bind.as_str(), reader, ctrl, &cfg.node)?;
        node.run()
    }
}

#[cfg(not(feature = "esp32"))]
fn main() -> Result<()> {
    host::main()
}

#[cfg(feature = "esp32")]
mod device {
    use super::*;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::log::EspLogger;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
    use kisan_guard::{hw, net};
    use std::thread;
    use std::time::Duration;

    pub fn main() -> Result<()> {
        esp_idf_sys::link_patches();
        EspLogger::initialize_default();

        let _handle = thread::Builder::new()
            .name("app".into())
            .stack_size(28 * 1024)
            .spawn(|| {
                if let Err(e) = app() {
                    log::error!("app() failed: {e:?}");
                }
            })?;

        loop {
            thread::sleep(Duration::from_secs(60));
        }
    }

    fn app() -> Result<()> {
        let cfg = Config::default();
        cfg.validate()?;
        i18n::validate()?;

        let peripherals = esp_idf_hal::peripherals::Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;
        let esp_wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;
        let link = net::bring_up(&mut wifi)?;

        // HW
        let (bus, relay) = hw::init_hw(peripherals.pins, peripherals.adc1, peripherals.i2c0, config::I2C_HZ)?;

        let ctrl = SharedController::new(IrrigationController::new(
            cfg.control.clone(),
            Box::new(relay),
            Some(Box::new(LogDashboard)),
        ));
        let node = Node::bind(config::HTTP_BIND, SensorReader::new(bus, cfg.sensor.clone()), ctrl, &cfg.node)?;
        thread::Builder::new()
            .name("node".into())
            .stack_size(24 * 1024)
            .spawn(move || node.run())?;

        // Reconnect-Watchdog im selben Thread
        net::watch(&mut wifi, link)
    }
}

#[cfg(feature = "esp32")]
fn main() -> Result<()> {
    device::main()
}
