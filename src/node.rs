//! Hauptschleife des Knotens: Sensoren lesen, entscheiden, Dashboard füttern,
//! dann höchstens eine wartende HTTP-Verbindung bedienen.

use anyhow::Result;
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::NodeConfig;
use crate::control::SharedController;
use crate::season::Month;
use crate::sensor::{SensorBus, SensorReader};
use crate::web;

/// Pause wenn weder Messung noch Verbindung anstehen
const IDLE_SLEEP: Duration = Duration::from_millis(50);

pub struct Node<B> {
    reader: SensorReader<B>,
    ctrl: SharedController,
    listener: TcpListener,
    poll_interval: Duration,
    http_timeout: Duration,
    last_poll: Option<Instant>,
}

impl<B: SensorBus> Node<B> {
    pub fn bind(
        addr: impl ToSocketAddrs,
        reader: SensorReader<B>,
        ctrl: SharedController,
        cfg: &NodeConfig,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        log::info!("http listening on {}", listener.local_addr()?);
        ctrl.lock().note("System started");
        Ok(Self {
            reader,
            ctrl,
            listener,
            poll_interval: cfg.poll_interval(),
            http_timeout: cfg.http_timeout(),
            last_poll: None,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn controller(&self) -> &SharedController {
        &self.ctrl
    }

    /// Reads the sensors and runs one decision cycle.
    pub fn poll_once(&mut self) {
        let sample = self.reader.read();
        let advice = self.ctrl.cycle(&sample);
        log::debug!(
            "soil {}% tank {}% rain {} -> {}",
            sample.soil_pct,
            sample.tank_pct,
            sample.rain_active,
            advice.message
        );
        self.last_poll = Some(Instant::now());
    }

    fn poll_due(&self) -> bool {
        self.last_poll
            .map_or(true, |t| t.elapsed() >= self.poll_interval)
    }

    /// Accepts and serves at most one pending connection. `false` if none
    /// was waiting.
    pub fn serve_pending(&self) -> bool {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                // Listener ist nonblocking, die Verbindung selbst nicht
                let served = stream
                    .set_nonblocking(false)
                    .map_err(anyhow::Error::from)
                    .and_then(|()| web::serve_connection(stream, &self.ctrl, Month::current(), self.http_timeout));
                if let Err(e) = served {
                    log::warn!("http {peer}: {e:?}");
                }
                true
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => false,
            Err(e) => {
                log::warn!("accept failed: {e}");
                false
            }
        }
    }

    /// One pass of the loop.
    pub fn step(&mut self) {
        if self.poll_due() {
            self.poll_once();
        }
        if !self.serve_pending() {
            thread::sleep(IDLE_SLEEP);
        }
    }

    pub fn run(mut self) -> ! {
        log::info!("node loop running (poll every {:?})", self.poll_interval);
        loop {
            self.step();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ControlConfig, SensorConfig};
    use crate::control::{IrrigationController, Relay};
    use crate::sensor::{Climate, SensorError};
    use std::io::{Read, Write};
    use std::net::TcpStream;

    struct FixedBus;

    impl SensorBus for FixedBus {
        fn soil_raw(&mut self) -> Result<u16, SensorError> {
            Ok(2250)
        }
        fn tank_raw(&mut self) -> Result<u16, SensorError> {
            Ok(1000)
        }
        fn rain_raw(&mut self) -> Result<u16, SensorError> {
            Ok(4095)
        }
        fn climate(&mut self) -> Result<Climate, SensorError> {
            Ok(Climate {
                temp_c: 24.0,
                humidity_pct: 50.0,
            })
        }
    }

    struct NullRelay;

    impl Relay for NullRelay {
        fn set(&mut self, _on: bool) -> Result<()> {
            Ok(())
        }
    }

    fn node() -> Node<FixedBus> {
        let ctrl = SharedController::new(IrrigationController::new(
            ControlConfig::default(),
            Box::new(NullRelay),
            None,
        ));
        let reader = SensorReader::new(FixedBus, SensorConfig::default());
        Node::bind("127.0.0.1:0", reader, ctrl, &NodeConfig::default()).unwrap()
    }

    #[test]
    fn startup_note_and_first_poll() {
        let mut n = node();
        assert!(n.controller().lock().last_sample().is_none());
        assert_eq!(n.controller().lock().logs()[0].message, "System started");
        assert!(n.poll_due());
        n.step();
        assert!(n.controller().lock().last_sample().is_some());
        assert!(!n.poll_due());
    }

    #[test]
    fn nothing_pending_is_not_an_error() {
        let n = node();
        assert!(!n.serve_pending());
    }

    #[test]
    fn serves_one_connection() {
        let mut n = node();
        n.poll_once();
        let mut client = TcpStream::connect(n.local_addr().unwrap()).unwrap();
        client.write_all(b"GET /data HTTP/1.1\r\n\r\n").unwrap();

        let mut served = false;
        for _ in 0..100 {
            if n.serve_pending() {
                served = true;
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(served);
        let mut reply = String::new();
        client.read_to_string(&mut reply).unwrap();
        assert!(reply.starts_with("HTTP/1.1 200 OK"));
        assert!(reply.contains("\"soil\":50"));
    }
}
