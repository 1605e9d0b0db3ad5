use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use kisan_guard::config::{ControlConfig, NodeConfig, SensorConfig};
use kisan_guard::control::{IrrigationController, Relay, SharedController};
use kisan_guard::node::Node;
use kisan_guard::sensor::{Climate, SensorBus, SensorError, SensorReader};

/// Rohwerte, die der Test während des Laufs verändern kann.
#[derive(Clone, Copy)]
struct Raw {
    soil: u16,
    tank: u16,
    rain: u16,
}

#[derive(Clone)]
struct ScriptedBus(Arc<Mutex<Raw>>);

impl SensorBus for ScriptedBus {
    fn soil_raw(&mut self) -> Result<u16, SensorError> {
        Ok(self.0.lock().unwrap().soil)
    }
    fn tank_raw(&mut self) -> Result<u16, SensorError> {
        Ok(self.0.lock().unwrap().tank)
    }
    fn rain_raw(&mut self) -> Result<u16, SensorError> {
        Ok(self.0.lock().unwrap().rain)
    }
    fn climate(&mut self) -> Result<Climate, SensorError> {
        Ok(Climate {
            temp_c: 25.0,
            humidity_pct: 55.0,
        })
    }
}

#[derive(Clone, Default)]
struct RecordingRelay(Arc<Mutex<Vec<bool>>>);

impl Relay for RecordingRelay {
    fn set(&mut self, on: bool) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(on);
        Ok(())
    }
}

impl RecordingRelay {
    fn last(&self) -> Option<bool> {
        self.0.lock().unwrap().last().copied()
    }
}

struct Harness {
    addr: SocketAddr,
    raw: Arc<Mutex<Raw>>,
    relay: RecordingRelay,
}

fn start() -> Harness {
    // soil 50 %, tank ~91 %, kein Regen
    let raw = Arc::new(Mutex::new(Raw {
        soil: 2250,
        tank: 1000,
        rain: 4000,
    }));
    let relay = RecordingRelay::default();
    let ctrl = SharedController::new(IrrigationController::new(
        ControlConfig::default(),
        Box::new(relay.clone()),
        None,
    ));
    let node_cfg = NodeConfig {
        poll_interval_ms: 50,
        http_timeout_ms: 1000,
    };
    let reader = SensorReader::new(ScriptedBus(raw.clone()), SensorConfig::default());
    let node = Node::bind("127.0.0.1:0", reader, ctrl, &node_cfg).unwrap();
    let addr = node.local_addr().unwrap();
    thread::spawn(move || node.run());
    Harness { addr, raw, relay }
}

fn send(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(raw.as_bytes()).unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).unwrap();
    reply
}

fn get(addr: SocketAddr, target: &str) -> String {
    send(addr, &format!("GET {target} HTTP/1.1\r\nHost: node\r\n\r\n"))
}

fn body(reply: &str) -> &str {
    reply.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or("")
}

fn data(addr: SocketAddr) -> serde_json::Value {
    let reply = get(addr, "/data");
    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"), "{reply}");
    serde_json::from_str(body(&reply)).unwrap()
}

#[test]
fn data_is_json_and_connection_closes() {
    let h = start();
    let reply = get(h.addr, "/data");
    assert!(reply.contains("Content-Type: application/json\r\n"));
    assert!(reply.contains("Connection: close\r\n"));

    let json: serde_json::Value = serde_json::from_str(body(&reply)).unwrap();
    assert_eq!(json["soil"], 50);
    assert_eq!(json["rain"], false);
    assert_eq!(json["pump"], false);
    assert_eq!(json["mode"], "auto");
    for key in ["temp", "humidity", "tank", "season", "predicted_crop", "crop_score"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
}

#[test]
fn force_turns_relay_on() {
    let h = start();
    let reply = get(h.addr, "/control?a=force");
    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(body(&reply), "OK");
    assert_eq!(h.relay.last(), Some(true));
    assert_eq!(data(h.addr)["pump"], true);

    get(h.addr, "/control?a=stop");
    assert_eq!(h.relay.last(), Some(false));
}

#[test]
fn rain_beats_forced_watering() {
    let h = start();
    get(h.addr, "/control?a=force");
    assert_eq!(h.relay.last(), Some(true));

    h.raw.lock().unwrap().rain = 10;
    let mut off = false;
    for _ in 0..50 {
        thread::sleep(Duration::from_millis(20));
        if data(h.addr)["pump"] == false {
            off = true;
            break;
        }
    }
    assert!(off);
    assert_eq!(h.relay.last(), Some(false));
    assert_eq!(data(h.addr)["rain"], true);
}

#[test]
fn unknown_routes_and_methods() {
    let h = start();
    assert!(get(h.addr, "/nope").starts_with("HTTP/1.1 404 "));
    assert!(get(h.addr, "/control?a=launch").starts_with("HTTP/1.1 404 "));
    assert!(get(h.addr, "/lang?l=de").starts_with("HTTP/1.1 404 "));
    let reply = send(h.addr, "POST /control?a=pump HTTP/1.1\r\n\r\n");
    assert!(reply.starts_with("HTTP/1.1 405 "));
    assert!(reply.contains("Connection: close\r\n"));
    assert_eq!(h.relay.last(), Some(false));
}

#[test]
fn malformed_request_is_closed_without_reply() {
    let h = start();
    assert_eq!(send(h.addr, "this is not http\r\n\r\n"), "");
    assert_eq!(send(h.addr, "GET /control?a=mode\r\n\r\n"), "");
    // nichts verändert, Knoten lebt weiter
    assert_eq!(data(h.addr)["mode"], "auto");
}

#[test]
fn language_switch_changes_page() {
    let h = start();
    let reply = get(h.addr, "/lang?l=te");
    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));

    let page = get(h.addr, "/");
    assert!(page.contains("Content-Type: text/html; charset=utf-8\r\n"));
    assert!(page.contains(r#"<html lang="te">"#));
    assert!(page.contains("Language: Telugu"));
    assert!(get(h.addr, "/dashboard").contains(r#"<html lang="te">"#));
}
