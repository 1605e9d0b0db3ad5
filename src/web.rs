//! HTTP-Oberfläche: eine Anfrage pro Verbindung, danach `Connection: close`.
//! Kein Framework, nur Request-Line parsen und feste Routentabelle.

use anyhow::Result;
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;
use thiserror::Error;

use crate::control::{Command, SharedController};
use crate::i18n::Language;
use crate::page;
use crate::report::{DataReport, StatusView};
use crate::season::Month;

/// Alles darüber wird abgeschnitten (nur Request-Line + Header interessieren)
const MAX_REQUEST: usize = 2048;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("empty request")]
    Empty,
    #[error("malformed request line: {0:?}")]
    RequestLine(String),
    #[error("request target must be origin-form: {0:?}")]
    Target(String),
}

/// Parsed request line. Borrowed from the receive buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct Request<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: Vec<(&'a str, &'a str)>,
}

impl<'a> Request<'a> {
    pub fn parse(raw: &'a str) -> Result<Self, RequestError> {
        let line = raw.lines().next().unwrap_or("").trim_end_matches('\r');
        if line.is_empty() {
            return Err(RequestError::Empty);
        }
        let mut parts = line.split(' ');
        let (Some(method), Some(target), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(RequestError::RequestLine(line.into()));
        };
        if method.is_empty() || !version.starts_with("HTTP/") {
            return Err(RequestError::RequestLine(line.into()));
        }
        if !target.starts_with('/') {
            return Err(RequestError::Target(target.into()));
        }

        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let query = query
            .split('&')
            .filter(|p| !p.is_empty())
            .map(|p| p.split_once('=').unwrap_or((p, "")))
            .collect();
        Ok(Self {
            method,
            path,
            query,
        })
    }

    pub fn param(&self, key: &str) -> Option<&'a str> {
        self.query.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Control(Command),
    Data,
}

/// Pfad, geforderter Query-Parameter, Ziel.
const ROUTES: &[(&str, Option<(&str, &str)>, Route)] = &[
    ("/", None, Route::Dashboard),
    ("/dashboard", None, Route::Dashboard),
    ("/control", Some(("a", "pump")), Route::Control(Command::TogglePump)),
    ("/control", Some(("a", "mode")), Route::Control(Command::ToggleMode)),
    ("/control", Some(("a", "force")), Route::Control(Command::ForceWater)),
    ("/control", Some(("a", "stop")), Route::Control(Command::Stop)),
    ("/control", Some(("a", "clear")), Route::Control(Command::ClearLogs)),
    ("/lang", Some(("l", "en")), Route::Control(Command::SetLanguage(Language::En))),
    ("/lang", Some(("l", "hi")), Route::Control(Command::SetLanguage(Language::Hi))),
    ("/lang", Some(("l", "te")), Route::Control(Command::SetLanguage(Language::Te))),
    ("/data", None, Route::Data),
];

pub fn route(req: &Request<'_>) -> Option<Route> {
    ROUTES.iter().find_map(|(path, param, target)| {
        let param_ok = match param {
            Some((k, v)) => req.param(k) == Some(*v),
            None => true,
        };
        (*path == req.path && param_ok).then_some(*target)
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub reason: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    fn new(status: u16, reason: &'static str, content_type: &'static str, body: String) -> Self {
        Self {
            status,
            reason,
            content_type,
            body,
        }
    }

    fn text(status: u16, reason: &'static str) -> Self {
        Self::new(status, reason, "text/plain; charset=utf-8", reason.into())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            self.reason,
            self.content_type,
            self.body.len()
        )
        .into_bytes();
        out.extend_from_slice(self.body.as_bytes());
        out
    }
}

/// Antwort auf eine rohe Anfrage. `None` heißt: Verbindung ohne Antwort
/// schließen, nichts wurde verändert.
pub fn handle(raw: &[u8], ctrl: &SharedController, month: Month) -> Option<Response> {
    let text = match std::str::from_utf8(raw) {
        Ok(t) => t,
        Err(_) => {
            log::debug!("dropping non-utf8 request");
            return None;
        }
    };
    let req = match Request::parse(text) {
        Ok(r) => r,
        Err(e) => {
            log::debug!("dropping request: {e}");
            return None;
        }
    };
    if req.method != "GET" {
        return Some(Response::text(405, "Method Not Allowed"));
    }
    let Some(route) = route(&req) else {
        log::debug!("404 {}", req.path);
        return Some(Response::text(404, "Not Found"));
    };

    let resp = match route {
        Route::Control(cmd) => {
            log::info!("http command {cmd:?}");
            ctrl.command(cmd);
            Response::text(200, "OK")
        }
        Route::Dashboard => match StatusView::capture(ctrl, month) {
            Some(view) => Response::new(200, "OK", "text/html; charset=utf-8", page::render(&view)),
            None => Response::text(503, "Service Unavailable"),
        },
        Route::Data => match StatusView::capture(ctrl, month) {
            Some(view) => match serde_json::to_string(&DataReport::from(&view)) {
                Ok(json) => Response::new(200, "OK", "application/json", json),
                Err(e) => {
                    log::error!("/data encode failed: {e}");
                    Response::text(500, "Internal Server Error")
                }
            },
            None => Response::text(503, "Service Unavailable"),
        },
    };
    Some(resp)
}

fn read_request(stream: &mut TcpStream) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(512);
    let mut chunk = [0u8; 512];
    while buf.len() < MAX_REQUEST && !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            // Client schweigt: mit dem arbeiten, was da ist
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) && !buf.is_empty() => break,
            Err(e) => return Err(e.into()),
        }
    }
    buf.truncate(MAX_REQUEST);
    Ok(buf)
}

/// Serves exactly one request on `stream`, then closes it.
pub fn serve_connection(
    mut stream: TcpStream,
    ctrl: &SharedController,
    month: Month,
    timeout: Duration,
) -> Result<()> {
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let raw = read_request(&mut stream)?;
    if let Some(resp) = handle(&raw, ctrl, month) {
        stream.write_all(&resp.to_bytes())?;
        stream.flush()?;
    }
    let _ = stream.shutdown(Shutdown::Both);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlConfig;
    use crate::control::{IrrigationController, Mode, Relay};
    use crate::sensor::SensorSample;

    struct NullRelay;

    impl Relay for NullRelay {
        fn set(&mut self, _on: bool) -> Result<()> {
            Ok(())
        }
    }

    fn shared() -> SharedController {
        SharedController::new(IrrigationController::new(
            ControlConfig::default(),
            Box::new(NullRelay),
            None,
        ))
    }

    fn polled() -> SharedController {
        let ctrl = shared();
        ctrl.cycle(&SensorSample {
            temperature_c: 26.0,
            humidity_pct: 60.0,
            soil_raw: 2200,
            soil_pct: 50,
            tank_raw: 1500,
            tank_pct: 70,
            rain_active: false,
        });
        ctrl
    }

    fn july() -> Month {
        Month::new(7).unwrap()
    }

    #[test]
    fn parses_request_line_and_query() {
        let req = Request::parse("GET /control?a=force&x HTTP/1.1\r\nHost: n\r\n\r\n").unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/control");
        assert_eq!(req.param("a"), Some("force"));
        assert_eq!(req.param("x"), Some(""));
        assert_eq!(req.param("l"), None);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(Request::parse(""), Err(RequestError::Empty));
        assert!(matches!(Request::parse("GET /"), Err(RequestError::RequestLine(_))));
        assert!(matches!(Request::parse("hello world"), Err(RequestError::RequestLine(_))));
        assert!(matches!(Request::parse("GET / HTTP/1.1 extra"), Err(RequestError::RequestLine(_))));
        assert!(matches!(Request::parse("GET x HTTP/1.1"), Err(RequestError::Target(_))));
    }

    #[test]
    fn route_table_is_exact() {
        let r = |line: &str| route(&Request::parse(line).unwrap());
        assert_eq!(r("GET / HTTP/1.1"), Some(Route::Dashboard));
        assert_eq!(r("GET /dashboard HTTP/1.1"), Some(Route::Dashboard));
        assert_eq!(r("GET /control?a=stop HTTP/1.1"), Some(Route::Control(Command::Stop)));
        assert_eq!(
            r("GET /lang?l=te HTTP/1.1"),
            Some(Route::Control(Command::SetLanguage(Language::Te)))
        );
        assert_eq!(r("GET /data?ts=1 HTTP/1.1"), Some(Route::Data));
        // keine Teilstring-Treffer
        assert_eq!(r("GET /control?a=forceful HTTP/1.1"), None);
        assert_eq!(r("GET /controls?a=pump HTTP/1.1"), None);
        assert_eq!(r("GET /lang?l=fr HTTP/1.1"), None);
        assert_eq!(r("GET /favicon.ico HTTP/1.1"), None);
    }

    #[test]
    fn status_codes() {
        let ctrl = polled();
        let get = |raw: &str| handle(raw.as_bytes(), &ctrl, july());
        assert_eq!(get("GET /nope HTTP/1.1\r\n\r\n").unwrap().status, 404);
        assert_eq!(get("GET /control?a=bogus HTTP/1.1\r\n\r\n").unwrap().status, 404);
        assert_eq!(get("POST /control?a=pump HTTP/1.1\r\n\r\n").unwrap().status, 405);
        assert!(get("garbage\r\n\r\n").is_none());
        assert!(handle(&[0xff, 0xfe], &ctrl, july()).is_none());
    }

    #[test]
    fn rejected_requests_change_nothing() {
        let ctrl = polled();
        let before = ctrl.lock().state();
        handle(b"POST /control?a=mode HTTP/1.1\r\n\r\n", &ctrl, july());
        handle(b"GET /control?a=mod HTTP/1.1\r\n\r\n", &ctrl, july());
        handle(b"GET /control?a=mode\r\n\r\n", &ctrl, july());
        assert_eq!(ctrl.lock().state(), before);
    }

    #[test]
    fn control_route_applies_command() {
        let ctrl = polled();
        let resp = handle(b"GET /control?a=mode HTTP/1.1\r\n\r\n", &ctrl, july()).unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "OK");
        assert_eq!(ctrl.lock().state().mode, Mode::Manual);
    }

    #[test]
    fn views_wait_for_first_poll() {
        let ctrl = shared();
        let resp = handle(b"GET /data HTTP/1.1\r\n\r\n", &ctrl, july()).unwrap();
        assert_eq!(resp.status, 503);
        let resp = handle(b"GET / HTTP/1.1\r\n\r\n", &ctrl, july()).unwrap();
        assert_eq!(resp.status, 503);
    }

    #[test]
    fn dashboard_follows_language() {
        let ctrl = polled();
        handle(b"GET /lang?l=hi HTTP/1.1\r\n\r\n", &ctrl, july());
        let resp = handle(b"GET / HTTP/1.1\r\n\r\n", &ctrl, july()).unwrap();
        assert_eq!(resp.content_type, "text/html; charset=utf-8");
        assert!(resp.body.contains(r#"<html lang="hi">"#));
        assert!(resp.body.contains(Language::Hi.strings().title));
        assert!(resp.body.contains("Language: Hindi"));
    }

    #[test]
    fn response_always_closes() {
        let bytes = Response::text(404, "Not Found").to_bytes();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 9\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\nNot Found"));
    }
}
