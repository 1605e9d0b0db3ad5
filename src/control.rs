use anyhow::Result;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::Instant;

use crate::config::ControlConfig;
use crate::dashboard::{self, DashValue, DashboardSignal, DashboardSink, VirtualPin};
use crate::i18n::Language;
use crate::logbuf::{LogBuffer, LogEntry};
use crate::sensor::SensorSample;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Auto,
    Manual,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Auto => "auto",
            Mode::Manual => "manual",
        }
    }
}

/// Severity of the current field condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Good,
    Warn,
    Crit,
}

impl Status {
    pub fn color(self) -> &'static str {
        match self {
            Status::Good => "#10b981",
            Status::Warn => "#f59e0b",
            Status::Crit => "#ef4444",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Advice {
    pub message: &'static str,
    pub status: Status,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverrideKind {
    /// fester Pumpstoß über `a=force`
    ForcedWatering,
    /// manuell gestartet (Pumpe toggeln / Dashboard-Taste)
    ManualRun,
}

impl OverrideKind {
    fn off_message(self) -> &'static str {
        match self {
            OverrideKind::ForcedWatering => "Force water OFF",
            OverrideKind::ManualRun => "Manual run OFF (timeout)",
        }
    }
}

/// A manually started watering action with its expiry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Override {
    pub kind: OverrideKind,
    pub token: u64,
    pub deadline: Instant,
}

/// Snapshot of the controller state handed to readers.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemState {
    pub mode: Mode,
    pub relay_on: bool,
    pub language: Language,
    pub manual_override: Option<Override>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    TogglePump,
    ToggleMode,
    ForceWater,
    Stop,
    ClearLogs,
    SetLanguage(Language),
    Dashboard(DashboardSignal),
}

/// Pumpenrelais. `on`/`off` ohne Rücksicht auf Pin-Polarität.
pub trait Relay: Send {
    fn set(&mut self, on: bool) -> Result<()>;
}

pub struct IrrigationController {
    cfg: ControlConfig,
    state: SystemState,
    relay: Box<dyn Relay>,
    dashboard: Option<Box<dyn DashboardSink>>,
    logs: LogBuffer,
    last_sample: Option<SensorSample>,
    advice: Advice,
    tank_alarm: bool,
    next_token: u64,
}

impl IrrigationController {
    pub fn new(
        cfg: ControlConfig,
        mut relay: Box<dyn Relay>,
        dashboard: Option<Box<dyn DashboardSink>>,
    ) -> Self {
        // Initial AUS
        if let Err(e) = relay.set(false) {
            log::error!("relay init failed: {e:?}");
        }
        let language = Language::default();
        Self {
            logs: LogBuffer::new(cfg.log_capacity),
            cfg,
            state: SystemState {
                mode: Mode::Auto,
                relay_on: false,
                language,
                manual_override: None,
            },
            relay,
            dashboard,
            last_sample: None,
            advice: Advice {
                message: language.strings().normal,
                status: Status::Good,
            },
            tank_alarm: false,
            next_token: 1,
        }
    }

    pub fn state(&self) -> SystemState {
        self.state.clone()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs.snapshot()
    }

    pub fn last_sample(&self) -> Option<&SensorSample> {
        self.last_sample.as_ref()
    }

    pub fn advice(&self) -> Advice {
        self.advice
    }

    pub fn config(&self) -> &ControlConfig {
        &self.cfg
    }

    /// Free-form entry, e.g. the startup notice.
    pub fn note(&mut self, message: impl Into<String>) {
        self.logs.append(message);
    }

    /// One decision cycle. Rules in priority order: rain, tank critical,
    /// auto soil logic (skipped while an override runs), override expiry.
    pub fn cycle(&mut self, sample: &SensorSample, now: Instant) -> Advice {
        self.last_sample = Some(sample.clone());
        let t = self.state.language.strings();

        let tank_critical = sample.tank_pct < self.cfg.tank_critical_pct;
        let tank_entered = tank_critical && !self.tank_alarm;
        self.tank_alarm = tank_critical;

        let advice = if sample.rain_active {
            self.state.manual_override = None;
            self.switch(false, t.rain_detected);
            Advice {
                message: t.rain_detected,
                status: Status::Warn,
            }
        } else if tank_critical {
            self.state.manual_override = None;
            let switched = self.switch(false, t.tank_empty);
            if tank_entered && !switched {
                self.logs.append(t.tank_empty);
            }
            Advice {
                message: t.tank_empty,
                status: Status::Crit,
            }
        } else if let Some(o) = self.state.manual_override {
            if now >= o.deadline {
                self.state.manual_override = None;
                self.switch(false, o.kind.off_message());
            }
            Advice {
                message: t.normal,
                status: Status::Good,
            }
        } else if self.state.mode == Mode::Auto {
            if sample.soil_pct < self.cfg.soil_dry_pct {
                if sample.tank_pct > self.cfg.tank_critical_pct {
                    self.switch(true, t.soil_dry);
                }
                Advice {
                    message: t.soil_dry,
                    status: Status::Warn,
                }
            } else if sample.soil_pct > self.cfg.soil_wet_pct {
                self.switch(false, t.soil_wet);
                Advice {
                    message: t.soil_wet,
                    status: Status::Good,
                }
            } else {
                Advice {
                    message: t.normal,
                    status: Status::Good,
                }
            }
        } else {
            Advice {
                message: t.normal,
                status: Status::Good,
            }
        };

        self.advice = advice;
        advice
    }

    /// Re-runs the decision on the last sample after a command.
    pub fn rerun(&mut self, now: Instant) {
        if let Some(sample) = self.last_sample.clone() {
            self.cycle(&sample, now);
        }
    }

    /// Sends the current sample and pump state to the dashboard.
    pub fn publish(&mut self) {
        if let (Some(sink), Some(sample)) = (self.dashboard.as_mut(), self.last_sample.as_ref()) {
            dashboard::publish(sink.as_mut(), sample, self.state.relay_on, &self.cfg);
        }
    }

    /// Applies an external command. Returns the override that was armed, if
    /// any, so the caller can schedule its auto-off.
    pub fn apply(&mut self, cmd: Command, now: Instant) -> Option<Override> {
        let armed = match cmd {
            Command::TogglePump => {
                if self.state.relay_on {
                    self.state.manual_override = None;
                    self.switch(false, "Pump OFF");
                    None
                } else if self.reject_start(cmd) {
                    None
                } else if self.switch(true, "Pump ON") {
                    Some(self.arm(OverrideKind::ManualRun, now))
                } else {
                    None
                }
            }
            Command::ForceWater => {
                let secs = self.cfg.force_water_secs;
                if self.reject_start(cmd) {
                    None
                } else if self.state.relay_on {
                    // läuft schon: Frist neu setzen
                    self.logs.append(format!("Force water extended ({secs}s)"));
                    Some(self.arm(OverrideKind::ForcedWatering, now))
                } else if self.switch(true, &format!("Force water ON ({secs}s)")) {
                    Some(self.arm(OverrideKind::ForcedWatering, now))
                } else {
                    None
                }
            }
            Command::Stop => {
                self.state.manual_override = None;
                if !self.switch(false, "Water STOP") {
                    self.logs.append("Water STOP");
                }
                None
            }
            Command::ToggleMode => {
                let next = match self.state.mode {
                    Mode::Auto => Mode::Manual,
                    Mode::Manual => Mode::Auto,
                };
                self.set_mode(next, now);
                None
            }
            Command::ClearLogs => {
                self.logs.clear();
                self.logs.append("Logs cleared");
                None
            }
            Command::SetLanguage(lang) => {
                self.state.language = lang;
                self.logs.append(format!("Language: {}", lang.english_name()));
                None
            }
            Command::Dashboard(DashboardSignal::Mode(auto)) => {
                self.set_mode(if auto { Mode::Auto } else { Mode::Manual }, now);
                None
            }
            Command::Dashboard(DashboardSignal::Pump(on)) => {
                if self.state.mode != Mode::Manual {
                    log::debug!("dashboard pump ignored in auto mode");
                    None
                } else if on {
                    if self.reject_start(cmd) {
                        None
                    } else {
                        self.switch(true, "Manual pump ON");
                        self.state.relay_on.then(|| self.arm(OverrideKind::ManualRun, now))
                    }
                } else {
                    self.state.manual_override = None;
                    self.switch(false, "Manual pump OFF");
                    None
                }
            }
        };

        // Regen / Tank haben immer Vorrang
        self.rerun(now);
        armed.filter(|o| self.state.manual_override.map(|cur| cur.token) == Some(o.token))
    }

    /// Timer callback: turns the relay off if `token` is still the running
    /// override. No-op otherwise.
    pub fn expire_override(&mut self, token: u64) -> bool {
        match self.state.manual_override {
            Some(o) if o.token == token => {
                self.state.manual_override = None;
                self.switch(false, o.kind.off_message());
                true
            }
            _ => false,
        }
    }

    /// Why the pump may not start on the last sample: rain or a tank below
    /// the dry-run limit.
    pub fn start_blocked(&self) -> Option<&'static str> {
        let sample = self.last_sample.as_ref()?;
        let t = self.state.language.strings();
        if sample.rain_active {
            Some(t.rain_detected)
        } else if sample.tank_pct < self.cfg.tank_critical_pct {
            Some(t.tank_empty)
        } else {
            None
        }
    }

    // Relais bleibt unberührt, kein Log-Eintrag
    fn reject_start(&self, cmd: Command) -> bool {
        match self.start_blocked() {
            Some(reason) => {
                log::warn!("{cmd:?} rejected: {reason}");
                true
            }
            None => false,
        }
    }

    fn set_mode(&mut self, mode: Mode, now: Instant) {
        if self.state.mode == mode {
            return;
        }
        self.state.mode = mode;
        self.logs.append(format!("Mode: {}", mode.as_str()));
        log::info!("mode -> {}", mode.as_str());
        if mode == Mode::Auto {
            self.rerun(now);
        }
    }

    fn arm(&mut self, kind: OverrideKind, now: Instant) -> Override {
        let duration = match kind {
            OverrideKind::ForcedWatering => self.cfg.force_water(),
            OverrideKind::ManualRun => self.cfg.manual_run(),
        };
        let o = Override {
            kind,
            token: self.next_token,
            deadline: now + duration,
        };
        self.next_token += 1;
        self.state.manual_override = Some(o);
        o
    }

    /// Schaltet das Relais. Ein Log-Eintrag und ein Dashboard-Write pro
    /// tatsächlichem Wechsel; `false` wenn nichts geschaltet wurde.
    fn switch(&mut self, on: bool, cause: &str) -> bool {
        if self.state.relay_on == on {
            return false;
        }
        if let Err(e) = self.relay.set(on) {
            log::error!("relay -> {}: {e:?}", if on { "on" } else { "off" });
            return false;
        }
        self.state.relay_on = on;
        log::info!("pump {} ({cause})", if on { "ON" } else { "OFF" });
        self.logs.append(cause);
        if let Some(sink) = self.dashboard.as_mut() {
            sink.virtual_write(VirtualPin::Pump, DashValue::Int(on.into()));
        }
        true
    }
}

/// The one lock around the controller, shared by the node loop, the HTTP
/// handlers and the override timers.
#[derive(Clone)]
pub struct SharedController {
    inner: Arc<Mutex<IrrigationController>>,
}

impl SharedController {
    pub fn new(ctrl: IrrigationController) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ctrl)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, IrrigationController> {
        // ein panischer Handler soll die Steuerung nicht blockieren
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cycle(&self, sample: &SensorSample) -> Advice {
        let mut c = self.lock();
        let advice = c.cycle(sample, Instant::now());
        c.publish();
        advice
    }

    /// Applies `cmd` and schedules the auto-off of any override it armed.
    pub fn command(&self, cmd: Command) {
        let armed = self.lock().apply(cmd, Instant::now());
        if let Some(o) = armed {
            self.schedule_expiry(o);
        }
    }

    fn schedule_expiry(&self, o: Override) {
        let weak: Weak<Mutex<IrrigationController>> = Arc::downgrade(&self.inner);
        let delay = o.deadline.saturating_duration_since(Instant::now());
        let spawned = thread::Builder::new()
            .name("override-off".into())
            .stack_size(16 * 1024)
            .spawn(move || {
                thread::sleep(delay);
                if let Some(inner) = weak.upgrade() {
                    let mut c = inner.lock().unwrap_or_else(PoisonError::into_inner);
                    if c.expire_override(o.token) {
                        c.publish();
                    }
                }
            });
        if let Err(e) = spawned {
            // Fallback: Frist wird im nächsten Zyklus geprüft
            log::error!("cannot spawn override timer: {e}");
        }
    }
}
