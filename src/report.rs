//! Zustands-Schnappschuss für Seite, `/data` und Dashboard.

use serde::Serialize;
use std::time::{Duration, Instant};

use crate::control::{Advice, Mode, OverrideKind, SharedController, SystemState};
use crate::crops::{self, CropId, Recommendation};
use crate::logbuf::LogEntry;
use crate::season::{self, Month, Season, SeasonType};
use crate::sensor::SensorSample;

/// Everything the presentation layer needs, captured under one lock.
#[derive(Clone, Debug)]
pub struct StatusView {
    pub state: SystemState,
    pub sample: SensorSample,
    pub season: Season,
    pub season_type: SeasonType,
    pub recommendation: Recommendation,
    pub advice: Advice,
    pub logs: Vec<LogEntry>,
    /// Tank unter der Trockenlauf-Grenze aus der Konfiguration
    pub low_tank: bool,
    pub override_remaining: Option<(OverrideKind, Duration)>,
}

impl StatusView {
    /// `None` until the first sensor poll has run.
    pub fn capture(ctrl: &SharedController, month: Month) -> Option<Self> {
        let (state, sample, advice, logs, tank_limit) = {
            let c = ctrl.lock();
            let sample = c.last_sample()?.clone();
            (c.state(), sample, c.advice(), c.logs(), c.config().tank_critical_pct)
        };
        let (season, season_type) = season::classify(month);
        let recommendation = crops::recommend(&sample, season_type);
        let now = Instant::now();
        let override_remaining = state
            .manual_override
            .map(|o| (o.kind, o.deadline.saturating_duration_since(now)));
        Some(Self {
            low_tank: sample.tank_pct < tank_limit,
            state,
            sample,
            season,
            season_type,
            recommendation,
            advice,
            logs,
            override_remaining,
        })
    }
}

/// Body of `GET /data`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DataReport {
    pub temp: f32,
    pub humidity: f32,
    pub soil: u8,
    pub tank: u8,
    pub rain: bool,
    pub pump: bool,
    pub mode: Mode,
    pub season: Season,
    pub predicted_crop: CropId,
    pub crop_score: u8,
}

impl From<&StatusView> for DataReport {
    fn from(v: &StatusView) -> Self {
        Self {
            temp: v.sample.temperature_c,
            humidity: v.sample.humidity_pct,
            soil: v.sample.soil_pct,
            tank: v.sample.tank_pct,
            rain: v.sample.rain_active,
            pump: v.state.relay_on,
            mode: v.state.mode,
            season: v.season,
            predicted_crop: v.recommendation.best.crop_id,
            crop_score: v.recommendation.best.score,
        }
    }
}
