//! Anbau-Saisons nach Kalendermonat (Rabi / Kharif / Zaid).

use chrono::Datelike;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonType {
    Rabi,
    Kharif,
    Zaid,
}

/// Sub-phase of a cropping season.
///
/// There is no Kharif harvest phase: September still counts as growing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    RabiSowing,
    RabiGrowing,
    RabiHarvest,
    KharifSowing,
    KharifGrowing,
    Zaid,
}

impl Season {
    pub const ALL: [Season; 6] = [
        Season::RabiSowing,
        Season::RabiGrowing,
        Season::RabiHarvest,
        Season::KharifSowing,
        Season::KharifGrowing,
        Season::Zaid,
    ];

    pub fn season_type(self) -> SeasonType {
        match self {
            Season::RabiSowing | Season::RabiGrowing | Season::RabiHarvest => SeasonType::Rabi,
            Season::KharifSowing | Season::KharifGrowing => SeasonType::Kharif,
            Season::Zaid => SeasonType::Zaid,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Season::RabiSowing => "rabi_sowing",
            Season::RabiGrowing => "rabi_growing",
            Season::RabiHarvest => "rabi_harvest",
            Season::KharifSowing => "kharif_sowing",
            Season::KharifGrowing => "kharif_growing",
            Season::Zaid => "zaid",
        }
    }
}

/// Calendar month, 1..=12.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Month(u8);

impl Month {
    pub fn new(month: u8) -> Option<Self> {
        (1..=12).contains(&month).then_some(Month(month))
    }

    /// Current month in local time.
    pub fn current() -> Self {
        // chrono liefert immer 1..=12
        Month(chrono::Local::now().month() as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

pub fn classify(month: Month) -> (Season, SeasonType) {
    let season = match month.0 {
        10 | 11 => Season::RabiSowing,
        12 | 1 => Season::RabiGrowing,
        2 => Season::RabiHarvest,
        6 | 7 => Season::KharifSowing,
        8 | 9 => Season::KharifGrowing,
        _ => Season::Zaid,
    };
    (season, season.season_type())
}
