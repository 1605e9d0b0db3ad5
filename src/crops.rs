//! Kultur-Empfehlung: statischer Katalog, Punktwertung nach Saison,
//! Temperatur und Bodenfeuchte.

use serde::Serialize;

use crate::season::SeasonType;
use crate::sensor::SensorSample;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CropId {
    Paddy,
    Wheat,
    Maize,
    Vegetables,
    Cotton,
    Millets,
    Groundnut,
    Sugarcane,
}

impl CropId {
    pub fn as_str(self) -> &'static str {
        match self {
            CropId::Paddy => "paddy",
            CropId::Wheat => "wheat",
            CropId::Maize => "maize",
            CropId::Vegetables => "vegetables",
            CropId::Cotton => "cotton",
            CropId::Millets => "millets",
            CropId::Groundnut => "groundnut",
            CropId::Sugarcane => "sugarcane",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            CropId::Paddy | CropId::Wheat | CropId::Millets => "🌾",
            CropId::Maize => "🌽",
            CropId::Vegetables => "🥦",
            CropId::Cotton => "🧵",
            CropId::Groundnut => "🥜",
            CropId::Sugarcane => "🎋",
        }
    }
}

/// Which seasons a crop is grown in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Affinity {
    Only(SeasonType),
    /// Rabi and Kharif
    Both,
    All,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CropProfile {
    pub id: CropId,
    pub display_name: &'static str,
    pub temp_min: f32,
    pub temp_max: f32,
    pub moisture_min: u8,
    pub moisture_max: u8,
    pub affinity: Affinity,
}

const fn crop(
    id: CropId,
    display_name: &'static str,
    temp: (f32, f32),
    moisture: (u8, u8),
    affinity: Affinity,
) -> CropProfile {
    CropProfile {
        id,
        display_name,
        temp_min: temp.0,
        temp_max: temp.1,
        moisture_min: moisture.0,
        moisture_max: moisture.1,
        affinity,
    }
}

/// Katalog-Reihenfolge ist der Tie-Break beim Ranking.
pub static CATALOG: [CropProfile; 8] = [
    crop(CropId::Paddy, "Rice", (20.0, 35.0), (70, 95), Affinity::Only(SeasonType::Kharif)),
    crop(CropId::Wheat, "Wheat", (10.0, 25.0), (40, 70), Affinity::Only(SeasonType::Rabi)),
    crop(CropId::Maize, "Maize", (15.0, 30.0), (50, 80), Affinity::Both),
    crop(CropId::Vegetables, "Vegetables", (15.0, 30.0), (60, 85), Affinity::All),
    crop(CropId::Cotton, "Cotton", (20.0, 35.0), (45, 75), Affinity::Only(SeasonType::Kharif)),
    crop(CropId::Millets, "Millets", (20.0, 40.0), (30, 65), Affinity::Only(SeasonType::Kharif)),
    crop(CropId::Groundnut, "Groundnut", (22.0, 35.0), (40, 70), Affinity::Only(SeasonType::Kharif)),
    crop(CropId::Sugarcane, "Sugarcane", (20.0, 35.0), (65, 90), Affinity::All),
];

pub const SEASON_WEIGHT: u8 = 40;
pub const TEMP_WEIGHT: u8 = 30;
pub const MOISTURE_WEIGHT: u8 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    pub crop_id: CropId,
    /// 5..=100
    pub score: u8,
}

/// Qualitative band of the best score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Rating {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Rating::Excellent,
            60..=79 => Rating::Good,
            40..=59 => Rating::Fair,
            _ => Rating::Poor,
        }
    }

    pub fn stars(self) -> &'static str {
        match self {
            Rating::Excellent => "⭐⭐⭐",
            Rating::Good => "⭐⭐",
            Rating::Fair => "⭐",
            Rating::Poor => "⭕",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Rating::Excellent => "#10b981",
            Rating::Good => "#3b82f6",
            Rating::Fair => "#f59e0b",
            Rating::Poor => "#ef4444",
        }
    }
}

fn season_points(affinity: Affinity, season: SeasonType) -> u8 {
    match (affinity, season) {
        (Affinity::All, _) => SEASON_WEIGHT,
        (Affinity::Both, SeasonType::Rabi | SeasonType::Kharif) => SEASON_WEIGHT,
        (Affinity::Only(s), actual) if s == actual => SEASON_WEIGHT,
        (Affinity::Only(SeasonType::Kharif), SeasonType::Zaid) => 20,
        (Affinity::Only(SeasonType::Rabi), SeasonType::Zaid) => 15,
        _ => 5,
    }
}

/// `weight` inside `[min, max]`, then 2/3, 1/3 and 1/6 of it by distance to
/// the nearest bound (≤ 5, ≤ 10, further).
fn band_points(value: f32, min: f32, max: f32, weight: u8) -> u8 {
    if (min..=max).contains(&value) {
        return weight;
    }
    let distance = if value < min { min - value } else { value - max };
    if distance <= 5.0 {
        weight * 2 / 3
    } else if distance <= 10.0 {
        weight / 3
    } else {
        weight / 6
    }
}

pub fn score_profile(profile: &CropProfile, temp_c: f32, soil_pct: u8, season: SeasonType) -> u8 {
    season_points(profile.affinity, season)
        + band_points(temp_c, profile.temp_min, profile.temp_max, TEMP_WEIGHT)
        + band_points(
            f32::from(soil_pct),
            f32::from(profile.moisture_min),
            f32::from(profile.moisture_max),
            MOISTURE_WEIGHT,
        )
}

/// Scores every profile of `catalog`, best first. Ties keep catalog order.
pub fn rank(catalog: &[CropProfile], temp_c: f32, soil_pct: u8, season: SeasonType) -> Vec<ScoreResult> {
    let mut results: Vec<ScoreResult> = catalog
        .iter()
        .map(|p| ScoreResult {
            crop_id: p.id,
            score: score_profile(p, temp_c, soil_pct, season),
        })
        .collect();
    // sort_by ist stabil
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

pub fn score(sample: &SensorSample, season: SeasonType) -> Vec<ScoreResult> {
    rank(&CATALOG, sample.temperature_c, sample.soil_pct, season)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub best: ScoreResult,
    pub rating: Rating,
    pub ranking: Vec<ScoreResult>,
}

pub fn recommend(sample: &SensorSample, season: SeasonType) -> Recommendation {
    let ranking = score(sample, season);
    // Katalog ist nie leer
    let best = ranking[0];
    Recommendation {
        best,
        rating: Rating::from_score(best.score),
        ranking,
    }
}
