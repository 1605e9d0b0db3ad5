//! Anzeigetexte für en / hi / te.
//!
//! Every language is a full [`Strings`] value, so a missing key is a compile
//! error; [`validate`] additionally rejects empty entries at startup.

use serde::Serialize;

use crate::config::ConfigError;
use crate::control::Status;
use crate::crops::{CropId, Rating};
use crate::season::Season;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Te,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Hi, Language::Te];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Te => "te",
        }
    }

    /// Name in der Sprache selbst (Sprachauswahl)
    pub fn native_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "हिन्दी",
            Language::Te => "తెలుగు",
        }
    }

    pub fn english_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "Hindi",
            Language::Te => "Telugu",
        }
    }

    pub fn strings(self) -> &'static Strings {
        match self {
            Language::En => &EN,
            Language::Hi => &HI,
            Language::Te => &TE,
        }
    }
}

pub struct SeasonLabels {
    pub rabi_sowing: &'static str,
    pub rabi_growing: &'static str,
    pub rabi_harvest: &'static str,
    pub kharif_sowing: &'static str,
    pub kharif_growing: &'static str,
    pub zaid: &'static str,
}

pub struct CropNames {
    pub paddy: &'static str,
    pub wheat: &'static str,
    pub maize: &'static str,
    pub vegetables: &'static str,
    pub cotton: &'static str,
    pub millets: &'static str,
    pub groundnut: &'static str,
    pub sugarcane: &'static str,
}

pub struct RatingLabels {
    pub excellent: &'static str,
    pub good: &'static str,
    pub fair: &'static str,
    pub poor: &'static str,
}

pub struct Strings {
    pub title: &'static str,
    pub temperature: &'static str,
    pub humidity: &'static str,
    pub soil_moisture: &'static str,
    pub rain_status: &'static str,
    pub tank_level: &'static str,
    pub pump: &'static str,
    pub mode: &'static str,
    pub toggle_pump: &'static str,
    pub change_mode: &'static str,
    pub force_water: &'static str,
    pub manual_run: &'static str,
    pub stop_water: &'static str,
    pub clear_logs: &'static str,
    pub status_good: &'static str,
    pub status_warn: &'static str,
    pub status_crit: &'static str,
    pub suggestion: &'static str,
    pub logs: &'static str,
    pub rain_detected: &'static str,
    pub raining: &'static str,
    pub no_rain: &'static str,
    pub soil_dry: &'static str,
    pub soil_wet: &'static str,
    pub tank_empty: &'static str,
    pub low_tank: &'static str,
    pub normal: &'static str,
    pub predicted_crop: &'static str,
    pub crop_score: &'static str,
    pub current_season: &'static str,
    pub language: &'static str,
    pub mode_auto: &'static str,
    pub mode_manual: &'static str,
    pub on: &'static str,
    pub off: &'static str,
    pub seasons: SeasonLabels,
    pub crops: CropNames,
    pub ratings: RatingLabels,
}

impl Strings {
    pub fn season(&self, season: Season) -> &'static str {
        let s = &self.seasons;
        match season {
            Season::RabiSowing => s.rabi_sowing,
            Season::RabiGrowing => s.rabi_growing,
            Season::RabiHarvest => s.rabi_harvest,
            Season::KharifSowing => s.kharif_sowing,
            Season::KharifGrowing => s.kharif_growing,
            Season::Zaid => s.zaid,
        }
    }

    pub fn crop(&self, crop: CropId) -> &'static str {
        let c = &self.crops;
        match crop {
            CropId::Paddy => c.paddy,
            CropId::Wheat => c.wheat,
            CropId::Maize => c.maize,
            CropId::Vegetables => c.vegetables,
            CropId::Cotton => c.cotton,
            CropId::Millets => c.millets,
            CropId::Groundnut => c.groundnut,
            CropId::Sugarcane => c.sugarcane,
        }
    }

    pub fn rating(&self, rating: Rating) -> &'static str {
        let r = &self.ratings;
        match rating {
            Rating::Excellent => r.excellent,
            Rating::Good => r.good,
            Rating::Fair => r.fair,
            Rating::Poor => r.poor,
        }
    }

    pub fn status(&self, status: Status) -> &'static str {
        match status {
            Status::Good => self.status_good,
            Status::Warn => self.status_warn,
            Status::Crit => self.status_crit,
        }
    }

    fn entries(&self) -> Vec<(&'static str, &'static str)> {
        let mut v = vec![
            ("title", self.title),
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("soil_moisture", self.soil_moisture),
            ("rain_status", self.rain_status),
            ("tank_level", self.tank_level),
            ("pump", self.pump),
            ("mode", self.mode),
            ("toggle_pump", self.toggle_pump),
            ("change_mode", self.change_mode),
            ("force_water", self.force_water),
            ("manual_run", self.manual_run),
            ("stop_water", self.stop_water),
            ("clear_logs", self.clear_logs),
            ("status_good", self.status_good),
            ("status_warn", self.status_warn),
            ("status_crit", self.status_crit),
            ("suggestion", self.suggestion),
            ("logs", self.logs),
            ("rain_detected", self.rain_detected),
            ("raining", self.raining),
            ("no_rain", self.no_rain),
            ("soil_dry", self.soil_dry),
            ("soil_wet", self.soil_wet),
            ("tank_empty", self.tank_empty),
            ("low_tank", self.low_tank),
            ("normal", self.normal),
            ("predicted_crop", self.predicted_crop),
            ("crop_score", self.crop_score),
            ("current_season", self.current_season),
            ("language", self.language),
            ("mode_auto", self.mode_auto),
            ("mode_manual", self.mode_manual),
            ("on", self.on),
            ("off", self.off),
        ];
        v.extend(Season::ALL.map(|s| (s.as_str(), self.season(s))));
        v.extend(crate::crops::CATALOG.iter().map(|p| (p.id.as_str(), self.crop(p.id))));
        v.extend([
            ("excellent", self.ratings.excellent),
            ("good", self.ratings.good),
            ("fair", self.ratings.fair),
            ("poor", self.ratings.poor),
        ]);
        v
    }
}

/// Startup check over every language table.
pub fn validate() -> Result<(), ConfigError> {
    for lang in Language::ALL {
        if let Some((key, _)) = lang
            .strings()
            .entries()
            .into_iter()
            .find(|(_, text)| text.trim().is_empty())
        {
            return Err(ConfigError::Translation {
                language: lang.code(),
                key,
            });
        }
    }
    Ok(())
}

pub static EN: Strings = Strings {
    title: "Smart Crop Predictor",
    temperature: "Temperature",
    humidity: "Humidity",
    soil_moisture: "Soil Moisture",
    rain_status: "Rain Status",
    tank_level: "Tank Level",
    pump: "Pump",
    mode: "Mode",
    toggle_pump: "Toggle Pump",
    change_mode: "Mode",
    force_water: "Force Water",
    manual_run: "Manual run",
    stop_water: "Stop Water",
    clear_logs: "Clear",
    status_good: "Good",
    status_warn: "Warning",
    status_crit: "Critical",
    suggestion: "Suggestion:",
    logs: "Logs",
    rain_detected: "Rain detected - Pump OFF",
    raining: "RAINING",
    no_rain: "NO RAIN",
    soil_dry: "Soil dry - irrigation needed",
    soil_wet: "Soil wet - stop irrigation",
    tank_empty: "Tank empty! Refill needed",
    low_tank: "Low water level!",
    normal: "Normal conditions",
    predicted_crop: "PREDICTED CROP",
    crop_score: "Suitability:",
    current_season: "Season:",
    language: "Language",
    mode_auto: "Auto",
    mode_manual: "Manual",
    on: "ON",
    off: "OFF",
    seasons: SeasonLabels {
        rabi_sowing: "🌱 Rabi (Sowing)",
        rabi_growing: "🌾 Rabi (Growing)",
        rabi_harvest: "📦 Rabi (Harvest)",
        kharif_sowing: "🌱 Kharif (Sowing)",
        kharif_growing: "🌾 Kharif (Growing)",
        zaid: "☀️ Zaid (Summer)",
    },
    crops: CropNames {
        paddy: "Rice",
        wheat: "Wheat",
        maize: "Maize",
        vegetables: "Vegetables",
        cotton: "Cotton",
        millets: "Millets",
        groundnut: "Groundnut",
        sugarcane: "Sugarcane",
    },
    ratings: RatingLabels {
        excellent: "Excellent",
        good: "Good",
        fair: "Fair",
        poor: "Poor",
    },
};

pub static HI: Strings = Strings {
    title: "स्मार्ट फसल भविष्यवक्ता",
    temperature: "तापमान",
    humidity: "नमी",
    soil_moisture: "मिट्टी नमी",
    rain_status: "वर्षा स्थिति",
    tank_level: "टैंक स्तर",
    pump: "पम्प",
    mode: "मोड",
    toggle_pump: "पम्प टॉगल",
    change_mode: "मोड",
    force_water: "जबरन पानी",
    manual_run: "मैनुअल सिंचाई",
    stop_water: "पानी रोको",
    clear_logs: "साफ",
    status_good: "अच्छा",
    status_warn: "चेतावनी",
    status_crit: "गंभीर",
    suggestion: "सलाह:",
    logs: "लॉग",
    rain_detected: "बारिश - पम्प बंद",
    raining: "बारिश",
    no_rain: "बारिश नहीं",
    soil_dry: "मिट्टी सूखी - सिंचाई चाहिए",
    soil_wet: "मिट्टी गीली - सिंचाई बंद",
    tank_empty: "टैंक खाली! भरें",
    low_tank: "कम पानी!",
    normal: "सामान्य",
    predicted_crop: "भविष्यवाणी फसल",
    crop_score: "उपयुक्तता:",
    current_season: "मौसम:",
    language: "भाषा",
    mode_auto: "स्वचालित",
    mode_manual: "मैन्युअल",
    on: "चालू",
    off: "बंद",
    seasons: SeasonLabels {
        rabi_sowing: "🌱 रबी (बुवाई)",
        rabi_growing: "🌾 रबी (बढ़ रहा)",
        rabi_harvest: "📦 रबी (कटाई)",
        kharif_sowing: "🌱 खरीफ (बुवाई)",
        kharif_growing: "🌾 खरीफ (बढ़ रहा)",
        zaid: "☀️ जायद (गर्मी)",
    },
    crops: CropNames {
        paddy: "धान",
        wheat: "गेहूं",
        maize: "मक्का",
        vegetables: "सब्जियां",
        cotton: "कपास",
        millets: "मोटे अनाज",
        groundnut: "मूंगफली",
        sugarcane: "गन्ना",
    },
    ratings: RatingLabels {
        excellent: "उत्तम",
        good: "अच्छा",
        fair: "ठीक",
        poor: "खराब",
    },
};

pub static TE: Strings = Strings {
    title: "స్మార్ట్ పంట ఊహించేందుకు",
    temperature: "ఉష్ణోగ్రత",
    humidity: "తేమ",
    soil_moisture: "నేల తేమ",
    rain_status: "వర్షం స్థితి",
    tank_level: "ట్యాంక్ స్థాయి",
    pump: "పంపు",
    mode: "మోడ్",
    toggle_pump: "పంపు మార్పు",
    change_mode: "మోడ్",
    force_water: "నీరు బలం",
    manual_run: "మాన్యువల్ నీరు",
    stop_water: "నీరు ఆపండి",
    clear_logs: "క్లియర్",
    status_good: "మంచిది",
    status_warn: "హెచ్చరిక",
    status_crit: "క్లిష్టం",
    suggestion: "సలహా:",
    logs: "లాగ్‌లు",
    rain_detected: "వర్షం - పంపు ఆఫ్",
    raining: "వర్షం",
    no_rain: "వర్షం లేదు",
    soil_dry: "నేల పొడి - నీరు కావాలి",
    soil_wet: "నేల తడి - నీరు ఆపండి",
    tank_empty: "ట్యాంక్ ఖాళీ! నింపండి",
    low_tank: "నీటి స్థాయి తక్కువ!",
    normal: "సాధారణం",
    predicted_crop: "ఊహించిన పంట",
    crop_score: "సరిపడుతుంది:",
    current_season: "ఋతువు:",
    language: "భాష",
    mode_auto: "స్వయంచాలక",
    mode_manual: "మాన్యువల్",
    on: "ఆన్",
    off: "ఆఫ్",
    seasons: SeasonLabels {
        rabi_sowing: "🌱 రబీ (విత్తడం)",
        rabi_growing: "🌾 రబీ (పెరుగుతోంది)",
        rabi_harvest: "📦 రబీ (కోత)",
        kharif_sowing: "🌱 ఖరీఫ్ (విత్తడం)",
        kharif_growing: "🌾 ఖరీఫ్ (పెరుగుతోంది)",
        zaid: "☀️ జైద్ (వేసవి)",
    },
    crops: CropNames {
        paddy: "వరి",
        wheat: "గోధుమ",
        maize: "మొక్కజొన్న",
        vegetables: "కూరగాయలు",
        cotton: "పత్తి",
        millets: "చిన్నధాన్యాలు",
        groundnut: "వేరుశనగ",
        sugarcane: "చెరకు",
    },
    ratings: RatingLabels {
        excellent: "అద్భుతం",
        good: "మంచిది",
        fair: "సరిపోతుంది",
        poor: "పేలవం",
    },
};
