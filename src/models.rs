// Plain data records for the logbook entities.
// Ids are assigned by the database on insert and never reused; a record with
// id 0 has not been persisted yet. Dates are ISO-8601 strings ("YYYY-MM-DD"
// or "YYYY-MM-DD HH:MM").

use serde::{Deserialize, Serialize};

// ----- Enums (stored as lowercase TEXT tokens) -----

/// Stop increment class for shutter, aperture and exposure compensation scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncrementClass {
    Full,
    Half,
    #[default]
    Third,
}

impl IncrementClass {
    pub fn as_db(&self) -> &'static str {
        match self {
            IncrementClass::Full => "full",
            IncrementClass::Half => "half",
            IncrementClass::Third => "third",
        }
    }

    pub fn from_db(token: &str) -> Self {
        match token {
            "full" => IncrementClass::Full,
            "half" => IncrementClass::Half,
            _ => IncrementClass::Third,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilmType {
    #[default]
    Unknown,
    ColorNegative,
    Slide,
    BwNegative,
    Other,
}

impl FilmType {
    pub fn as_db(&self) -> &'static str {
        match self {
            FilmType::Unknown => "unknown",
            FilmType::ColorNegative => "color_negative",
            FilmType::Slide => "slide",
            FilmType::BwNegative => "bw_negative",
            FilmType::Other => "other",
        }
    }

    pub fn from_db(token: &str) -> Self {
        match token {
            "color_negative" => FilmType::ColorNegative,
            "slide" => FilmType::Slide,
            "bw_negative" => FilmType::BwNegative,
            "other" => FilmType::Other,
            _ => FilmType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilmProcess {
    #[default]
    Unknown,
    C41,
    E6,
    Bw,
    Other,
}

impl FilmProcess {
    pub fn as_db(&self) -> &'static str {
        match self {
            FilmProcess::Unknown => "unknown",
            FilmProcess::C41 => "c41",
            FilmProcess::E6 => "e6",
            FilmProcess::Bw => "bw",
            FilmProcess::Other => "other",
        }
    }

    pub fn from_db(token: &str) -> Self {
        match token {
            "c41" => FilmProcess::C41,
            "e6" => FilmProcess::E6,
            "bw" => FilmProcess::Bw,
            "other" => FilmProcess::Other,
            _ => FilmProcess::Unknown,
        }
    }
}

/// Film format. "135" is standard 35mm cartridge film.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RollFormat {
    #[default]
    Unknown,
    F135,
    F120,
    F4x5,
    F5x7,
    F8x10,
}

impl RollFormat {
    pub fn as_db(&self) -> &'static str {
        match self {
            RollFormat::Unknown => "unknown",
            RollFormat::F135 => "135",
            RollFormat::F120 => "120",
            RollFormat::F4x5 => "4x5",
            RollFormat::F5x7 => "5x7",
            RollFormat::F8x10 => "8x10",
        }
    }

    pub fn from_db(token: &str) -> Self {
        match token {
            "135" => RollFormat::F135,
            "120" => RollFormat::F120,
            "4x5" => RollFormat::F4x5,
            "5x7" => RollFormat::F5x7,
            "8x10" => RollFormat::F8x10,
            _ => RollFormat::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeteringMode {
    #[default]
    Unknown,
    CenterWeighted,
    Matrix,
    Spot,
    Partial,
}

impl MeteringMode {
    pub fn as_db(&self) -> &'static str {
        match self {
            MeteringMode::Unknown => "unknown",
            MeteringMode::CenterWeighted => "center_weighted",
            MeteringMode::Matrix => "matrix",
            MeteringMode::Spot => "spot",
            MeteringMode::Partial => "partial",
        }
    }

    pub fn from_db(token: &str) -> Self {
        match token {
            "center_weighted" => MeteringMode::CenterWeighted,
            "matrix" => MeteringMode::Matrix,
            "spot" => MeteringMode::Spot,
            "partial" => MeteringMode::Partial,
            _ => MeteringMode::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightSource {
    #[default]
    Unknown,
    Daylight,
    Sunny,
    Cloudy,
    Shade,
    Sunset,
    Tungsten,
    Fluorescent,
    Flash,
}

impl LightSource {
    pub fn as_db(&self) -> &'static str {
        match self {
            LightSource::Unknown => "unknown",
            LightSource::Daylight => "daylight",
            LightSource::Sunny => "sunny",
            LightSource::Cloudy => "cloudy",
            LightSource::Shade => "shade",
            LightSource::Sunset => "sunset",
            LightSource::Tungsten => "tungsten",
            LightSource::Fluorescent => "fluorescent",
            LightSource::Flash => "flash",
        }
    }

    pub fn from_db(token: &str) -> Self {
        match token {
            "daylight" => LightSource::Daylight,
            "sunny" => LightSource::Sunny,
            "cloudy" => LightSource::Cloudy,
            "shade" => LightSource::Shade,
            "sunset" => LightSource::Sunset,
            "tungsten" => LightSource::Tungsten,
            "fluorescent" => LightSource::Fluorescent,
            "flash" => LightSource::Flash,
            _ => LightSource::Unknown,
        }
    }
}

// ----- Value types -----

/// A geographic coordinate captured for a frame.
/// Persisted as a "lat lon" TEXT column plus a separate formatted address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: Option<String>,
}

impl Location {
    pub fn to_db(&self) -> String {
        format!("{} {}", self.latitude, self.longitude)
    }

    /// Parse a "lat lon" string. Returns None for malformed values so a
    /// damaged column degrades to "no location" instead of an error.
    pub fn from_db(coordinates: &str, formatted_address: Option<String>) -> Option<Self> {
        let mut parts = coordinates.split_whitespace();
        let latitude: f64 = parts.next()?.parse().ok()?;
        let longitude: f64 = parts.next()?.parse().ok()?;
        Some(Location {
            latitude,
            longitude,
            formatted_address,
        })
    }
}

// ----- Entities -----

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub serial_number: Option<String>,
    pub min_shutter: Option<String>,
    pub max_shutter: Option<String>,
    pub shutter_increments: IncrementClass,
    pub exposure_comp_increments: IncrementClass,
}

impl Camera {
    pub fn name(&self) -> String {
        format!("{} {}", self.make, self.model)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub serial_number: Option<String>,
    pub min_aperture: Option<String>,
    pub max_aperture: Option<String>,
    /// Equal min/max for a fixed-focal-length lens.
    pub min_focal_length: i64,
    pub max_focal_length: i64,
    pub aperture_increments: IncrementClass,
}

impl Lens {
    pub fn name(&self) -> String {
        format!("{} {}", self.make, self.model)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub id: i64,
    pub make: String,
    pub model: String,
}

impl Filter {
    pub fn name(&self) -> String {
        format!("{} {}", self.make, self.model)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilmStock {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub iso: i64,
    pub film_type: FilmType,
    pub process: FilmProcess,
    /// True for rows seeded from the bundled reference list.
    pub preadded: bool,
}

impl FilmStock {
    pub fn name(&self) -> String {
        format!("{} {}", self.make, self.model)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roll {
    pub id: i64,
    pub name: Option<String>,
    pub date: Option<String>,
    pub unloaded: Option<String>,
    pub developed: Option<String>,
    pub note: Option<String>,
    pub iso: Option<i64>,
    pub push_pull: Option<String>,
    pub format: RollFormat,
    pub archived: bool,
    pub camera_id: Option<i64>,
    pub film_stock_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: i64,
    pub roll_id: i64,
    /// Position within the roll. Meaningful only inside its roll.
    pub count: i64,
    pub date: Option<String>,
    pub lens_id: Option<i64>,
    pub shutter: Option<String>,
    pub aperture: Option<String>,
    pub note: Option<String>,
    pub location: Option<Location>,
    pub focal_length: Option<i64>,
    pub exposure_comp: Option<String>,
    pub no_of_exposures: i64,
    pub flash_used: bool,
    pub flash_power: Option<String>,
    pub flash_comp: Option<String>,
    pub metering_mode: MeteringMode,
    pub light_source: LightSource,
    /// File name of a complementary digital picture of this frame.
    pub picture_filename: Option<String>,
    /// Ids of the filters mounted for this exposure.
    pub filter_ids: Vec<i64>,
}
