use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platforms that feed the pipeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Idealista,
    Imovirtual,
    Olx,
    Casasapo,
    Custojusto,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Idealista,
        Platform::Imovirtual,
        Platform::Olx,
        Platform::Casasapo,
        Platform::Custojusto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Idealista => "idealista",
            Platform::Imovirtual => "imovirtual",
            Platform::Olx => "olx",
            Platform::Casasapo => "casasapo",
            Platform::Custojusto => "custojusto",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', '_', ' '], "");
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| format!("unknown platform: {}", s))
    }
}

/// Where the property is
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub district: String,
    pub municipality: String,
    pub parish: String,
    pub lat: String,
    pub lng: String,
}

/// Physical characteristics of the property
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyDetails {
    #[serde(rename = "type")]
    pub kind: String,
    pub tipology: String,
    pub area_total: String,
    pub area_useful: String,
    pub year: String,
    pub floor: String,
    pub condition: String,
}

/// Who placed the ad
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Advertiser {
    pub name: String,
    pub total_ads: String,
    pub is_agency: bool,
    pub url: String,
    pub phone: String,
}

/// Heuristic signals detected upstream by the collectors
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signals {
    pub watermark: bool,
    pub duplicate: bool,
    pub professional_photos: bool,
    pub agency_keywords: Vec<String>,
}

/// Canonical listing. Every source platform is reduced to this shape.
///
/// Text, count and date fields are strings where absence is `""`; nothing is
/// ever null.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    pub source: String,
    pub ad_id: String,
    pub url: String,
    pub published_date: String,
    pub updated_date: String,
    pub scraped_at: String,
    pub days_online: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub location: Location,
    pub property: PropertyDetails,
    pub features: Vec<String>,
    pub photos: Vec<String>,
    pub advertiser: Advertiser,
    pub signals: Signals,
}

/// Private-seller likelihood for one listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreResult {
    pub score: u8,
    pub reasons: Vec<String>,
}

/// A listing as handed back to the caller: canonical fields plus the
/// per-run annotations that live outside the schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredListing {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(rename = "_fingerprint")]
    pub fingerprint: String,
    pub is_new: bool,
    pub private_score: u8,
    pub score_reasons: Vec<String>,
}

/// Result of one pipeline invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchOutput {
    pub platform: String,
    pub total_results: usize,
    pub duplicates_removed: usize,
    pub new_count: usize,
    pub items: Vec<ScoredListing>,
}
