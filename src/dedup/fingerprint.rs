use crate::models::Listing;

/// Tuning for the weakest evidence part (the price/tipology/area/location
/// combo). Two distinct ads sharing all four collapse to one fingerprint,
/// which is how cross-platform reposts are caught.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintConfig {
    /// How many of the four combo sub-parts must be non-empty before the
    /// combo counts as evidence.
    pub combo_min_fields: usize,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self { combo_min_fields: 1 }
    }
}

/// Ordered evidence parts used to identify a listing. Empty parts are skipped.
pub fn evidence_parts(listing: &Listing, config: &FingerprintConfig) -> Vec<String> {
    let mut parts = Vec::with_capacity(4);

    if !listing.url.is_empty() {
        parts.push(format!("url:{}", listing.url));
    }

    if !listing.source.is_empty() && !listing.ad_id.is_empty() {
        parts.push(format!("id:{}:{}", listing.source, listing.ad_id));
    }

    let phone: String = listing
        .advertiser
        .phone
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if !phone.is_empty() {
        parts.push(format!("phone:{}", phone));
    }

    let area = if listing.property.area_useful.is_empty() {
        &listing.property.area_total
    } else {
        &listing.property.area_useful
    };
    let place = [
        listing.location.district.as_str(),
        listing.location.municipality.as_str(),
        listing.location.parish.as_str(),
    ]
    .join("|");
    let present = [
        !listing.price.is_empty(),
        !listing.property.tipology.is_empty(),
        !area.is_empty(),
        place != "||",
    ]
    .iter()
    .filter(|present| **present)
    .count();
    if present > 0 && present >= config.combo_min_fields {
        parts.push(format!(
            "combo:{}|{}|{}|{}",
            listing.price, listing.property.tipology, area, place
        ));
    }

    parts
}

/// 128-bit hex content hash identifying the real-world ad behind a listing.
pub fn fingerprint(listing: &Listing, config: &FingerprintConfig) -> String {
    let parts = evidence_parts(listing, config);
    let material = if parts.is_empty() {
        format!("{}|{}", listing.title, listing.price)
    } else {
        parts.join("||")
    };
    format!("{:x}", md5::compute(material.as_bytes()))
}
