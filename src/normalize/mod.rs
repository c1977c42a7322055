//! Reduces loosely-typed collector records to the canonical [`Listing`].

pub mod coerce;

use crate::models::{Advertiser, Listing, Location, PropertyDetails, Signals};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::debug;

static NULL: Value = Value::Null;

/// Normalize one raw record, stamping it with the current time when it
/// carries no capture timestamp of its own.
pub fn normalize(raw: &Value) -> Listing {
    normalize_at(raw, Utc::now())
}

/// Normalize one raw record against a fixed capture instant.
///
/// Never fails. Anything that is not a JSON object is treated as an empty
/// record, and unknown keys are ignored.
pub fn normalize_at(raw: &Value, now: DateTime<Utc>) -> Listing {
    if !raw.is_object() {
        debug!("Raw record is not an object, normalizing to defaults");
    }
    let top = raw.as_object();

    let scraped_at = match coerce::text(field(top, "scraped_at")) {
        s if s.is_empty() => now.to_rfc3339_opts(SecondsFormat::Millis, true),
        s => s,
    };
    let published_date = coerce::text(field(top, "published_date"));

    let mut days_online = coerce::numeric(field(top, "days_online"));
    if days_online.is_empty() {
        days_online = derive_days_online(&published_date, &scraped_at).unwrap_or_default();
    }

    Listing {
        source: coerce::text(field(top, "source")),
        ad_id: coerce::text(field(top, "ad_id")),
        url: coerce::text(field(top, "url")),
        published_date,
        updated_date: coerce::text(field(top, "updated_date")),
        scraped_at,
        days_online,
        title: coerce::text(field(top, "title")),
        description: coerce::text(field(top, "description")),
        price: coerce::numeric(field(top, "price")),
        location: location(nested(top, "location")),
        property: property(nested(top, "property")),
        features: coerce::list(field(top, "features")),
        photos: coerce::list(field(top, "photos")),
        advertiser: advertiser(nested(top, "advertiser")),
        signals: signals(nested(top, "signals")),
    }
}

/// Normalize a whole batch. One bad record never affects the others.
pub fn normalize_batch(raws: &[Value], now: DateTime<Utc>) -> Vec<Listing> {
    raws.iter().map(|raw| normalize_at(raw, now)).collect()
}

fn field<'a>(obj: Option<&'a Map<String, Value>>, key: &str) -> &'a Value {
    obj.and_then(|o| o.get(key)).unwrap_or(&NULL)
}

fn nested<'a>(obj: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a Map<String, Value>> {
    field(obj, key).as_object()
}

fn location(obj: Option<&Map<String, Value>>) -> Location {
    Location {
        district: coerce::text(field(obj, "district")),
        municipality: coerce::text(field(obj, "municipality")),
        parish: coerce::text(field(obj, "parish")),
        lat: coerce::text(field(obj, "lat")),
        lng: coerce::text(field(obj, "lng")),
    }
}

fn property(obj: Option<&Map<String, Value>>) -> PropertyDetails {
    PropertyDetails {
        kind: coerce::text(field(obj, "type")),
        tipology: coerce::text(field(obj, "tipology")),
        area_total: coerce::numeric(field(obj, "area_total")),
        area_useful: coerce::numeric(field(obj, "area_useful")),
        year: coerce::numeric(field(obj, "year")),
        floor: coerce::text(field(obj, "floor")),
        condition: coerce::text(field(obj, "condition")),
    }
}

fn advertiser(obj: Option<&Map<String, Value>>) -> Advertiser {
    Advertiser {
        name: coerce::text(field(obj, "name")),
        total_ads: coerce::numeric(field(obj, "total_ads")),
        is_agency: coerce::flag(field(obj, "is_agency")),
        url: coerce::text(field(obj, "url")),
        phone: coerce::text(field(obj, "phone")),
    }
}

// `signals.is_agency` is never read: advertiser.is_agency is authoritative.
fn signals(obj: Option<&Map<String, Value>>) -> Signals {
    Signals {
        watermark: coerce::flag(field(obj, "watermark")),
        duplicate: coerce::flag(field(obj, "duplicate")),
        professional_photos: coerce::flag(field(obj, "professional_photos")),
        agency_keywords: coerce::unique_list(field(obj, "agency_keywords")),
    }
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn derive_days_online(published: &str, scraped_at: &str) -> Option<String> {
    let published = parse_instant(published)?;
    let scraped = parse_instant(scraped_at)?;
    let days = (scraped - published).num_days().max(0);
    Some(days.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn keys(value: &Value) -> Vec<String> {
        let mut keys: Vec<String> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn assert_no_nulls(value: &Value) {
        match value {
            Value::Null => panic!("null found in normalized output"),
            Value::Array(items) => items.iter().for_each(assert_no_nulls),
            Value::Object(map) => map.values().for_each(assert_no_nulls),
            _ => {}
        }
    }

    fn messy_record() -> Value {
        json!({
            "source": "olx",
            "ad_id": 998877,
            "url": "  https://www.olx.pt/d/anuncio/apartamento-t2-IDabc.html ",
            "published_date": "2024-06-01",
            "title": "Apartamento T2 com varanda",
            "description": null,
            "price": "185.000 €",
            "location": {"district": "Lisboa", "municipality": "Sintra", "lat": 38.8},
            "property": {"type": "apartamento", "tipology": "T2", "area_useful": "85,5 m²", "year": 1998.0},
            "features": "Varanda",
            "photos": ["a.jpg", null, "b.jpg"],
            "advertiser": {"name": "Joana", "total_ads": "1", "is_agency": "no", "phone": "912 345 678"},
            "signals": {"watermark": "Yes", "is_agency": true, "agency_keywords": ["lda", "lda", "remax"]},
            "scraper_debug": {"selector": ".card"}
        })
    }

    #[test]
    fn every_input_yields_full_schema() {
        let expected_top = vec![
            "ad_id", "advertiser", "days_online", "description", "features", "location",
            "photos", "price", "property", "published_date", "scraped_at", "signals", "source",
            "title", "updated_date", "url",
        ];
        for raw in [json!({}), json!([1, 2]), json!("text"), json!(42), Value::Null, messy_record()] {
            let out = serde_json::to_value(normalize_at(&raw, fixed_now())).unwrap();
            assert_eq!(keys(&out), expected_top);
            assert_eq!(keys(&out["location"]), vec!["district", "lat", "lng", "municipality", "parish"]);
            assert_eq!(
                keys(&out["property"]),
                vec!["area_total", "area_useful", "condition", "floor", "tipology", "type", "year"]
            );
            assert_eq!(keys(&out["advertiser"]), vec!["is_agency", "name", "phone", "total_ads", "url"]);
            assert_eq!(
                keys(&out["signals"]),
                vec!["agency_keywords", "duplicate", "professional_photos", "watermark"]
            );
            assert_no_nulls(&out);
        }
    }

    #[test]
    fn coerces_messy_fields() {
        let listing = normalize_at(&messy_record(), fixed_now());
        assert_eq!(listing.ad_id, "998877");
        assert_eq!(listing.url, "https://www.olx.pt/d/anuncio/apartamento-t2-IDabc.html");
        assert_eq!(listing.price, "185000");
        assert_eq!(listing.description, "");
        assert_eq!(listing.location.lat, "38.8");
        assert_eq!(listing.property.area_useful, "85.5");
        assert_eq!(listing.property.year, "1998");
        assert_eq!(listing.features, vec!["Varanda"]);
        assert_eq!(listing.photos, vec!["a.jpg", "b.jpg"]);
        assert!(!listing.advertiser.is_agency);
        assert!(listing.signals.watermark);
        assert_eq!(listing.signals.agency_keywords, vec!["lda", "remax"]);
        assert_eq!(listing.days_online, "9");
    }

    #[test]
    fn agency_flag_only_lives_on_advertiser() {
        let out = serde_json::to_value(normalize_at(&messy_record(), fixed_now())).unwrap();
        assert!(out["signals"].get("is_agency").is_none());
        assert_eq!(out["advertiser"]["is_agency"], json!(false));
        assert!(out.get("scraper_debug").is_none());
    }

    #[test]
    fn capture_time_defaults_to_now() {
        let listing = normalize_at(&json!({}), fixed_now());
        assert_eq!(listing.scraped_at, "2024-06-10T12:00:00.000Z");

        let kept = normalize_at(&json!({"scraped_at": "2024-01-01T00:00:00Z"}), fixed_now());
        assert_eq!(kept.scraped_at, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let floats = json!({
            "price": 1.567,
            "days_online": "3,7",
            "property": {"area_useful": 85.125, "area_total": 999.999, "year": 2001.0},
            "advertiser": {"total_ads": 12.5}
        });
        for raw in [messy_record(), json!({}), json!({"price": "1,5", "advertiser": "x"}), floats] {
            let once = normalize_at(&raw, fixed_now());
            let twice = normalize_at(&serde_json::to_value(&once).unwrap(), fixed_now());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn fractional_values_survive_a_second_pass() {
        let once = normalize_at(&json!({"property": {"area_useful": 85.125}}), fixed_now());
        assert_eq!(once.property.area_useful, "85.125");
        let twice = normalize_at(&serde_json::to_value(&once).unwrap(), fixed_now());
        assert_eq!(twice.property.area_useful, "85.125");
    }

    #[test]
    fn days_online_keeps_fraction() {
        let listing = normalize_at(&json!({"days_online": "3,7"}), fixed_now());
        assert_eq!(listing.days_online, "3.7");
        let whole = normalize_at(&json!({"days_online": 12.0}), fixed_now());
        assert_eq!(whole.days_online, "12");
    }

    #[test]
    fn batch_keeps_one_output_per_input() {
        let raws = vec![messy_record(), json!(null), json!({"title": "ok"})];
        let out = normalize_batch(&raws, fixed_now());
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].title, "ok");
    }
}
