use crate::models::Listing;

/// A signed score change and the human-readable reason for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustment {
    pub delta: i32,
    pub reason: String,
}

impl Adjustment {
    fn new(delta: i32, reason: impl Into<String>) -> Self {
        Self {
            delta,
            reason: reason.into(),
        }
    }
}

/// One independent scoring rule. Returns `None` when it does not apply.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub evaluate: fn(&Listing) -> Option<Adjustment>,
}

/// Evaluated in order; every firing rule contributes one reason.
pub const RULES: &[Rule] = &[
    Rule { name: "advertiser_name", evaluate: advertiser_name },
    Rule { name: "total_ads", evaluate: total_ads },
    Rule { name: "agency_keywords", evaluate: agency_keywords },
    Rule { name: "professional_photos", evaluate: professional_photos },
    Rule { name: "phone", evaluate: phone },
    Rule { name: "photo_count", evaluate: photo_count },
    Rule { name: "description_length", evaluate: description_length },
    Rule { name: "watermark", evaluate: watermark },
    Rule { name: "duplicate", evaluate: duplicate },
    Rule { name: "is_agency", evaluate: is_agency },
];

/// Words that give away an agency in the advertiser name
const AGENCY_NAME_KEYWORDS: &[&str] = &[
    "imobiliaria", "imobiliária", "imoveis", "imóveis", "mediacao", "mediação",
    "real estate", "realty", "properties", "homes", "investimentos", "consultores",
    "remax", "re max", "era", "century 21", "keller williams", "kw", "zome", "iad",
    "predial", "lda", "unipessoal",
];

/// Placeholder names platforms show when the seller hides theirs
const GENERIC_NAMES: &[&str] = &[
    "particular", "proprietario", "proprietário", "anunciante", "utilizador",
    "vendedor", "user", "owner", "private",
];

/// Lowercase, punctuation folded to single spaces, padded for whole-word search.
fn padded_words(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    format!(" {} ", folded.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn agency_name_match(name: &str) -> Option<&'static str> {
    let haystack = padded_words(name);
    AGENCY_NAME_KEYWORDS
        .iter()
        .find(|kw| haystack.contains(&format!(" {} ", kw)))
        .copied()
}

fn advertiser_name(listing: &Listing) -> Option<Adjustment> {
    let name = listing.advertiser.name.trim();
    if name.is_empty() {
        return None;
    }
    if let Some(kw) = agency_name_match(name) {
        return Some(Adjustment::new(-30, format!("advertiser name contains agency term '{}'", kw)));
    }
    let generic = GENERIC_NAMES.contains(&padded_words(name).trim());
    (!generic).then(|| Adjustment::new(5, "advertiser shows a personal name"))
}

fn total_ads(listing: &Listing) -> Option<Adjustment> {
    let count = listing.advertiser.total_ads.parse::<f64>().ok();
    match count {
        None => Some(Adjustment::new(10, "advertiser ad count unknown")),
        Some(n) if n >= 20.0 => Some(Adjustment::new(-25, format!("advertiser has {} ads", n))),
        Some(n) if n >= 5.0 => Some(Adjustment::new(-15, format!("advertiser has {} ads", n))),
        Some(n) if n <= 0.0 => Some(Adjustment::new(10, "advertiser has no other ads")),
        Some(_) => None,
    }
}

fn agency_keywords(listing: &Listing) -> Option<Adjustment> {
    let keywords = &listing.signals.agency_keywords;
    if keywords.is_empty() {
        return None;
    }
    Some(Adjustment::new(
        -10 * keywords.len() as i32,
        format!("agency keywords in text: {}", keywords.join(", ")),
    ))
}

fn professional_photos(listing: &Listing) -> Option<Adjustment> {
    Some(if listing.signals.professional_photos {
        Adjustment::new(-15, "photos look professional")
    } else {
        Adjustment::new(5, "photos look amateur")
    })
}

fn phone(listing: &Listing) -> Option<Adjustment> {
    Some(if listing.advertiser.phone.trim().is_empty() {
        Adjustment::new(-5, "no phone number")
    } else {
        Adjustment::new(15, "phone number present")
    })
}

fn photo_count(listing: &Listing) -> Option<Adjustment> {
    let n = listing.photos.len();
    Some(match n {
        0 => Adjustment::new(-10, "no photos"),
        1..=8 => Adjustment::new(10, format!("{} photos, typical of a private seller", n)),
        9..=20 => Adjustment::new(0, format!("{} photos", n)),
        _ => Adjustment::new(-10, format!("{} photos, typical of an agency", n)),
    })
}

fn description_length(listing: &Listing) -> Option<Adjustment> {
    let len = listing.description.chars().count();
    match len {
        0 => Some(Adjustment::new(-10, "no description")),
        200..=1000 => Some(Adjustment::new(5, "description of moderate length")),
        n if n > 2000 => Some(Adjustment::new(-5, "very long description")),
        _ => None,
    }
}

fn watermark(listing: &Listing) -> Option<Adjustment> {
    listing
        .signals
        .watermark
        .then(|| Adjustment::new(-20, "watermark detected on photos"))
}

fn duplicate(listing: &Listing) -> Option<Adjustment> {
    listing
        .signals
        .duplicate
        .then(|| Adjustment::new(-10, "listing already flagged as duplicate"))
}

fn is_agency(listing: &Listing) -> Option<Adjustment> {
    Some(if listing.advertiser.is_agency {
        Adjustment::new(-40, "platform marks advertiser as agency")
    } else {
        Adjustment::new(10, "platform marks advertiser as private")
    })
}
