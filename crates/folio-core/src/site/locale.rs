//! Accept-Language parsing and locale preference

use crate::model::Site;

/// Normalize `en-us` style tags to `en_US`
pub fn normalize_tag(tag: &str) -> String {
    let mut parts = tag.trim().split(['-', '_']);
    let primary = parts.next().unwrap_or_default().to_ascii_lowercase();
    match parts.next() {
        Some(region) if !region.is_empty() => {
            format!("{}_{}", primary, region.to_ascii_uppercase())
        }
        _ => primary,
    }
}

/// Primary language subtag of a normalized locale (`en_US` -> `en`)
pub fn primary_language(locale: &str) -> &str {
    locale.split('_').next().unwrap_or(locale)
}

/// Parse an `Accept-Language` header into tags ordered by quality
///
/// Entries with `q=0` or an unparsable weight are dropped; `*` is ignored.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(f32, usize, String)> = Vec::new();
    for (position, entry) in header.split(',').enumerate() {
        let mut parts = entry.split(';');
        let tag = parts.next().unwrap_or_default().trim();
        if tag.is_empty() || tag == "*" {
            continue;
        }
        let mut quality = 1.0f32;
        for param in parts {
            if let Some(value) = param.trim().strip_prefix("q=") {
                quality = value.trim().parse().unwrap_or(0.0);
            }
        }
        if quality <= 0.0 {
            continue;
        }
        weighted.push((quality, position, normalize_tag(tag)));
    }
    weighted.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let mut languages: Vec<String> = Vec::new();
    for (_, _, tag) in weighted {
        if !languages.contains(&tag) {
            languages.push(tag);
        }
    }
    languages
}

/// Pick the candidate whose locale best matches the preferred languages
///
/// Exact matches are tried for each preferred language before falling back
/// to its primary subtag. Returns `None` when nothing matches.
pub fn preferred_site<'a>(candidates: &[&'a Site], preferred: &[String]) -> Option<&'a Site> {
    for language in preferred {
        let normalized = normalize_tag(language);
        if let Some(site) = candidates.iter().find(|s| {
            s.locale
                .as_deref()
                .map(|l| normalize_tag(l) == normalized)
                .unwrap_or(false)
        }) {
            return Some(*site);
        }
        let primary = primary_language(&normalized);
        if let Some(site) = candidates.iter().find(|s| {
            s.locale
                .as_deref()
                .map(|l| primary_language(&normalize_tag(l)) == primary)
                .unwrap_or(false)
        }) {
            return Some(*site);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_orders_by_quality() {
        let langs = parse_accept_language("fr;q=0.5, en-US, de;q=0.8, *;q=0.1");
        assert_eq!(langs, vec!["en_US", "de", "fr"]);
    }

    #[test]
    fn test_parse_drops_zero_quality() {
        assert_eq!(parse_accept_language("en;q=0, fr"), vec!["fr"]);
        assert!(parse_accept_language("").is_empty());
    }

    #[test]
    fn test_region_falls_back_to_primary_language() {
        let en = Site::new("en", "English", "example.com").with_locale("en");
        let fr = Site::new("fr", "French", "example.com").with_locale("fr_FR");
        let candidates = vec![&en, &fr];

        let chosen = preferred_site(&candidates, &["en_GB".to_string()]);
        assert_eq!(chosen.map(|s| s.id.as_str()), Some("en"));

        let chosen = preferred_site(&candidates, &["fr".to_string()]);
        assert_eq!(chosen.map(|s| s.id.as_str()), Some("fr"));

        assert!(preferred_site(&candidates, &["de".to_string()]).is_none());
    }
}
