//! Customer address extraction.
//!
//! Labeled address lines are handled by the label table; this module is the
//! pattern fallback for addresses written inline: a street line, the
//! "City, ST 12345" trio, and country keywords.

use std::sync::LazyLock;

use regex::Regex;

use crate::record::Field;

use super::labels::LabeledLine;
use super::{Candidate, Tier};

/// "1420 Commerce Blvd", "88 Pine Street Suite 400".
static RE_STREET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d{1,6}\s+[A-Za-z0-9 .'-]{2,40}?\s(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Drive|Dr|Lane|Ln|Way|Court|Ct|Parkway|Pkwy|Plaza|Pl)\b\.?(?:,?\s*(?:Suite|Ste|Unit|Floor|Fl)\s*\.?\s*#?\w+)?",
    )
    .unwrap()
});

/// "Austin, TX 78701" / "Austin, TX".
static RE_CITY_STATE_ZIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z .'-]{1,30}),\s*([A-Z]{2})(?:\s+(\d{5}(?:-\d{4})?))?\b").unwrap()
});

/// USPS state and territory codes plus Canadian provinces. The trio regex
/// alone would read "Derek Foster, VP" as a city/state pair.
const STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC", "PR", "AB", "BC", "MB", "NB", "NL", "NS", "ON", "PE",
    "QC", "SK",
];

const COUNTRY_KEYWORDS: &[(&str, &str)] = &[
    ("united states", "United States"),
    ("usa", "United States"),
    ("u.s.", "United States"),
    ("canada", "Canada"),
    ("united kingdom", "United Kingdom"),
    ("uk", "United Kingdom"),
    ("australia", "Australia"),
    ("mexico", "Mexico"),
];

/// Pattern-tier address candidates. Runs only on lines the label table did
/// not already claim, so "Address: 1420 Commerce Blvd" is not double-counted.
pub fn extract(text: &str, labeled: &[LabeledLine]) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let unlabeled: Vec<&str> = text
        .lines()
        .filter(|line| !labeled.iter().any(|l| line.contains(l.value.as_str())))
        .collect();
    let haystack = unlabeled.join("\n");

    if let Some(m) = RE_STREET.find(&haystack) {
        candidates.push(Candidate::new(
            Field::CustomerStreet,
            m.as_str().trim_end_matches([',', '.']),
            55,
            Tier::Pattern,
        ));
    }

    if let Some(caps) = RE_CITY_STATE_ZIP
        .captures_iter(&haystack)
        .find(|c| STATE_CODES.contains(&&c[2]))
    {
        candidates.push(Candidate::new(
            Field::CustomerCity,
            caps[1].trim(),
            50,
            Tier::Pattern,
        ));
        candidates.push(Candidate::new(
            Field::CustomerState,
            &caps[2],
            50,
            Tier::Pattern,
        ));
        if let Some(zip) = caps.get(3) {
            candidates.push(Candidate::new(
                Field::CustomerZip,
                zip.as_str(),
                50,
                Tier::Pattern,
            ));
        }
    }

    let lower = haystack.to_ascii_lowercase();
    if let Some((_, canonical)) = COUNTRY_KEYWORDS
        .iter()
        .find(|(kw, _)| contains_token(&lower, kw))
    {
        candidates.push(Candidate::new(
            Field::CustomerCountry,
            *canonical,
            40,
            Tier::Pattern,
        ));
    }

    candidates
}

/// Word-bounded containment so "uk" never fires inside "bucket".
fn contains_token(haystack: &str, needle: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let abs = start + pos;
        let before_ok = abs == 0
            || !haystack[..abs]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let after = abs + needle.len();
        let after_ok = after >= haystack.len()
            || !haystack[after..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = abs + needle.len();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn street_line() {
        let cands = extract("They are at 1420 Commerce Blvd, Austin, TX 78701.", &[]);
        assert!(cands
            .iter()
            .any(|c| c.field == Field::CustomerStreet && c.value == "1420 Commerce Blvd"));
        assert!(cands
            .iter()
            .any(|c| c.field == Field::CustomerCity && c.value == "Austin"));
        assert!(cands
            .iter()
            .any(|c| c.field == Field::CustomerState && c.value == "TX"));
        assert!(cands
            .iter()
            .any(|c| c.field == Field::CustomerZip && c.value == "78701"));
    }

    #[test]
    fn street_with_suite() {
        let cands = extract("HQ: 88 Pine Street Suite 400", &[]);
        let street = cands
            .iter()
            .find(|c| c.field == Field::CustomerStreet)
            .unwrap();
        assert_eq!(street.value, "88 Pine Street Suite 400");
    }

    #[test]
    fn city_state_without_zip() {
        let cands = extract("offices in Portland, OR and beyond", &[]);
        assert!(cands
            .iter()
            .any(|c| c.field == Field::CustomerCity && c.value == "Portland"));
        assert!(cands.iter().all(|c| c.field != Field::CustomerZip));
    }

    #[test]
    fn person_comma_title_does_not_read_as_city_state() {
        let cands = extract("Derek Foster, VP of Operations will attend", &[]);
        assert!(cands.iter().all(|c| c.field != Field::CustomerCity));
    }

    #[test]
    fn country_keywords_word_bounded() {
        let cands = extract("All sites are in Canada.", &[]);
        assert!(cands
            .iter()
            .any(|c| c.field == Field::CustomerCountry && c.value == "Canada"));

        let cands = extract("grab a bucket of leads", &[]);
        assert!(cands.iter().all(|c| c.field != Field::CustomerCountry));
    }

    #[test]
    fn labeled_lines_are_skipped() {
        let labeled = vec![LabeledLine {
            label: "address".to_string(),
            value: "1420 Commerce Blvd".to_string(),
        }];
        let cands = extract("Address: 1420 Commerce Blvd", &labeled);
        assert!(cands.iter().all(|c| c.field != Field::CustomerStreet));
    }
}
