//! Extraction vocabularies: configuration data, not code.
//!
//! Distributor names, solution-tag keywords, the public-mail-provider
//! denylist, and the organization's internal domain all live here so they
//! can grow without touching extraction logic. A shipped default covers the
//! common cases; deployments override it with a TOML file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IntakeError, IntakeResult};

// ── Entries ─────────────────────────────────────────────────────────────

/// A known distributor and the strings/domains that identify it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributorEntry {
    /// Canonical name, the only form ever written to a record.
    pub name: String,
    /// Case-insensitive aliases matched against body text.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Email domains belonging to this distributor.
    #[serde(default)]
    pub domains: Vec<String>,
}

/// A solution tag and the phrases that imply it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionEntry {
    /// Canonical tag written to the record's solution set.
    pub tag: String,
    /// Case-insensitive keywords matched against body text.
    #[serde(default)]
    pub keywords: Vec<String>,
}

// ── Vocabulary ──────────────────────────────────────────────────────────

/// Versioned extraction vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Monotonic vocabulary revision, bumped when entries change.
    #[serde(default = "default_version")]
    pub version: u32,
    /// The organization's own email domain. Addresses on this domain are
    /// forwarding staff, never partners/distributors/customers.
    pub internal_domain: String,
    /// Well-known consumer mail domains; never used for company inference.
    #[serde(default)]
    pub public_mail_domains: Vec<String>,
    #[serde(default)]
    pub distributors: Vec<DistributorEntry>,
    #[serde(default)]
    pub solutions: Vec<SolutionEntry>,
}

fn default_version() -> u32 {
    1
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Vocabulary {
    /// The shipped default vocabulary.
    pub fn builtin() -> Self {
        Vocabulary {
            version: 1,
            internal_domain: "internal.example".to_string(),
            public_mail_domains: [
                "gmail.com",
                "googlemail.com",
                "yahoo.com",
                "outlook.com",
                "hotmail.com",
                "aol.com",
                "icloud.com",
                "me.com",
                "msn.com",
                "live.com",
                "comcast.net",
                "proton.me",
                "protonmail.com",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            distributors: vec![
                distributor("Telarus", &["telarus"], &["telarus.com"]),
                distributor("Intelisys", &["intelisys"], &["intelisys.com"]),
                distributor(
                    "AVANT",
                    &["avant communications", "avant"],
                    &["goavant.net", "avantcommunications.com"],
                ),
                distributor(
                    "Sandler Partners",
                    &["sandler partners", "sandler"],
                    &["sandlerpartners.com"],
                ),
                distributor(
                    "Bridgepointe",
                    &["bridgepointe technologies", "bridgepointe"],
                    &["bridgepointetech.com", "bpt3.net"],
                ),
                distributor("Upstack", &["upstack"], &["upstack.com"]),
            ],
            solutions: vec![
                solution(
                    "CCaaS",
                    &[
                        "ccaas",
                        "contact center as a service",
                        "cloud contact center",
                        "contact center",
                        "call center",
                    ],
                ),
                solution(
                    "UCaaS",
                    &[
                        "ucaas",
                        "unified communications",
                        "hosted voice",
                        "cloud pbx",
                        "voip",
                    ],
                ),
                solution(
                    "Workforce Engagement",
                    &[
                        "workforce engagement",
                        "workforce management",
                        "wfm",
                        "wem",
                        "quality management",
                    ],
                ),
                solution(
                    "AI & Virtual Agents",
                    &[
                        "virtual agent",
                        "conversational ai",
                        "chatbot",
                        "ai agent",
                        "self-service bot",
                    ],
                ),
                solution(
                    "Analytics",
                    &["speech analytics", "interaction analytics", "analytics"],
                ),
                solution(
                    "Outbound",
                    &["outbound dialer", "predictive dialer", "campaign management"],
                ),
            ],
        }
    }

    /// Parse a vocabulary from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> IntakeResult<Self> {
        let vocab: Vocabulary = toml::from_str(text).map_err(|e| IntakeError::Vocabulary {
            message: e.to_string(),
        })?;
        vocab.validate()?;
        Ok(vocab)
    }

    /// Load and validate a vocabulary TOML file.
    pub fn load(path: &Path) -> IntakeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Structural checks beyond what serde enforces.
    pub fn validate(&self) -> IntakeResult<()> {
        if self.internal_domain.trim().is_empty() || !self.internal_domain.contains('.') {
            return Err(IntakeError::Vocabulary {
                message: format!("internal_domain {:?} is not a domain", self.internal_domain),
            });
        }
        if self.distributors.is_empty() {
            return Err(IntakeError::Vocabulary {
                message: "at least one distributor entry is required".to_string(),
            });
        }
        for d in &self.distributors {
            if d.name.trim().is_empty() {
                return Err(IntakeError::Vocabulary {
                    message: "distributor with empty name".to_string(),
                });
            }
        }
        for s in &self.solutions {
            if s.tag.trim().is_empty() {
                return Err(IntakeError::Vocabulary {
                    message: "solution entry with empty tag".to_string(),
                });
            }
        }
        Ok(())
    }

    // ── Lookups ─────────────────────────────────────────────────────

    /// Whether `addr` belongs to the internal domain (exact or subdomain).
    pub fn is_internal_email(&self, addr: &str) -> bool {
        let addr = addr.trim().to_ascii_lowercase();
        let domain = self.internal_domain.to_ascii_lowercase();
        match addr.rsplit_once('@') {
            Some((_, d)) => d == domain || d.ends_with(&format!(".{domain}")),
            None => false,
        }
    }

    /// Whether `domain` is a consumer mail provider.
    pub fn is_public_mail_domain(&self, domain: &str) -> bool {
        let domain = domain.to_ascii_lowercase();
        self.public_mail_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(&domain))
    }

    /// First distributor whose name or alias appears in `text` (word-bounded,
    /// case-insensitive). Entries are checked in vocabulary order, aliases
    /// longest-first so "avant communications" beats "avant".
    pub fn match_distributor(&self, text: &str) -> Option<&str> {
        let haystack = text.to_ascii_lowercase();
        for entry in &self.distributors {
            let mut needles: Vec<&str> = entry.aliases.iter().map(String::as_str).collect();
            needles.push(entry.name.as_str());
            needles.sort_by_key(|n| std::cmp::Reverse(n.len()));
            for needle in needles {
                if contains_word(&haystack, &needle.to_ascii_lowercase()) {
                    return Some(&entry.name);
                }
            }
        }
        None
    }

    /// Distributor owning the given email domain, if any.
    pub fn distributor_for_domain(&self, domain: &str) -> Option<&str> {
        let domain = domain.to_ascii_lowercase();
        self.distributors
            .iter()
            .find(|d| d.domains.iter().any(|dd| dd.eq_ignore_ascii_case(&domain)))
            .map(|d| d.name.as_str())
    }

    /// All solution tags whose keywords appear in `text` (word-bounded,
    /// case-insensitive), in vocabulary order.
    pub fn match_solutions(&self, text: &str) -> Vec<&str> {
        let haystack = text.to_ascii_lowercase();
        self.solutions
            .iter()
            .filter(|s| {
                s.keywords
                    .iter()
                    .any(|k| contains_word(&haystack, &k.to_ascii_lowercase()))
            })
            .map(|s| s.tag.as_str())
            .collect()
    }
}

fn distributor(name: &str, aliases: &[&str], domains: &[&str]) -> DistributorEntry {
    DistributorEntry {
        name: name.to_string(),
        aliases: aliases.iter().map(|s| s.to_string()).collect(),
        domains: domains.iter().map(|s| s.to_string()).collect(),
    }
}

fn solution(tag: &str, keywords: &[&str]) -> SolutionEntry {
    SolutionEntry {
        tag: tag.to_string(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
    }
}

/// Substring containment with word boundaries on both ends, so "avant"
/// matches "via AVANT." but not "avantgarde".
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
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
    fn builtin_is_valid() {
        Vocabulary::builtin().validate().unwrap();
    }

    #[test]
    fn internal_email_detection() {
        let vocab = Vocabulary::builtin();
        assert!(vocab.is_internal_email("sarah@internal.example"));
        assert!(vocab.is_internal_email("Sarah@INTERNAL.EXAMPLE"));
        assert!(vocab.is_internal_email("ops@mail.internal.example"));
        assert!(!vocab.is_internal_email("jess@partner.net"));
        assert!(!vocab.is_internal_email("not-an-address"));
    }

    #[test]
    fn distributor_by_alias_word_bounded() {
        let vocab = Vocabulary::builtin();
        assert_eq!(vocab.match_distributor("Sourced via Telarus."), Some("Telarus"));
        assert_eq!(vocab.match_distributor("through AVANT today"), Some("AVANT"));
        assert_eq!(vocab.match_distributor("the avantgarde option"), None);
        assert_eq!(vocab.match_distributor("no distributor named"), None);
    }

    #[test]
    fn distributor_by_domain() {
        let vocab = Vocabulary::builtin();
        assert_eq!(vocab.distributor_for_domain("telarus.com"), Some("Telarus"));
        assert_eq!(vocab.distributor_for_domain("TELARUS.COM"), Some("Telarus"));
        assert_eq!(vocab.distributor_for_domain("partner.net"), None);
    }

    #[test]
    fn solutions_by_keyword() {
        let vocab = Vocabulary::builtin();
        let tags = vocab.match_solutions("They want a cloud contact center with speech analytics.");
        assert!(tags.contains(&"CCaaS"));
        assert!(tags.contains(&"Analytics"));
        assert!(!tags.contains(&"UCaaS"));
    }

    #[test]
    fn public_mail_denylist() {
        let vocab = Vocabulary::builtin();
        assert!(vocab.is_public_mail_domain("gmail.com"));
        assert!(vocab.is_public_mail_domain("GMAIL.com"));
        assert!(!vocab.is_public_mail_domain("pinnacleretail.com"));
    }

    #[test]
    fn toml_round_trip() {
        let text = r#"
version = 4
internal_domain = "corp.example"
public_mail_domains = ["gmail.com"]

[[distributors]]
name = "Telarus"
aliases = ["telarus"]
domains = ["telarus.com"]

[[solutions]]
tag = "CCaaS"
keywords = ["contact center"]
"#;
        let vocab = Vocabulary::from_toml_str(text).unwrap();
        assert_eq!(vocab.version, 4);
        assert_eq!(vocab.internal_domain, "corp.example");
        assert_eq!(vocab.match_distributor("per telarus"), Some("Telarus"));
    }

    #[test]
    fn invalid_toml_rejected() {
        assert!(Vocabulary::from_toml_str("internal_domain = 3").is_err());
        // Missing distributors.
        assert!(Vocabulary::from_toml_str(r#"internal_domain = "a.b""#).is_err());
        // Domain-less internal_domain.
        let bad = r#"
internal_domain = "nodot"
[[distributors]]
name = "X"
"#;
        assert!(Vocabulary::from_toml_str(bad).is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.toml");
        let text = toml::to_string(&Vocabulary::builtin()).unwrap();
        std::fs::write(&path, text).unwrap();

        let vocab = Vocabulary::load(&path).unwrap();
        assert_eq!(vocab.internal_domain, "internal.example");
    }
}
