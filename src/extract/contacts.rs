//! Contact identity extraction: partner (trusted advisor), distributor
//! contact, and end-customer people.
//!
//! Identity flows from strongest signal to weakest: the envelope sender
//! when it is external, the recovered forward header when the envelope is
//! internal staff, then positional guesses over the body's email/phone
//! inventory. Internal-domain addresses are dropped at the door and never
//! become candidates for any field.

use std::sync::LazyLock;

use regex::Regex;

use crate::forward::ForwardHeader;
use crate::record::Field;
use crate::vocab::Vocabulary;

use super::{Candidate, Tier};

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});

/// North-American phone shapes: "(555) 123-4567", "555.123.4567",
/// "+1 555-123-4567".
static RE_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?1[\s.\-]?)?\(?\d{3}\)?[\s.\-]\d{3}[\s.\-]\d{4}").unwrap()
});

/// Hard ceiling for anything inferred from an email domain.
const DOMAIN_INFERENCE_CAP: u8 = 60;

// ── Extract ─────────────────────────────────────────────────────────────

pub fn extract(
    text: &str,
    header: &ForwardHeader,
    sender_email: Option<&str>,
    sender_display: Option<&str>,
    vocab: &Vocabulary,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    partner_identity(header, sender_email, sender_display, vocab, &mut candidates);
    body_emails(text, header, vocab, &mut candidates);
    body_phones(text, &mut candidates);

    candidates
}

/// Who sent this in? An external envelope sender is the partner themselves
/// writing in directly; an internal sender is staff forwarding, so the
/// forward header speaks for the originator instead.
fn partner_identity(
    header: &ForwardHeader,
    sender_email: Option<&str>,
    sender_display: Option<&str>,
    vocab: &Vocabulary,
    out: &mut Vec<Candidate>,
) {
    let envelope_external = sender_email
        .map(|e| !vocab.is_internal_email(e))
        .unwrap_or(false);

    let (email, name, confidence) = if envelope_external {
        (
            sender_email.map(str::to_ascii_lowercase),
            sender_display.map(str::to_string),
            65,
        )
    } else {
        (
            header.sender_email.clone(),
            header.sender_name.clone(),
            62,
        )
    };

    let Some(email) = email.filter(|e| !vocab.is_internal_email(e)) else {
        return;
    };

    // A sender on a distributor's domain is a TSD contact, not the
    // registering partner.
    if let Some(tsd) = email_domain(&email).and_then(|d| vocab.distributor_for_domain(d)) {
        let tsd = tsd.to_string();
        out.push(Candidate::new(
            Field::TsdContactEmail,
            &email,
            75,
            Tier::Vocabulary,
        ));
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            out.push(Candidate::new(
                Field::TsdContactName,
                name,
                70,
                Tier::Vocabulary,
            ));
        }
        out.push(Candidate::new(Field::TsdName, tsd, 85, Tier::Vocabulary));
        return;
    }

    out.push(Candidate::new(
        Field::TaEmail,
        &email,
        confidence,
        Tier::Pattern,
    ));
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        out.push(Candidate::new(
            Field::TaFullName,
            name,
            confidence.saturating_sub(5),
            Tier::Pattern,
        ));
    }
    if let Some(company) = email_domain(&email)
        .filter(|d| !vocab.is_public_mail_domain(d))
        .and_then(company_from_domain)
    {
        out.push(Candidate::new(
            Field::TaCompanyName,
            company,
            50.min(DOMAIN_INFERENCE_CAP),
            Tier::Positional,
        ));
    }
}

/// Positional pass over every address in the body: internal ones vanish,
/// distributor-domain ones identify the TSD, and of the rest the first is
/// the partner and the first later distinct address is the customer.
fn body_emails(text: &str, header: &ForwardHeader, vocab: &Vocabulary, out: &mut Vec<Candidate>) {
    let mut seen: Vec<String> = Vec::new();
    for m in RE_EMAIL.find_iter(text) {
        let addr = m.as_str().to_ascii_lowercase();
        if vocab.is_internal_email(&addr) || seen.contains(&addr) {
            continue;
        }
        seen.push(addr);
    }

    let mut externals: Vec<&str> = Vec::new();
    for addr in &seen {
        match email_domain(addr).and_then(|d| vocab.distributor_for_domain(d)) {
            Some(tsd) => {
                out.push(Candidate::new(
                    Field::TsdContactEmail,
                    addr,
                    72,
                    Tier::Vocabulary,
                ));
                out.push(Candidate::new(
                    Field::TsdName,
                    tsd.to_string(),
                    85,
                    Tier::Vocabulary,
                ));
            }
            None => externals.push(addr),
        }
    }

    let partner = header.sender_email.as_deref();
    let mut iter = externals.iter();
    if let Some(first) = iter.next() {
        out.push(Candidate::new(Field::TaEmail, *first, 45, Tier::Positional));

        // The customer is the first address that is not the partner's.
        if let Some(customer) = iter.find(|a| partner != Some(**a)) {
            out.push(Candidate::new(
                Field::CustomerEmail,
                *customer,
                42,
                Tier::Positional,
            ));
            if let Some(company) = email_domain(customer)
                .filter(|d| !vocab.is_public_mail_domain(d))
                .and_then(company_from_domain)
            {
                out.push(Candidate::new(
                    Field::CustomerCompanyName,
                    company,
                    48.min(DOMAIN_INFERENCE_CAP),
                    Tier::Positional,
                ));
            }
            if let Some((first, last)) = person_from_local_part(customer) {
                out.push(Candidate::new(
                    Field::CustomerFirstName,
                    first,
                    35,
                    Tier::Positional,
                ));
                out.push(Candidate::new(
                    Field::CustomerLastName,
                    last,
                    35,
                    Tier::Positional,
                ));
            }
        }
    }
}

/// Phones are position-only evidence: first number leans partner, a later
/// distinct number leans customer.
fn body_phones(text: &str, out: &mut Vec<Candidate>) {
    let mut seen: Vec<&str> = Vec::new();
    for m in RE_PHONE.find_iter(text) {
        if !seen.contains(&m.as_str()) {
            seen.push(m.as_str());
        }
    }

    let mut iter = seen.iter();
    if let Some(first) = iter.next() {
        out.push(Candidate::new(Field::TaPhone, *first, 40, Tier::Positional));
    }
    if let Some(second) = iter.next() {
        out.push(Candidate::new(
            Field::CustomerPhone,
            *second,
            38,
            Tier::Positional,
        ));
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn email_domain(addr: &str) -> Option<&str> {
    addr.rsplit_once('@').map(|(_, d)| d)
}

/// "pinnacleretail.com" → "Pinnacleretail". Rough, so the confidence cap
/// keeps it from ever beating a stated company name.
fn company_from_domain(domain: &str) -> Option<String> {
    let label = domain.split('.').next()?.trim();
    if label.len() < 3 || !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }
    let mut chars = label.chars();
    let first = chars.next()?.to_ascii_uppercase();
    Some(format!("{first}{}", chars.as_str()))
}

/// "derek.foster@…" → ("Derek", "Foster"). Only dotted two-part local
/// parts qualify.
fn person_from_local_part(addr: &str) -> Option<(String, String)> {
    let local = addr.split_once('@')?.0;
    let (first, last) = local.split_once('.')?;
    if first.len() < 2
        || last.len() < 2
        || !first.chars().all(|c| c.is_ascii_alphabetic())
        || !last.chars().all(|c| c.is_ascii_alphabetic())
    {
        return None;
    }
    Some((capitalize(first), capitalize(last)))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => format!("{}{}", c.to_ascii_uppercase(), chars.as_str()),
        None => String::new(),
    }
}
