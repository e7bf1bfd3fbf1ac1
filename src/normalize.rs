// src/normalize.rs
//! Provider payload adapters: raw JSON -> [`JobListing`].
//!
//! Providers disagree on field names and on the envelope around the listing
//! array, so each [`ProviderKind`] carries its own field table. Items that
//! cannot be rendered as a card (no title, no absolute apply URL) are dropped.

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::{Map, Value};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::model::{JobListing, ProviderKind};

/// Maximum description length kept for a card.
const DESCRIPTION_CAP: usize = 1500;

/// Epoch values above this are treated as milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

struct FieldTable {
    envelopes: &'static [&'static [&'static str]],
    id: &'static [&'static str],
    title: &'static [&'static str],
    company: &'static [&'static str],
    location: &'static [&'static str],
    description: &'static [&'static str],
    posted: &'static [&'static str],
    url: &'static [&'static str],
}

const LINKEDIN_FIELDS: FieldTable = FieldTable {
    envelopes: &[&["elements"], &["jobs"], &["results"]],
    id: &["id", "jobId", "entityUrn"],
    title: &["title"],
    company: &["company", "companyName"],
    location: &["location", "formattedLocation"],
    description: &["description", "descriptionText"],
    posted: &["posted", "postedAt", "listedAt"],
    url: &["url", "applyUrl", "jobPostingUrl"],
};

const GLASSDOOR_FIELDS: FieldTable = FieldTable {
    envelopes: &[&["response", "jobListings"], &["jobListings"], &["jobs"]],
    id: &["id", "jobListingId"],
    title: &["title", "jobTitle"],
    company: &["company", "employer", "employerName"],
    location: &["location", "locationName"],
    description: &["description", "descriptionFragment"],
    posted: &["posted", "postedDate", "date"],
    url: &["url", "jobViewUrl", "applyUrl"],
};

impl ProviderKind {
    fn fields(self) -> &'static FieldTable {
        match self {
            ProviderKind::LinkedIn => &LINKEDIN_FIELDS,
            ProviderKind::Glassdoor => &GLASSDOOR_FIELDS,
        }
    }

    /// Map a raw provider body to canonical listings, preserving provider order.
    pub fn normalize(self, raw: &Value) -> Result<Vec<JobListing>> {
        let table = self.fields();
        let items = locate_items(raw, table.envelopes).ok_or_else(|| {
            anyhow!(
                "{} payload has no listing array (got {})",
                self.label(),
                value_kind(raw)
            )
        })?;

        let mut out = Vec::with_capacity(items.len());
        let mut dropped = 0u64;
        for (index, item) in items.iter().enumerate() {
            match item.as_object().and_then(|obj| self.listing_from(obj, index)) {
                Some(listing) => out.push(listing),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::debug!(provider = self.label(), dropped, "dropped unusable listings");
            counter!("normalize_dropped_total", "provider" => self.segment()).increment(dropped);
        }
        Ok(out)
    }

    fn listing_from(self, obj: &Map<String, Value>, index: usize) -> Option<JobListing> {
        let t = self.fields();
        let title = first_text(obj, t.title).map(|s| normalize_text(&s))?;
        if title.is_empty() {
            return None;
        }
        let apply_url = first_text(obj, t.url).filter(|u| is_absolute_http(u))?;

        // Synthesized ids use `#` so they never collide with `<segment>:<raw>`.
        let id = match first_text(obj, t.id) {
            Some(raw) => format!("{}:{}", self.segment(), raw),
            None => format!("{}#{}", self.segment(), index),
        };

        Some(JobListing {
            id,
            title,
            company: first_text(obj, t.company)
                .map(|s| normalize_text(&s))
                .unwrap_or_default(),
            location: first_text(obj, t.location)
                .map(|s| normalize_text(&s))
                .unwrap_or_default(),
            description: first_text(obj, t.description)
                .map(|s| cap_chars(normalize_text(&s), DESCRIPTION_CAP))
                .unwrap_or_default(),
            posted_at: first_value(obj, t.posted).and_then(parse_posted),
            apply_url,
        })
    }
}

fn locate_items<'a>(raw: &'a Value, envelopes: &[&[&str]]) -> Option<&'a Vec<Value>> {
    if let Value::Array(items) = raw {
        return Some(items);
    }
    envelopes.iter().find_map(|path| {
        path.iter()
            .try_fold(raw, |node, key| node.get(*key))
            .and_then(Value::as_array)
    })
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn first_value<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// First present key rendered as text. Numbers are accepted (numeric ids);
/// objects with a `name` field are flattened (e.g. `employer: {name: ..}`).
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(|v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(o) => o
            .get("name")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    })
}

fn is_absolute_http(url: &str) -> bool {
    reqwest::Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

fn cap_chars(s: String, max: usize) -> String {
    if s.chars().count() > max {
        s.chars().take(max).collect()
    } else {
        s
    }
}

/// Decode entities, strip tags, normalize quotes and collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Parse a provider posting date into an instant.
///
/// Accepts RFC 3339, RFC 2822, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and
/// numeric epochs (seconds, or milliseconds above 1e11). Strings holding
/// digits only are treated as epochs too.
pub fn parse_posted(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(from_epoch),
        Value::String(s) => parse_posted_str(s.trim()),
        _ => None,
    }
}

fn parse_posted_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        // Compact `YYYYMMDD` wins over an 8-digit epoch.
        if s.len() == 8 {
            if let Some(d) = NaiveDate::parse_from_str(s, "%Y%m%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
            {
                return Some(Utc.from_utc_datetime(&d));
            }
        }
        return s.parse::<i64>().ok().and_then(from_epoch);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
        return Utc.timestamp_opt(dt.unix_timestamp(), 0).single();
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn from_epoch(raw: i64) -> Option<DateTime<Utc>> {
    if raw <= 0 {
        return None;
    }
    if raw > EPOCH_MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(raw).single()
    } else {
        Utc.timestamp_opt(raw, 0).single()
    }
}
