//! Paper record and entry normalization.
//!
//! Raw API entries arrive as plain JSON values; this module extracts the
//! stable id and version from the identifier URL and lifts the fields the
//! pipeline cares about into a typed record. The full entry is retained in
//! `raw` so fields we do not model survive a round-trip through the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

/// A paper fetched from the search API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paper {
    /// Stable identifier with the version suffix stripped
    pub id: String,

    /// Revision number parsed from the identifier URL
    pub version: u32,

    /// Primary category term as reported by the API
    pub primary_category: String,

    /// Paper title
    pub title: String,

    /// Abstract text
    pub summary: String,

    /// Author names in publication order
    pub authors: Vec<String>,

    /// Submission timestamp
    pub published: DateTime<Utc>,

    /// Last-update timestamp
    pub updated: DateTime<Utc>,

    /// Full original entry, kept for fields we do not model
    pub raw: Value,
}

/// Subject bucket used to partition the digest.
///
/// Unknown category terms fall into the `Other` overflow bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    HepEx,
    HepPh,
    HepTh,
    Other,
}

impl Category {
    /// All buckets in digest display order.
    pub const ALL: [Category; 4] = [
        Category::HepEx,
        Category::HepPh,
        Category::HepTh,
        Category::Other,
    ];

    /// Map a raw category term to a bucket.
    pub fn from_term(term: &str) -> Self {
        match term {
            "hep-ex" => Category::HepEx,
            "hep-ph" => Category::HepPh,
            "hep-th" => Category::HepTh,
            _ => Category::Other,
        }
    }

    /// Bucket name as shown in the digest.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::HepEx => "hep-ex",
            Category::HepPh => "hep-ph",
            Category::HepTh => "hep-th",
            Category::Other => "other",
        }
    }

    /// CSS color used for the category tag in the HTML rendering.
    pub fn color(&self) -> &'static str {
        match self {
            Category::HepEx => "darkred",
            Category::HepPh => "darkgreen",
            Category::HepTh => "darkblue",
            Category::Other => "gray",
        }
    }
}

/// Parse the stable id and version out of an identifier URL.
///
/// The trailing path segment must have the form `<id>v<version>`, e.g.
/// `http://arxiv.org/abs/1512.08756v2` yields `("1512.08756", 2)`.
/// Anything else is a contract violation on the API side and fatal.
pub fn parse_id_url(url: &str) -> Result<(String, u32)> {
    let tail = url.rsplit('/').next().unwrap_or(url);
    let parts: Vec<&str> = tail.split('v').collect();
    if parts.len() != 2 {
        return Err(AppError::api(
            "parse_id_url",
            format!("cannot split '{url}' into id and version"),
        ));
    }
    let version = parts[1]
        .parse::<u32>()
        .map_err(|e| AppError::api("parse_id_url", format!("bad version in '{url}': {e}")))?;
    Ok((parts[0].to_string(), version))
}

impl Paper {
    /// Normalize one raw API entry into a `Paper`.
    ///
    /// Missing or mistyped required fields are fatal: the merge logic
    /// downstream needs a valid id and version to be correct.
    pub fn from_entry(entry: &Value) -> Result<Self> {
        let id_url = str_field(entry, "id")?;
        let (id, version) = parse_id_url(id_url)?;

        let authors = entry
            .get("authors")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::api(&id, "missing 'authors' list"))?
            .iter()
            .map(|author| {
                author
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| AppError::api(&id, "author entry missing 'name'"))
            })
            .collect::<Result<Vec<String>>>()?;

        let primary_category = entry
            .pointer("/arxiv_primary_category/term")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::api(&id, "missing 'arxiv_primary_category.term'"))?
            .to_string();

        Ok(Self {
            title: str_field(entry, "title")?.to_string(),
            summary: str_field(entry, "summary")?.to_string(),
            published: time_field(entry, "published")?,
            updated: time_field(entry, "updated")?,
            id,
            version,
            primary_category,
            authors,
            raw: entry.clone(),
        })
    }

    /// Subject bucket for this paper.
    pub fn category(&self) -> Category {
        Category::from_term(&self.primary_category)
    }

    /// Canonical abstract-page URL for this paper.
    pub fn abs_url(&self) -> String {
        format!("https://arxiv.org/abs/{}", self.id)
    }
}

fn str_field<'a>(entry: &'a Value, key: &str) -> Result<&'a str> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::api("entry", format!("missing string field '{key}'")))
}

fn time_field(entry: &Value, key: &str) -> Result<DateTime<Utc>> {
    let text = str_field(entry, key)?;
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AppError::api("entry", format!("bad timestamp in '{key}': {e}")))
}
