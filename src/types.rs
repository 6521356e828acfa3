//! Public types for the ISO registry client.
//!
//! Wire-level candidate records as returned by the registry search, plus
//! the minimal bibliographic item the resolver produces. Building a fully
//! populated item is delegated to an [`ItemBuilder`] so richer back ends
//! can be plugged in without touching the resolution pipeline.

use crate::reference;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a registry entry.
///
/// Ordering preference for ranking: active first, deleted last, anything
/// unrecognized after that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocStatus {
    #[serde(rename = "ENT_ACTIVE")]
    Active,
    #[serde(rename = "ENT_PROGRESS")]
    Progress,
    #[serde(rename = "ENT_INACTIVE")]
    Inactive,
    #[serde(rename = "ENT_DELETED")]
    Deleted,
    #[default]
    #[serde(other)]
    Unknown,
}

impl DocStatus {
    /// Ranking weight, lower is more preferred.
    pub fn sort_weight(self) -> u8 {
        match self {
            DocStatus::Active => 0,
            DocStatus::Progress => 1,
            DocStatus::Inactive => 2,
            DocStatus::Deleted => 3,
            DocStatus::Unknown => 4,
        }
    }
}

/// One candidate record from a registry search, as published.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHit {
    /// Canonical identifier as published, e.g. `"ISO 9000:2015"`.
    pub doc_ref: String,
    /// Document number; the registry serves it as string or integer.
    #[serde(deserialize_with = "deserialize_number_option", default)]
    pub doc_number: Option<String>,
    /// Part number, possibly empty for single-part documents.
    #[serde(default)]
    pub doc_part: Option<String>,
    #[serde(default)]
    pub status: DocStatus,
    /// Publication date as `"YYYY-MM"`.
    #[serde(default)]
    pub publication_date: Option<String>,
    /// Project start date for entries not yet published.
    #[serde(default)]
    pub new_project_date: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Custom deserializer for docNumber that accepts both string and integer.
fn deserialize_number_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct NumberVisitor;

    impl<'de> Visitor<'de> for NumberVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, integer, or null")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(NumberValueVisitor).map(Some)
        }
    }

    struct NumberValueVisitor;

    impl<'de> Visitor<'de> for NumberValueVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_option(NumberVisitor)
}

/// Registry search response wrapper.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub standards: Vec<RawHit>,
}

/// Kind of link between two bibliographic items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    /// The related item is a concrete instance (one part) of this one.
    Instance,
}

/// A relation link attached to a bibliographic item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub kind: RelationKind,
    pub item: BibliographicItem,
}

/// A resolved bibliographic record.
///
/// Only the fields the resolver ranks, filters, and merges on; richer
/// representations come from a custom [`ItemBuilder`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BibliographicItem {
    /// Document identifier, e.g. `"ISO 9000:2015"` or
    /// `"ISO 9000 (all parts)"`.
    pub id: String,
    /// Preformatted citation text; the only field carried by the
    /// placeholder items attached as part relations.
    pub formatted_ref: Option<String>,
    pub title: Option<String>,
    pub docnumber: Option<String>,
    pub part: Option<String>,
    pub year: Option<String>,
    pub language: Option<String>,
    pub status: Option<DocStatus>,
    /// True for an aggregate record covering a whole document family.
    pub all_parts: bool,
    pub relations: Vec<Relation>,
}

impl BibliographicItem {
    /// Placeholder item carrying only a formatted reference.
    pub fn from_formatted_ref(content: impl Into<String>) -> Self {
        Self {
            formatted_ref: Some(content.into()),
            ..Self::default()
        }
    }

    /// The all-parts variant of this item: identifier truncated after the
    /// document number with an `(all parts)` marker, part and year
    /// cleared.
    pub fn to_all_parts(&self) -> Self {
        let mut item = self.clone();
        item.id = match reference::find_number(&self.id) {
            Some(n) => format!("{} (all parts)", &self.id[..n.num_end]),
            None => format!("{} (all parts)", self.id),
        };
        item.part = None;
        item.year = None;
        item.all_parts = true;
        item
    }

    /// The undated form of this item, referencing whatever edition is
    /// most recent rather than the one that matched.
    pub fn to_most_recent_reference(&self) -> Self {
        let mut item = self.clone();
        item.year = None;
        if let Some(year) = reference::first_embedded_year(&self.id) {
            let tagged = format!(":{year}");
            item.id = self.id.replacen(&tagged, "", 1);
        }
        item
    }
}

/// Builds a full bibliographic item from one raw candidate record.
///
/// The default [`RegistryItemBuilder`] works from the search record
/// alone; implementations may enrich items from other sources.
pub trait ItemBuilder {
    fn build(&self, raw: &RawHit, lang: Option<&str>) -> BibliographicItem;
}

/// Default builder: populates an item from the raw search record.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryItemBuilder;

impl ItemBuilder for RegistryItemBuilder {
    fn build(&self, raw: &RawHit, lang: Option<&str>) -> BibliographicItem {
        BibliographicItem {
            id: raw.doc_ref.clone(),
            formatted_ref: Some(raw.doc_ref.clone()),
            title: raw.title.clone(),
            docnumber: raw.doc_number.clone(),
            part: raw.doc_part.clone().filter(|p| !p.is_empty()),
            year: reference::last_embedded_year(&raw.doc_ref).map(str::to_string),
            language: lang.map(str::to_string),
            status: Some(raw.status),
            all_parts: false,
            relations: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_deserialization() {
        let s: DocStatus = serde_json::from_str("\"ENT_ACTIVE\"").unwrap();
        assert_eq!(s, DocStatus::Active);
        let s: DocStatus = serde_json::from_str("\"ENT_DELETED\"").unwrap();
        assert_eq!(s, DocStatus::Deleted);
        let s: DocStatus = serde_json::from_str("\"SOMETHING_ELSE\"").unwrap();
        assert_eq!(s, DocStatus::Unknown);
    }

    #[test]
    fn test_status_sort_weights() {
        assert!(DocStatus::Active.sort_weight() < DocStatus::Progress.sort_weight());
        assert!(DocStatus::Progress.sort_weight() < DocStatus::Inactive.sort_weight());
        assert!(DocStatus::Inactive.sort_weight() < DocStatus::Deleted.sort_weight());
        assert!(DocStatus::Deleted.sort_weight() < DocStatus::Unknown.sort_weight());
    }

    #[test]
    fn test_raw_hit_doc_number_as_string_or_int() {
        let hit: RawHit = serde_json::from_str(
            r#"{"docRef": "ISO 9000:2015", "docNumber": "9000", "status": "ENT_ACTIVE"}"#,
        )
        .unwrap();
        assert_eq!(hit.doc_number.as_deref(), Some("9000"));

        let hit: RawHit = serde_json::from_str(
            r#"{"docRef": "ISO 9000:2015", "docNumber": 9000, "status": "ENT_ACTIVE"}"#,
        )
        .unwrap();
        assert_eq!(hit.doc_number.as_deref(), Some("9000"));
    }

    #[test]
    fn test_raw_hit_defaults() {
        let hit: RawHit = serde_json::from_str(r#"{"docRef": "ISO 9000"}"#).unwrap();
        assert_eq!(hit.status, DocStatus::Unknown);
        assert!(hit.doc_part.is_none());
        assert!(hit.publication_date.is_none());
    }

    #[test]
    fn test_to_all_parts_rewrites_identifier() {
        let item = BibliographicItem {
            id: "ISO 9000-1:2015".to_string(),
            part: Some("1".to_string()),
            year: Some("2015".to_string()),
            ..Default::default()
        };
        let all = item.to_all_parts();
        assert_eq!(all.id, "ISO 9000 (all parts)");
        assert!(all.part.is_none());
        assert!(all.year.is_none());
        assert!(all.all_parts);
    }

    #[test]
    fn test_to_most_recent_reference_strips_year() {
        let item = BibliographicItem {
            id: "ISO 9000:2015".to_string(),
            year: Some("2015".to_string()),
            ..Default::default()
        };
        let recent = item.to_most_recent_reference();
        assert_eq!(recent.id, "ISO 9000");
        assert!(recent.year.is_none());
    }

    #[test]
    fn test_registry_builder_fields() {
        let raw: RawHit = serde_json::from_str(
            r#"{
                "docRef": "ISO 9000-1:2015",
                "docNumber": 9000,
                "docPart": "1",
                "status": "ENT_ACTIVE",
                "publicationDate": "2015-09",
                "title": "Quality management"
            }"#,
        )
        .unwrap();
        let item = RegistryItemBuilder.build(&raw, Some("en"));
        assert_eq!(item.id, "ISO 9000-1:2015");
        assert_eq!(item.year.as_deref(), Some("2015"));
        assert_eq!(item.part.as_deref(), Some("1"));
        assert_eq!(item.language.as_deref(), Some("en"));
        assert_eq!(item.status, Some(DocStatus::Active));
    }
}
