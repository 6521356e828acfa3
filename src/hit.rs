//! Candidate hits and their ranked collection.
//!
//! A [`Hit`] wraps one raw registry record and memoizes its full
//! bibliographic item; a [`HitCollection`] owns the ranking order and the
//! all-parts aggregation.

use crate::reference;
use crate::types::{BibliographicItem, ItemBuilder, RawHit, Relation, RelationKind};
use std::cmp::Reverse;
use std::sync::OnceLock;

/// Date used to rank hits of equal status, newest first.
///
/// Derived Ord compares year, then month, then day. [`EffectiveDate::MIN`]
/// is the sentinel for records carrying no date information at all, so
/// sorting stays total over sparse data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EffectiveDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl EffectiveDate {
    pub const MIN: EffectiveDate = EffectiveDate {
        year: 0,
        month: 1,
        day: 1,
    };
}

/// One candidate document returned by a registry search.
#[derive(Debug, Clone)]
pub struct Hit {
    raw: RawHit,
    item: OnceLock<BibliographicItem>,
}

impl Hit {
    pub fn new(raw: RawHit) -> Self {
        Self {
            raw,
            item: OnceLock::new(),
        }
    }

    /// The raw record as served by the registry.
    pub fn raw(&self) -> &RawHit {
        &self.raw
    }

    /// Ranking weight derived from the entry status, lower first.
    pub fn sort_weight(&self) -> u8 {
        self.raw.status.sort_weight()
    }

    /// Date used for ranking: the publication date when present, else the
    /// last year embedded in the document reference, else the project
    /// start date, else the minimal sentinel.
    pub fn effective_date(&self) -> EffectiveDate {
        if let Some(date) = self
            .raw
            .publication_date
            .as_deref()
            .and_then(parse_year_month)
        {
            return date;
        }
        if let Some(year) = reference::last_embedded_year(&self.raw.doc_ref) {
            if let Ok(year) = year.parse() {
                return EffectiveDate {
                    year,
                    month: 1,
                    day: 1,
                };
            }
        }
        if let Some(date) = self
            .raw
            .new_project_date
            .as_deref()
            .and_then(parse_year_month_day)
        {
            return date;
        }
        EffectiveDate::MIN
    }

    /// Build the full bibliographic item for this hit, at most once per
    /// hit instance.
    pub fn fetch(&self, builder: &dyn ItemBuilder, lang: Option<&str>) -> &BibliographicItem {
        self.item.get_or_init(|| builder.build(&self.raw, lang))
    }
}

/// `"YYYY-MM"`.
fn parse_year_month(s: &str) -> Option<EffectiveDate> {
    let (year, month) = s.split_once('-')?;
    let year = year.parse().ok()?;
    let month: u8 = month.parse().ok()?;
    (1..=12).contains(&month).then_some(EffectiveDate {
        year,
        month,
        day: 1,
    })
}

/// `"YYYY-MM-DD"`, or just the leading `"YYYY-MM"`.
fn parse_year_month_day(s: &str) -> Option<EffectiveDate> {
    let mut parts = s.splitn(3, '-');
    let year = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next().and_then(|d| d.parse().ok()).unwrap_or(1);
    ((1..=12).contains(&month) && (1..=31).contains(&day))
        .then_some(EffectiveDate { year, month, day })
}

/// Ordered collection of hits for one search, preferred status first and
/// newest first within equal status.
#[derive(Debug, Clone, Default)]
pub struct HitCollection {
    hits: Vec<Hit>,
}

impl HitCollection {
    /// Wrap and rank raw search records.
    pub fn from_hits(raw: Vec<RawHit>) -> Self {
        let mut hits: Vec<Hit> = raw.into_iter().map(Hit::new).collect();
        // Stable sort: equally ranked hits keep the registry's order.
        hits.sort_by_key(|h| (h.sort_weight(), Reverse(h.effective_date())));
        Self { hits }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn first(&self) -> Option<&Hit> {
        self.hits.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hit> {
        self.hits.iter()
    }

    /// Subset of hits matching a predicate, preserving rank order.
    pub(crate) fn select<F>(&self, pred: F) -> Self
    where
        F: Fn(&Hit) -> bool,
    {
        Self {
            hits: self.hits.iter().filter(|h| pred(h)).cloned().collect(),
        }
    }

    /// Merge the part-bearing hits into one aggregate all-parts item.
    ///
    /// The base is the hit with the numerically smallest part; every
    /// other part attaches as an `instance` relation carrying only its
    /// published reference, so no additional fetches are issued. A
    /// collection without part-bearing hits falls back to fetching its
    /// first hit as-is.
    pub fn to_all_parts(
        &self,
        builder: &dyn ItemBuilder,
        lang: Option<&str>,
    ) -> Option<BibliographicItem> {
        let parts: Vec<&Hit> = self
            .hits
            .iter()
            .filter(|h| h.raw().doc_part.as_deref().is_some_and(|p| !p.is_empty()))
            .collect();
        let Some(base) = parts.iter().copied().min_by_key(|h| part_number(h.raw())) else {
            return self.first().map(|h| h.fetch(builder, lang).clone());
        };

        let mut item = base.fetch(builder, lang).to_all_parts();
        for hit in parts
            .iter()
            .filter(|h| h.raw().doc_ref != base.raw().doc_ref)
        {
            item.relations.push(Relation {
                kind: RelationKind::Instance,
                item: BibliographicItem::from_formatted_ref(hit.raw().doc_ref.clone()),
            });
        }
        Some(item)
    }
}

impl<'a> IntoIterator for &'a HitCollection {
    type Item = &'a Hit;
    type IntoIter = std::slice::Iter<'a, Hit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// Leading digits of the part number, for choosing the base part.
fn part_number(raw: &RawHit) -> u32 {
    raw.doc_part
        .as_deref()
        .map(|p| {
            let digits: String = p.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocStatus, RegistryItemBuilder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn raw(doc_ref: &str, part: Option<&str>, status: DocStatus, pub_date: Option<&str>) -> RawHit {
        RawHit {
            doc_ref: doc_ref.to_string(),
            doc_number: None,
            doc_part: part.map(str::to_string),
            status,
            publication_date: pub_date.map(str::to_string),
            new_project_date: None,
            title: None,
        }
    }

    /// Builder that counts how many items it constructs.
    struct CountingBuilder(AtomicUsize);

    impl ItemBuilder for CountingBuilder {
        fn build(&self, raw: &RawHit, lang: Option<&str>) -> BibliographicItem {
            self.0.fetch_add(1, Ordering::SeqCst);
            RegistryItemBuilder.build(raw, lang)
        }
    }

    #[test]
    fn test_sort_prefers_active_then_recent() {
        let hits = HitCollection::from_hits(vec![
            raw("ISO 1:2000", None, DocStatus::Deleted, Some("2000-01")),
            raw("ISO 1:2005", None, DocStatus::Active, Some("2005-09")),
            raw("ISO 1:2015", None, DocStatus::Active, Some("2015-09")),
            raw("ISO 1:2010", None, DocStatus::Progress, Some("2010-01")),
        ]);
        let order: Vec<&str> = hits.iter().map(|h| h.raw().doc_ref.as_str()).collect();
        assert_eq!(
            order,
            vec!["ISO 1:2015", "ISO 1:2005", "ISO 1:2010", "ISO 1:2000"]
        );
    }

    #[test]
    fn test_sort_most_recent_first_scenario() {
        let hits = HitCollection::from_hits(vec![
            raw("ISO 9000:2005", None, DocStatus::Active, Some("2005-09")),
            raw("ISO 9000:2015", None, DocStatus::Active, Some("2015-09")),
        ]);
        assert_eq!(hits.first().unwrap().raw().doc_ref, "ISO 9000:2015");
    }

    #[test]
    fn test_sort_total_over_sparse_dates() {
        // Neither hit carries any date; both fall back to the sentinel
        // and stable sort keeps the registry order.
        let hits = HitCollection::from_hits(vec![
            raw("ISO 2 DAD", None, DocStatus::Active, None),
            raw("ISO 3 DAD", None, DocStatus::Active, None),
        ]);
        assert_eq!(hits.first().unwrap().raw().doc_ref, "ISO 2 DAD");
        assert_eq!(hits.first().unwrap().effective_date(), EffectiveDate::MIN);
    }

    #[test]
    fn test_effective_date_precedence() {
        let h = Hit::new(raw(
            "ISO 1:2003",
            None,
            DocStatus::Active,
            Some("2005-09"),
        ));
        assert_eq!(h.effective_date().year, 2005);

        let h = Hit::new(raw("ISO 1:2003", None, DocStatus::Active, None));
        assert_eq!(h.effective_date().year, 2003);

        let mut r = raw("ISO 1 WD", None, DocStatus::Progress, None);
        r.new_project_date = Some("2021-03-15".to_string());
        let h = Hit::new(r);
        assert_eq!(
            h.effective_date(),
            EffectiveDate {
                year: 2021,
                month: 3,
                day: 15
            }
        );
    }

    #[test]
    fn test_project_date_rejects_out_of_range_components() {
        assert!(parse_year_month_day("2021-03-99").is_none());
        assert!(parse_year_month_day("2021-13-01").is_none());
        assert!(parse_year_month_day("2021-03-00").is_none());
        assert_eq!(
            parse_year_month_day("2021-03"),
            Some(EffectiveDate {
                year: 2021,
                month: 3,
                day: 1
            })
        );

        // A malformed project date falls through to the sentinel.
        let mut r = raw("ISO 1 WD", None, DocStatus::Progress, None);
        r.new_project_date = Some("2021-03-99".to_string());
        assert_eq!(Hit::new(r).effective_date(), EffectiveDate::MIN);
    }

    #[test]
    fn test_effective_date_uses_last_embedded_year() {
        let h = Hit::new(raw(
            "ISO 1:2000/Amd 1:2005",
            None,
            DocStatus::Active,
            None,
        ));
        assert_eq!(h.effective_date().year, 2005);
    }

    #[test]
    fn test_fetch_is_memoized() {
        let builder = CountingBuilder(AtomicUsize::new(0));
        let hit = Hit::new(raw("ISO 9000:2015", None, DocStatus::Active, None));
        let a = hit.fetch(&builder, None).clone();
        let b = hit.fetch(&builder, None).clone();
        assert_eq!(a.id, b.id);
        assert_eq!(builder.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_to_all_parts_merges_sibling_parts() {
        let hits = HitCollection::from_hits(vec![
            raw("ISO 9000-2:2016", Some("2"), DocStatus::Active, Some("2016-01")),
            raw("ISO 9000-1:2015", Some("1"), DocStatus::Active, Some("2015-01")),
            raw("ISO 9000-3:2017", Some("3"), DocStatus::Active, Some("2017-01")),
        ]);
        let builder = CountingBuilder(AtomicUsize::new(0));
        let item = hits.to_all_parts(&builder, None).unwrap();

        assert_eq!(item.id, "ISO 9000 (all parts)");
        assert!(item.all_parts);
        assert_eq!(item.relations.len(), 2);
        let refs: Vec<&str> = item
            .relations
            .iter()
            .map(|r| r.item.formatted_ref.as_deref().unwrap())
            .collect();
        assert!(refs.contains(&"ISO 9000-2:2016"));
        assert!(refs.contains(&"ISO 9000-3:2017"));
        assert!(item
            .relations
            .iter()
            .all(|r| r.kind == RelationKind::Instance));
        // Only the base part is ever fully built.
        assert_eq!(builder.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_to_all_parts_without_parts_falls_back_to_first() {
        let hits = HitCollection::from_hits(vec![
            raw("ISO 9000:2005", Some(""), DocStatus::Active, Some("2005-09")),
            raw("ISO 9000:2015", None, DocStatus::Active, Some("2015-09")),
        ]);
        let item = hits.to_all_parts(&RegistryItemBuilder, None).unwrap();
        assert_eq!(item.id, "ISO 9000:2015");
        assert!(!item.all_parts);
        assert!(item.relations.is_empty());
    }

    #[test]
    fn test_to_all_parts_empty_collection() {
        let hits = HitCollection::default();
        assert!(hits.to_all_parts(&RegistryItemBuilder, None).is_none());
    }
}
