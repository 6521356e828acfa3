//! Reference resolution engine.
//!
//! Orchestrates one lookup: parse the reference, issue a single registry
//! search, then filter the fetched candidates locally — by code and
//! correction, retrying across document-stage prefixes and an `ISO` →
//! `ISO/IEC` substitution, all without further network traffic — and
//! finally disambiguate by year, producing either a single item, an
//! all-parts aggregate, or a no-match diagnostic.

use crate::client::IsoClient;
use crate::error::Result;
use crate::hit::{Hit, HitCollection};
use crate::reference::{self, ParsedReference};
use crate::types::{BibliographicItem, ItemBuilder, RegistryItemBuilder};
use std::future::Future;

/// Document-stage tokens tried, in order, when a code matches nothing at
/// the top level.
pub(crate) const STAGES: [&str; 9] = ["NP", "WD", "CD", "DIS", "FDIS", "PRF", "IS", "AWI", "TR"];

/// Options accepted by [`IsoResolver::get`].
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Force (`Some(true)`) or suppress (`Some(false)`) all-parts
    /// aggregation; `None` derives it from the reference shape.
    pub all_parts: Option<bool>,
    /// Keep the matched edition's year instead of rewriting an undated
    /// reference to its most recent edition.
    pub keep_year: bool,
    /// Preferred language for the built item.
    pub lang: Option<String>,
}

/// Lookup service for a sibling standards body, consulted for directive
/// documents and as a last resort when the ISO registry has no match.
pub trait SiblingRegistry {
    fn get(
        &self,
        code: &str,
        year: Option<&str>,
        opts: &GetOptions,
    ) -> impl Future<Output = Result<Option<BibliographicItem>>> + Send;
}

/// Default sibling registry: always absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSibling;

impl SiblingRegistry for NoSibling {
    async fn get(
        &self,
        _code: &str,
        _year: Option<&str>,
        _opts: &GetOptions,
    ) -> Result<Option<BibliographicItem>> {
        Ok(None)
    }
}

/// Stateless resolution engine over an [`IsoClient`].
///
/// # Example
///
/// ```no_run
/// # async fn example() -> isobib_client::error::Result<()> {
/// use isobib_client::{GetOptions, IsoClient, IsoResolver};
///
/// let resolver = IsoResolver::new(IsoClient::new());
/// if let Some(item) = resolver.get("ISO 19115-1", None, &GetOptions::default()).await? {
///     println!("{}", item.id);
/// }
/// # Ok(())
/// # }
/// ```
pub struct IsoResolver<S = NoSibling> {
    client: IsoClient,
    builder: Box<dyn ItemBuilder + Send + Sync>,
    sibling: S,
}

impl IsoResolver<NoSibling> {
    pub fn new(client: IsoClient) -> Self {
        Self {
            client,
            builder: Box::new(RegistryItemBuilder),
            sibling: NoSibling,
        }
    }
}

impl<S: SiblingRegistry> IsoResolver<S> {
    /// Replace the sibling-registry collaborator.
    pub fn with_sibling<T: SiblingRegistry>(self, sibling: T) -> IsoResolver<T> {
        IsoResolver {
            client: self.client,
            builder: self.builder,
            sibling,
        }
    }

    /// Replace the bibliographic-item builder.
    pub fn with_builder(mut self, builder: Box<dyn ItemBuilder + Send + Sync>) -> Self {
        self.builder = builder;
        self
    }

    /// Search the registry for candidates matching a reference string.
    pub async fn search(&self, text: &str) -> Result<HitCollection> {
        self.client.search(text).await
    }

    /// Resolve a reference to a single bibliographic item.
    ///
    /// Returns `Ok(None)` when nothing matches; transport failures are
    /// the only errors. Unless a year was given (explicitly or embedded),
    /// `keep_year` was set, or an all-parts reference was requested, the
    /// result is rewritten to its most recent edition.
    pub async fn get(
        &self,
        reference: &str,
        year: Option<&str>,
        opts: &GetOptions,
    ) -> Result<Option<BibliographicItem>> {
        let parsed = ParsedReference::parse(reference, year, opts.all_parts);
        tracing::debug!(reference, code = %parsed.code, "fetching from registry");

        // Directive documents live in the sibling body's registry.
        if parsed.code.starts_with("ISO/IEC DIR") {
            return self
                .sibling
                .get(&parsed.code, parsed.year.as_deref(), opts)
                .await;
        }

        let Some(item) = self.resolve(&parsed, opts).await? else {
            return Ok(None);
        };
        if parsed.year.is_some() || opts.keep_year || parsed.all_parts {
            Ok(Some(item))
        } else {
            Ok(Some(item.to_most_recent_reference()))
        }
    }

    async fn resolve(
        &self,
        parsed: &ParsedReference,
        opts: &GetOptions,
    ) -> Result<Option<BibliographicItem>> {
        let result = self.client.search(&parsed.code).await?;
        self.resolve_candidates(&result, parsed, opts).await
    }

    /// Resolve against an already-fetched candidate list: local filtering
    /// first, then one sibling-registry call only if nothing survived.
    async fn resolve_candidates(
        &self,
        result: &HitCollection,
        parsed: &ParsedReference,
        opts: &GetOptions,
    ) -> Result<Option<BibliographicItem>> {
        let filtered = search_filter(result, parsed);

        if filtered.is_empty() {
            if let Some(item) = self
                .sibling
                .get(&parsed.code, parsed.year.as_deref(), opts)
                .await?
            {
                return Ok(Some(item));
            }
        }

        let (kept, missed) = filter_by_year(&filtered, parsed.year.as_deref());
        let lang = opts.lang.as_deref();
        let resolved = if parsed.all_parts && kept.len() > 1 {
            kept.to_all_parts(self.builder.as_ref(), lang)
        } else {
            kept.first()
                .map(|h| h.fetch(self.builder.as_ref(), lang).clone())
        };

        match resolved {
            Some(item) => {
                tracing::debug!(id = %item.id, "found");
                Ok(Some(item))
            }
            None => {
                report_not_found(&parsed.code, parsed.year.as_deref(), &missed);
                Ok(None)
            }
        }
    }
}

/// Filter the fetched candidates against the parsed code, retrying with
/// stage-substituted codes and an `ISO` → `ISO/IEC` substitution when the
/// plain code matches nothing. Purely local; the candidate list came from
/// one search.
pub(crate) fn search_filter(result: &HitCollection, parsed: &ParsedReference) -> HitCollection {
    let res = search_code(result, &parsed.code, parsed);
    if !res.is_empty() {
        return res;
    }

    if compound_prefix(&parsed.code) {
        // Code like "ISO/IEC 123": the stage slots in after the org.
        if let Some(res) = try_stages(result, parsed, |st| stage_after_org(&parsed.code, st)) {
            return res;
        }
    } else if simple_prefix(&parsed.code) {
        // Code like "ISO 123": the stage joins the org token.
        if let Some(res) = try_stages(result, parsed, |st| stage_on_org(&parsed.code, st)) {
            return res;
        }
    }

    if parsed.code.starts_with("ISO ") {
        tracing::debug!("attempting ISO/IEC retrieval");
        let code = parsed.code.replacen("ISO", "ISO/IEC", 1);
        return search_code(result, &code, parsed);
    }

    HitCollection::default()
}

/// Try each stage token in fixed order, stopping at the first that
/// matches anything.
fn try_stages<F>(result: &HitCollection, parsed: &ParsedReference, make: F) -> Option<HitCollection>
where
    F: Fn(&str) -> String,
{
    for stage in STAGES {
        let code = make(stage);
        let res = search_code(result, &code, parsed);
        if !res.is_empty() {
            return Some(res);
        }
    }
    None
}

/// Keep hits whose published reference matches the code and the requested
/// correction.
///
/// The code must be a prefix not immediately followed by `-` (skipped
/// entirely for all-parts lookups, which span every part). When a
/// correction was requested, the reference must carry it after the code;
/// when none was, references with any `/`-suffix are rejected so that
/// amendment-only entries do not satisfy a plain document lookup.
pub(crate) fn search_code(
    result: &HitCollection,
    code: &str,
    parsed: &ParsedReference,
) -> HitCollection {
    result.select(|hit| {
        let doc_ref = hit.raw().doc_ref.as_str();
        let prefix_ok = parsed.all_parts || code_prefix(doc_ref, code);
        if !prefix_ok {
            return false;
        }
        match parsed.correction.as_deref() {
            Some(corr) => {
                suffix_after_code(doc_ref, code).is_some_and(|suffix| suffix.starts_with(corr))
            }
            None => suffix_after_code(doc_ref, code).is_none(),
        }
    })
}

/// Keep only hits whose last embedded year equals the requested one,
/// collecting the years of rejected hits for diagnostics.
pub(crate) fn filter_by_year(
    hits: &HitCollection,
    year: Option<&str>,
) -> (HitCollection, Vec<String>) {
    let Some(year) = year else {
        return (hits.clone(), Vec::new());
    };
    let matches = |hit: &Hit| {
        reference::last_embedded_year(&hit.raw().doc_ref).is_some_and(|y| y == year)
    };
    let kept = hits.select(matches);
    let missed = hits
        .iter()
        .filter(|h| !matches(h))
        .filter_map(|h| reference::last_embedded_year(&h.raw().doc_ref))
        .map(str::to_string)
        .collect();
    (kept, missed)
}

fn code_prefix(doc_ref: &str, code: &str) -> bool {
    doc_ref
        .strip_prefix(code)
        .is_some_and(|rest| !rest.starts_with('-'))
}

/// The portion of `doc_ref` after `code`, a word/dash run, an optional
/// `:YYYY`, and a `/` — i.e. the correction suffix, if any.
fn suffix_after_code<'a>(doc_ref: &'a str, code: &str) -> Option<&'a str> {
    let rest = doc_ref.strip_prefix(code)?;
    let bytes = rest.as_bytes();
    let run = bytes
        .iter()
        .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        .count();
    let tail = &rest[run..];
    if let Some(after_year) = strip_embedded_year(tail) {
        if let Some(suffix) = after_year.strip_prefix('/') {
            return Some(suffix);
        }
    }
    tail.strip_prefix('/')
}

fn strip_embedded_year(s: &str) -> Option<&str> {
    let rest = s.strip_prefix(':')?;
    let bytes = rest.as_bytes();
    (bytes.len() >= 4 && bytes[..4].iter().all(u8::is_ascii_digit)).then(|| &rest[4..])
}

/// Code shape `ORG/SUB n` — an org token containing `/`, then a number.
fn compound_prefix(code: &str) -> bool {
    let Some(slash) = code.find('/') else {
        return false;
    };
    if slash == 0 || !code.as_bytes()[..slash].iter().all(|&b| is_word(b)) {
        return false;
    }
    let segment = code[slash + 1..].split('/').next().unwrap_or("");
    let bytes = segment.as_bytes();
    (1..bytes.len().saturating_sub(1))
        .any(|i| bytes[i].is_ascii_whitespace() && bytes[i + 1].is_ascii_digit())
}

/// Code shape `ORG n` — a bare org token, then a number.
fn simple_prefix(code: &str) -> bool {
    let bytes = code.as_bytes();
    let end = bytes.iter().take_while(|&&b| is_word(b)).count();
    end > 0
        && bytes.get(end).is_some_and(|b| b.is_ascii_whitespace())
        && bytes.get(end + 1).is_some_and(|b| b.is_ascii_digit())
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `"ISO/IEC 123"` + `"WD"` → `"ISO/IEC WD 123"`.
fn stage_after_org(code: &str, stage: &str) -> String {
    match code.find(' ') {
        Some(i) => format!("{} {} {}", &code[..i], stage, &code[i + 1..]),
        None => code.to_string(),
    }
}

/// `"ISO 123"` + `"WD"` → `"ISO/WD 123"`.
fn stage_on_org(code: &str, stage: &str) -> String {
    let end = code.bytes().take_while(|&b| is_word(b)).count();
    format!("{}/{}{}", &code[..end], stage, &code[end..])
}

/// Advisory no-match diagnostics; the caller still receives a definitive
/// absent result.
fn report_not_found(code: &str, year: Option<&str>, missed_years: &[String]) {
    let id = match year {
        Some(y) => format!("{code}:{y}"),
        None => code.to_string(),
    };
    tracing::warn!(
        "no match found online for {id}; the code must be exactly as published by the registry"
    );
    if let (Some(year), false) = (year, missed_years.is_empty()) {
        tracing::warn!(
            "there was no match for {year}, though there were matches found for {}",
            missed_years.join(", ")
        );
    }
    if names_subpart(code) {
        tracing::warn!(
            "the provided document part may not exist, or the document may no longer be published in parts"
        );
    } else {
        tracing::warn!(
            "to cite all document parts, use \"{code} (all parts)\"; if the document is not a standard, use its type abbreviation (TS, TR, PAS, Guide)"
        );
    }
}

/// A digit-dash-digit run, the shape of a sub-part reference.
fn names_subpart(code: &str) -> bool {
    code.as_bytes()
        .windows(3)
        .any(|w| w[0].is_ascii_digit() && w[1] == b'-' && w[2].is_ascii_digit())
}
