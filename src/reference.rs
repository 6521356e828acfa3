//! Reference-string parsing.
//!
//! Splits a citation like `"ISO/IEC TR 29110-5-1:2015"` or
//! `"ISO 3166-1:2006/Cor 1:2007"` into its structured components with a
//! hand-rolled scanner. Parsing never fails hard: a string that does not
//! match the expected shape is carried through as an opaque code and the
//! mismatch surfaces later as a no-match result.

/// Correction tags recognized after the `/` separator, longest first so
/// that compound tags win over their suffixes.
const CORRECTION_TAGS: [&str; 10] = [
    "AWI Amd", "PRF Amd", "CD Amd", "WD Amd", "NP Amd", "CD Cor", "FDAmd", "DAmd", "Amd", "Cor",
];

/// Structured fields extracted from a reference string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    /// Search code with any embedded year removed, e.g. `"ISO 9000-1"`.
    pub code: String,
    /// Leading organization token of the code, e.g. `"ISO/IEC"`.
    pub prefix: String,
    /// Document number, when the code carries one.
    pub number: Option<u32>,
    /// Dash-joined sub-part numbers, e.g. `"5-1"`.
    pub part: Option<String>,
    /// Effective year: caller-supplied, or embedded in the code or the
    /// correction tag.
    pub year: Option<String>,
    /// Correction suffix, e.g. `"Cor 1:2007"` or `"CD Amd 1"`.
    pub correction: Option<String>,
    /// Whether the reference names an entire multi-part family.
    pub all_parts: bool,
}

impl ParsedReference {
    /// Parse a reference string.
    ///
    /// `year` is the caller-supplied publication year; when present, the
    /// embedded-year split is skipped and the code keeps any `:YYYY`.
    /// `all_parts` forces or suppresses all-parts resolution; when absent
    /// it is derived from the shape of the reference.
    pub fn parse(reference: &str, year: Option<&str>, all_parts: Option<bool>) -> Self {
        let reference = reference.replace('\u{2013}', "-");
        let (mut code, correction) = split_correction(&reference);
        let mut year = year.map(str::to_string);
        let mut has_suffix = false;

        if year.is_none() {
            if let Some(split) = split_year(&code) {
                has_suffix = split.suffix;
                year = correction
                    .as_deref()
                    .and_then(first_embedded_year)
                    .map(str::to_string)
                    .or(split.year);
                code = split.code;
            }
        }

        let (number, part) = doc_number(&code);
        let number = number.and_then(|n| n.parse().ok());
        let part = part.map(str::to_string);
        let all_parts = match all_parts {
            Some(forced) => forced,
            None => part.is_none() && !has_suffix,
        };
        let prefix = code
            .split_ascii_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();

        Self {
            code,
            prefix,
            number,
            part,
            year,
            correction,
            all_parts,
        }
    }
}

/// Extract the first `<whitespace><digits>[-<digits-with-dashes>]` run,
/// the pattern shared by the parser and the search query.
pub(crate) fn doc_number(code: &str) -> (Option<&str>, Option<&str>) {
    match find_number(code) {
        Some(n) => (Some(n.num), n.part),
        None => (None, None),
    }
}

pub(crate) struct DocNumber<'a> {
    pub num: &'a str,
    pub part: Option<&'a str>,
    /// Byte offset just past the number, used to rebuild identifiers.
    pub num_end: usize,
}

pub(crate) fn find_number(code: &str) -> Option<DocNumber<'_>> {
    let bytes = code.as_bytes();
    for i in 0..bytes.len().saturating_sub(1) {
        if !(bytes[i].is_ascii_whitespace() && bytes[i + 1].is_ascii_digit()) {
            continue;
        }
        let start = i + 1;
        let num_end = start + count_digits(&bytes[start..]);
        let part = if bytes.get(num_end).copied() == Some(b'-') {
            let p = count_num_dash(&bytes[num_end + 1..]);
            (p > 0).then(|| &code[num_end + 1..num_end + 1 + p])
        } else {
            None
        };
        return Some(DocNumber {
            num: &code[start..num_end],
            part,
            num_end,
        });
    }
    None
}

/// First `:YYYY` occurrence in a string.
pub(crate) fn first_embedded_year(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    (0..bytes.len())
        .find(|&i| bytes[i] == b':' && count_digits(&bytes[i + 1..]) >= 4)
        .map(|i| &s[i + 1..i + 5])
}

/// Last `:YYYY` occurrence in a string. Document references embed the
/// publication year this way, possibly several times for corrections
/// (`"ISO 1:2000/Amd 1:2005"`); the last one is the most specific.
pub(crate) fn last_embedded_year(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    (0..bytes.len())
        .rev()
        .find(|&i| bytes[i] == b':' && count_digits(&bytes[i + 1..]) >= 4)
        .map(|i| &s[i + 1..i + 5])
}

/// Split `"<code>/<correction>"` into the code and the recognized
/// correction suffix. The code segment is the first token, a space, and
/// everything up to the first `/`; if what follows is not a correction
/// tag the whole input is the code.
fn split_correction(reference: &str) -> (String, Option<String>) {
    let Some(space) = reference
        .as_bytes()
        .iter()
        .position(|b| b.is_ascii_whitespace())
    else {
        return (reference.to_string(), None);
    };
    if space == 0 {
        return (reference.to_string(), None);
    }
    let body = &reference[space + 1..];
    let Some(slash) = body.find('/') else {
        return (reference.to_string(), None);
    };
    if slash == 0 {
        return (reference.to_string(), None);
    }
    let tail = &body[slash + 1..];
    match correction_prefix(tail) {
        Some(len) => (
            reference[..space + 1 + slash].to_string(),
            Some(tail[..len].to_string()),
        ),
        None => (reference.to_string(), None),
    }
}

/// Match `<tag> <digits>[:[<year>]][/Cor <digits>:<year>]` at the start
/// of `s`, returning the matched length.
fn correction_prefix(s: &str) -> Option<usize> {
    let tag = CORRECTION_TAGS.iter().find(|t| s.starts_with(**t))?;
    let bytes = s.as_bytes();
    let mut pos = tag.len();
    if bytes.get(pos).copied() != Some(b' ') {
        return None;
    }
    pos += 1;
    let digits = count_digits(&bytes[pos..]);
    if digits == 0 {
        return None;
    }
    pos += digits;
    if bytes.get(pos).copied() == Some(b':') {
        if count_digits(&bytes[pos + 1..]) >= 4 {
            pos += 5;
        } else {
            pos += 1;
        }
    }
    pos += trailing_corrigendum(&s[pos..]).unwrap_or(0);
    Some(pos)
}

/// Match an appended `"/Cor <digits>:<year>"`, returning its length.
fn trailing_corrigendum(s: &str) -> Option<usize> {
    let rest = s.strip_prefix("/Cor ")?;
    let bytes = rest.as_bytes();
    let digits = count_digits(bytes);
    if digits == 0 {
        return None;
    }
    let mut pos = digits;
    if bytes.get(pos).copied() != Some(b':') {
        return None;
    }
    pos += 1;
    if count_digits(&bytes[pos..]) < 4 {
        return None;
    }
    Some("/Cor ".len() + pos + 4)
}

struct YearSplit {
    code: String,
    year: Option<String>,
    /// A trailing word followed the year position; its presence means
    /// the reference names something more specific than a plain document.
    suffix: bool,
}

/// Split `<token>[ <word>] <digits-with-dashes>[:YYYY][ <word>]` into the
/// code without its embedded year, the year, and the trailing-suffix flag.
fn split_year(code: &str) -> Option<YearSplit> {
    let bytes = code.as_bytes();
    let t0 = bytes.iter().position(|b| b.is_ascii_whitespace())?;
    if t0 == 0 {
        return None;
    }
    let pos = t0 + 1;

    // Prefer the shape with a middle word ("ISO/IEC TR 29110"), matching
    // the number token after it; otherwise the number follows directly.
    let num_start = {
        let w = count_word(&bytes[pos..]);
        if w > 0
            && bytes
                .get(pos + w)
                .is_some_and(|b| b.is_ascii_whitespace())
            && count_num_dash(&bytes[pos + w + 1..]) > 0
        {
            pos + w + 1
        } else {
            pos
        }
    };
    let n = count_num_dash(&bytes[num_start..]);
    if n == 0 {
        return None;
    }
    let code_end = num_start + n;

    let mut cursor = code_end;
    let mut year = None;
    if bytes.get(cursor).copied() == Some(b':') && count_digits(&bytes[cursor + 1..]) >= 4 {
        year = Some(code[cursor + 1..cursor + 5].to_string());
        cursor += 5;
    }

    let mut result = code[..code_end].to_string();
    let mut suffix = false;
    if bytes.get(cursor).is_some_and(|b| b.is_ascii_whitespace()) {
        let w = count_word(&bytes[cursor + 1..]);
        if w > 0 {
            result.push_str(&code[cursor..cursor + 1 + w]);
            suffix = true;
        }
    }

    Some(YearSplit {
        code: result,
        year,
        suffix,
    })
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

fn count_num_dash(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .take_while(|&&b| b.is_ascii_digit() || b == b'-')
        .count()
}

fn count_word(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'_')
        .count()
}
