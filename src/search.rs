//! Registry search endpoint.

use crate::client::{IsoClient, SEARCH_PATH};
use crate::error::{IsoError, Result};
use crate::hit::HitCollection;
use crate::reference;
use crate::types::SearchResponse;

/// Status filter sent with every search: candidates in all lifecycle
/// states are requested and ranked locally.
pub(crate) const STATUS_FILTER: &str = "ENT_ACTIVE,ENT_PROGRESS,ENT_INACTIVE,ENT_DELETED";

impl IsoClient {
    /// Search the registry for candidates matching a reference string.
    ///
    /// The document number and optional part are extracted from the text;
    /// everything else in the string is ignored at this stage and applied
    /// later as local filters. An empty response body means zero
    /// candidates, not an error.
    pub async fn search(&self, text: &str) -> Result<HitCollection> {
        let text = text.replace('\u{2013}', "-");
        let (number, part) = reference::doc_number(&text);

        let number = number.unwrap_or("");
        let mut params = vec![("status", STATUS_FILTER), ("docNumber", number)];
        if let Some(part) = part {
            params.push(("docPartNo", part));
        }

        let body = self.get(SEARCH_PATH, &params).await?;
        parse_search_response(&body)
    }
}

/// Parse a registry search JSON response into a ranked [`HitCollection`].
///
/// The registry answers some queries with an empty body; that means zero
/// candidates, not an error.
pub fn parse_search_response(json: &str) -> Result<HitCollection> {
    if json.trim().is_empty() {
        return Ok(HitCollection::default());
    }
    let response: SearchResponse = serde_json::from_str(json)
        .map_err(|e| IsoError::Parse(format!("invalid registry JSON: {e}")))?;
    Ok(HitCollection::from_hits(response.standards))
}
