//! Best-effort movie title/year lookup against the OMDb API.

use crate::media::DetailFields;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const OMDB_BASE_URL: &str = "http://www.omdbapi.com/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieMatch {
    pub title: String,
    pub year: Option<String>,
}

pub trait MovieLookup {
    fn lookup(&self, title: &str) -> Result<Option<MovieMatch>>;
}

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response")]
    response: Option<String>,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

pub struct OmdbClient {
    api_key: String,
    base_url: String,
    http: reqwest::blocking::Client,
}

impl OmdbClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, OMDB_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            http,
        })
    }
}

impl MovieLookup for OmdbClient {
    fn lookup(&self, title: &str) -> Result<Option<MovieMatch>> {
        let body = self
            .http
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str()), ("t", title)])
            .send()
            .with_context(|| format!("OMDb request failed for {title:?}"))?
            .error_for_status()
            .context("OMDb returned an error status")?
            .text()
            .context("failed to read OMDb response")?;
        parse_omdb_response(&body)
    }
}

pub fn parse_omdb_response(body: &str) -> Result<Option<MovieMatch>> {
    let response: OmdbResponse =
        serde_json::from_str(body).context("OMDb response is not valid JSON")?;

    if response.response.as_deref() == Some("False") {
        debug!(error = ?response.error, "OMDb found no match");
        return Ok(None);
    }

    let Some(title) = response
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
    else {
        return Ok(None);
    };

    Ok(Some(MovieMatch {
        title,
        year: response.year.as_deref().and_then(leading_year),
    }))
}

/// Replaces title/year with the lookup result. Any lookup problem leaves the
/// caller's fields as they were.
pub fn enrich_details<L: MovieLookup + ?Sized>(lookup: &L, details: &mut DetailFields) {
    let Some(query) = details
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        return;
    };

    match lookup.lookup(query) {
        Ok(Some(found)) => {
            debug!(query, title = %found.title, year = ?found.year, "movie lookup matched");
            details.title = Some(found.title);
            if let Some(year) = found.year {
                details.year = Some(year);
            }
        }
        Ok(None) => debug!(query, "movie lookup returned nothing"),
        Err(err) => warn!(query, error = %err, "movie lookup failed, keeping given details"),
    }
}

/// "2010", "2010–2012" and "2010-" all yield "2010".
fn leading_year(raw: &str) -> Option<String> {
    let digits: String = raw.trim().chars().take_while(char::is_ascii_digit).collect();
    (digits.len() == 4).then_some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedLookup(Result<Option<MovieMatch>, String>);

    impl MovieLookup for CannedLookup {
        fn lookup(&self, _title: &str) -> Result<Option<MovieMatch>> {
            self.0.clone().map_err(anyhow::Error::msg)
        }
    }

    fn details(title: &str, year: Option<&str>) -> DetailFields {
        DetailFields {
            title: Some(title.to_string()),
            year: year.map(str::to_string),
            ..DetailFields::default()
        }
    }

    #[test]
    fn parses_match() {
        let body = r#"{"Title":"Inception","Year":"2010","Response":"True"}"#;
        let found = parse_omdb_response(body).expect("parse").expect("match");
        assert_eq!(found.title, "Inception");
        assert_eq!(found.year.as_deref(), Some("2010"));
    }

    #[test]
    fn parses_not_found() {
        let body = r#"{"Response":"False","Error":"Movie not found!"}"#;
        assert_eq!(parse_omdb_response(body).expect("parse"), None);
    }

    #[test]
    fn year_ranges_are_reduced() {
        assert_eq!(leading_year("2010–2012").as_deref(), Some("2010"));
        assert_eq!(leading_year("N/A"), None);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_omdb_response("<html>").is_err());
    }

    #[test]
    fn enrich_replaces_title_and_year() {
        let lookup = CannedLookup(Ok(Some(MovieMatch {
            title: "Inception".to_string(),
            year: Some("2010".to_string()),
        })));
        let mut fields = details("inception", Some("1999"));
        enrich_details(&lookup, &mut fields);
        assert_eq!(fields, details("Inception", Some("2010")));
    }

    #[test]
    fn enrich_keeps_fields_on_error_or_absence() {
        let mut fields = details("Inception", Some("2010"));
        enrich_details(&CannedLookup(Err("offline".to_string())), &mut fields);
        assert_eq!(fields, details("Inception", Some("2010")));

        enrich_details(&CannedLookup(Ok(None)), &mut fields);
        assert_eq!(fields, details("Inception", Some("2010")));
    }
}
