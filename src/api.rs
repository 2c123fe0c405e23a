// API client module: a small blocking HTTP client for the Deezer search
// endpoint. Synchronous on purpose, the menu waits for each request.

use crate::config::Config;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Deezer caps a single search page at this many results.
pub const SEARCH_LIMIT: u32 = 100;

/// Anything that can turn a keyword into a list of tracks. The menu only
/// needs this, which keeps the save flow testable without a network.
pub trait SongSearch {
    fn search(&self, keyword: &str) -> Result<Vec<Track>>;
}

/// Blocking client holding a reqwest client and the search endpoint URL.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    search_url: String,
}

/// Top-level search response. Deezer answers some failures with HTTP 200
/// and an `error` object instead of `data`, so a missing array is treated
/// as "no results".
#[derive(Deserialize, Debug, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<Track>,
}

/// One search hit. Only the fields the app uses are kept.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub artist: TrackArtist,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TrackArtist {
    pub name: String,
}

impl Track {
    pub fn new(artist: &str, title: &str) -> Self {
        Track {
            title: title.to_string(),
            artist: TrackArtist {
                name: artist.to_string(),
            },
        }
    }
}

impl ApiClient {
    /// Create a client for `search_url` with the given request timeout.
    pub fn new(search_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            search_url: search_url.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_url.clone(), config.timeout)
    }
}

impl SongSearch for ApiClient {
    /// GET `<search_url>?q=<keyword>&index=0&limit=100&output=json` and
    /// return the `data` array. Non-success statuses become errors with the
    /// response body attached.
    fn search(&self, keyword: &str) -> Result<Vec<Track>> {
        debug!(url = %self.search_url, keyword, "searching songs");
        let limit = SEARCH_LIMIT.to_string();
        let res = self
            .client
            .get(&self.search_url)
            .query(&[
                ("q", keyword),
                ("index", "0"),
                ("limit", limit.as_str()),
                ("output", "json"),
            ])
            .send()
            .context("Failed to send search request")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("Search failed: {} - {}", status, txt);
        }
        let resp: SearchResponse = res.json().context("Parsing search response json")?;
        debug!(results = resp.data.len(), "search finished");
        Ok(resp.data)
    }
}
