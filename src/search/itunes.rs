use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::config::SearchSettings;

use super::model::{SearchCandidate, SearchError, SearchProvider};

const USER_AGENT: &str = concat!("record/", env!("CARGO_PKG_VERSION"));

/// Song search against the iTunes Search API (or anything that speaks its
/// response format).
pub struct ITunesProvider {
    agent: ureq::Agent,
    endpoint: String,
    limit: u32,
    country: Option<String>,
    artwork_size: u32,
}

#[derive(Debug, Deserialize)]
struct ITunesResponse {
    #[serde(default)]
    results: Vec<ITunesTrack>,
}

#[derive(Debug, Deserialize)]
struct ITunesTrack {
    #[serde(rename = "trackName")]
    track_name: Option<String>,
    #[serde(rename = "artistName")]
    artist_name: Option<String>,
    #[serde(rename = "artworkUrl100")]
    artwork_url_100: Option<String>,
}

impl ITunesProvider {
    pub fn new(settings: &SearchSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .user_agent(USER_AGENT)
            .build();

        Self {
            agent,
            endpoint: settings.endpoint.clone(),
            limit: settings.limit,
            country: settings
                .country
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            artwork_size: settings.artwork_size,
        }
    }
}

impl SearchProvider for ITunesProvider {
    fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, SearchError> {
        let limit = self.limit.to_string();
        let mut request = self
            .agent
            .get(&self.endpoint)
            .query("term", query)
            .query("entity", "song")
            .query("limit", &limit);
        if let Some(country) = &self.country {
            request = request.query("country", country);
        }

        let response = request.call().map_err(|e| match e {
            ureq::Error::Status(status, _) => SearchError::Http { status },
            ureq::Error::Transport(t) => SearchError::Transport(t.to_string()),
        })?;
        let body = response
            .into_string()
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let candidates = parse_response(&body, self.artwork_size)?;
        debug!(query, hits = candidates.len(), "itunes search finished");
        Ok(candidates)
    }
}

/// Parse an iTunes search body, skipping hits without a title or artist.
pub(super) fn parse_response(
    body: &str,
    artwork_size: u32,
) -> Result<Vec<SearchCandidate>, SearchError> {
    let response: ITunesResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Malformed(e.to_string()))?;

    Ok(response
        .results
        .into_iter()
        .filter_map(|t| {
            let title = t.track_name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;
            let artist = t.artist_name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;
            let album_art_url = t
                .artwork_url_100
                .map(|u| resize_artwork(&u, artwork_size))
                .unwrap_or_default();
            Some(SearchCandidate {
                title,
                artist,
                album_art_url,
            })
        })
        .collect())
}

/// iTunes artwork URLs encode their size as `100x100`; swap in the wanted one.
pub(super) fn resize_artwork(url: &str, size: u32) -> String {
    if size == 0 || size == 100 {
        return url.to_string();
    }
    url.replace("100x100", &format!("{size}x{size}"))
}
