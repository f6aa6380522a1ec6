//! HTTP client for the aoe4world player games listing.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use super::{FetchError, FetcherConfig, MatchPage, MatchSource};
use crate::models::{Match, ProfileId};

/// `GET {base}/players/{id}/games?since=..&page=..`
pub struct HttpMatchSource {
    client: Client,
    api_base: String,
}

impl HttpMatchSource {
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("aoe4-ledger")),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Listing URL for one page.
    pub fn page_url(
        &self,
        profile_id: ProfileId,
        since: Option<&str>,
        page: u32,
    ) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!("{}/players/{}/games", self.api_base, profile_id))
            .map_err(|e| FetchError::InvalidUrl(format!("Bad games URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            if let Some(since) = since {
                query.append_pair("since", since);
            }
            query.append_pair("page", &page.to_string());
        }

        Ok(url)
    }
}

/// Decode a listing body: the paginated envelope, or a bare array.
pub(crate) fn parse_page(body: &str) -> Result<MatchPage, FetchError> {
    match serde_json::from_str::<MatchPage>(body) {
        Ok(page) => Ok(page),
        Err(envelope_err) => match serde_json::from_str::<Vec<Match>>(body) {
            Ok(games) => Ok(MatchPage::new(games)),
            Err(_) => {
                let preview: String = body.chars().take(300).collect();
                warn!("Could not parse games response. Preview: {}", preview);
                Err(FetchError::Json(envelope_err))
            }
        },
    }
}

#[async_trait]
impl MatchSource for HttpMatchSource {
    fn name(&self) -> &'static str {
        "aoe4world"
    }

    async fn fetch_page(
        &self,
        profile_id: ProfileId,
        since: Option<&str>,
        page: u32,
    ) -> Result<MatchPage, FetchError> {
        let url = self.page_url(profile_id, since, page)?;
        debug!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(FetchError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        parse_page(&body)
    }
}
