//! Reddit search client.
//!
//! Authenticates with the OAuth2 client-credentials grant, then pages through
//! `/r/{subreddit}/search` 100 posts at a time. Rate limited to one request
//! per second, in line with Reddit's 60 requests/minute OAuth quota.

use super::{PostSource, ScrapedPost};
use crate::config::ScrapeSettings;
use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(1000);

/// Reddit never returns more than this many items per listing page.
pub const MAX_PAGE_SIZE: usize = 100;

pub struct RedditClient {
    client: Client,
    api_base_url: String,
    subreddit: String,
    access_token: String,
    last_request: Mutex<Instant>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    after: Option<String>,
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Deserialize)]
struct ListingChild {
    data: RedditPost,
}

#[derive(Deserialize)]
struct RedditPost {
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    score: i64,
}

impl From<RedditPost> for ScrapedPost {
    fn from(post: RedditPost) -> Self {
        ScrapedPost {
            body: post.selftext,
            subreddit: post.subreddit,
            title: post.title,
            created_utc: post.created_utc,
            score: post.score,
        }
    }
}

impl Listing {
    fn into_page(self) -> (Vec<ScrapedPost>, Option<String>) {
        let posts = self
            .data
            .children
            .into_iter()
            .map(|child| child.data.into())
            .collect();
        (posts, self.data.after.filter(|a| !a.is_empty()))
    }
}

impl RedditClient {
    /// Obtain an access token and return a client ready to search.
    /// Fails if credentials are missing or Reddit rejects them.
    pub fn connect(settings: &ScrapeSettings) -> Result<Self> {
        let creds = settings.credentials()?;
        let (client_id, client_secret, user_agent) =
            (creds.client_id, creds.client_secret, creds.user_agent);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()?;

        let response = client
            .post(&settings.auth_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .context("Failed to reach Reddit token endpoint")?;

        if !response.status().is_success() {
            bail!("Reddit token request failed with status {}", response.status());
        }

        let token: TokenResponse = response
            .json()
            .context("Malformed Reddit token response")?;
        let access_token = match (token.access_token, token.error) {
            (Some(access_token), _) => access_token,
            (None, Some(error)) => bail!("Reddit token request rejected: {}", error),
            (None, None) => bail!("Reddit token response has no access_token"),
        };

        info!("Authenticated with Reddit as '{}'", user_agent);

        Ok(Self {
            client,
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            subreddit: settings.subreddit.clone(),
            access_token,
            last_request: Mutex::new(Instant::now() - RATE_LIMIT_INTERVAL),
        })
    }

    fn rate_limit(&self) {
        let mut last = self.last_request.lock().unwrap();
        let elapsed = last.elapsed();
        if elapsed < RATE_LIMIT_INTERVAL {
            std::thread::sleep(RATE_LIMIT_INTERVAL - elapsed);
        }
        *last = Instant::now();
    }

    fn fetch_page(
        &self,
        query: &str,
        page_size: usize,
        after: Option<&str>,
    ) -> Result<(Vec<ScrapedPost>, Option<String>)> {
        self.rate_limit();

        let mut url = format!(
            "{}/r/{}/search?q={}&limit={}&raw_json=1",
            self.api_base_url,
            urlencoding::encode(&self.subreddit),
            urlencoding::encode(query),
            page_size
        );
        if let Some(after) = after {
            url.push_str(&format!("&after={}", urlencoding::encode(after)));
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()?;

        if !response.status().is_success() {
            bail!("Reddit search failed with status {}", response.status());
        }

        let listing: Listing = response.json().context("Malformed Reddit listing")?;
        Ok(listing.into_page())
    }
}

impl PostSource for RedditClient {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<ScrapedPost>> {
        let mut posts: Vec<ScrapedPost> = Vec::with_capacity(limit);
        let mut after: Option<String> = None;

        while posts.len() < limit {
            let page_size = (limit - posts.len()).min(MAX_PAGE_SIZE);
            let (page, next) = self.fetch_page(query, page_size, after.as_deref())?;
            debug!(
                "Fetched {} posts from r/{} (after {:?})",
                page.len(),
                self.subreddit,
                after
            );
            let exhausted = page.is_empty() || next.is_none();
            posts.extend(page);
            if exhausted {
                break;
            }
            after = next;
        }

        posts.truncate(limit);
        info!(
            "Reddit search '{}' in r/{} returned {} posts",
            query,
            self.subreddit,
            posts.len()
        );
        Ok(posts)
    }
}
