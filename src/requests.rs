use std::fmt;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Request};

use crate::error::{Result, SearchError};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const GH_API_VERSION: &str = "2022-11-28";

// max amount GitHub will allow per page
const PER_PAGE: &str = "100";

/// Filters and credentials for one query execution.
///
/// Pagination and the per-repository phase copy this record with an
/// updated `page` or `repo` rather than mutating it in place.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub owner: Option<String>,
    pub extension: Option<String>,
    pub repo_query: Option<String>,
    pub query: String,
    pub filename: Option<String>,
    pub topic: Option<String>,
    pub repo: Option<String>,
    pub token: String,
    pub page: u32,
}

impl RequestParams {
    /// Copy of these parameters targeting `page`.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Copy of these parameters scoped to a single repository.
    #[must_use]
    pub fn with_repo(&self, repo: &str) -> Self {
        Self {
            repo: Some(repo.to_string()),
            ..self.clone()
        }
    }

    /// Search expression sent to `/search/repositories`.
    ///
    /// The topic goes out as a `topic:<value>` qualifier rather than bare
    /// text, so GitHub matches repositories tagged with it instead of ones
    /// that merely mention the word.
    #[must_use]
    pub fn repo_search_query(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(repo_query) = &self.repo_query {
            parts.push(repo_query.clone());
        }
        if let Some(topic) = &self.topic {
            parts.push(format!("topic:{topic}"));
        }
        if let Some(owner) = &self.owner {
            parts.push(format!("org:{owner}"));
        }
        parts.join(" ")
    }

    /// Search expression sent to `/search/code`.
    #[must_use]
    pub fn code_search_query(&self) -> String {
        let mut parts = Vec::with_capacity(5);
        parts.push(self.query.clone());
        if let Some(owner) = &self.owner {
            parts.push(format!("org:{owner}"));
        }
        if let Some(repo) = &self.repo {
            parts.push(format!("repo:{repo}"));
        }
        if let Some(extension) = &self.extension {
            parts.push(format!("extension:{extension}"));
        }
        if let Some(filename) = &self.filename {
            parts.push(format!("filename:{filename}"));
        }
        parts.join(" ")
    }
}

// The token never reaches logs.
impl fmt::Debug for RequestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestParams")
            .field("owner", &self.owner)
            .field("extension", &self.extension)
            .field("repo_query", &self.repo_query)
            .field("query", &self.query)
            .field("filename", &self.filename)
            .field("topic", &self.topic)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .field("page", &self.page)
            .finish()
    }
}

/// Builds GitHub search requests against a configurable API base URL.
#[derive(Debug, Clone)]
pub struct RequestFactory {
    client: Client,
    base_url: String,
}

impl RequestFactory {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn repo_search(&self, params: &RequestParams) -> Result<Request> {
        self.common_request(
            "/search/repositories",
            params.page,
            &params.repo_search_query(),
            &params.token,
        )
    }

    pub fn code_search(&self, params: &RequestParams) -> Result<Request> {
        self.common_request(
            "/search/code",
            params.page,
            &params.code_search_query(),
            &params.token,
        )
    }

    fn common_request(&self, path: &str, page: u32, query: &str, token: &str) -> Result<Request> {
        let mut builder = self.client.get(format!("{}{path}", self.base_url));
        if page > 0 {
            builder = builder.query(&[("page", page.to_string())]);
        }

        builder
            .query(&[("q", query), ("per_page", PER_PAGE)])
            .header("X-GitHub-Api-Version", GH_API_VERSION)
            .header(ACCEPT, "application/vnd.github+json")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .build()
            .map_err(SearchError::BuildRequest)
    }
}
