//! Query strategies and the result sets they accumulate into.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::error::{Result, SearchError};
use crate::paginate::{paginate, ResultsAggregator};
use crate::rate_limit::RateLimitedTransport;
use crate::requests::{RequestFactory, RequestParams};

/// Code search hits grouped by repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryResults {
    /// Number of distinct repositories with at least one hit.
    pub repository_hits: usize,
    /// Number of matching files across all repositories.
    pub file_hits: usize,
    /// Repository full name to matched file paths, in arrival order.
    pub repositories: BTreeMap<String, Vec<String>>,
}

impl QueryResults {
    fn record_hit(&mut self, repo: &str, path: String) {
        match self.repositories.get_mut(repo) {
            Some(files) => files.push(path),
            None => {
                self.repository_hits += 1;
                self.repositories.insert(repo.to_string(), vec![path]);
            }
        }
        self.file_hits += 1;
    }
}

impl ResultsAggregator for QueryResults {
    fn aggregate_page(&mut self, body: &[u8]) -> Result<()> {
        let page: SearchPage<CodeSearchFile> = serde_json::from_slice(body)?;
        debug!(
            total_count = page.total_count,
            items = page.items.len(),
            "decoded code search page"
        );
        for item in page.items {
            debug!(
                name = %item.name,
                path = %item.path,
                repo = %item.repository.full_name,
                "search hit"
            );
            self.record_hit(&item.repository.full_name, item.path);
        }
        Ok(())
    }
}

/// Repositories discovered by a repository search, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoQueryResults {
    repositories: Vec<String>,
}

impl RepoQueryResults {
    pub fn repositories(&self) -> &[String] {
        &self.repositories
    }

    pub fn into_repositories(self) -> Vec<String> {
        self.repositories
    }
}

impl ResultsAggregator for RepoQueryResults {
    fn aggregate_page(&mut self, body: &[u8]) -> Result<()> {
        let page: SearchPage<SearchRepository> = serde_json::from_slice(body)?;
        debug!(
            total_count = page.total_count,
            items = page.items.len(),
            "decoded repository search page"
        );
        for item in page.items {
            debug!(repo = %item.full_name, "search hit");
            self.repositories.push(item.full_name);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage<T> {
    total_count: u64,
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CodeSearchFile {
    name: String,
    path: String,
    repository: SearchRepository,
}

#[derive(Debug, Deserialize)]
struct SearchRepository {
    full_name: String,
}

/// Runs a complete search, choosing the strategy from the parameters.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    transport: RateLimitedTransport,
    requests: RequestFactory,
}

impl QueryExecutor {
    pub fn new(transport: RateLimitedTransport, requests: RequestFactory) -> Self {
        Self {
            transport,
            requests,
        }
    }

    /// Executes the query described by `params`.
    ///
    /// A topic filter cannot be expressed in a code search, so when one is set
    /// the repositories carrying the topic are found first and each is then
    /// searched on its own, one after another. Otherwise a single code search
    /// covers everything.
    pub async fn execute(
        &self,
        params: &RequestParams,
        cancel: &CancellationToken,
    ) -> Result<QueryResults> {
        let span = info_span!(
            "query",
            api = %self.requests.base_url(),
            query = %params.query,
            owner = params.owner.as_deref(),
            extension = params.extension.as_deref(),
            filename = params.filename.as_deref(),
            topic = params.topic.as_deref(),
            repo = params.repo.as_deref(),
        );

        if params.topic.is_some() {
            self.query_per_repo(params, cancel).instrument(span).await
        } else {
            self.global_query(params, cancel).instrument(span).await
        }
    }

    async fn global_query(
        &self,
        params: &RequestParams,
        cancel: &CancellationToken,
    ) -> Result<QueryResults> {
        info!("executing query in multi-repo mode");
        let mut results = QueryResults::default();
        paginate(
            &self.transport,
            cancel,
            |page| self.requests.code_search(&params.with_page(page)),
            &mut results,
        )
        .await?;
        Ok(results)
    }

    async fn query_per_repo(
        &self,
        params: &RequestParams,
        cancel: &CancellationToken,
    ) -> Result<QueryResults> {
        info!("executing query per discovered repository");

        info!("searching for list of repositories matching query params");
        let mut repos = RepoQueryResults::default();
        paginate(
            &self.transport,
            cancel,
            |page| self.requests.repo_search(&params.with_page(page)),
            &mut repos,
        )
        .await
        .map_err(|err| SearchError::RepositorySearch(Box::new(err)))?;

        let mut results = QueryResults::default();
        for repo in repos.into_repositories() {
            let scoped = params.with_repo(&repo);
            let span = info_span!("repository", repo = %repo);
            async {
                info!("executing query for repository");
                paginate(
                    &self.transport,
                    cancel,
                    |page| self.requests.code_search(&scoped.with_page(page)),
                    &mut results,
                )
                .await
            }
            .instrument(span)
            .await
            .map_err(|err| SearchError::RepositoryCodeSearch {
                repo,
                source: Box::new(err),
            })?;
        }

        Ok(results)
    }
}
