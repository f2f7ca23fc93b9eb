//! Mock GitHub API helpers shared by the integration tests.

#![allow(dead_code)]

use gh_search::{QueryExecutor, RateLimitedTransport, RequestFactory, RequestParams};
use reqwest::Client;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const TOKEN: &str = "test-token";

pub fn transport() -> RateLimitedTransport {
    RateLimitedTransport::new(Client::new())
}

pub fn factory(server: &MockServer) -> RequestFactory {
    RequestFactory::new(Client::new(), server.uri())
}

pub fn executor(server: &MockServer) -> QueryExecutor {
    QueryExecutor::new(transport(), factory(server))
}

pub fn params(query: &str) -> RequestParams {
    RequestParams {
        query: query.to_string(),
        token: TOKEN.to_string(),
        ..RequestParams::default()
    }
}

/// Body of a `/search/code` page holding one item per `(repo, path)` pair.
pub fn code_page(hits: &[(&str, &str)]) -> Value {
    let items: Vec<Value> = hits
        .iter()
        .map(|&(repo, path)| {
            json!({
                "name": path.rsplit('/').next().unwrap_or(path),
                "path": path,
                "sha": "0000000000000000000000000000000000000000",
                "repository": {
                    "name": repo.rsplit('/').next().unwrap_or(repo),
                    "full_name": repo,
                    "owner": { "login": repo.split('/').next().unwrap_or(repo) },
                },
            })
        })
        .collect();
    json!({ "total_count": items.len(), "incomplete_results": false, "items": items })
}

/// Body of a `/search/repositories` page.
pub fn repo_page(repos: &[&str]) -> Value {
    let items: Vec<Value> = repos
        .iter()
        .map(|repo| json!({ "full_name": repo, "private": false }))
        .collect();
    json!({ "total_count": items.len(), "incomplete_results": false, "items": items })
}

/// `Link` header value pointing `rel="next"` at `page`, plus a `last` relation.
pub fn next_link(server: &MockServer, path: &str, page: u32) -> String {
    format!(
        "<{uri}{path}?q=needle&page={page}&per_page=100>; rel=\"next\", \
         <{uri}{path}?q=needle&page=50&per_page=100>; rel=\"last\"",
        uri = server.uri()
    )
}
