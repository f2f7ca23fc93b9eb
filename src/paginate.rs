//! Walks a paged search resource by following `rel="next"` links.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{HeaderMap, LINK};
use reqwest::Request;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{Result, SearchError};
use crate::rate_limit::RateLimitedTransport;

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<.*?[\?&]page=(\d+).*?>; rel="([^"]+)""#).expect("link pattern is valid")
});

/// Folds one page of a search response into a running result set.
pub trait ResultsAggregator {
    fn aggregate_page(&mut self, body: &[u8]) -> Result<()>;
}

/// Fetches every page of a search, starting from page 1.
///
/// `build_request` is called with each page number to produce the request
/// for it. The next page comes from the response's `next` link, not from
/// incrementing, and the loop ends when a response has no such link. Any
/// failure aborts the whole run with the page number attached.
pub async fn paginate<B, A>(
    transport: &RateLimitedTransport,
    cancel: &CancellationToken,
    mut build_request: B,
    aggregator: &mut A,
) -> Result<()>
where
    B: FnMut(u32) -> Result<Request>,
    A: ResultsAggregator + ?Sized,
{
    trace!("paginating query");
    let mut page: u32 = 1;

    loop {
        match fetch_page(transport, cancel, &mut build_request, aggregator, page).await {
            Ok(Some(next_page)) => page = next_page,
            Ok(None) => return Ok(()),
            Err(err) => return Err(err.at_page(page)),
        }
    }
}

async fn fetch_page<B, A>(
    transport: &RateLimitedTransport,
    cancel: &CancellationToken,
    build_request: &mut B,
    aggregator: &mut A,
    page: u32,
) -> Result<Option<u32>>
where
    B: FnMut(u32) -> Result<Request>,
    A: ResultsAggregator + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(SearchError::Cancelled);
    }

    trace!(page, "building query for page");
    let request = build_request(page)?;

    trace!(url = %request.url(), page, "requesting page");
    let response = transport.execute(request, cancel).await?;

    let status = response.status();
    let headers = response.headers().clone();
    let body = tokio::select! {
        () = cancel.cancelled() => return Err(SearchError::Cancelled),
        body = response.bytes() => body?,
    };

    if !status.is_success() {
        return Err(SearchError::Status {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    aggregator.aggregate_page(&body)?;
    if cancel.is_cancelled() {
        return Err(SearchError::Cancelled);
    }

    let links = parse_link_relations(&headers)?;
    let next = links.get("next").copied();
    debug!(page, next_page = ?next, "page aggregated");
    Ok(next)
}

/// Maps each relation named in the response's `Link` headers to its page number.
pub fn parse_link_relations(headers: &HeaderMap) -> Result<HashMap<String, u32>> {
    let mut links = HashMap::new();
    for value in headers.get_all(LINK) {
        let Ok(value) = value.to_str() else {
            debug!("skipping non-ascii Link header");
            continue;
        };

        for captures in LINK_RE.captures_iter(value) {
            let raw_page = &captures[1];
            let page = raw_page
                .parse::<u32>()
                .map_err(|source| SearchError::LinkPage {
                    value: raw_page.to_string(),
                    source,
                })?;
            links.insert(captures[2].to_string(), page);
        }
    }
    Ok(links)
}
