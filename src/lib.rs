//! # gh-search
//!
//! Searches code on GitHub and gathers every page of results, waiting out
//! GitHub rate limits along the way.
//!
//! ## Main Components
//!
//! - [`QueryExecutor`]: runs a query, either as one code search or, when a
//!   repository topic is given, as a repository search followed by one code
//!   search per repository found
//! - [`paginate`](paginate::paginate): follows `rel="next"` links until the
//!   last page
//! - [`RateLimitedTransport`]: sleeps until the quota resets when GitHub
//!   throttles a request, then re-sends it
//! - [`QueryResults`]: file hits grouped by repository
//! - [`Args`]: command line arguments
//!
//! ## Example
//!
//! ```no_run
//! use gh_search::{Args, QueryExecutor, RateLimitedTransport, RequestFactory};
//! use clap::Parser;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let args = Args::parse();
//!     let params = args.request_params()?;
//!
//!     let client = reqwest::Client::builder().user_agent("gh-search").build()?;
//!     let executor = QueryExecutor::new(
//!         RateLimitedTransport::new(client.clone()),
//!         RequestFactory::new(client, &args.api_url),
//!     );
//!
//!     let results = executor.execute(&params, &CancellationToken::new()).await?;
//!     println!("{} files in {} repositories", results.file_hits, results.repository_hits);
//!     Ok(())
//! }
//! ```

mod args;
mod error;
pub mod logging;
pub mod output;
pub mod paginate;
mod progress;
mod query;
pub mod rate_limit;
mod requests;

pub use crate::args::Args;
pub use crate::error::{Result, SearchError};
pub use crate::output::OutputFormat;
pub use crate::paginate::ResultsAggregator;
pub use crate::progress::CooldownDisplay;
pub use crate::query::{QueryExecutor, QueryResults, RepoQueryResults};
pub use crate::rate_limit::RateLimitedTransport;
pub use crate::requests::{RequestFactory, RequestParams, DEFAULT_API_URL};
