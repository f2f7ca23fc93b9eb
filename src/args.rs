use clap::Parser;

use crate::error::{Result, SearchError};
use crate::logging::LogLevel;
use crate::output::OutputFormat;
use crate::requests::{RequestParams, DEFAULT_API_URL};

/// Search code on GitHub.
///
/// Every page of results is fetched, waiting out GitHub rate limits as
/// needed. Scoping by repository topic first searches for the repositories
/// carrying the topic and then searches each of them in turn.
#[derive(Parser, Debug)]
#[clap(name = "gh-search", author, version, about)]
pub struct Args {
    /// Text to search for in code.
    #[clap(value_name = "QUERY TEXT")]
    pub query: String,

    /// File extension of files to query within.
    #[clap(
        short,
        long,
        env = "GH_SEARCH_EXTENSION",
        conflicts_with = "filename",
        help_heading = "Query Arguments"
    )]
    pub extension: Option<String>,

    /// Repo owner of files to query within.
    #[clap(short, long, env = "GH_SEARCH_OWNER", help_heading = "Query Arguments")]
    pub owner: Option<String>,

    /// File name of files to query within.
    #[clap(short, long, env = "GH_SEARCH_FILENAME", help_heading = "Query Arguments")]
    pub filename: Option<String>,

    /// Repo topic to scope queries to.
    #[clap(
        short,
        long,
        env = "GH_SEARCH_TOPIC",
        conflicts_with = "repo",
        help_heading = "Query Arguments"
    )]
    pub topic: Option<String>,

    /// Repository to scope queries to.
    #[clap(short, long, env = "GH_SEARCH_REPO", help_heading = "Query Arguments")]
    pub repo: Option<String>,

    /// Query to search for within repository metadata to limit the repositories queried.
    #[clap(long, env = "GH_SEARCH_REPO_QUERY", help_heading = "Query Arguments")]
    pub repo_query: Option<String>,

    /// GitHub API token used to authorize the query.
    /// Prefer passing it through the environment.
    #[clap(long, env = "GITHUB_TOKEN", hide_env_values = true, help_heading = "Authentication")]
    pub token: Option<String>,

    /// Logging level [TRACE, DEBUG, INFO, WARN, ERROR].
    #[clap(long, env = "GH_SEARCH_LOG_LEVEL", default_value = "INFO", help_heading = "Logging")]
    pub log_level: LogLevel,

    /// Emit log lines as JSON.
    #[clap(long, help_heading = "Logging")]
    pub log_json: bool,

    /// Output format.
    #[clap(
        long,
        env = "GH_SEARCH_FORMAT",
        value_enum,
        default_value_t = OutputFormat::Json,
        help_heading = "Output Formatting"
    )]
    pub format: OutputFormat,

    /// Hide the rate-limit cooldown progress bar.
    #[clap(long, help_heading = "Output Formatting")]
    pub no_progress: bool,

    /// Base URL of the GitHub REST API.
    #[clap(long, env = "GH_SEARCH_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

impl Args {
    /// Validated query parameters for the search.
    ///
    /// Falls back to `GH_TOKEN` when no token came from the flag or
    /// `GITHUB_TOKEN`. Blank filter values count as unset.
    pub fn request_params(&self) -> Result<RequestParams> {
        let token = non_blank(self.token.as_deref())
            .or_else(|| non_blank(std::env::var("GH_TOKEN").ok().as_deref()))
            .ok_or(SearchError::MissingToken)?;

        Ok(RequestParams {
            owner: non_blank(self.owner.as_deref()),
            extension: non_blank(self.extension.as_deref()),
            repo_query: non_blank(self.repo_query.as_deref()),
            query: self.query.clone(),
            filename: non_blank(self.filename.as_deref()),
            topic: non_blank(self.topic.as_deref()),
            repo: non_blank(self.repo.as_deref()),
            token,
            page: 0,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}
