use std::io;
use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;
use gh_search::{
    logging, output, Args, CooldownDisplay, QueryExecutor, RateLimitedTransport, RequestFactory,
    SearchError,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const USER_AGENT: &str = concat!("gh-search/", env!("CARGO_PKG_VERSION"));

// Conventional exit status for a process interrupted by SIGINT.
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    let args = Args::parse();
    logging::init(args.log_level, args.log_json);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling query");
            ctrl_c.cancel();
        }
    });

    match run(&args, &cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_cancelled() => {
            error!("{err}");
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args, cancel: &CancellationToken) -> Result<(), SearchError> {
    let params = args.request_params()?;

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(SearchError::BuildRequest)?;
    let cooldown = CooldownDisplay::new(!args.no_progress);
    let transport = RateLimitedTransport::with_cooldown(client.clone(), cooldown);
    let executor = QueryExecutor::new(transport, RequestFactory::new(client, &args.api_url));

    let results = executor.execute(&params, cancel).await?;
    info!(
        "Found {} files in {} repositories",
        results.file_hits, results.repository_hits
    );

    output::render(&results, args.format, &mut io::stdout().lock())
}
