use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use rtally::{
    config::{Args, TallyConfig},
    date_key::DateKey,
    error::TallyError,
    fetch::{HttpPageSource, MetricFetcher, MetricPattern},
    google::{credentials::ServiceAccount, GoogleSheet},
    run_tally, RunSummary,
};

fn run(args: &Args) -> Result<RunSummary, TallyError> {
    let config = TallyConfig::from(args);

    let encoded = std::env::var(&args.creds_env)
        .map_err(|_| TallyError::Credentials(format!("{} is not set", args.creds_env)))?;
    let account = ServiceAccount::from_base64(&encoded)?;

    let pattern = MetricPattern::new(&config.field)?;
    let pages = HttpPageSource::new().map_err(TallyError::HttpClient)?;
    let fetcher = MetricFetcher::new(pages, pattern);

    let mut sheet = GoogleSheet::connect(account, &config.sheet_id, &config.tab)?;
    run_tally(&mut sheet, &fetcher, &config, &DateKey::today())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(summary) => {
            info!(
                "finished: column index {}{}, {} rows",
                summary.target_column,
                if summary.column_created { " (new)" } else { "" },
                summary.rows_written
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}
