//! SmartAPI login binary: resolve credentials, run the pipeline, report the outcome.

// std
use std::{path::PathBuf, process::ExitCode, thread, time::Duration};
// crates.io
use clap::Parser;
use tracing_subscriber::EnvFilter;
use url::Url;
// self
use smartapi_login::{
	api::{DEFAULT_ENDPOINT, HttpSessionClient},
	credential::{Credentials, StdinPrompt},
	error::Result,
	pipeline::{self, LoginReport},
	store::TokenStore,
};

/// Pause before a failing exit so the message stays readable in short-lived consoles.
const FAILURE_EXIT_DELAY: Duration = Duration::from_secs(5);

/// TOTP-based login utility for the AngelOne SmartAPI.
#[derive(Debug, Parser)]
#[command(name = "smartapi-login", version, about)]
struct Args {
	/// Path of the saved credential file.
	#[arg(long, default_value = "angelone_login_details.json")]
	credentials: PathBuf,
	/// Path the issued token bundle is written to.
	#[arg(long, default_value = "smartapi_tokens.json")]
	tokens: PathBuf,
	/// Base URL of the SmartAPI service.
	#[arg(long, default_value = DEFAULT_ENDPOINT)]
	endpoint: Url,
}

fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let args = Args::parse();

	match run(&args) {
		Ok(report) => {
			match report.profile_name {
				Some(name) => tracing::info!("welcome, {name}"),
				None => tracing::info!("login verified tokens are ready to use"),
			}

			ExitCode::SUCCESS
		},
		Err(e) => {
			tracing::error!("login failed: {e}");
			tracing::error!("check your credentials and try again");

			thread::sleep(FAILURE_EXIT_DELAY);

			ExitCode::FAILURE
		},
	}
}

fn run(args: &Args) -> Result<LoginReport> {
	tracing::info!("attempting login to AngelOne SmartAPI");

	let credentials = Credentials::resolve(&args.credentials, &StdinPrompt)?;
	let client = HttpSessionClient::new(args.endpoint.clone(), credentials.api_key.clone())?;
	let store = TokenStore::new(&args.tokens);
	let report = pipeline::run(&credentials, &client, &store)?;

	tracing::info!(
		client_code = %report.bundle.client_code,
		tokens = %store.path().display(),
		"login successful",
	);

	Ok(report)
}
