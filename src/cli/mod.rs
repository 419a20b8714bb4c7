pub mod auth;
pub mod log;
pub mod prompt;

use anyhow::{anyhow, Result};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use self::{
    auth::{authenticate, ensure_api_key},
    log::run_log,
    prompt::TerminalPrompter,
};
use crate::{
    app::Application,
    config::Config,
    error::WakalogError,
    http::build_client,
    sheets::{auth::InstalledFlowTokens, SheetsClient},
    store::FileCredentialStore,
    utils::{clock::DefaultClock, logging::enable_logging, shutdown::detect_shutdown},
    wakatime::{TimeTracker, WakaTimeClient},
};

#[derive(Parser, Debug)]
#[command(name = "wakalog", version, long_about = None)]
#[command(about = "Log your weekly WakaTime activity to a Google Sheet", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Authenticate with WakaTime using your secret API key")]
    Auth,
    #[command(
        about = "Log last week's daily average, most active day and total time to the team sheet"
    )]
    Log,
}

pub async fn run_cli() -> Result<()> {
    let args = parse_args(std::env::args_os())?;

    let config = Config::load()?;
    std::fs::create_dir_all(&config.app_dir)?;
    enable_logging(&config.app_dir, config.log_level, config.log_console)?;
    info!("Starting {:?} with {:?}", args.commands, config.app_dir);

    let shutdown = CancellationToken::new();
    tokio::spawn(detect_shutdown(shutdown.clone()));

    let result = run_command(args.commands, &config, &shutdown).await;
    shutdown.cancel();
    if let Err(e) = &result {
        error!("Command failed {e:?}");
    }
    result
}

fn parse_args<I, T>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Args::try_parse_from(args) {
        Ok(args) => Ok(args),
        Err(e) if prints_and_exits(e.kind()) => e.exit(),
        Err(e) => {
            let rendered = e.to_string();
            let message = rendered
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ")
                .to_string();
            Err(WakalogError::Flag {
                message,
                usage: Args::command().render_usage().to_string(),
            }
            .into())
        }
    }
}

/// Kinds clap renders in full (help or version) instead of as a one-line error.
fn prints_and_exits(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

async fn run_command(
    command: Commands,
    config: &Config,
    shutdown: &CancellationToken,
) -> Result<()> {
    let http = build_client(config.request_timeout)?;
    let store = FileCredentialStore::new(config.credentials_path());
    let connect = |api_key: &str| -> Box<dyn TimeTracker> {
        Box::new(WakaTimeClient::new(
            http.clone(),
            &config.wakatime_base_url,
            api_key,
            shutdown.clone(),
        ))
    };

    match command {
        Commands::Auth => {
            let account = authenticate(&store, &TerminalPrompter, connect).await?;
            println!(
                "WakaTime auth successful! Logged in as {}.",
                account.display_name
            );
            Ok(())
        }
        Commands::Log => {
            let spreadsheet_id = config
                .spreadsheet_id
                .clone()
                .ok_or_else(|| anyhow!("WAKALOG_SPREADSHEET_ID is not set"))?;
            let api_key = ensure_api_key(
                config.wakatime_api_key.as_deref(),
                &store,
                &TerminalPrompter,
                &connect,
            )
            .await?;

            let tokens =
                InstalledFlowTokens::new(&config.google_client_secret, &config.sheets_token_path())
                    .await?;
            let app = Application {
                time_tracker: connect(&api_key),
                spreadsheet: Box::new(SheetsClient::new(
                    http.clone(),
                    spreadsheet_id,
                    Box::new(tokens),
                    shutdown.clone(),
                )),
                prompter: Box::new(TerminalPrompter),
                clock: Box::new(DefaultClock),
            };

            let outcome = run_log(&app).await?;
            info!("Log finished with {outcome:?}");
            println!("{}", outcome.message());
            Ok(())
        }
    }
}

/// Message to print and process exit code for a failed run. Typed errors are looked up anywhere
/// in the context chain.
pub fn exit_code(error: &anyhow::Error) -> (String, i32) {
    let typed = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<WakalogError>());

    match typed {
        Some(WakalogError::Auth(message)) => (message.clone(), 1),
        Some(WakalogError::Flag { message, usage }) => (format!("{message}\n\n{usage}"), 1),
        Some(WakalogError::VendorApi {
            vendor,
            status,
            message,
        }) => (format!("{vendor} Error: {message} ({status})"), *status as i32),
        Some(WakalogError::Cancelled) => ("Operation cancelled.".into(), 1),
        None => (format!("An error occurred: {error:#} (1)"), 1),
    }
}
