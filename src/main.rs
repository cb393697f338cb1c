//! modreq - Moderator-assistance tickets for multiplayer game servers
//!
//! This is the main entry point for the modreq CLI application. It parses
//! arguments, loads configuration, builds the worker runtime and hands the
//! command to its handler while the calling thread serves as the main loop.

use clap::Parser;
use modreq::cli::handlers::{
    Completion, HandlerContext, ListParams, StatusChange, handle_claim, handle_config_command,
    handle_create, handle_info, handle_list, handle_migrate, handle_note, handle_status_change,
    handle_teleport, handle_unclaim, resolve_actor,
};
use modreq::cli::{Cli, Commands, OutputFormatter};
use modreq::config::Config;
use modreq::error::{ModReqError, Result};
use modreq::host::{HostHandle, MainLoop};
use std::process;
use tracing_subscriber::EnvFilter;

/// Main entry point for the modreq CLI
fn main() {
    let cli = Cli::parse();
    let formatter = OutputFormatter::new(cli.json, cli.no_color);

    match run(cli, formatter) {
        Ok(completion) => process::exit(completion.exit_code()),
        Err(e) => {
            handle_error(&e, &formatter);
            process::exit(1);
        },
    }
}

/// Install the log subscriber
///
/// `-v` forces debug output; otherwise `RUST_LOG` wins over the configured
/// level. Logs go to stderr so JSON output stays parseable.
fn init_tracing(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    // A second initialization only happens in tests; ignore it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the CLI application with the parsed arguments
fn run(cli: Cli, formatter: OutputFormatter) -> Result<Completion> {
    if let Commands::Config { command } = cli.command {
        init_tracing(cli.verbose, "warn");
        return handle_config_command(command, cli.config.as_deref(), &formatter);
    }

    let config = Config::load(cli.config.as_deref())?;
    init_tracing(cli.verbose, &config.logging.level);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.runtime.worker_threads)
        .thread_name("modreq-worker")
        .enable_all()
        .build()?;

    let main_loop = MainLoop::new();
    let host = main_loop.handle();
    main_loop.run_until(&runtime, execute(cli, config, host, formatter))?
}

/// Execute a ticket command on the worker runtime
async fn execute(
    cli: Cli,
    config: Config,
    host: HostHandle,
    formatter: OutputFormatter,
) -> Result<Completion> {
    if matches!(cli.command, Commands::Migrate) {
        return handle_migrate(&config, cli.database.as_deref(), &formatter).await;
    }

    let actor = resolve_actor(&cli.actor)?;
    let ctx = HandlerContext::open(config, cli.database.as_deref(), actor, host, formatter).await?;
    let result = dispatch_command(&ctx, cli.command).await;
    ctx.shutdown().await;
    result
}

async fn dispatch_command(ctx: &HandlerContext, command: Commands) -> Result<Completion> {
    match command {
        Commands::Create {
            description,
            location,
        } => handle_create(ctx, &description, location.into_location()).await,
        Commands::Claim { id, force } => handle_claim(ctx, id, force).await,
        Commands::Unclaim { id } => handle_unclaim(ctx, id).await,
        Commands::Elevate { id } => handle_status_change(ctx, id, StatusChange::Elevate).await,
        Commands::Done { id } => handle_status_change(ctx, id, StatusChange::Complete).await,
        Commands::Close { id } => handle_status_change(ctx, id, StatusChange::Close).await,
        Commands::Note { id, message } => handle_note(ctx, id, &message).await,
        Commands::Info { id } => handle_info(ctx, id).await,
        Commands::List {
            status,
            all,
            player,
            mine,
            page,
        } => {
            let params = ListParams {
                statuses: status,
                all,
                player,
                mine,
                page,
            };
            handle_list(ctx, &params).await
        },
        Commands::Tp { id } => handle_teleport(ctx, id).await,
        Commands::Migrate | Commands::Config { .. } => Err(ModReqError::custom(
            "command is handled before the database is opened",
        )),
    }
}

fn handle_error(error: &ModReqError, formatter: &OutputFormatter) {
    // Display the main error message
    formatter.error(&error.user_message());

    // Display suggestions if available
    let suggestions = error.suggestions();
    if !suggestions.is_empty() && !formatter.is_json() {
        eprintln!("\nSuggestions:");
        for suggestion in &suggestions {
            eprintln!("  • {suggestion}");
        }
    }

    // In JSON mode, output error as JSON
    if formatter.is_json() {
        let _ = formatter.print_json(&serde_json::json!({
            "status": "error",
            "error": error.to_string(),
            "suggestions": suggestions,
            "recoverable": error.is_recoverable(),
            "retriable": error.is_retriable(),
            "is_config_error": error.is_config_error(),
        }));
    }

    // In verbose mode, show the full error chain
    if tracing::enabled!(tracing::Level::DEBUG) {
        eprintln!("\nDebug information:");
        eprintln!("{error:?}");
    }
}
