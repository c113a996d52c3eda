use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod ai_cmd;
mod cli;
mod config_cmds;
mod context;
mod error_hints;
mod exec_cmd;
mod lookup_cmd;
mod push_cmd;
mod session_cmds;

use cli::{Cli, Commands, ConfigCommands, RecordCommands};
use context::AppContext;

/// Exit status after Ctrl-C, as a shell reports SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let debug = trail_config::debug_enabled();
    let default_level = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .try_init()
        .ok();

    let cli = Cli::parse();

    // Dropping the command future kills any child process group it owns.
    let outcome = tokio::select! {
        result = run(cli) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    match outcome {
        Some(Ok(code)) => std::process::exit(code),
        Some(Err(err)) => {
            eprintln!("error: {err:#}");
            if let Some(hint) = error_hints::suggest_fix(&err) {
                eprintln!("{hint}");
            }
            std::process::exit(error_hints::exit_code(&err));
        }
        None => {
            eprintln!("Interrupted.");
            std::process::exit(EXIT_INTERRUPTED);
        }
    }
}

/// Runs one command and returns the process exit code.
async fn run(cli: Cli) -> Result<i32> {
    let format = cli.format;

    // Config commands must work even when the session store is unusable.
    if let Commands::Config { cmd } = cli.command {
        match cmd {
            ConfigCommands::Show => config_cmds::handle_config_show(format)?,
            ConfigCommands::SetToken { token } => config_cmds::handle_set_token(token)?,
            ConfigCommands::ClearToken => config_cmds::handle_clear_token()?,
            ConfigCommands::Init => config_cmds::handle_config_init()?,
        }
        return Ok(0);
    }

    let mut ctx = AppContext::load()?;
    match cli.command {
        Commands::Start { force } => session_cmds::handle_start(&mut ctx, force, format)?,
        Commands::Which => session_cmds::handle_which(&ctx, format)?,
        Commands::Lookup { file, error } => {
            lookup_cmd::handle_lookup(&ctx, file, error, format).await?;
        }
        Commands::Checkout { id } => session_cmds::handle_checkout(&mut ctx, id).await?,
        Commands::Resolve { message } => session_cmds::handle_resolve(&ctx, message)?,
        Commands::Ai {
            error,
            file,
            model,
            cloud,
        } => ai_cmd::handle_ai(&ctx, error, file, model, cloud, format).await?,
        Commands::Record { cmd } => match cmd {
            RecordCommands::Start => session_cmds::handle_record_start(&mut ctx)?,
            RecordCommands::Stop => session_cmds::handle_record_stop(&ctx).await?,
        },
        Commands::Replay { id } => session_cmds::handle_replay(&ctx, id, format)?,
        Commands::End => session_cmds::handle_end(&mut ctx)?,
        Commands::Push => push_cmd::handle_push(&ctx, format).await?,
        Commands::Exec { command } => return exec_cmd::handle_exec(&ctx, command).await,
        Commands::List => session_cmds::handle_list(&ctx, format)?,
        Commands::Config { .. } => {}
    }
    Ok(0)
}
