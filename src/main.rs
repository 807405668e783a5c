//! Focus Timer CLI
//!
//! A Pomodoro timer split into a daemon that owns the countdown and a CLI
//! that controls it:
//! - 25 minutes of focused work
//! - 5 minutes of short break
//! - 15 minutes of long break after 4 focus sessions

use anyhow::{Context, Result};
use chrono::Local;
use clap::{CommandFactory, Parser};

use focus_timer::analytics::{recent_focus_sessions, summarize};
use focus_timer::cli::{
    ClientError, Cli, Commands, DaemonArgs, Display, IpcClient, SettingsArgs, SettingsCommand,
};
use focus_timer::config::{load_settings, save_settings, Paths};
use focus_timer::daemon::Daemon;
use focus_timer::notification::{CommandNotifier, LogNotifier, NotificationPort};
use focus_timer::store::{JsonlSessionStore, SessionStore};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Start(args)) => {
            let response = IpcClient::new()?.start(args.intent).await?;
            Display::show_command_success(&response);
        }
        Some(Commands::Pause) => {
            let response = IpcClient::new()?.pause().await?;
            Display::show_command_success(&response);
        }
        Some(Commands::Stop) => {
            let response = IpcClient::new()?.stop().await?;
            Display::show_command_success(&response);
        }
        Some(Commands::Skip) => {
            let response = IpcClient::new()?.skip().await?;
            Display::show_command_success(&response);
        }
        Some(Commands::Status) => {
            let response = IpcClient::new()?.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Intent { text }) => {
            let response = IpcClient::new()?.set_intent(text).await?;
            Display::show_command_success(&response);
        }
        Some(Commands::Settings { action }) => {
            let paths = Paths::from_env()?;
            match action {
                SettingsCommand::Show => {
                    let settings = load_settings(&paths.settings_path())?;
                    Display::show_settings(&settings);
                }
                SettingsCommand::Set(args) => update_settings(&paths, &args).await?,
            }
        }
        Some(Commands::History { limit }) => {
            let paths = Paths::from_env()?;
            let records = JsonlSessionStore::new(paths.sessions_path()).load_all()?;
            Display::show_history(&recent_focus_sessions(&records, limit));
        }
        Some(Commands::Stats) => {
            let paths = Paths::from_env()?;
            let records = JsonlSessionStore::new(paths.sessions_path()).load_all()?;
            Display::show_stats(&summarize(&records, Local::now().date_naive()));
        }
        Some(Commands::Daemon(args)) => run_daemon(args).await?,
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Sends new settings to the daemon, or writes the file when it is not running.
async fn update_settings(paths: &Paths, args: &SettingsArgs) -> Result<()> {
    if args.is_empty() {
        anyhow::bail!("Nothing to change. Pass --focus, --short-break, --long-break or --sessions");
    }

    let settings_path = paths.settings_path();
    let settings = args.apply(load_settings(&settings_path)?);
    settings.validate()?;

    let client = IpcClient::with_socket_path(paths.socket_path());
    match client.update_settings(settings).await {
        Ok(response) => println!("{}", response.message),
        Err(e)
            if matches!(
                e.downcast_ref::<ClientError>(),
                Some(ClientError::DaemonNotRunning)
            ) =>
        {
            save_settings(&settings_path, &settings)?;
            println!("Settings saved");
        }
        Err(e) => return Err(e),
    }

    Display::show_settings(&settings);
    Ok(())
}

/// Runs the daemon in the foreground until interrupted.
async fn run_daemon(args: DaemonArgs) -> Result<()> {
    let notifier: Box<dyn NotificationPort> = match args.notify_command {
        Some(command) => Box::new(
            CommandNotifier::parse(&command).context("--notify-command must not be empty")?,
        ),
        None => Box::new(LogNotifier),
    };

    let paths = Paths::from_env()?;
    Daemon::new(paths, notifier).run().await
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
