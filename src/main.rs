//! Break Order - break rotation scheduler for pharmacy staff.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::{Context, bail};
use break_order as app;
use clap::{Args, Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use app::config::{AppConfig, ConfigLoadResult, LoggingConfig, RotationConfig};
use app::models::{Role, RotationRecord};
use app::storage::FileStore;
use app::{AppError, RosterStore, export, report};

/// Break rotation scheduler for pharmacists and clerks.
#[derive(Parser)]
#[command(name = "break-order", version)]
struct Cli {
    /// Config file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory, overrides the config file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log to stderr at the configured level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the staff roster
    #[command(subcommand)]
    Staff(StaffCommand),
    /// Mark who is present for the next rotation
    #[command(subcommand)]
    Presence(PresenceCommand),
    /// Shuffle present staff into a new break order
    Generate {
        /// Reveal slots one by one before printing the order
        #[arg(long)]
        reveal: bool,
    },
    /// Show the most recently generated order
    Last,
    /// Inspect or clear rotation history
    #[command(subcommand)]
    History(HistoryCommand),
    /// Inspect or create the config file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum StaffCommand {
    /// List staff by role
    List,
    /// Add a staff member
    Add {
        name: String,
        #[arg(short, long)]
        role: Role,
    },
    /// Rename a staff member or change their role
    Edit {
        /// Id, id prefix, or name
        staff: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        role: Option<Role>,
    },
    /// Remove a staff member
    Remove {
        /// Id, id prefix, or name
        staff: String,
        #[command(flatten)]
        confirm: ConfirmArgs,
    },
}

#[derive(Subcommand)]
enum PresenceCommand {
    /// Show presence per role
    Show,
    /// Mark staff present
    Set { staff: Vec<String> },
    /// Mark staff absent
    Unset { staff: Vec<String> },
    /// Flip presence of one staff member
    Toggle { staff: String },
    /// Mark everyone present
    All,
    /// Mark nobody present
    None,
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List past rotations, most recent first
    List {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Delete all history
    Clear {
        #[command(flatten)]
        confirm: ConfirmArgs,
    },
    /// Export history to an Excel file
    Export { path: Option<PathBuf> },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print config and data locations
    Path,
    /// Print the effective config
    Show,
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct ConfirmArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<AppError>() {
            Some(AppError::EmptySelection) => {
                eprintln!("warning: nobody is marked present; use `presence set` or `presence all` first");
                ExitCode::from(1)
            }
            Some(app_err) if app_err.is_user_error() => {
                eprintln!("{app_err}");
                ExitCode::from(1)
            }
            _ => {
                tracing::error!("{e:#}");
                eprintln!("error: {e:#}");
                ExitCode::from(2)
            }
        },
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = match AppConfig::try_load(&config_path) {
        ConfigLoadResult::Loaded(config) => config,
        ConfigLoadResult::Missing => AppConfig::default(),
        ConfigLoadResult::Invalid(e) => bail!("invalid config {}: {e}", config_path.display()),
    };

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.storage.resolved_data_dir());

    // Config commands only print paths, so they must not create a log dir
    let log_dir = (config.logging.file_enabled && !matches!(cli.command, Command::Config(_)))
        .then(|| data_dir.join("logs"));
    let _guard = init_logging(&config.logging, log_dir.as_deref(), cli.verbose);
    tracing::debug!("Config path: {:?}, data dir: {:?}", config_path, data_dir);

    let open_store = || -> anyhow::Result<Store> {
        let storage =
            FileStore::open(&data_dir).with_context(|| format!("opening data dir {}", data_dir.display()))?;
        Ok(RosterStore::open_default(storage, config.store_options())?)
    };

    match cli.command {
        Command::Staff(cmd) => run_staff(&mut open_store()?, cmd)?,
        Command::Presence(cmd) => run_presence(&mut open_store()?, cmd)?,
        Command::Generate { reveal } => {
            let record = open_store()?.generate_rotation()?;
            if reveal {
                play_reveal(&record, &config.rotation);
            }
            print!("{}", report::rotation(&record));
        }
        Command::Last => {
            let store = open_store()?;
            match store.last_rotation() {
                Some(record) => print!("{}", report::rotation(record)),
                None => println!("No rotation generated yet"),
            }
        }
        Command::History(cmd) => run_history(&mut open_store()?, cmd)?,
        Command::Config(cmd) => run_config(&cmd, &config, &config_path, &data_dir)?,
    }

    Ok(())
}

type Store = RosterStore<FileStore>;

fn run_staff(store: &mut Store, cmd: StaffCommand) -> anyhow::Result<()> {
    match cmd {
        StaffCommand::List => print!("{}", report::roster(store.roster())),
        StaffCommand::Add { name, role } => {
            let member = store.add_staff(&name, role)?;
            println!("Added {} {} ({})", member.role, member.name, member.id.short());
        }
        StaffCommand::Edit { staff, name, role } => {
            if name.is_none() && role.is_none() {
                return Err(AppError::validation("Nothing to change: pass --name and/or --role").into());
            }
            let member = store.resolve(&staff)?.clone();
            let name = name.unwrap_or(member.name);
            let role = role.unwrap_or(member.role);
            store.update_staff(&member.id, &name, role)?;
            println!("Updated {} ({})", name.trim(), role);
        }
        StaffCommand::Remove { staff, confirm } => {
            let member = store.resolve(&staff)?.clone();
            if !confirm.yes && !ask(&format!("Remove {} '{}'?", member.role, member.name))? {
                println!("Cancelled");
                return Ok(());
            }
            store.remove_staff(&member.id)?;
            println!("Removed {}", member.name);
        }
    }
    Ok(())
}

fn run_presence(store: &mut Store, cmd: PresenceCommand) -> anyhow::Result<()> {
    match cmd {
        PresenceCommand::Show => {}
        PresenceCommand::Set { staff } => set_presence(store, &staff, true)?,
        PresenceCommand::Unset { staff } => set_presence(store, &staff, false)?,
        PresenceCommand::Toggle { staff } => {
            let id = store.resolve(&staff)?.id.clone();
            store.toggle_present(&id)?;
        }
        PresenceCommand::All => store.set_all_present(true)?,
        PresenceCommand::None => store.set_all_present(false)?,
    }

    print!(
        "{}",
        report::presence(store.roster(), store.presence(), &store.presence_summary())
    );
    Ok(())
}

fn set_presence(store: &mut Store, queries: &[String], present: bool) -> anyhow::Result<()> {
    if queries.is_empty() {
        return Err(AppError::validation("No staff given").into());
    }

    // Resolve everything first so a bad reference changes nothing
    let ids = queries
        .iter()
        .map(|q| store.resolve(q).map(|m| m.id.clone()))
        .collect::<app::Result<Vec<_>>>()?;

    for id in &ids {
        store.set_present(id, present)?;
    }
    Ok(())
}

fn run_history(store: &mut Store, cmd: HistoryCommand) -> anyhow::Result<()> {
    match cmd {
        HistoryCommand::List { limit } => print!("{}", report::history(store.history(), limit)),
        HistoryCommand::Clear { confirm } => {
            if store.history().is_empty() {
                println!("No rotation history");
                return Ok(());
            }
            if !confirm.yes && !ask(&format!("Delete all {} history records?", store.history().len()))? {
                println!("Cancelled");
                return Ok(());
            }
            store.clear_history()?;
            println!("History cleared");
        }
        HistoryCommand::Export { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(export::generate_export_filename("break_history")));
            let rows = export::export_history_to_excel(store.history(), &path).map_err(AppError::from)?;
            tracing::info!("Exported {} rows to {:?}", rows, path);
            println!("Exported {} rows to {}", rows, path.display());
        }
    }
    Ok(())
}

fn run_config(cmd: &ConfigCommand, config: &AppConfig, config_path: &Path, data_dir: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Path => {
            println!("config: {}", config_path.display());
            println!("data:   {}", data_dir.display());
        }
        ConfigCommand::Show => print!("{}", toml::to_string_pretty(config)?),
        ConfigCommand::Init { force } => {
            if config_path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", config_path.display());
            }
            AppConfig::default().save(config_path)?;
            println!("Wrote {}", config_path.display());
        }
    }
    Ok(())
}

/// Print slots one at a time, alternating role columns.
fn play_reveal(record: &RotationRecord, rotation: &RotationConfig) {
    thread::sleep(Duration::from_millis(rotation.reveal_base_delay_ms));
    for step in record.reveal_sequence() {
        let tag = match step.role {
            Role::Pharmacist => "PH",
            Role::Clerk => "CL",
        };
        println!("  {tag} {:>2}. {}", step.position, step.name);
        thread::sleep(Duration::from_millis(rotation.reveal_interval_ms));
    }
    println!();
}

/// Ask a yes/no question on stdin. Anything but y/yes is no.
fn ask(prompt: &str) -> io::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Initialize logging: stderr follows RUST_LOG (warn by default), the
/// optional log file follows the configured level.
fn init_logging(logging: &LoggingConfig, log_dir: Option<&Path>, verbose: bool) -> Option<WorkerGuard> {
    let stderr_filter = if verbose {
        EnvFilter::new(&logging.level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let mut file_error = None;
    let (file_layer, guard) = match log_dir.map(log_appender) {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(&logging.level));
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            file_error = Some(e);
            (None, None)
        }
        None => (None, None),
    };

    // A subscriber may already be installed when run() is called more than once
    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if let Some(e) = file_error {
        tracing::warn!("File logging disabled: {e}");
    }

    guard
}

/// Daily rolling log file under `dir`.
fn log_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("break-order")
        .filename_suffix("log")
        .build(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_appender_reports_unusable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("data");
        std::fs::write(&not_a_dir, "plain file").unwrap();

        assert!(log_appender(&not_a_dir.join("logs")).is_err());
        assert!(log_appender(&dir.path().join("logs")).is_ok());
    }

    #[test]
    fn test_config_path_leaves_data_dir_alone() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let config_path = dir.path().join("config.toml");

        let cli = Cli::parse_from([
            "break-order",
            "--config",
            config_path.to_str().unwrap(),
            "--data-dir",
            data_dir.to_str().unwrap(),
            "config",
            "path",
        ]);
        run(cli).unwrap();

        assert!(!data_dir.exists());
    }

    #[test]
    fn test_staff_add_opens_store() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let config_path = dir.path().join("config.toml");

        let cli = Cli::parse_from([
            "break-order",
            "--config",
            config_path.to_str().unwrap(),
            "--data-dir",
            data_dir.to_str().unwrap(),
            "staff",
            "add",
            "Sato",
            "--role",
            "clerk",
        ]);
        run(cli).unwrap();

        assert!(data_dir.join("bo_staff.json").exists());
    }
}
