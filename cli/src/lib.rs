//! `scm` front end: argument handling, startup wiring and the two run modes
//! (interactive line editor, or a script from `-c` / stdin).

pub mod args;
pub mod logging;
pub mod render;
pub mod repl;

use anyhow::Context;
use anyhow::Result;
pub use args::Cli;
use render::Renderer;
use scm_api::ScmApiClient;
use scm_core::HistoryDb;
use scm_core::InMemoryObjectStore;
use scm_core::ObjectStore;
use scm_core::ScmCredentials;
use scm_core::ScmError;
use scm_core::Session;
use scm_core::Shell;
use scm_core::ShellSettings;
use std::io::BufRead;
use std::io::IsTerminal;

/// Process exit status when at least one scripted command failed.
pub const EXIT_COMMAND_FAILED: i32 = 1;

/// Builds the shell from `cli` and runs it to completion, returning the exit code.
pub fn run(cli: Cli) -> Result<i32> {
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
        }
        None => match dotenvy::dotenv() {
            Ok(_) => {}
            Err(err) if err.not_found() => {}
            Err(err) => return Err(err).context("failed to load .env"),
        },
    }

    let settings = match &cli.config {
        Some(path) => ShellSettings::load_from_path(path)?,
        None => ShellSettings::load()?,
    };
    let _log_guard = logging::init(&settings.resolved_log_dir());
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        offline = cli.offline,
        "scm starting"
    );

    let history = if cli.ephemeral_history {
        HistoryDb::open_in_memory()?
    } else {
        let path = cli
            .history_db
            .clone()
            .unwrap_or_else(|| settings.resolved_history_db_path());
        HistoryDb::open(&path)?
    };

    let (user, store) = connect_store(cli.offline)?;
    let mut shell = Shell::new(&user, store, history, &settings);

    let color = settings.color && !cli.no_color && std::io::stdout().is_terminal();
    let renderer = Renderer::new(color);

    let all_ok = if !cli.commands.is_empty() {
        repl::run_script(&mut shell, renderer, &cli.commands, true)
    } else if std::io::stdin().is_terminal() {
        repl::run_interactive(&mut shell, renderer)?;
        true
    } else {
        let lines = std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .context("failed to read commands from stdin")?;
        repl::run_script(&mut shell, renderer, &lines, true)
    };

    Ok(if all_ok { 0 } else { EXIT_COMMAND_FAILED })
}

fn connect_store(offline: bool) -> Result<(String, Box<dyn ObjectStore>)> {
    if offline {
        let client_id = std::env::var(ScmCredentials::ENV_CLIENT_ID).ok();
        let user = Session::username_from_client_id(client_id.as_deref());
        tracing::info!("using in-memory object store");
        return Ok((user, Box::new(InMemoryObjectStore::new())));
    }

    let credentials = ScmCredentials::from_env()?;
    let user = Session::username_from_client_id(Some(&credentials.client_id));
    let client = ScmApiClient::connect(&credentials).map_err(ScmError::from)?;
    tracing::info!(base_url = %credentials.base_url, "connected to Strata Cloud Manager");
    Ok((user, Box::new(client)))
}
