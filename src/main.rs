use gh_ci::app::App;
use gh_ci::cli::Cli;
use gh_ci::config::{self, Config};
use gh_ci::events::{AppEvent, EventHandler};
use gh_ci::gh::{GhClient, LocalRepo};
use gh_ci::poller::RefreshTimer;
use gh_ci::runner::{self, Collaborators};
use gh_ci::task::Request;
use gh_ci::traits::Environment;
use gh_ci::tui;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

fn state_dir() -> PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME").filter(|s| !s.is_empty()) {
        PathBuf::from(state).join("gh-ci")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local").join("state").join("gh-ci")
    } else {
        PathBuf::from("/tmp/gh-ci")
    }
}

/// File logging, enabled by `--verbose` or `GH_CI_LOG_FILE`. The terminal belongs to the TUI.
fn setup_logging(verbose: bool) -> Result<()> {
    let explicit = std::env::var_os("GH_CI_LOG_FILE").map(PathBuf::from);
    if !verbose && explicit.is_none() {
        return Ok(());
    }
    let log_path = explicit.unwrap_or_else(|| state_dir().join("debug.log"));
    if let Some(dir) = log_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| eyre!("Failed to create log directory {dir:?}: {e}"))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("GH_CI_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    tracing::info!("gh-ci v{} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}

/// Config file, overridden by flags, with the repo auto-detected from `origin` as a last resort.
async fn resolve_config(args: &Cli, local: &LocalRepo) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;
    if !args.repos.is_empty() {
        config.repos.clone_from(&args.repos);
    }
    if let Some(interval) = args.interval {
        config.refresh_interval = interval;
    }
    if let Some(branch) = args.default_branch.as_ref().filter(|b| !b.is_empty()) {
        config.default_branch.clone_from(branch);
    }
    if config.repos.is_empty() {
        match local.origin_repo().await {
            Ok(repo) => {
                tracing::debug!(%repo, "repository detected from origin");
                config.repos.push(repo);
            }
            Err(e) => tracing::debug!("no origin repository: {e}"),
        }
    }
    Ok(config)
}

fn dispatch(requests: Vec<Request>, ctx: &Collaborators, tx: &mpsc::UnboundedSender<AppEvent>) {
    for request in requests {
        tracing::debug!(id = request.id, task = request.task.label(), "request issued");
        runner::spawn(request, ctx, tx.clone());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();
    setup_logging(args.verbose)?;

    let local = LocalRepo::new();
    let config = resolve_config(&args, &local).await?;
    if let Err(e) = config::ensure_repos(&config) {
        eprintln!("{e}");
        std::process::exit(1);
    }
    let local_branch = local.current_branch().await.ok();

    // Restore the terminal before the default hook prints the panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to disable raw mode during panic: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, SetTitle("")) {
            eprintln!("Failed to leave alternate screen during panic: {e}");
        }
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetTitle(format!("gh-ci {}", config.repos.join(", "))))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(config, local_branch);
    let ctx = Collaborators {
        source: Arc::new(GhClient::new()),
        discovery: Arc::new(local),
    };

    let result = run_app(&mut terminal, &mut app, &ctx).await;

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, SetTitle(""))?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    ctx: &Collaborators,
) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(100));
    let tx = events.sender();

    let size = terminal.size()?;
    app.update(AppEvent::Resize(size.width, size.height));

    let (delay_tx, delay_rx) = watch::channel(app.refresh_delay());
    let timer = tokio::spawn(RefreshTimer::new(tx.clone(), delay_rx).run());

    dispatch(app.init(), ctx, &tx);

    loop {
        terminal.draw(|f| tui::render(f, app))?;

        let Some(event) = events.next().await else {
            break;
        };
        let requests = app.update(event);
        dispatch(requests, ctx, &tx);

        let delay = app.refresh_delay();
        delay_tx.send_if_modified(|current| {
            if *current == delay {
                false
            } else {
                tracing::debug!(delay, failures = app.refresh_failures(), "refresh delay updated");
                *current = delay;
                true
            }
        });

        if app.should_quit() {
            break;
        }
    }

    events.stop();
    timer.abort();
    Ok(())
}
