use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use clap::Parser;
use color_eyre::Result;
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tokio_util::sync::CancellationToken;
use url::Url;

use smart_suggest::app::App;
use smart_suggest::config::{self, Config, ConfigResult};
use smart_suggest::error::AppError;
use smart_suggest::import::Preset;
use smart_suggest::jobs::spawn_jobs_worker;
use smart_suggest::suggest::spawn_worker;
use smart_suggest::suggest::worker::WorkerConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// smart-suggest - Terminal document editor with AI sentence suggestions
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Word document (.docx) to import on startup
    #[arg(value_name = "FILE", conflicts_with = "preset")]
    input: Option<PathBuf>,

    /// Built-in document to import on startup
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Config file to use instead of ~/.config/smart-suggest/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the suggestion service websocket URL
    #[arg(long, value_name = "URL")]
    suggest_url: Option<String>,

    /// Write logs to this file (logging is off otherwise)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

struct Workers {
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let ConfigResult {
        mut config,
        warning,
    } = match &args.config {
        Some(path) => ConfigResult {
            config: config::load_config_from_path(path).map_err(AppError::from)?,
            warning: None,
        },
        None => config::load_config(),
    };
    if let Some(url) = &args.suggest_url {
        config.suggest.url = url.clone();
    }
    let suggest_url = parse_suggest_url(&config.suggest.url)?;

    let mut app = App::new(&config);
    let workers = start_workers(&config, suggest_url, &mut app)?;

    if let Some(warning) = warning {
        log::warn!("{}", warning);
        app.notification.show_warning(&warning);
    }
    if let Some(preset) = args.preset {
        app.request_preset(preset);
    } else if let Some(path) = args.input {
        app.request_upload(path);
    }

    let mut terminal = ratatui::init();
    let _ = execute!(std::io::stdout(), EnableBracketedPaste);

    let result = run(&mut terminal, &mut app);

    let _ = execute!(std::io::stdout(), DisableBracketedPaste);
    ratatui::restore();

    app.session.shutdown();
    stop_workers(workers, app);

    result
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    while !app.should_quit() {
        terminal.draw(|frame| app.render(frame))?;
        app.handle_events(POLL_INTERVAL)?;
        app.tick(Instant::now());
    }
    Ok(())
}

fn init_logging(path: &Path) -> Result<(), AppError> {
    use std::io::Write;

    let file = File::create(path).map_err(AppError::LogFile)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
    log::info!("smart-suggest {} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}

fn parse_suggest_url(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw).map_err(|e| AppError::InvalidSuggestUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(AppError::InvalidSuggestUrl {
            url: raw.to_string(),
            reason: format!("expected ws:// or wss://, got {}://", other),
        }),
    }
}

fn start_workers(config: &Config, suggest_url: Url, app: &mut App) -> Result<Workers, AppError> {
    let shutdown = CancellationToken::new();
    let mut handles = Vec::new();

    let (request_tx, request_rx) = tokio::sync::mpsc::unbounded_channel();
    let (response_tx, response_rx) = mpsc::channel();
    let worker_config = WorkerConfig {
        url: suggest_url,
        connect_timeout: Duration::from_millis(config.suggest.connect_timeout_ms),
    };
    handles.push(spawn_worker(
        worker_config,
        request_rx,
        response_tx,
        shutdown.clone(),
    )?);
    app.session.set_channels(request_tx, response_rx);

    let (job_tx, job_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();
    handles.push(spawn_jobs_worker(config, job_rx, event_tx)?);
    app.jobs.set_channels(job_tx, event_rx);

    Ok(Workers { shutdown, handles })
}

/// Signal the workers and give them a moment to finish
///
/// A job stuck on the network is left behind rather than holding up exit.
fn stop_workers(workers: Workers, app: App) {
    workers.shutdown.cancel();
    // Dropping the app closes the job and command channels
    drop(app);

    let deadline = Instant::now() + SHUTDOWN_GRACE;
    for handle in workers.handles {
        while !handle.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        if handle.is_finished() {
            let _ = handle.join();
        }
    }
    log::info!("smart-suggest exiting");
}
