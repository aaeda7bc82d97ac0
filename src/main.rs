// ============================================================================
// NavFlow - Point d'entrée
// ============================================================================
// Télécharge l'historique NAV / AUM de fonds et calcule le flow factor :
//
//   flow_factor = aum_t - aum_t-1 * (nav_t / nav_t-1)
//
// Deux façons de l'utiliser :
// - TUI (par défaut) : calendrier pour choisir les dates, puis un ticker
//   (option 1) ou un fichier de tickers (option 2)
// - Headless : --ticker ou --file avec --start et --end
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle qui gère événements et rendering
// 3. Async dans sync : un thread worker possède le runtime tokio
// 4. Channels : commandes vers le worker, résultats vers l'UI
// ============================================================================

use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex, MutexGuard};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tracing::{debug, error, info, warn};

use navflow::api::{RequestSummary, SessionFactory};
use navflow::app::{App, DateRangeSelector, InputTarget, StatusLevel};
use navflow::config::{Args, RunMode};
use navflow::driver::{run_batch, run_single, BatchConfig, BatchReport, Progress, ProgressFn};
use navflow::input::{expand_home, has_txt_extension};
use navflow::models::{DateRange, TickerRequest};
use navflow::output::OutputSettings;
use navflow::ui::calendar::day_at;
use navflow::ui::dashboard::calendar_area;
use navflow::ui::events::{self, Event, EventHandler};
use navflow::ui::render;

// ============================================================================
// AppCommand / AppResult : messages entre l'UI et le worker
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum AppCommand {
    /// Option 1 : un ticker
    RunSingle { request: TickerRequest },

    /// Option 2 : un fichier de tickers
    RunBatch { ticker_file: PathBuf, range: DateRange },
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    /// Progression d'un ticker
    Progress(Progress),

    /// Option 1 terminée
    SingleDone(RequestSummary),

    /// Option 2 terminée
    BatchDone(BatchReport),

    /// Échec global (session, fichier de tickers illisible, ...)
    Failed { context: String, error: String },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : on log vers un
// fichier, avec rotation quotidienne.
//
// Linux : ~/.local/share/navflow/logs/navflow.log.YYYY-MM-DD
//
//   RUST_LOG=navflow=trace navflow
// ============================================================================

fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("navflow").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "navflow.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "navflow=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(host = %args.host, port = args.port, "NavFlow starting up");

    let factory = args.session_factory()?;

    match args.mode()? {
        RunMode::Interactive => run_tui(factory, args.output_settings()?, args.max_workers),
        RunMode::Single(request) => run_headless_single(factory, request, &args.output_settings()?),
        RunMode::Batch(config) => run_headless_batch(factory, &config),
    }
}

// ============================================================================
// Mode headless
// ============================================================================

fn run_headless_single(
    factory: Arc<dyn SessionFactory>,
    request: TickerRequest,
    output: &OutputSettings,
) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    println!(
        "📊 {} du {} au {}...",
        request.symbol,
        request.range.start_compact(),
        request.range.end_compact()
    );

    let summary = runtime.block_on(run_single(factory, request, output, None))?;
    println!("✅ {} lignes écrites dans {}", summary.rows, summary.path.display());
    if summary.skipped > 0 {
        println!("   {} lignes ignorées (NAV ou AUM manquante)", summary.skipped);
    }
    Ok(())
}

fn run_headless_batch(factory: Arc<dyn SessionFactory>, config: &BatchConfig) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    println!("📊 Batch : {}", config.ticker_file.display());

    let progress: ProgressFn = Arc::new(|event| match event {
        Progress::Started { ticker } => println!("  … {}", ticker),
        Progress::Finished { ticker, rows } => println!("  ✓ {} ({} lignes)", ticker, rows),
        Progress::Failed { ticker, error } => println!("  ✗ {} : {}", ticker, error),
    });

    let report = runtime.block_on(run_batch(factory, config, Some(progress)))?;
    println!(
        "\n{} tickers, {} réussis, {} échecs, {} lignes écrites",
        report.total(),
        report.succeeded.len(),
        report.failed.len(),
        report.rows_written()
    );

    if !report.is_success() {
        bail!("{} ticker(s) en échec", report.failed.len());
    }
    Ok(())
}

// ============================================================================
// Mode TUI
// ============================================================================

/// Paramètres fixes du worker
struct WorkerContext {
    factory: Arc<dyn SessionFactory>,
    output: OutputSettings,
    max_workers: usize,
}

fn run_tui(factory: Arc<dyn SessionFactory>, output: OutputSettings, max_workers: usize) -> Result<()> {
    // Le runtime est créé ici pour que l'erreur remonte par main()
    let runtime = tokio::runtime::Runtime::new()?;

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let app = Arc::new(Mutex::new(App::new()));
    {
        let mut app_lock = lock(&app);
        app_lock.push_status(
            StatusLevel::Info,
            format!("Output folder: {}", output.directory.display()),
        );
    }

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    let context = WorkerContext {
        factory,
        output,
        max_workers,
    };
    spawn_background_worker(runtime, context, command_rx, result_tx, app.clone());

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, app, &events, command_tx, result_rx);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

/// Verrouille l'état partagé, même si un thread a paniqué en le tenant
fn lock(app: &Mutex<App>) -> MutexGuard<'_, App> {
    app.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// Thread séparé qui possède le runtime tokio :
// - reçoit des AppCommand (command_rx)
// - exécute le driver avec block_on (bloque le worker, pas l'UI)
// - renvoie des AppResult (result_tx)
// ============================================================================

fn spawn_background_worker(
    runtime: tokio::runtime::Runtime,
    context: WorkerContext,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
    app: Arc<Mutex<App>>,
) {
    std::thread::spawn(move || {
        // Les workers tokio envoient leur progression sur le même channel
        let progress_tx = Mutex::new(result_tx.clone());
        let progress: ProgressFn = Arc::new(move |event| {
            let sender = progress_tx.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let _ = sender.send(AppResult::Progress(event));
        });

        while let Ok(command) = command_rx.recv() {
            info!(?command, "Worker received command");

            let message = match &command {
                AppCommand::RunSingle { request } => format!("Fetching {}...", request.symbol),
                AppCommand::RunBatch { ticker_file, .. } => {
                    format!("Running batch {}...", ticker_file.display())
                }
            };
            lock(&app).start_loading(Some(message));

            let result = execute_command(&runtime, &context, command, &progress);
            let _ = result_tx.send(result);
            lock(&app).stop_loading();
        }

        info!("Worker thread exiting (channel closed)");
    });
}

/// Exécute une commande et la résume en un seul AppResult
///
/// Option 1 ne passe pas de progression : son échec n'est rapporté qu'une
/// fois, par AppResult::Failed.
fn execute_command(
    runtime: &tokio::runtime::Runtime,
    context: &WorkerContext,
    command: AppCommand,
    progress: &ProgressFn,
) -> AppResult {
    match command {
        AppCommand::RunSingle { request } => {
            let symbol = request.symbol.clone();
            match runtime.block_on(run_single(
                Arc::clone(&context.factory),
                request,
                &context.output,
                None,
            )) {
                Ok(summary) => AppResult::SingleDone(summary),
                Err(e) => AppResult::Failed {
                    context: symbol,
                    error: format!("{:#}", e),
                },
            }
        }
        AppCommand::RunBatch { ticker_file, range } => {
            let config = BatchConfig {
                ticker_file,
                range,
                output: context.output.clone(),
                max_workers: context.max_workers,
            };
            match runtime.block_on(run_batch(
                Arc::clone(&context.factory),
                &config,
                Some(progress.clone()),
            )) {
                Ok(report) => AppResult::BatchDone(report),
                Err(e) => AppResult::Failed {
                    context: config.ticker_file.display().to_string(),
                    error: format!("{:#}", e),
                },
            }
        }
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. résultats du worker
//   1. render
//   2. input
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: Arc<Mutex<App>>,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    // Le worker est considéré mort une seule fois
    let mut worker_alive = true;

    loop {
        if !lock(&app).is_running() {
            break;
        }

        // 0. Résultats du worker (non bloquant)
        loop {
            match result_rx.try_recv() {
                Ok(result) => apply_result(&mut lock(&app), result),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    if worker_alive {
                        error!("Worker thread disconnected!");
                        lock(&app).push_status(StatusLevel::Error, "Background worker stopped");
                        worker_alive = false;
                    }
                    break;
                }
            }
        }

        // 1. Render
        terminal.draw(|frame| {
            let app_lock = lock(&app);
            render(frame, &app_lock);
        })?;

        // 2. Input (le calendrier suit la taille du terminal pour les clics)
        let calendar = calendar_area(terminal.size()?);
        match events.next() {
            Ok(event) => handle_event(&mut lock(&app), event, calendar, &command_tx),
            Err(e) => warn!(error = %e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

/// Reporte un résultat du worker dans le journal de statut
fn apply_result(app: &mut App, result: AppResult) {
    match result {
        AppResult::Progress(Progress::Started { ticker }) => {
            app.push_status(StatusLevel::Info, format!("{}: requesting...", ticker));
        }
        AppResult::Progress(Progress::Finished { ticker, rows }) => {
            app.push_status(StatusLevel::Success, format!("{}: {} rows", ticker, rows));
        }
        AppResult::Progress(Progress::Failed { ticker, error }) => {
            app.push_status(StatusLevel::Error, format!("{}: {}", ticker, error));
        }
        AppResult::SingleDone(summary) => {
            app.push_status(
                StatusLevel::Success,
                format!("Written {}", summary.path.display()),
            );
            if summary.skipped > 0 {
                app.push_status(
                    StatusLevel::Warning,
                    format!("{} rows skipped (missing NAV or AUM)", summary.skipped),
                );
            }
        }
        AppResult::BatchDone(report) => {
            let level = if report.is_success() {
                StatusLevel::Success
            } else {
                StatusLevel::Warning
            };
            app.push_status(
                level,
                format!(
                    "Batch done: {} ok, {} failed, {} rows",
                    report.succeeded.len(),
                    report.failed.len(),
                    report.rows_written()
                ),
            );
        }
        AppResult::Failed { context, error } => {
            app.push_status(StatusLevel::Error, format!("{}: {}", context, error));
        }
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================
// Le mode input est traité en premier : toutes les touches y sont du texte.
// ============================================================================

fn handle_event(
    app: &mut App,
    event: Event,
    calendar: Rect,
    command_tx: &mpsc::Sender<AppCommand>,
) {
    if let Event::Tick = event {
        return;
    }

    if app.is_in_input_mode() {
        handle_input_event(app, &event, command_tx);
        return;
    }

    if events::is_quit_event(&event) {
        if app.is_awaiting_quit_confirmation() {
            info!("User confirmed quit");
            app.quit();
        } else {
            info!("User requested quit (awaiting confirmation)");
            app.request_quit();
        }
        return;
    }

    // Toute autre touche annule la confirmation de quit
    app.cancel_quit();

    if let Event::Click { column, row } = event {
        if let Some(day) = day_at(&app.picker, calendar, column, row) {
            app.picker.select_day(day);
            debug!(selection = ?app.picker.selected_date(), "Day clicked");
        }
        return;
    }

    if let Some(delta) = events::cursor_delta(&event) {
        app.picker.move_cursor(delta);
    } else if events::is_previous_month_event(&event) {
        app.picker.prev_month();
        debug!(month = %app.picker.header(), "Previous month");
    } else if events::is_next_month_event(&event) {
        app.picker.next_month();
        debug!(month = %app.picker.header(), "Next month");
    } else if events::is_select_day_event(&event) {
        app.picker.select_cursor();
        debug!(selection = ?app.picker.selected_date(), "Day selected");
    } else if events::is_start_date_event(&event) {
        match app.set_start_from_selection() {
            Some(date) => info!(%date, "Start date set"),
            None => app.push_status(StatusLevel::Warning, "Select a day first"),
        }
    } else if events::is_stop_date_event(&event) {
        match app.set_stop_from_selection() {
            Some(date) => info!(%date, "Stop date set"),
            None => app.push_status(StatusLevel::Warning, "Select a day first"),
        }
    } else if events::is_ticker_input_event(&event) {
        app.start_input(InputTarget::Ticker);
    } else if events::is_file_input_event(&event) {
        app.start_input(InputTarget::TickerFile);
    } else if events::is_run_batch_event(&event) {
        submit_batch(app, command_tx);
    }
}

fn handle_input_event(app: &mut App, event: &Event, command_tx: &mpsc::Sender<AppCommand>) {
    if events::is_escape_event(event) {
        info!("User cancelled input");
        app.cancel_input();
    } else if events::is_enter_event(event) {
        match app.submit_input() {
            Some((_, value)) if value.is_empty() => debug!("Empty input, ignoring"),
            Some((InputTarget::Ticker, symbol)) => submit_single(app, symbol, command_tx),
            Some((InputTarget::TickerFile, raw)) => {
                let path = expand_home(&raw);
                if !has_txt_extension(&path) {
                    app.push_status(StatusLevel::Warning, "Ticker file is not a .txt file");
                }
                app.push_status(
                    StatusLevel::Info,
                    format!("Ticker file: {} (press r to run)", path.display()),
                );
                app.ticker_file = Some(path);
            }
            None => {}
        }
    } else if events::is_backspace_event(event) {
        app.backspace();
    } else if let Some(c) = events::get_char_from_event(event) {
        app.append_char(c);
    }
}

/// Option 1 : envoie la requête d'un ticker au worker
fn submit_single(app: &mut App, symbol: String, command_tx: &mpsc::Sender<AppCommand>) {
    let Some(range) = ready_range(app) else {
        return;
    };

    info!(ticker = %symbol, "User submitted ticker");
    let request = TickerRequest::new(symbol, range);
    send_command(app, command_tx, AppCommand::RunSingle { request });
}

/// Option 2 : envoie le batch du fichier choisi au worker
fn submit_batch(app: &mut App, command_tx: &mpsc::Sender<AppCommand>) {
    let Some(ticker_file) = app.ticker_file.clone() else {
        app.push_status(StatusLevel::Warning, "Choose a ticker file first (f)");
        return;
    };
    let Some(range) = ready_range(app) else {
        return;
    };

    info!(file = %ticker_file.display(), "User started batch");
    send_command(app, command_tx, AppCommand::RunBatch { ticker_file, range });
}

/// Plage de dates prête à être envoyée, sinon message dans le statut
fn ready_range(app: &mut App) -> Option<DateRange> {
    if app.is_loading_data() {
        app.push_status(StatusLevel::Warning, "A request is already running");
        return None;
    }

    let Some(range) = app.date_range() else {
        app.push_status(StatusLevel::Warning, "Set the start (s) and stop (e) dates first");
        return None;
    };

    if range.is_inverted() {
        app.push_status(StatusLevel::Warning, "Start date is after stop date");
    }
    Some(range)
}

fn send_command(app: &mut App, command_tx: &mpsc::Sender<AppCommand>, command: AppCommand) {
    if command_tx.send(command).is_err() {
        error!("Worker channel closed");
        app.push_status(StatusLevel::Error, "Background worker stopped");
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use navflow::api::bridge::parse_gateway_response;
    use navflow::api::ReplayFactory;
    use navflow::models::DatePicker;
    use tempfile::tempdir;

    const REJECTED: &str = r#"{"status": 0, "message": "OK", "data": [
        {"securityData": {"security": "NOPE Equity", "fieldData": [],
            "securityError": {"category": "BAD_SEC", "message": "Unknown/Invalid security"}}}
    ]}"#;

    fn january_app() -> App {
        App::with_picker(DatePicker::for_month(2023, 1, Weekday::Sun).unwrap())
    }

    #[test]
    fn test_single_failure_reported_once() {
        let dir = tempdir().unwrap();
        let context = WorkerContext {
            factory: Arc::new(ReplayFactory::new(parse_gateway_response(REJECTED).unwrap())),
            output: OutputSettings::new(dir.path()),
            max_workers: 1,
        };
        let runtime = tokio::runtime::Runtime::new().unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let progress: ProgressFn = Arc::new(move |event| {
            recorder.lock().unwrap().push(event);
        });

        let request = TickerRequest::new(
            "NOPE Equity",
            DateRange::parse_compact("20230101", "20230131").unwrap(),
        );
        let result = execute_command(
            &runtime,
            &context,
            AppCommand::RunSingle { request },
            &progress,
        );

        assert!(matches!(result, AppResult::Failed { .. }), "{:?}", result);
        assert!(seen.lock().unwrap().is_empty());

        let mut app = january_app();
        apply_result(&mut app, result);
        let errors = app
            .recent_status(usize::MAX)
            .filter(|line| line.level == StatusLevel::Error)
            .count();
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_click_selects_calendar_day() {
        let (command_tx, _command_rx) = mpsc::channel();
        let mut app = january_app();
        let calendar = calendar_area(Rect::new(0, 0, 120, 40));

        // Le 8 janvier 2023 est un dimanche : première case de la 2e semaine
        let inner_x = calendar.x + 1;
        let left = inner_x + (calendar.width - 2) / 2 - 14;
        let click = Event::Click {
            column: left + 3,
            row: calendar.y + 4,
        };
        handle_event(&mut app, click, calendar, &command_tx);

        assert_eq!(
            app.picker.current_selection(),
            Some(("20230108".to_string(), "2023 / 01 / 08".to_string()))
        );
        assert_eq!(app.picker.cursor(), 8);

        // Clic hors de la grille : rien ne change
        let outside = Event::Click {
            column: calendar.x + calendar.width + 5,
            row: calendar.y + 4,
        };
        handle_event(&mut app, outside, calendar, &command_tx);
        assert_eq!(app.picker.cursor(), 8);
    }
}
