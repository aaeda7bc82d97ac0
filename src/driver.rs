// ============================================================================
// Concurrency Driver
// ============================================================================
// Lance une requête historique par ticker et attend la fin de toutes.
//
// - Mode batch : un worker (tâche tokio) par ligne du fichier de tickers,
//   tous planifiés avant le premier join. Un sémaphore limite le nombre de
//   sessions ouvertes en même temps (max_workers, 0 = pas de limite).
// - Mode single : un seul worker, lancé puis attendu.
//
// Chaque worker crée sa propre session. L'échec d'un worker n'annule pas les
// autres : il est seulement compté dans le BatchReport.
//
// CONCEPTS RUST :
// 1. tokio::spawn : tâches concurrentes, JoinHandle pour récupérer le résultat
// 2. Arc<Semaphore> : permis partagés entre tâches (pool borné)
// 3. Arc<dyn Fn> : callback de progression appelé depuis les workers
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::api::{run_historical_request, RequestSummary, SessionFactory};
use crate::input::load_tickers;
use crate::models::{DateRange, TickerRequest};
use crate::output::OutputSettings;

/// Nombre de workers par défaut en mode batch
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Paramètres d'un traitement batch
///
/// Tout l'état nécessaire est passé explicitement (pas de variable globale).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub ticker_file: PathBuf,
    pub range: DateRange,
    pub output: OutputSettings,
    /// Sessions simultanées maximum (0 = une par ticker, sans limite)
    pub max_workers: usize,
}

/// Progression d'un worker
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Started { ticker: String },
    Finished { ticker: String, rows: usize },
    Failed { ticker: String, error: String },
}

/// Callback de progression (appelé depuis les tâches tokio)
pub type ProgressFn = Arc<dyn Fn(Progress) + Send + Sync>;

/// Échec d'un ticker
#[derive(Debug, Clone, PartialEq)]
pub struct TickerFailure {
    pub ticker: String,
    pub error: String,
}

/// Bilan agrégé d'un batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub succeeded: Vec<RequestSummary>,
    pub failed: Vec<TickerFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Nombre total de lignes écrites
    pub fn rows_written(&self) -> usize {
        self.succeeded.iter().map(|s| s.rows).sum()
    }
}

/// Traite le fichier de tickers d'un BatchConfig
pub async fn run_batch(
    factory: Arc<dyn SessionFactory>,
    config: &BatchConfig,
    progress: Option<ProgressFn>,
) -> Result<BatchReport> {
    let tickers = load_tickers(&config.ticker_file)?;
    info!(
        file = %config.ticker_file.display(),
        tickers = tickers.len(),
        "Starting batch"
    );

    let requests = tickers
        .into_iter()
        .map(|symbol| TickerRequest::new(symbol, config.range))
        .collect();

    Ok(run_requests(factory, requests, &config.output, config.max_workers, progress).await)
}

/// Exécute une seule requête (lancée puis attendue)
pub async fn run_single(
    factory: Arc<dyn SessionFactory>,
    request: TickerRequest,
    output: &OutputSettings,
    progress: Option<ProgressFn>,
) -> Result<RequestSummary> {
    let ticker = request.symbol.clone();
    let handle = spawn_worker(factory, request, output.clone(), None, progress);

    match handle.await {
        Ok(result) => result,
        Err(e) => anyhow::bail!("Le worker de {} s'est arrêté anormalement : {}", ticker, e),
    }
}

/// Lance toutes les requêtes puis attend chaque worker
pub async fn run_requests(
    factory: Arc<dyn SessionFactory>,
    requests: Vec<TickerRequest>,
    output: &OutputSettings,
    max_workers: usize,
    progress: Option<ProgressFn>,
) -> BatchReport {
    let permits = if max_workers == 0 {
        Semaphore::MAX_PERMITS
    } else {
        max_workers
    };
    let semaphore = Arc::new(Semaphore::new(permits));

    // Tous les workers sont lancés avant le premier join
    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let ticker = request.symbol.clone();
            let handle = spawn_worker(
                Arc::clone(&factory),
                request,
                output.clone(),
                Some(Arc::clone(&semaphore)),
                progress.clone(),
            );
            (ticker, handle)
        })
        .collect();

    let mut report = BatchReport::default();
    for (ticker, handle) in handles {
        match handle.await {
            Ok(Ok(summary)) => report.succeeded.push(summary),
            Ok(Err(e)) => report.failed.push(TickerFailure {
                ticker,
                error: format!("{:#}", e),
            }),
            Err(e) => {
                error!(%ticker, error = %e, "Worker panicked");
                report.failed.push(TickerFailure {
                    ticker,
                    error: e.to_string(),
                });
            }
        }
    }

    if report.is_success() {
        info!(
            tickers = report.total(),
            rows = report.rows_written(),
            "All workers completed"
        );
    } else {
        warn!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "All workers completed with failures"
        );
    }

    report
}

/// Lance un worker : attend un permis, crée sa session, exécute la requête
fn spawn_worker(
    factory: Arc<dyn SessionFactory>,
    request: TickerRequest,
    output: OutputSettings,
    semaphore: Option<Arc<Semaphore>>,
    progress: Option<ProgressFn>,
) -> tokio::task::JoinHandle<Result<RequestSummary>> {
    tokio::spawn(async move {
        // Le permis est rendu quand _permit sort du scope
        let _permit = match semaphore {
            Some(semaphore) => Some(semaphore.acquire_owned().await?),
            None => None,
        };

        let notify = |event: Progress| {
            if let Some(progress) = &progress {
                progress(event);
            }
        };

        notify(Progress::Started {
            ticker: request.symbol.clone(),
        });

        let mut session = factory.create();
        let result = run_historical_request(session.as_mut(), &request, &output).await;

        match &result {
            Ok(summary) => notify(Progress::Finished {
                ticker: request.symbol.clone(),
                rows: summary.rows,
            }),
            Err(e) => notify(Progress::Failed {
                ticker: request.symbol.clone(),
                error: format!("{:#}", e),
            }),
        }

        result
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::bridge::parse_gateway_response;
    use crate::api::ReplayFactory;
    use crate::output::output_file_name;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    const RECORDED: &str = r#"{"status": 0, "message": "OK", "data": [
        {"securityData": {"security": "AAPL US Equity", "fieldData": [
            {"date": "2023-01-03", "FUND_NET_ASSET_VAL": 10.0, "FUND_TOTAL_ASSETS": 1000.0},
            {"date": "2023-01-04", "FUND_NET_ASSET_VAL": 11.0, "FUND_TOTAL_ASSETS": 1200.0}
        ]}},
        {"securityData": {"security": "MSFT US Equity", "fieldData": [
            {"date": "2023-01-03", "FUND_NET_ASSET_VAL": 20.0, "FUND_TOTAL_ASSETS": 500.0}
        ]}},
        {"securityData": {"security": "VFIAX US Equity", "fieldData": [
            {"date": "2023-01-03", "FUND_NET_ASSET_VAL": 30.0, "FUND_TOTAL_ASSETS": 900.0}
        ]}}
    ]}"#;

    fn factory() -> Arc<dyn SessionFactory> {
        Arc::new(ReplayFactory::new(parse_gateway_response(RECORDED).unwrap()))
    }

    fn january() -> DateRange {
        DateRange::parse_compact("20230101", "20230131").unwrap()
    }

    #[tokio::test]
    async fn test_batch_writes_one_file_per_ticker() {
        let dir = tempdir().unwrap();
        let ticker_file = dir.path().join("tickers.txt");
        let mut file = std::fs::File::create(&ticker_file).unwrap();
        writeln!(file, "AAPL US Equity\nMSFT US Equity\nVFIAX US Equity").unwrap();

        let config = BatchConfig {
            ticker_file,
            range: january(),
            output: OutputSettings::new(dir.path().join("out")),
            max_workers: 2,
        };

        let report = run_batch(factory(), &config, None).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.total(), 3);
        assert_eq!(report.rows_written(), 4);

        for ticker in ["AAPL US Equity", "MSFT US Equity", "VFIAX US Equity"] {
            let path = config.output.directory.join(output_file_name(ticker, &january()));
            assert!(path.exists(), "missing {}", path.display());
        }
        assert_eq!(std::fs::read_dir(&config.output.directory).unwrap().count(), 3);
    }

    #[tokio::test]
    async fn test_unbounded_workers() {
        let dir = tempdir().unwrap();
        let requests = vec![
            TickerRequest::new("AAPL US Equity", january()),
            TickerRequest::new("MSFT US Equity", january()),
        ];

        let report = run_requests(factory(), requests, &OutputSettings::new(dir.path()), 0, None).await;
        assert_eq!(report.succeeded.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_does_not_cancel_siblings() {
        let dir = tempdir().unwrap();
        let output = OutputSettings::new(dir.path());
        // Un octet nul rend le nom de fichier invalide : ce worker échoue
        let requests = vec![
            TickerRequest::new("AAPL US Equity", january()),
            TickerRequest::new("BAD\0 Equity", january()),
            TickerRequest::new("MSFT US Equity", january()),
        ];

        let report = run_requests(factory(), requests, &output, 0, None).await;

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].ticker, "BAD\0 Equity");
        assert!(output.file_path("AAPL US Equity", &january()).exists());
        assert!(output.file_path("MSFT US Equity", &january()).exists());
    }

    #[tokio::test]
    async fn test_rejected_security_is_reported_as_failure() {
        let dir = tempdir().unwrap();
        let output = OutputSettings::new(dir.path());
        let recorded = r#"{"status": 0, "message": "OK", "data": [
            {"securityData": {"security": "AAPL US Equity", "fieldData": [
                {"date": "2023-01-03", "FUND_NET_ASSET_VAL": 10.0, "FUND_TOTAL_ASSETS": 1000.0}
            ]}},
            {"securityData": {"security": "NOPE Equity", "fieldData": [],
                "securityError": {"category": "BAD_SEC", "message": "Unknown/Invalid security"}}}
        ]}"#;
        let factory: Arc<dyn SessionFactory> =
            Arc::new(ReplayFactory::new(parse_gateway_response(recorded).unwrap()));
        let requests = vec![
            TickerRequest::new("AAPL US Equity", january()),
            TickerRequest::new("NOPE Equity", january()),
        ];

        let report = run_requests(factory, requests, &output, 0, None).await;

        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].ticker, "NOPE Equity");
        assert!(report.failed[0].error.contains("BAD_SEC"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_single_matches_batch_behaviour() {
        let dir = tempdir().unwrap();
        let output = OutputSettings::new(dir.path());

        let summary = run_single(
            factory(),
            TickerRequest::new("AAPL US Equity", january()),
            &output,
            None,
        )
        .await
        .unwrap();

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.path, output.file_path("AAPL US Equity", &january()));
    }

    #[tokio::test]
    async fn test_progress_events() {
        let dir = tempdir().unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let progress: ProgressFn = Arc::new(move |event| sink.lock().unwrap().push(event));

        run_single(
            factory(),
            TickerRequest::new("MSFT US Equity", january()),
            &OutputSettings::new(dir.path()),
            Some(progress),
        )
        .await
        .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Progress::Started { .. }));
        assert_eq!(
            events[1],
            Progress::Finished {
                ticker: "MSFT US Equity".to_string(),
                rows: 1
            }
        );
    }

    #[tokio::test]
    async fn test_missing_ticker_file() {
        let config = BatchConfig {
            ticker_file: PathBuf::from("/nonexistent/tickers.txt"),
            range: january(),
            output: OutputSettings::new("/tmp"),
            max_workers: 1,
        };
        assert!(run_batch(factory(), &config, None).await.is_err());
    }
}
