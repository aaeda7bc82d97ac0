// ============================================================================
// Configuration : arguments de la ligne de commande
// ============================================================================
// CONCEPT RUST : clap derive
// - Chaque champ de Args devient une option (--ip, -p, --ticker, ...)
// - Les doc comments /// deviennent l'aide (--help)
// - value_parser : conversion directe en NaiveDate
//
// Sans --ticker ni --file, l'application démarre en mode TUI.
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Parser;

use crate::api::session::{DEFAULT_HOST, DEFAULT_PORT};
use crate::api::{HttpSessionFactory, ReplayFactory, SessionFactory, SessionOptions};
use crate::driver::{BatchConfig, DEFAULT_MAX_WORKERS};
use crate::models::date_range::parse_compact_date;
use crate::models::{DateRange, TickerRequest};
use crate::output::OutputSettings;

/// Récupère l'historique NAV / AUM et calcule le flow factor
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Server name or IP of the data service
    #[arg(short = 'a', long = "ip", value_name = "ipAddress", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Server port of the data service
    #[arg(short = 'p', long = "port", value_name = "tcpPort", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Single ticker to fetch without the TUI (ex: "MSFT US Equity")
    #[arg(long, conflicts_with = "file")]
    pub ticker: Option<String>,

    /// Ticker file (one symbol per line) to fetch without the TUI
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Start date, YYYYMMDD
    #[arg(long, value_parser = parse_compact_date)]
    pub start: Option<NaiveDate>,

    /// End date, YYYYMMDD
    #[arg(long, value_parser = parse_compact_date)]
    pub end: Option<NaiveDate>,

    /// Output directory (default: ~/Desktop/Bloomberg_Output)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum concurrent sessions in batch mode (0 = one per ticker)
    #[arg(long, default_value_t = DEFAULT_MAX_WORKERS)]
    pub max_workers: usize,

    /// Replay a recorded gateway response instead of connecting
    #[arg(long, value_name = "JSON")]
    pub replay: Option<PathBuf>,
}

/// Mode d'exécution déduit des arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Interface terminal
    Interactive,
    /// Un ticker, sans interface
    Single(TickerRequest),
    /// Un fichier de tickers, sans interface
    Batch(BatchConfig),
}

impl Args {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::new(self.host.clone(), self.port)
    }

    /// Dossier de sortie : --output-dir ou ~/Desktop/Bloomberg_Output
    pub fn output_settings(&self) -> Result<OutputSettings> {
        match &self.output_dir {
            Some(dir) => Ok(OutputSettings::new(dir.clone())),
            None => OutputSettings::desktop(),
        }
    }

    /// Transport : replay si --replay, passerelle HTTP sinon
    pub fn session_factory(&self) -> Result<Arc<dyn SessionFactory>> {
        Ok(match &self.replay {
            Some(path) => Arc::new(ReplayFactory::from_file(path)?),
            None => Arc::new(HttpSessionFactory::new(self.session_options())),
        })
    }

    /// Détermine le mode à partir des options
    pub fn mode(&self) -> Result<RunMode> {
        if self.ticker.is_none() && self.file.is_none() {
            return Ok(RunMode::Interactive);
        }

        let range = match (self.start, self.end) {
            (Some(start), Some(end)) => DateRange::new(start, end),
            _ => bail!("--start et --end sont obligatoires avec --ticker ou --file"),
        };

        if let Some(ticker) = &self.ticker {
            let ticker = ticker.trim();
            if ticker.is_empty() {
                bail!("--ticker ne peut pas être vide");
            }
            return Ok(RunMode::Single(TickerRequest::new(ticker, range)));
        }

        match &self.file {
            Some(file) => Ok(RunMode::Batch(BatchConfig {
                ticker_file: file.clone(),
                range,
                output: self.output_settings()?,
                max_workers: self.max_workers,
            })),
            None => Ok(RunMode::Interactive),
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
