// ============================================================================
// Historical Data Requester
// ============================================================================
// Pour un ticker et une plage de dates :
// 1. démarre une session et ouvre le service //blp/refdata
// 2. envoie une HistoricalDataRequest (NAV + AUM, quotidien, 10 000 points max)
// 3. lit les événements (poll de 500ms) jusqu'à la Response finale
// 4. calcule le flow factor point par point et écrit chaque ligne en CSV
//
// La session est toujours arrêtée à la fin, succès ou échec.
//
// CONCEPTS RUST :
// 1. &mut dyn Session : le transport est choisi par l'appelant
// 2. #[instrument] : tous les logs portent le ticker
// 3. Séparation start / drive : stop() est appelé quel que soit le résultat
// ============================================================================

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, error, info, instrument, warn};

use crate::api::error::SessionError;
use crate::api::event::HistoricalDataRequest;
use crate::api::session::{Session, POLL_TIMEOUT, REFDATA_SERVICE};
use crate::models::{FlowTracker, TickerRequest};
use crate::output::{FlowWriter, OutputSettings};

/// Résultat d'une requête réussie
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSummary {
    pub ticker: String,
    /// Fichier CSV écrit
    pub path: PathBuf,
    /// Lignes écrites (hors en-tête)
    pub rows: usize,
    /// Lignes ignorées (NAV ou AUM manquante)
    pub skipped: usize,
}

/// Exécute la requête historique d'un ticker et écrit son fichier CSV
#[instrument(skip(session, request, output), fields(ticker = %request.symbol))]
pub async fn run_historical_request(
    session: &mut dyn Session,
    request: &TickerRequest,
    output: &OutputSettings,
) -> Result<RequestSummary> {
    if request.range.is_inverted() {
        warn!(
            start = %request.range.start,
            end = %request.range.end,
            "Start date is after end date, sending anyway"
        );
    }

    if let Err(e) = session.start().await {
        error!(error = %e, "Failed to start session");
        return Err(e).context("Échec du démarrage de la session");
    }
    info!("Session started");

    let result = drive(session, request, output).await;

    session.stop().await;
    debug!("Session stopped");

    match &result {
        Ok(summary) => info!(rows = summary.rows, path = %summary.path.display(), "Request completed"),
        Err(e) => error!(error = ?e, "Request failed"),
    }

    result
}

/// Corps de la requête, entre start() et stop()
async fn drive(
    session: &mut dyn Session,
    request: &TickerRequest,
    output: &OutputSettings,
) -> Result<RequestSummary> {
    session
        .open_service(REFDATA_SERVICE)
        .await
        .with_context(|| format!("Impossible d'ouvrir {}", REFDATA_SERVICE))?;

    let historical = HistoricalDataRequest::nav_aum(&request.symbol, &request.range);
    debug!(?historical, "Sending request");
    session
        .send_request(&historical)
        .await
        .context("Échec de l'envoi de la requête")?;

    let mut writer = FlowWriter::create(output, &request.symbol, &request.range)?;
    let mut tracker = FlowTracker::new(&request.symbol);
    let mut skipped = 0;
    let mut security_error = None;

    // Boucle de poll : un événement par itération, jusqu'à la réponse finale
    loop {
        let event = session
            .next_event(POLL_TIMEOUT)
            .await
            .context("Échec de la lecture des événements")?;

        for message in &event.messages {
            let Some(data) = &message.security_data else {
                continue;
            };

            if let Some(error) = &data.security_error {
                warn!(
                    security = %data.security,
                    category = %error.category,
                    message = %error.message,
                    "Security error returned by service"
                );
                security_error = Some(SessionError::Security {
                    security: data.security.clone(),
                    category: error.category.clone(),
                    message: error.message.clone(),
                });
            }

            for field_data in &data.field_data {
                match field_data.to_data_point() {
                    Some(point) => {
                        let row = tracker.push(point);
                        debug!(
                            date = %row.timestamp,
                            nav = row.nav,
                            aum = row.aum,
                            flow_factor = ?row.flow_factor,
                            "Data point"
                        );
                        writer.write_row(&row)?;
                    }
                    None => {
                        skipped += 1;
                        warn!(date = %field_data.date, "Missing NAV or AUM, row skipped");
                    }
                }
            }
        }

        if event.is_final() {
            break;
        }
    }

    // Titre refusé sans aucune donnée : échec, pas de fichier vide
    if let (true, Some(error)) = (tracker.is_empty(), security_error) {
        let path = writer.path().to_path_buf();
        drop(writer);
        if let Err(e) = std::fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "Failed to remove empty output file");
        }
        return Err(error.into());
    }

    let rows = writer.rows();
    let path = writer.finish()?;

    Ok(RequestSummary {
        ticker: request.symbol.clone(),
        path,
        rows,
        skipped,
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================
