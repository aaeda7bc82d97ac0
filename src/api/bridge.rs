// ============================================================================
// Transport : passerelle HTTP
// ============================================================================
// Parle au service de données de référence via une passerelle JSON/HTTP
// (style blpapi-http) :
//
//   start        → GET  http://host:port/           (sonde de connexion)
//   send_request → POST http://host:port/request?ns=blp&service=refdata
//                       &type=HistoricalDataRequest  (corps JSON)
//
// Réponse : {"status": 0, "message": "OK", "data": [message, ...]}
// Chaque message devient un événement PartialResponse, le dernier Response.
//
// CONCEPTS RUST :
// 1. reqwest::Client : client HTTP async réutilisable
// 2. VecDeque : file FIFO des événements en attente
// 3. Option<Client> : None tant que start() n'a pas réussi
// ============================================================================

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::api::error::SessionError;
use crate::api::event::{Event, EventType, HistoricalDataRequest, Message};
use crate::api::session::{Session, SessionFactory, SessionOptions};

/// Enveloppe de réponse de la passerelle
#[derive(Debug, Deserialize)]
struct GatewayResponse {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Vec<Message>,
}

/// Parse le corps d'une réponse de la passerelle
///
/// Un status non nul est un refus du service.
pub fn parse_gateway_response(body: &str) -> Result<Vec<Message>, SessionError> {
    let response: GatewayResponse = serde_json::from_str(body)
        .map_err(|e| SessionError::InvalidResponse(e.to_string()))?;

    if response.status != 0 {
        return Err(SessionError::Rejected(format!(
            "status {} ({})",
            response.status, response.message
        )));
    }

    Ok(response.data)
}

/// Découpe une liste de messages en événements
///
/// Tous les messages sauf le dernier sont des PartialResponse ; le dernier
/// (ou un événement vide s'il n'y a aucun message) est la Response finale.
pub fn events_from_messages(messages: Vec<Message>) -> VecDeque<Event> {
    let total = messages.len();
    if total == 0 {
        return VecDeque::from(vec![Event {
            event_type: EventType::Response,
            messages: Vec::new(),
        }]);
    }

    messages
        .into_iter()
        .enumerate()
        .map(|(i, message)| Event {
            event_type: if i + 1 == total {
                EventType::Response
            } else {
                EventType::PartialResponse
            },
            messages: vec![message],
        })
        .collect()
}

/// Découpe "//ns/service" en ("ns", "service")
fn parse_service(service: &str) -> Option<(String, String)> {
    let rest = service.strip_prefix("//")?;
    let (namespace, name) = rest.split_once('/')?;
    if namespace.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((namespace.to_string(), name.to_string()))
}

/// Session sur la passerelle HTTP
pub struct HttpSession {
    options: SessionOptions,
    client: Option<reqwest::Client>,
    service: Option<(String, String)>,
    pending: VecDeque<Event>,
}

impl HttpSession {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            client: None,
            service: None,
            pending: VecDeque::new(),
        }
    }

    fn base_url(&self) -> String {
        format!("http://{}:{}", self.options.host, self.options.port)
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn start(&mut self) -> Result<(), SessionError> {
        let endpoint = self.options.endpoint();
        debug!(%endpoint, "Starting gateway session");

        let client = reqwest::Client::builder()
            .user_agent(concat!("navflow/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        // N'importe quelle réponse HTTP prouve que la passerelle écoute
        let probe = client.get(self.base_url()).send().await;
        if let Err(e) = probe {
            return Err(SessionError::Start {
                endpoint,
                reason: e.to_string(),
            });
        }

        info!(%endpoint, "Gateway session started");
        self.client = Some(client);
        Ok(())
    }

    async fn open_service(&mut self, service: &str) -> Result<(), SessionError> {
        if self.client.is_none() {
            return Err(SessionError::NotReady("session not started"));
        }

        let parsed =
            parse_service(service).ok_or_else(|| SessionError::ServiceUnavailable(service.to_string()))?;
        debug!(service, "Service opened");
        self.service = Some(parsed);
        Ok(())
    }

    async fn send_request(&mut self, request: &HistoricalDataRequest) -> Result<(), SessionError> {
        let client = self
            .client
            .as_ref()
            .ok_or(SessionError::NotReady("session not started"))?;
        let (namespace, service) = self
            .service
            .as_ref()
            .ok_or(SessionError::NotReady("service not opened"))?;

        let url = format!("{}/request", self.base_url());
        debug!(%url, securities = ?request.securities, "Sending HistoricalDataRequest");

        let response = client
            .post(&url)
            .query(&[
                ("ns", namespace.as_str()),
                ("service", service.as_str()),
                ("type", "HistoricalDataRequest"),
            ])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Gateway returned error status");
            return Err(SessionError::Rejected(format!("HTTP {}", status)));
        }

        let body = response.text().await?;
        let messages = parse_gateway_response(&body)?;
        debug!(messages = messages.len(), "Gateway response received");

        self.pending = events_from_messages(messages);
        Ok(())
    }

    async fn next_event(&mut self, timeout: Duration) -> Result<Event, SessionError> {
        match self.pending.pop_front() {
            Some(event) => Ok(event),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(Event::timeout())
            }
        }
    }

    async fn stop(&mut self) {
        self.client = None;
        self.service = None;
        self.pending.clear();
        debug!(endpoint = %self.options.endpoint(), "Gateway session stopped");
    }
}

/// Fabrique de sessions HTTP (une par worker)
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    options: SessionOptions,
}

impl HttpSessionFactory {
    pub fn new(options: SessionOptions) -> Self {
        Self { options }
    }
}

impl SessionFactory for HttpSessionFactory {
    fn create(&self) -> Box<dyn Session> {
        Box::new(HttpSession::new(self.options.clone()))
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
