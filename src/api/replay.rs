// ============================================================================
// Transport : replay
// ============================================================================
// Rejoue une réponse de passerelle enregistrée (fichier JSON) au lieu
// d'interroger le service. Sert aux exécutions hors ligne (--replay) et aux
// tests de la boucle de requête.
//
// Le fichier peut contenir plusieurs titres : chaque session ne rejoue que
// les messages du titre demandé.
// ============================================================================

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::api::bridge::{events_from_messages, parse_gateway_response};
use crate::api::error::SessionError;
use crate::api::event::{Event, HistoricalDataRequest, Message};
use crate::api::session::{Session, SessionFactory, REFDATA_SERVICE};

/// Session qui rejoue des messages enregistrés
#[derive(Debug, Clone)]
pub struct ReplaySession {
    messages: Arc<Vec<Message>>,
    pending: VecDeque<Event>,
    idle_polls: usize,
    fail_start: bool,
    fail_service: bool,
    started: bool,
    stopped: bool,
}

impl ReplaySession {
    pub fn new(messages: Arc<Vec<Message>>) -> Self {
        Self {
            messages,
            pending: VecDeque::new(),
            idle_polls: 0,
            fail_start: false,
            fail_service: false,
            started: false,
            stopped: false,
        }
    }

    /// Nombre d'événements Timeout renvoyés avant la réponse
    pub fn with_idle_polls(mut self, polls: usize) -> Self {
        self.idle_polls = polls;
        self
    }

    /// Simule un service injoignable
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Simule un service de données indisponible
    pub fn failing_service(mut self) -> Self {
        self.fail_service = true;
        self
    }

    /// Vrai une fois stop() appelé
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[async_trait]
impl Session for ReplaySession {
    async fn start(&mut self) -> Result<(), SessionError> {
        if self.fail_start {
            return Err(SessionError::Start {
                endpoint: "replay".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        self.started = true;
        Ok(())
    }

    async fn open_service(&mut self, service: &str) -> Result<(), SessionError> {
        if !self.started {
            return Err(SessionError::NotReady("session not started"));
        }
        if self.fail_service || service != REFDATA_SERVICE {
            return Err(SessionError::ServiceUnavailable(service.to_string()));
        }
        Ok(())
    }

    async fn send_request(&mut self, request: &HistoricalDataRequest) -> Result<(), SessionError> {
        if !self.started {
            return Err(SessionError::NotReady("session not started"));
        }

        let selected: Vec<Message> = self
            .messages
            .iter()
            .filter(|message| match &message.security_data {
                Some(data) => request.securities.contains(&data.security),
                None => true,
            })
            .cloned()
            .collect();

        debug!(
            securities = ?request.securities,
            messages = selected.len(),
            "Replaying recorded messages"
        );

        let mut events: VecDeque<Event> = (0..self.idle_polls).map(|_| Event::timeout()).collect();
        events.extend(events_from_messages(selected));
        self.pending = events;
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
        self.pending.clear();
        self.started = false;
        self.stopped = true;
    }
}

/// Fabrique de sessions replay partageant les mêmes messages
#[derive(Debug, Clone)]
pub struct ReplayFactory {
    messages: Arc<Vec<Message>>,
}

impl ReplayFactory {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages: Arc::new(messages),
        }
    }

    /// Charge une réponse de passerelle enregistrée
    pub fn from_file(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire le fichier replay {}", path.display()))?;
        let messages = parse_gateway_response(&body)
            .with_context(|| format!("Fichier replay invalide {}", path.display()))?;
        Ok(Self::new(messages))
    }

    pub fn session(&self) -> ReplaySession {
        ReplaySession::new(Arc::clone(&self.messages))
    }
}

impl SessionFactory for ReplayFactory {
    fn create(&self) -> Box<dyn Session> {
        Box::new(self.session())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
