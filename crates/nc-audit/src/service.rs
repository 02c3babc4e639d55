//! Audit service
//!
//! Records events through an [`AuditStore`] and reads them back with filters.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use nc_core::error::NcError;
use nc_core::traits::Id;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::warn;

use crate::event::{AuditEvent, AuditFilter};

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<AuditError> for NcError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Database(msg) => NcError::Database(msg),
            AuditError::InvalidData(msg) => NcError::Internal(msg),
        }
    }
}

pub type AuditResult<T> = Result<T, AuditError>;

/// Audit store trait for persistence
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append an event, returning its id
    async fn append(&self, event: &AuditEvent) -> AuditResult<Id>;

    /// Newest first, at most `filter.effective_limit()` events
    async fn list(&self, filter: &AuditFilter) -> AuditResult<Vec<AuditEvent>>;
}

type EventHandler = Box<dyn Fn(&AuditEvent) + Send + Sync>;

pub struct AuditService {
    store: Arc<dyn AuditStore>,
    event_handlers: Vec<EventHandler>,
}

impl AuditService {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self {
            store,
            event_handlers: Vec::new(),
        }
    }

    /// Register a handler called after every recorded event
    pub fn on_recorded<F>(&mut self, handler: F)
    where
        F: Fn(&AuditEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Box::new(handler));
    }

    pub async fn record(&self, mut event: AuditEvent) -> AuditResult<AuditEvent> {
        let id = self.store.append(&event).await?;
        event.id = Some(id);

        for handler in &self.event_handlers {
            handler(&event);
        }
        Ok(event)
    }

    /// Record without failing the caller; store errors become a warning log
    pub async fn log(&self, event: AuditEvent) {
        let action = event.action;
        let kind = event.entity_kind;
        if let Err(err) = self.record(event).await {
            warn!(%action, %kind, error = %err, "Failed to record audit event");
        }
    }

    pub async fn list(&self, filter: &AuditFilter) -> AuditResult<Vec<AuditEvent>> {
        self.store.list(filter).await
    }
}

/// In-memory audit store
pub struct MemoryAuditStore {
    events: RwLock<Vec<AuditEvent>>,
    next_id: AtomicI64,
}

impl Default for MemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot in insertion order
    pub fn all(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, event: &AuditEvent) -> AuditResult<Id> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut event = event.clone();
        event.id = Some(id);
        self.events.write().push(event);
        Ok(id)
    }

    async fn list(&self, filter: &AuditFilter) -> AuditResult<Vec<AuditEvent>> {
        let events = self.events.read();
        Ok(events
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .take(filter.effective_limit())
            .cloned()
            .collect())
    }
}
