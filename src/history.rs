//! Bounded most-recent-first log of past scan summaries, mirrored to local
//! storage on every mutation.

use std::sync::Arc;

use actix_web::{delete, error::ErrorInternalServerError, get, web, HttpResponse};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    model::{OperatorResult, UserLocation},
    storage::Storage,
};

pub const MAX_ENTRIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanLogEntry {
    pub id: String,
    pub date: String,
    pub location: String,
    pub top_operator: String,
    pub strength: i64,
}

impl ScanLogEntry {
    pub fn from_scan(
        at: DateTime<Utc>,
        location: Option<&UserLocation>,
        operators: &[OperatorResult],
    ) -> Self {
        let top = operators.first();
        Self {
            id: at.timestamp_millis().to_string(),
            date: at.format("%d/%m/%Y %H:%M").to_string(),
            location: location
                .map(|l| format!("{:.4}, {:.4}", l.latitude, l.longitude))
                .unwrap_or_else(|| "Unknown".to_string()),
            top_operator: top
                .map(|op| op.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            strength: top.map(|op| op.strength).unwrap_or(0),
        }
    }
}

#[derive(Clone)]
pub struct HistoryStore {
    storage: Arc<Storage>,
}

impl HistoryStore {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn entries(&self) -> Vec<ScanLogEntry> {
        self.storage.history()
    }

    /// Prepend, drop anything past the cap, persist.
    pub fn append(&self, entry: ScanLogEntry) -> Result<()> {
        let mut log = self.storage.history();
        log.insert(0, entry);
        log.truncate(MAX_ENTRIES);
        self.storage.set_history(log)
    }

    pub fn clear(&self) -> Result<()> {
        self.storage.set_history(Vec::new())
    }
}

#[get("/v1/history")]
pub async fn list_service(store: web::Data<HistoryStore>) -> HttpResponse {
    HttpResponse::Ok().json(store.entries())
}

#[delete("/v1/history")]
pub async fn clear_service(store: web::Data<HistoryStore>) -> actix_web::Result<HttpResponse> {
    store.clear().map_err(ErrorInternalServerError)?;
    Ok(HttpResponse::NoContent().finish())
}
