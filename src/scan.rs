//! Scan pipeline: the state machine from "scan requested" to "normalized
//! operator list + recommendation". One scan is in flight at a time; each
//! carries a sequence number so a stale completion can never overwrite a
//! newer scan's results.

use std::{sync::Arc, time::Duration};

use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::{sync::Mutex, time};

use crate::{
    history::{HistoryStore, ScanLogEntry},
    insight::{Insight, InsightClient},
    model::{
        ConnectionTech, NetworkStats, OperatorExtension, OperatorResult, SignalStatus,
        UserLocation,
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScanStatus {
    #[default]
    Idle,
    Scanning,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan already in progress")]
    AlreadyScanning,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSnapshot {
    pub status: ScanStatus,
    pub operators: Vec<OperatorResult>,
    pub recommendation: String,
    pub error: Option<String>,
    pub location: Option<UserLocation>,
    pub network_stats: Option<NetworkStats>,
}

#[derive(Debug, Default)]
struct ScanState {
    status: ScanStatus,
    seq: u64,
    operators: Vec<OperatorResult>,
    recommendation: String,
    error: Option<String>,
    location: Option<UserLocation>,
    network_stats: Option<NetworkStats>,
}

#[derive(Clone)]
pub struct ScanController {
    state: Arc<Mutex<ScanState>>,
    insight: Arc<InsightClient>,
    history: HistoryStore,
    delay: Duration,
}

impl ScanController {
    pub fn new(insight: Arc<InsightClient>, history: HistoryStore, delay: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScanState::default())),
            insight,
            history,
            delay,
        }
    }

    /// Begin a scan. Clears prior results immediately and spawns the delayed
    /// acquisition branch; rejected while one is already in flight.
    pub async fn start(
        &self,
        location: Option<UserLocation>,
        network_stats: Option<NetworkStats>,
    ) -> Result<u64, ScanError> {
        let seq = {
            let mut state = self.state.lock().await;
            if state.status == ScanStatus::Scanning {
                return Err(ScanError::AlreadyScanning);
            }
            state.seq += 1;
            state.status = ScanStatus::Scanning;
            state.operators.clear();
            state.recommendation.clear();
            state.error = None;
            state.location = location.clone();
            if network_stats.is_some() {
                state.network_stats = network_stats;
            }
            state.seq
        };

        info!(
            "scan #{seq} started (location {})",
            if location.is_some() { "known" } else { "unavailable" }
        );

        let controller = self.clone();
        tokio::spawn(async move {
            controller.run_scan(seq, location).await;
        });

        Ok(seq)
    }

    pub async fn snapshot(&self) -> ScanSnapshot {
        let state = self.state.lock().await;
        ScanSnapshot {
            status: state.status,
            operators: state.operators.clone(),
            recommendation: state.recommendation.clone(),
            error: state.error.clone(),
            location: state.location.clone(),
            network_stats: state.network_stats.clone(),
        }
    }

    async fn run_scan(&self, seq: u64, location: Option<UserLocation>) {
        time::sleep(self.delay).await;

        match location {
            Some(loc) => match self.insight.fetch_insight(loc.latitude, loc.longitude).await {
                Ok(insight) => self.complete(seq, insight).await,
                Err(err) => self.fail(seq, err.to_string()).await,
            },
            None => self.complete(seq, mock_insight()).await,
        }
    }

    /// Adopt a finished scan's results and log it. Completions for anything
    /// but the latest sequence are discarded.
    async fn complete(&self, seq: u64, insight: Insight) {
        let mut state = self.state.lock().await;
        if seq != state.seq {
            warn!("discarding stale completion for scan #{seq}");
            return;
        }

        state.operators = insight.operators;
        state.recommendation = insight.recommendation;
        state.error = None;
        state.status = ScanStatus::Idle;

        let entry = ScanLogEntry::from_scan(Utc::now(), state.location.as_ref(), &state.operators);
        info!("scan #{seq} finished with {} operators", state.operators.len());
        drop(state);

        if let Err(err) = self.history.append(entry) {
            error!("failed to persist scan history: {err:#}");
        }
    }

    /// Record a recoverable failure and return to idle. The previous operator
    /// list is left untouched so the caller can retry.
    async fn fail(&self, seq: u64, message: String) {
        let mut state = self.state.lock().await;
        if seq != state.seq {
            warn!("discarding stale failure for scan #{seq}");
            return;
        }

        error!("scan #{seq} analysis failed: {message}");
        state.error = Some(message);
        state.status = ScanStatus::Idle;
    }
}

/// Fixed result set for the no-location fallback path.
fn mock_insight() -> Insight {
    let operators = vec![
        mock_operator(
            "1",
            "Telkomsel",
            92,
            18,
            ConnectionTech::FiveG,
            SignalStatus::Excellent,
            "#f43f5e",
            96,
            &["n40", "B3"],
            true,
        ),
        mock_operator(
            "2",
            "XL Axiata",
            78,
            32,
            ConnectionTech::FourG,
            SignalStatus::Good,
            "#2563eb",
            88,
            &["B1", "B3"],
            true,
        ),
        mock_operator(
            "3",
            "Indosat Ooredoo",
            68,
            42,
            ConnectionTech::FourG,
            SignalStatus::Good,
            "#f59e0b",
            81,
            &["B3", "B8"],
            true,
        ),
        mock_operator(
            "4",
            "Smartfren",
            54,
            58,
            ConnectionTech::Lte,
            SignalStatus::Fair,
            "#db2777",
            74,
            &["B40"],
            false,
        ),
    ];

    Insight {
        recommendation: "Analisis simulasi menunjukkan dominasi Telkomsel 5G di area urban utama, \
                         sementara XL menawarkan latensi yang kompetitif."
            .to_string(),
        operators,
    }
}

#[allow(clippy::too_many_arguments)]
fn mock_operator(
    id: &str,
    name: &str,
    strength: i64,
    latency: i64,
    tech: ConnectionTech,
    status: SignalStatus,
    color: &str,
    integrity_score: i64,
    bands: &[&str],
    verified: bool,
) -> OperatorResult {
    OperatorResult {
        id: id.to_string(),
        name: name.to_string(),
        strength,
        latency,
        tech,
        status,
        color: color.to_string(),
        extension: Some(OperatorExtension {
            integrity_score,
            bands: bands.iter().map(|b| b.to_string()).collect(),
            verified,
        }),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    location: Option<UserLocation>,
    network_stats: Option<NetworkStats>,
}

#[post("/v1/scan")]
pub async fn start_service(
    data: web::Json<ScanRequest>,
    controller: web::Data<ScanController>,
) -> HttpResponse {
    let data = data.into_inner();
    match controller.start(data.location, data.network_stats).await {
        Ok(_) => HttpResponse::Accepted().json(controller.snapshot().await),
        Err(err @ ScanError::AlreadyScanning) => {
            HttpResponse::Conflict().json(json!({ "error": err.to_string() }))
        }
    }
}

#[get("/v1/scan")]
pub async fn state_service(controller: web::Data<ScanController>) -> HttpResponse {
    HttpResponse::Ok().json(controller.snapshot().await)
}
