//! On-demand report export: the pipeline's current state serialized as a
//! downloadable JSON document.

use actix_web::{get, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    model::{NetworkStats, OperatorResult, UserLocation},
    scan::{ScanController, ScanSnapshot},
};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub schema_version: u32,
    pub timestamp: DateTime<Utc>,
    pub location: Option<UserLocation>,
    pub network_stats: Option<NetworkStats>,
    pub operators: Vec<OperatorResult>,
    pub recommendation: String,
}

impl ScanReport {
    pub fn build(snapshot: ScanSnapshot, at: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            timestamp: at,
            location: snapshot.location,
            network_stats: snapshot.network_stats,
            operators: snapshot.operators,
            recommendation: snapshot.recommendation,
        }
    }
}

#[get("/v1/report")]
pub async fn service(controller: web::Data<ScanController>) -> HttpResponse {
    let now = Utc::now();
    let report = ScanReport::build(controller.snapshot().await, now);

    HttpResponse::Ok()
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"netscan-report-{}.json\"", now.timestamp()),
        ))
        .json(report)
}
