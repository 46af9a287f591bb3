//! Decorative signal-trend series: a timer-driven random walk, not a real
//! measurement. Feeds the dashboard chart.

use std::{sync::Arc, time::Duration};

use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle, time};

pub const WINDOW: usize = 30;
const TICK: Duration = Duration::from_millis(1500);
const FLOOR: f64 = 10.0;
const CEILING: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub time: String,
    pub val: f64,
}

#[derive(Clone)]
pub struct TrendSampler {
    series: Arc<Mutex<Vec<TrendPoint>>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl TrendSampler {
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        let series = (0..WINDOW)
            .map(|i| TrendPoint {
                time: i.to_string(),
                val: 30.0 + rng.gen::<f64>() * 40.0,
            })
            .collect();

        Self {
            series: Arc::new(Mutex::new(series)),
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn series(&self) -> Vec<TrendPoint> {
        self.series.lock().await.clone()
    }

    pub async fn spawn_ticker(&self) {
        let mut ticker = self.ticker.lock().await;
        if let Some(handle) = ticker.take() {
            handle.abort();
        }

        let series = self.series.clone();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(TICK);
            interval.tick().await;
            loop {
                interval.tick().await;
                step(&mut *series.lock().await);
            }
        });

        *ticker = Some(handle);
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}

fn step(series: &mut Vec<TrendPoint>) {
    let last = series.last().map(|p| p.val).unwrap_or(50.0);
    let change = rand::thread_rng().gen_range(-5.0..5.0);
    let val = (last + change).clamp(FLOOR, CEILING);

    if !series.is_empty() {
        series.remove(0);
    }
    series.push(TrendPoint {
        time: Utc::now().timestamp_millis().to_string(),
        val,
    });
}

#[get("/v1/trend")]
pub async fn service(sampler: web::Data<TrendSampler>) -> HttpResponse {
    HttpResponse::Ok().json(sampler.series().await)
}
