use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use actix_web::{web, App, HttpServer};
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

mod access;
mod config;
mod history;
mod insight;
mod model;
mod ping;
mod report;
mod scan;
mod storage;
mod trend;

#[derive(Debug, Parser)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Serve { port: Option<u16> },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let path = match cli.config.as_deref() {
        Some(x) => x,
        None => Path::new("config.toml"),
    };
    let config = config::load(path)?;

    let storage = Arc::new(storage::Storage::open(config.data_path.clone())?);
    let history = history::HistoryStore::new(storage.clone());
    let gate = access::AccessGate::new(storage, config.master_token.clone());
    if gate.check_persisted() {
        info!("persisted access token accepted");
    }

    let insight = Arc::new(insight::InsightClient::new(&config.insight)?);
    let controller = scan::ScanController::new(
        insight,
        history.clone(),
        Duration::from_millis(config.scan_delay_ms),
    );

    let trend = trend::TrendSampler::new();
    trend.spawn_ticker().await;

    let probe = ping::PingProbe::new(config.ping_url.clone())?;
    probe.spawn_ticker().await;

    match cli.command {
        Command::Serve { port } => {
            let port = port.unwrap_or(config.http_port);
            info!("listening on 0.0.0.0:{port}");

            let app_trend = trend.clone();
            let app_probe = probe.clone();
            HttpServer::new(move || {
                App::new()
                    .app_data(web::Data::new(controller.clone()))
                    .app_data(web::Data::new(history.clone()))
                    .app_data(web::Data::new(gate.clone()))
                    .app_data(web::Data::new(app_trend.clone()))
                    .app_data(web::Data::new(app_probe.clone()))
                    .service(scan::start_service)
                    .service(scan::state_service)
                    .service(history::list_service)
                    .service(history::clear_service)
                    .service(access::verify_service)
                    .service(access::state_service)
                    .service(access::logout_service)
                    .service(trend::service)
                    .service(ping::service)
                    .service(report::service)
            })
            .bind(("0.0.0.0", port))?
            .run()
            .await?;

            trend.stop().await;
            probe.stop().await;
        }
    };

    Ok(())
}
