//! Actix-Web API serving live station data to the map client.
//!
//! Every request runs a fresh aggregate fetch; nothing is cached between
//! requests.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use serde::Serialize;
use tracing::info;

use crate::aggregate::Aggregator;
use crate::geo::to_feature_collection;
use crate::summary::StationSummary;

/// Shared application state.
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
}

#[derive(Serialize)]
struct ApiHealth {
    healthy: bool,
    version: String,
    vendors: Vec<String>,
}

#[derive(Serialize)]
struct ApiError {
    error: &'static str,
}

/// Registers the API routes; shared by [`run`] and the tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health)).service(
        web::scope("/api/cors")
            .route("/realtime", web::get().to(realtime))
            .route("/stations", web::get().to(stations))
            .route("/geojson", web::get().to(geojson))
            .route("/summary", web::get().to(summary)),
    );
}

/// Binds and serves until the process is stopped.
pub async fn run(aggregator: Arc<Aggregator>, bind_addr: &str, port: u16) -> std::io::Result<()> {
    let state = web::Data::new(AppState { aggregator });

    info!(bind_addr, port, "Starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(routes)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

/// The client never sees vendor details; those are in the logs.
fn fetch_failed() -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiError {
        error: "failed to fetch station data",
    })
}

/// `GET /api/health`
async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        vendors: state
            .aggregator
            .vendors()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

/// `GET /api/cors/realtime`
///
/// Plain array of normalized stations.
async fn realtime(state: web::Data<AppState>) -> HttpResponse {
    match state.aggregator.fetch_all_stations().await {
        Ok(stations) => HttpResponse::Ok().json(stations),
        Err(_) => fetch_failed(),
    }
}

/// `GET /api/cors/stations`
///
/// Stations plus fetch time and the vendors that failed this cycle.
async fn stations(state: web::Data<AppState>) -> HttpResponse {
    match state.aggregator.fetch_report().await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(_) => fetch_failed(),
    }
}

/// `GET /api/cors/geojson`
async fn geojson(state: web::Data<AppState>) -> HttpResponse {
    match state.aggregator.fetch_all_stations().await {
        Ok(stations) => HttpResponse::Ok().json(to_feature_collection(&stations)),
        Err(_) => fetch_failed(),
    }
}

/// `GET /api/cors/summary`
async fn summary(state: web::Data<AppState>) -> HttpResponse {
    match state.aggregator.fetch_all_stations().await {
        Ok(stations) => HttpResponse::Ok().json(StationSummary::from_stations(&stations)),
        Err(_) => fetch_failed(),
    }
}
