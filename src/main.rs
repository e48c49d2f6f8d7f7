// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::EnvFilter;

use hilum_kiosk::api;
use hilum_kiosk::booking::BookingClient;
use hilum_kiosk::config::KioskConfig;
use hilum_kiosk::idle::IdleCoordinator;
use hilum_kiosk::state::AppState;
use hilum_kiosk::storage::ClinicStore;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = KioskConfig::from_env();
    // Fresh id per boot so log lines from different kiosk runs can be told
    // apart when several devices ship to the same collector.
    let boot_id = uuid::Uuid::new_v4();
    info!(%boot_id, ?config, "starting kiosk runtime");

    // Database open failure is fatal: the kiosk cannot operate without its
    // encrypted store (storage disabled, quota, bad mount).
    let store = ClinicStore::open(&config.database_path())
        .expect("failed to open encrypted kiosk database");

    let idle = IdleCoordinator::new(config.idle_timeout);
    // The frontend polls kiosk state; the log line is the server-side record
    // of every return to the home screen.
    idle.set_on_timeout(|| info!("idle timeout reached, kiosk returns to home screen"));
    // Nobody is authenticated yet; the countdown must not arm until login.
    idle.pause();

    let booking = BookingClient::new(&config.booking_api_base_url, idle.clone())
        .expect("invalid BOOKING_API_BASE_URL");

    let state = AppState::new(store, idle, booking, config.keep_alive_timeout);
    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("failed to parse bind address");

    info!(%addr, "kiosk runtime listening (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
