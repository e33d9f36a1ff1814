// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! `berthd`: the Router.
//!
//! One process serving every web surface (MCP proxy, dashboard, webtty,
//! webchat, webmeet, blobs, workspace files) and hosting the container
//! monitor. Exit codes carry supervision meaning: 2 = bind failure (the
//! watchdog will not restart), 100 = fatal.

mod auth;
mod endpoints;
mod monitor;
mod proxy;
mod state;
mod webchat;
mod webmeet;
mod webtty;

use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get, post};
use axum::Router;
use berth_core::error::exit_code;
use berth_engine::Engine;
use berth_logs::safe_eprintln;
use berth_workspace::{ServersConfig, WorkspacePaths};
use monitor::ContainerMonitor;
use serde_json::json;
use state::AppState;
use tokio_util::sync::CancellationToken;

/// Default maximum request body.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(endpoints::root_redirect))
        .route("/health", get(endpoints::health))
        .route("/status", get(endpoints::status))
        .route("/dashboard", get(endpoints::dashboard))
        .route("/webtty/:agent", get(webtty::webtty_page))
        .route("/webtty/:agent/ws", get(webtty::webtty_ws))
        .route("/webchat/:agent", get(webchat::webchat_page))
        .route("/webchat/:agent/message", post(webchat::webchat_message))
        .route("/webchat/:agent/events", get(webchat::webchat_events))
        .route("/webmeet", get(webmeet::webmeet_page))
        .route("/webmeet/ws", get(webmeet::webmeet_ws))
        .route("/mcps/:agent/mcp", any(proxy::mcp_proxy))
        .route("/blobs", post(endpoints::blob_put))
        .route("/blobs/:id", get(endpoints::blob_get))
        .route("/workspace-files/*path", get(endpoints::workspace_file))
        .layer(axum::Extension(webmeet::MeetRooms::default()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if std::env::var("ORCH_DEBUG").is_ok() {
                    tracing_subscriber::EnvFilter::new("debug")
                } else {
                    tracing_subscriber::EnvFilter::new("info")
                }
            }),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    berth_logs::mark_process_start();
    init_tracing();

    let paths = match WorkspacePaths::discover_from_cwd() {
        Ok(paths) => paths,
        Err(e) => {
            safe_eprintln(&format!("berthd: {}", e));
            std::process::exit(1);
        }
    };

    let log = berth_logs::LogWriter::new(paths.logs_dir(), "router");

    // Panics are bugs: capture and exit fatal so the watchdog knows not to
    // blindly restart.
    {
        let crash_log = log.clone();
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            crash_log.log_crash("panic", &info.to_string(), json!({}));
            default_hook(info);
            std::process::exit(exit_code::FATAL);
        }));
    }

    let engine = match Engine::detect() {
        Ok(engine) => engine,
        Err(e) => {
            safe_eprintln(&format!("berthd: {}", e));
            log.log_crash("engine_unavailable", &e.to_string(), json!({}));
            std::process::exit(1);
        }
    };

    let port = std::env::var("ROUTER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .or_else(|| berth_workspace::routing_io::read_routing_table(&paths).ok().flatten().map(|t| t.port))
        .unwrap_or(8080);

    let servers = match ServersConfig::load(&paths) {
        Ok(servers) => servers,
        Err(e) => {
            safe_eprintln(&format!("berthd: servers config: {}", e));
            std::process::exit(1);
        }
    };

    let state = AppState::new(paths, servers, engine);
    state.log().log_boot_event("router_start", json!({"port": port}));

    let cancel = CancellationToken::new();
    let monitor = ContainerMonitor::new(state.clone(), port);
    let monitor_task = tokio::spawn(monitor.run(cancel.clone()));

    let app = build_app(state.clone());
    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            safe_eprintln(&format!("berthd: cannot bind port {}: {}", port, e));
            state.log().log_shutdown("bind_failed", exit_code::PORT_OR_PERMISSION, json!({"port": port}));
            std::process::exit(exit_code::PORT_OR_PERMISSION);
        }
    };
    tracing::info!(port, "router listening");

    let shutdown_cancel = cancel.clone();
    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        shutdown_cancel.cancel();
    });

    let exit = match serve.await {
        Ok(()) => {
            state.log().log_shutdown("signal", exit_code::OK, json!({}));
            exit_code::OK
        }
        Err(e) => {
            safe_eprintln(&format!("berthd: server error: {}", e));
            state.log().log_crash("server_error", &e.to_string(), json!({}));
            exit_code::FAILURE
        }
    };

    cancel.cancel();
    let _ = monitor_task.await;
    state.log().log_memory_usage();
    std::process::exit(exit);
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(_) => return std::future::pending().await,
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(sigint) => sigint,
        Err(_) => return std::future::pending().await,
    };
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
    tracing::info!("shutdown signal received");
}
