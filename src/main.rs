// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod error;
mod infrastructure;
mod presentation;

use std::future::IntoFuture;
use std::sync::Arc;
use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, Instant};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::alert_coordinator::AlertCoordinator;
use crate::application::chart_presenter::{ChartFrame, ChartPresenter, PresenterSettings};
use crate::application::client::BbqClient;
use crate::application::probe_settings::{PresetCatalog, ProbeSettingsEditor};
use crate::application::reconciler::{ReconcilerSettings, TelemetryReconciler};
use crate::domain::dashboard::Dashboard;
use crate::domain::telemetry::ChartWindow;
use crate::infrastructure::config::load_client_config;
use crate::infrastructure::history_file::read_saved_history;
use crate::infrastructure::transport::{session, SessionMode};
use crate::infrastructure::websocket::WsConnector;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    clear_history, delete_probe_target, dismiss_notice, export_history, get_chart,
    get_dashboard, get_probe_target, health_check, import_history, list_presets, power_off,
    put_probe_target, reconnect, select_preset, set_unit, set_view, set_y_axis_min,
    silence_alarm, toggle_series,
};
use crate::presentation::view::{DashboardAlarm, ProbeBoard, WatchChartSurface};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_client_config()?;
    let unit = config.ui.unit;
    let now_ms = chrono::Utc::now().timestamp_millis();
    let span_ms = config.chart.initial_span_minutes * 60 * 1000;

    // A history file given at start-up is viewed offline
    let saved = match &config.ui.history_file {
        Some(path) => match read_saved_history(path).await {
            Ok(readings) => Some(readings),
            Err(e) => {
                tracing::warn!("Ignoring history file {}: {}", path.display(), e);
                None
            }
        },
        None => None,
    };
    let offline = config.server.start_offline || saved.is_some();

    // Views published to the HTTP surface
    let (dashboard_tx, dashboard_rx) = watch::channel(Dashboard::new(unit, offline));
    let dashboard_tx = Arc::new(dashboard_tx);
    let (chart_tx, chart_rx) = watch::channel(ChartFrame::empty(
        unit,
        ChartWindow::starting_at(now_ms, span_ms),
    ));

    // Transport (infrastructure layer)
    let initial_mode = if offline {
        SessionMode::Offline
    } else {
        SessionMode::Online
    };
    let (transport, transport_session, events) = session(
        WsConnector::new(config.server.url.clone()),
        initial_mode,
        Duration::from_millis(config.server.reconnect_delay_ms),
    );
    tokio::spawn(transport_session.run());

    // Client (application layer)
    let catalog = if config.presets.is_empty() {
        PresetCatalog::builtin()
    } else {
        PresetCatalog::new(config.presets.clone())
    };
    let presets = catalog.presets().to_vec();

    let reconciler = TelemetryReconciler::new(
        unit,
        ReconcilerSettings {
            palette: config.chart.palette.clone(),
            default_color: config.chart.default_color.clone(),
            initial_span_ms: span_ms,
        },
        now_ms,
    )
    .with_observer(Box::new(ProbeBoard::new(dashboard_tx.clone())));

    let presenter = ChartPresenter::new(
        Box::new(WatchChartSurface::new(chart_tx)),
        PresenterSettings {
            min_interval: Duration::from_millis(config.chart.min_redraw_interval_ms),
            retry_delay: Duration::from_millis(config.chart.retry_delay_ms),
            y_axis_min_c: config.chart.y_axis_min_c,
        },
    );
    let alerts = AlertCoordinator::new(Box::new(DashboardAlarm::new(dashboard_tx.clone())));

    let mut client = BbqClient::new(
        reconciler,
        presenter,
        alerts,
        ProbeSettingsEditor::new(catalog),
        transport,
        dashboard_tx,
    );
    if let Some(readings) = saved {
        client.load_history(&readings, Instant::now());
    }

    // Create application state
    let (actions_tx, actions_rx) = mpsc::channel(32);
    let state = Arc::new(AppState {
        actions: actions_tx,
        chart: chart_rx,
        dashboard: dashboard_rx,
        presets,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/chart", get(get_chart))
        .route("/dashboard", get(get_dashboard))
        .route("/presets", get(list_presets))
        .route("/view", post(set_view))
        .route("/unit", post(set_unit))
        .route("/alarm/silence", post(silence_alarm))
        .route(
            "/probes/:probe/target",
            get(get_probe_target)
                .put(put_probe_target)
                .delete(delete_probe_target),
        )
        .route("/probes/:probe/preset", post(select_preset))
        .route("/chart/series/:probe/toggle", post(toggle_series))
        .route("/chart/y-min", post(set_y_axis_min))
        .route("/history/clear", post(clear_history))
        .route("/history/export", get(export_history))
        .route(
            "/history/import",
            post(import_history).layer(DefaultBodyLimit::max(config.ui.max_upload_bytes)),
        )
        .route("/connection/reconnect", post(reconnect))
        .route("/power-off", post(power_off))
        .route("/notice/dismiss", post(dismiss_notice))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.ui.listen).await?;
    tracing::info!(
        "Starting ibbq-client on {} (bridge {})",
        config.ui.listen,
        config.server.url
    );

    tokio::select! {
        result = axum::serve(listener, router).into_future() => result?,
        _ = client.run(events, actions_rx, shutdown_signal()) => {}
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
