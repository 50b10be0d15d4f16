// Application state for HTTP handlers
use crate::application::chart_presenter::ChartFrame;
use crate::application::client::{Reply, UiAction};
use crate::application::probe_settings::Preset;
use crate::domain::dashboard::Dashboard;
use axum::http::StatusCode;
use tokio::sync::{mpsc, oneshot, watch};

#[derive(Clone)]
pub struct AppState {
    pub actions: mpsc::Sender<UiAction>,
    pub chart: watch::Receiver<ChartFrame>,
    pub dashboard: watch::Receiver<Dashboard>,
    pub presets: Vec<Preset>,
}

impl AppState {
    /// Forwards an action to the client loop and waits for its reply.
    pub async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> UiAction) -> Result<T, StatusCode> {
        let (tx, rx) = oneshot::channel();
        self.notify(build(tx)).await?;
        rx.await.map_err(|_| {
            tracing::error!("Client loop dropped a request");
            StatusCode::SERVICE_UNAVAILABLE
        })
    }

    /// Forwards an action without waiting for it to be applied.
    pub async fn notify(&self, action: UiAction) -> Result<(), StatusCode> {
        self.actions.send(action).await.map_err(|_| {
            tracing::error!("Client loop is not running");
            StatusCode::SERVICE_UNAVAILABLE
        })
    }
}
