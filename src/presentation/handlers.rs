// HTTP request handlers
use crate::application::chart_presenter::{ChartFrame, ViewVisibility};
use crate::application::client::{ActionOutcome, UiAction};
use crate::application::probe_settings::{Preset, ProbeSettingsForm};
use crate::domain::dashboard::Dashboard;
use crate::domain::unit::TemperatureUnit;
use crate::infrastructure::history_file::export_file_name;
use crate::infrastructure::http_response::json_download_response;
use crate::presentation::app_state::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, Path, Query, State},
    http::{Response, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

impl IntoResponse for ActionOutcome {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ActionOutcome::Sent | ActionOutcome::Done | ActionOutcome::Ignored => StatusCode::OK,
            ActionOutcome::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
            ActionOutcome::ConfirmationRequired => StatusCode::CONFLICT,
            ActionOutcome::Invalid { .. } | ActionOutcome::Rejected { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        };
        (status, Json(self)).into_response()
    }
}

#[derive(Deserialize)]
pub struct UnitRequest {
    pub unit: TemperatureUnit,
}

#[derive(Deserialize)]
pub struct PresetRequest {
    pub form: ProbeSettingsForm,
    pub preset: String,
}

#[derive(Deserialize)]
pub struct YAxisRequest {
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Deserialize)]
pub struct PowerOffQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Serialize)]
pub struct SeriesVisibility {
    pub probe: usize,
    pub visible: bool,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Latest rendered chart frame
pub async fn get_chart(State(state): State<Arc<AppState>>) -> Json<ChartFrame> {
    Json(state.chart.borrow().clone())
}

pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<Dashboard> {
    Json(state.dashboard.borrow().clone())
}

pub async fn list_presets(State(state): State<Arc<AppState>>) -> Json<Vec<Preset>> {
    Json(state.presets.clone())
}

/// Page visibility and chart-tab focus reported by the browser
pub async fn set_view(
    State(state): State<Arc<AppState>>,
    Json(visibility): Json<ViewVisibility>,
) -> Result<StatusCode, StatusCode> {
    state.notify(UiAction::SetVisibility(visibility)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_unit(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UnitRequest>,
) -> Result<ActionOutcome, StatusCode> {
    state
        .request(|reply| UiAction::SetUnit {
            unit: request.unit,
            reply,
        })
        .await
}

pub async fn silence_alarm(State(state): State<Arc<AppState>>) -> Result<ActionOutcome, StatusCode> {
    state.request(|reply| UiAction::SilenceAlarm { reply }).await
}

/// Opens the settings dialog for a probe, pre-filled from its target
pub async fn get_probe_target(
    Path(probe): Path<usize>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProbeSettingsForm>, StatusCode> {
    state
        .request(|reply| UiAction::OpenProbeSettings { probe, reply })
        .await
        .map(Json)
}

pub async fn put_probe_target(
    Path(probe): Path<usize>,
    State(state): State<Arc<AppState>>,
    Json(mut form): Json<ProbeSettingsForm>,
) -> Result<ActionOutcome, StatusCode> {
    form.probe = probe;
    state
        .request(|reply| UiAction::SaveProbeSettings { form, reply })
        .await
}

pub async fn delete_probe_target(
    Path(probe): Path<usize>,
    State(state): State<Arc<AppState>>,
) -> Result<ActionOutcome, StatusCode> {
    state
        .request(|reply| UiAction::ClearProbeSettings { probe, reply })
        .await
}

/// Applies a preset choice to a dialog and returns the updated fields
pub async fn select_preset(
    Path(probe): Path<usize>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<PresetRequest>,
) -> Result<Json<ProbeSettingsForm>, StatusCode> {
    let mut form = request.form;
    form.probe = probe;
    state
        .request(|reply| UiAction::SelectPreset {
            form,
            preset: request.preset,
            reply,
        })
        .await
        .map(Json)
}

/// Legend click
pub async fn toggle_series(
    Path(probe): Path<usize>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SeriesVisibility>, StatusCode> {
    let visible = state
        .request(|reply| UiAction::ToggleSeries { probe, reply })
        .await?;
    Ok(Json(SeriesVisibility { probe, visible }))
}

pub async fn set_y_axis_min(
    State(state): State<Arc<AppState>>,
    Json(request): Json<YAxisRequest>,
) -> Result<StatusCode, StatusCode> {
    state
        .notify(UiAction::SetYAxisMin {
            value: request.value,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_history(State(state): State<Arc<AppState>>) -> Result<ActionOutcome, StatusCode> {
    state.request(|reply| UiAction::ClearHistory { reply }).await
}

/// Download the chart contents as a saved-history file
pub async fn export_history(
    State(state): State<Arc<AppState>>,
) -> Result<Response<Body>, StatusCode> {
    let saved = state
        .request(|reply| UiAction::ExportHistory { reply })
        .await?;
    json_download_response(&saved, &export_file_name(chrono::Utc::now()))
}

/// Upload a saved-history file; the client goes offline to show it
pub async fn import_history(
    State(state): State<Arc<AppState>>,
    file: Result<Bytes, BytesRejection>,
) -> Result<ActionOutcome, StatusCode> {
    match file {
        Ok(file) => {
            state
                .request(|reply| UiAction::ImportHistory { file, reply })
                .await
        }
        Err(rejection) => {
            let reason = rejection.body_text();
            state
                .request(|reply| UiAction::RejectImport { reason, reply })
                .await
        }
    }
}

pub async fn reconnect(State(state): State<Arc<AppState>>) -> Result<ActionOutcome, StatusCode> {
    state.request(|reply| UiAction::Reconnect { reply }).await
}

/// Needs `?confirm=true`; without it the caller is asked to confirm
pub async fn power_off(
    Query(query): Query<PowerOffQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<ActionOutcome, StatusCode> {
    state
        .request(|reply| UiAction::PowerOff {
            confirmed: query.confirm,
            reply,
        })
        .await
}

pub async fn dismiss_notice(State(state): State<Arc<AppState>>) -> Result<StatusCode, StatusCode> {
    state.notify(UiAction::DismissNotice).await?;
    Ok(StatusCode::NO_CONTENT)
}
