// Client controller - Sole owner of telemetry state, driven by bridge events and operator actions
use crate::application::alert_coordinator::{AlertCoordinator, AlertState};
use crate::application::chart_presenter::{ChartPresenter, ViewVisibility};
use crate::application::ports::{CommandSink, SessionControl};
use crate::application::probe_settings::{FieldErrors, ProbeSettingsEditor, ProbeSettingsForm};
use crate::application::reconciler::TelemetryReconciler;
use crate::domain::dashboard::Dashboard;
use crate::domain::device::{BatteryStatus, ConnectionState};
use crate::domain::telemetry::Reading;
use crate::domain::unit::TemperatureUnit;
use crate::infrastructure::history_file::{parse_saved_history, SavedHistory};
use crate::infrastructure::protocol::{
    parse_server_message, ClientCommand, ServerMessage, StateUpdate,
};
use crate::infrastructure::transport::TransportEvent;
use bytes::Bytes;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

pub const INVALID_FILE_NOTICE: &str = "Invalid data file.";

pub type Reply<T> = oneshot::Sender<T>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The command went out to the bridge.
    Sent,
    NotConnected,
    Invalid { errors: FieldErrors },
    ConfirmationRequired,
    Rejected { reason: String },
    /// Applied locally.
    Done,
    /// Nothing to do in the current state.
    Ignored,
}

impl ActionOutcome {
    fn from_sent(sent: bool) -> Self {
        if sent {
            ActionOutcome::Sent
        } else {
            ActionOutcome::NotConnected
        }
    }
}

/// Operator input, forwarded from the presentation layer.
#[derive(Debug)]
pub enum UiAction {
    SilenceAlarm {
        reply: Reply<ActionOutcome>,
    },
    SetUnit {
        unit: TemperatureUnit,
        reply: Reply<ActionOutcome>,
    },
    OpenProbeSettings {
        probe: usize,
        reply: Reply<ProbeSettingsForm>,
    },
    SelectPreset {
        form: ProbeSettingsForm,
        preset: String,
        reply: Reply<ProbeSettingsForm>,
    },
    SaveProbeSettings {
        form: ProbeSettingsForm,
        reply: Reply<ActionOutcome>,
    },
    ClearProbeSettings {
        probe: usize,
        reply: Reply<ActionOutcome>,
    },
    ClearHistory {
        reply: Reply<ActionOutcome>,
    },
    PowerOff {
        confirmed: bool,
        reply: Reply<ActionOutcome>,
    },
    Reconnect {
        reply: Reply<ActionOutcome>,
    },
    ImportHistory {
        file: Bytes,
        reply: Reply<ActionOutcome>,
    },
    /// The upload never arrived in one piece (too large, aborted).
    RejectImport {
        reason: String,
        reply: Reply<ActionOutcome>,
    },
    ExportHistory {
        reply: Reply<SavedHistory>,
    },
    ToggleSeries {
        probe: usize,
        reply: Reply<bool>,
    },
    SetYAxisMin {
        value: Option<f64>,
    },
    SetVisibility(ViewVisibility),
    DismissNotice,
}

pub struct BbqClient<L> {
    reconciler: TelemetryReconciler,
    presenter: ChartPresenter,
    alerts: AlertCoordinator,
    editor: ProbeSettingsEditor,
    link: L,
    dashboard: Arc<watch::Sender<Dashboard>>,
    /// Events already queued by the transport are dropped while set.
    offline: bool,
}

impl<L: CommandSink + SessionControl> BbqClient<L> {
    pub fn new(
        reconciler: TelemetryReconciler,
        presenter: ChartPresenter,
        alerts: AlertCoordinator,
        editor: ProbeSettingsEditor,
        link: L,
        dashboard: Arc<watch::Sender<Dashboard>>,
    ) -> Self {
        let offline = dashboard.borrow().offline;
        Self {
            reconciler,
            presenter,
            alerts,
            editor,
            link,
            dashboard,
            offline,
        }
    }

    #[cfg(test)]
    pub fn reconciler(&self) -> &TelemetryReconciler {
        &self.reconciler
    }

    #[cfg(test)]
    pub fn alert_state(&self) -> AlertState {
        self.alerts.state()
    }

    pub fn on_transport_event(&mut self, event: TransportEvent, now: Instant) {
        if self.offline && !matches!(event, TransportEvent::Close { .. }) {
            tracing::debug!("Offline; dropping queued transport event");
            return;
        }
        match event {
            TransportEvent::Open => {
                self.presenter.request_redraw(&self.reconciler, now);
            }
            TransportEvent::Close { new_disconnect } => {
                self.dashboard
                    .send_modify(|d| d.connection = ConnectionState::Unknown);
                if new_disconnect {
                    self.presenter.request_redraw(&self.reconciler, now);
                }
            }
            TransportEvent::Message(text) => match parse_server_message(&text) {
                Ok(Some(message)) => self.on_server_message(message, now),
                Ok(None) => {}
                Err(e) => tracing::warn!("Dropping message from bridge: {}", e),
            },
        }
    }

    pub fn on_server_message(&mut self, message: ServerMessage, now: Instant) {
        match message {
            ServerMessage::StateUpdate(update) => self.on_state_update(update, now),
            ServerMessage::UnitUpdate { unit } => {
                self.apply_unit(unit, now);
            }
        }
    }

    fn on_state_update(&mut self, update: StateUpdate, now: Instant) {
        let connection = ConnectionState::from_connected(update.connected);
        let battery = BatteryStatus::from_level(update.battery_level);
        self.dashboard.send_modify(|d| {
            d.connection = connection;
            d.set_battery(battery);
        });

        let alert = update.target_temp_alert;
        if self.reconciler.apply_state(&update.into_snapshot()) {
            self.presenter.request_redraw(&self.reconciler, now);
            self.alerts.on_alert_flag(alert, &mut self.link);
        }
    }

    fn apply_unit(&mut self, unit: TemperatureUnit, now: Instant) -> bool {
        if !self.reconciler.set_unit(unit) {
            return false;
        }
        self.dashboard.send_modify(|d| d.unit = unit);
        self.presenter.force_redraw(&self.reconciler, now);
        true
    }

    pub fn handle_action(&mut self, action: UiAction, now: Instant) {
        match action {
            UiAction::SilenceAlarm { reply } => {
                let outcome = if self.alerts.state() == AlertState::Sounding {
                    ActionOutcome::from_sent(self.alerts.silence(&mut self.link))
                } else {
                    ActionOutcome::Ignored
                };
                let _ = reply.send(outcome);
            }
            UiAction::SetUnit { unit, reply } => {
                self.apply_unit(unit, now);
                let sent = self.link.send(&ClientCommand::SetUnit { unit });
                let _ = reply.send(ActionOutcome::from_sent(sent));
            }
            UiAction::OpenProbeSettings { probe, reply } => {
                let form = self.editor.open(
                    probe,
                    self.reconciler.target(probe),
                    self.reconciler.units(),
                );
                let _ = reply.send(form);
            }
            UiAction::SelectPreset {
                mut form,
                preset,
                reply,
            } => {
                self.editor
                    .select_preset(&mut form, &preset, self.reconciler.units());
                let _ = reply.send(form);
            }
            UiAction::SaveProbeSettings { form, reply } => {
                let outcome = match self.editor.submit(&form, self.reconciler.units()) {
                    Ok(command) => self.send_connected(&command),
                    Err(errors) => ActionOutcome::Invalid { errors },
                };
                let _ = reply.send(outcome);
            }
            UiAction::ClearProbeSettings { probe, reply } => {
                let command = self.editor.clear(probe);
                let _ = reply.send(self.send_connected(&command));
            }
            UiAction::ClearHistory { reply } => {
                let _ = reply.send(self.send_connected(&ClientCommand::ClearHistory));
            }
            UiAction::PowerOff { confirmed, reply } => {
                let outcome = if !self.link.is_connected() {
                    ActionOutcome::NotConnected
                } else if !confirmed {
                    ActionOutcome::ConfirmationRequired
                } else {
                    tracing::warn!("Powering off the bridge");
                    ActionOutcome::from_sent(self.link.send(&ClientCommand::Poweroff))
                };
                let _ = reply.send(outcome);
            }
            UiAction::Reconnect { reply } => {
                let went_online = self.link.go_online();
                let was_offline = std::mem::replace(&mut self.offline, false);
                let outcome = if went_online || was_offline {
                    self.dashboard.send_modify(|d| d.offline = false);
                    ActionOutcome::Done
                } else {
                    ActionOutcome::Ignored
                };
                let _ = reply.send(outcome);
            }
            UiAction::ImportHistory { file, reply } => {
                let _ = reply.send(self.import_history(&file, now));
            }
            UiAction::RejectImport { reason, reply } => {
                let _ = reply.send(self.reject_import(reason));
            }
            UiAction::ExportHistory { reply } => {
                let saved = SavedHistory::from_readings(&self.reconciler.export_readings());
                let _ = reply.send(saved);
            }
            UiAction::ToggleSeries { probe, reply } => {
                let visible = self.presenter.toggle_series(probe, &self.reconciler, now);
                let _ = reply.send(visible);
            }
            UiAction::SetYAxisMin { value } => {
                self.presenter.set_y_axis_min(value, &self.reconciler, now);
            }
            UiAction::SetVisibility(visibility) => {
                self.presenter
                    .set_visibility(visibility, &self.reconciler, now);
            }
            UiAction::DismissNotice => {
                self.dashboard.send_modify(|d| d.notice = None);
            }
        }
    }

    fn send_connected(&mut self, command: &ClientCommand) -> ActionOutcome {
        if !self.link.is_connected() {
            return ActionOutcome::NotConnected;
        }
        ActionOutcome::from_sent(self.link.send(command))
    }

    /// Validates a saved-history upload before touching any state.
    pub fn import_history(&mut self, file: &[u8], now: Instant) -> ActionOutcome {
        match parse_saved_history(file) {
            Ok(readings) => {
                self.load_history(&readings, now);
                ActionOutcome::Done
            }
            Err(e) => self.reject_import(e.to_string()),
        }
    }

    fn reject_import(&mut self, reason: String) -> ActionOutcome {
        tracing::warn!("Rejected saved history file: {}", reason);
        self.dashboard
            .send_modify(|d| d.notice = Some(INVALID_FILE_NOTICE.to_string()));
        ActionOutcome::Rejected { reason }
    }

    /// Goes Offline and shows `readings` in place of the live history.
    pub fn load_history(&mut self, readings: &[Reading], now: Instant) {
        self.link.go_offline();
        self.offline = true;
        self.dashboard.send_modify(|d| d.offline = true);
        self.reconciler
            .replace_history(readings, chrono::Utc::now().timestamp_millis());
        self.presenter.force_redraw(&self.reconciler, now);
        tracing::info!("Loaded {} saved readings", readings.len());
    }

    /// Event loop. Returns when `shutdown` resolves or either input closes.
    pub async fn run<F>(
        mut self,
        mut events: mpsc::Receiver<TransportEvent>,
        mut actions: mpsc::Receiver<UiAction>,
        shutdown: F,
    ) where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let deadline = self.presenter.pending_deadline();
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.on_transport_event(event, Instant::now()),
                    None => {
                        tracing::info!("Transport stopped; client exiting");
                        break;
                    }
                },
                action = actions.recv() => match action {
                    Some(action) => self.handle_action(action, Instant::now()),
                    None => {
                        tracing::info!("Operator surface closed; client exiting");
                        break;
                    }
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.presenter.fire_pending(&self.reconciler, Instant::now());
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutting down client");
                    break;
                }
            }
        }
    }
}
