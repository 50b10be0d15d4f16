// View adapters - Publish chart frames and dashboard state for HTTP readers
use crate::application::chart_presenter::ChartFrame;
use crate::application::ports::{AlarmSound, ChartSurface, ProbeObserver};
use crate::domain::dashboard::Dashboard;
use std::sync::Arc;
use tokio::sync::watch;

/// Keeps the latest frame for `GET /chart`.
pub struct WatchChartSurface {
    frames: watch::Sender<ChartFrame>,
}

impl WatchChartSurface {
    pub fn new(frames: watch::Sender<ChartFrame>) -> Self {
        Self { frames }
    }
}

impl ChartSurface for WatchChartSurface {
    fn render(&mut self, frame: ChartFrame) {
        self.frames.send_replace(frame);
    }
}

/// Probe cards on the dashboard.
pub struct ProbeBoard {
    dashboard: Arc<watch::Sender<Dashboard>>,
}

impl ProbeBoard {
    pub fn new(dashboard: Arc<watch::Sender<Dashboard>>) -> Self {
        Self { dashboard }
    }
}

impl ProbeObserver for ProbeBoard {
    fn probe_added(&mut self, probe: usize, color: &str) {
        self.dashboard.send_modify(|d| {
            d.card_mut(probe, color);
        });
    }

    fn current_value(&mut self, probe: usize, text: &str) {
        self.dashboard.send_if_modified(|d| match d.card(probe) {
            Some(card) if card.value_text != text => {
                card.value_text = text.to_string();
                true
            }
            _ => false,
        });
    }

    fn target_changed(&mut self, probe: usize, text: &str) {
        self.dashboard.send_if_modified(|d| match d.card(probe) {
            Some(card) if card.target_text != text => {
                card.target_text = text.to_string();
                true
            }
            _ => false,
        });
    }

    fn reset(&mut self) {
        self.dashboard.send_modify(|d| d.probes.clear());
    }
}

/// Stands in for the looping alarm tone: flags the dashboard so the
/// browser plays it, and logs.
pub struct DashboardAlarm {
    dashboard: Arc<watch::Sender<Dashboard>>,
}

impl DashboardAlarm {
    pub fn new(dashboard: Arc<watch::Sender<Dashboard>>) -> Self {
        Self { dashboard }
    }
}

impl AlarmSound for DashboardAlarm {
    fn start(&mut self) {
        let started = self.dashboard.send_if_modified(|d| !std::mem::replace(&mut d.alarm_sounding, true));
        if started {
            tracing::warn!("Alarm sounding");
        }
    }

    fn stop(&mut self) {
        let stopped = self.dashboard.send_if_modified(|d| std::mem::replace(&mut d.alarm_sounding, false));
        if stopped {
            tracing::info!("Alarm stopped");
        }
    }
}
