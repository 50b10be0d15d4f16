// Alert coordinator - Keeps the alarm UI in step with the bridge's alert flag
use crate::application::ports::{AlarmSound, CommandSink};
use crate::infrastructure::protocol::ClientCommand;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Idle,
    Sounding,
    /// Only held while a server-driven dismissal is being applied, so the
    /// dismissal is not echoed back as a silence command.
    Silencing,
}

pub struct AlertCoordinator {
    state: AlertState,
    sound: Box<dyn AlarmSound>,
}

impl AlertCoordinator {
    pub fn new(sound: Box<dyn AlarmSound>) -> Self {
        Self {
            state: AlertState::Idle,
            sound,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Follows the `target_temp_alert` flag of a state update.
    pub fn on_alert_flag(&mut self, alert: bool, link: &mut dyn CommandSink) {
        match (alert, self.state) {
            (true, AlertState::Idle) => {
                tracing::warn!("Probe target temperature reached");
                self.state = AlertState::Sounding;
                self.sound.start();
            }
            (false, AlertState::Sounding) => {
                tracing::info!("Bridge cleared the temperature alert");
                self.state = AlertState::Silencing;
                self.dismiss(link);
            }
            _ => {}
        }
    }

    /// Operator pressed "silence". Returns true if a silence command went
    /// out to the bridge.
    pub fn silence(&mut self, link: &mut dyn CommandSink) -> bool {
        if self.state != AlertState::Sounding {
            return false;
        }
        self.dismiss(link)
    }

    fn dismiss(&mut self, link: &mut dyn CommandSink) -> bool {
        self.sound.stop();
        let server_driven = self.state == AlertState::Silencing;
        self.state = AlertState::Idle;

        if server_driven {
            return false;
        }
        let sent = link.send(&ClientCommand::SilenceAlarm);
        if !sent {
            tracing::debug!("Alarm silenced locally; bridge not reachable");
        }
        sent
    }
}
