// JSON messages exchanged with the bridge over the websocket
use crate::domain::target::TargetConfig;
use crate::domain::telemetry::{Reading, StateSnapshot};
use crate::domain::unit::TemperatureUnit;
use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Messages pushed by the bridge
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ServerMessage {
    StateUpdate(StateUpdate),
    UnitUpdate { unit: TemperatureUnit },
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateUpdate {
    pub connected: bool,
    #[serde(default)]
    pub full_history: bool,
    #[serde(default)]
    pub battery_level: Option<u32>,
    #[serde(default)]
    pub probe_readings: Vec<Reading>,
    #[serde(default)]
    pub target_temps: TargetTemps,
    #[serde(default)]
    pub target_temp_alert: bool,
}

/// The bridge keys targets by probe index in a JSON object; older
/// bridges send a sparse array instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TargetTemps {
    Indexed(BTreeMap<String, Option<WireTarget>>),
    Listed(Vec<Option<WireTarget>>),
}

impl Default for TargetTemps {
    fn default() -> Self {
        TargetTemps::Listed(Vec::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireTarget {
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub min_temp: Option<f64>,
    #[serde(default)]
    pub max_temp: Option<f64>,
}

impl From<WireTarget> for TargetConfig {
    fn from(wire: WireTarget) -> Self {
        TargetConfig::new(wire.preset, wire.min_temp, wire.max_temp)
    }
}

impl TargetTemps {
    pub fn into_targets(self) -> BTreeMap<usize, TargetConfig> {
        let entries: Vec<(usize, Option<WireTarget>)> = match self {
            TargetTemps::Indexed(map) => map
                .into_iter()
                .filter_map(|(key, wire)| match key.parse::<usize>() {
                    Ok(probe) => Some((probe, wire)),
                    Err(_) => {
                        tracing::warn!("Ignoring target for non-numeric probe key {:?}", key);
                        None
                    }
                })
                .collect(),
            TargetTemps::Listed(list) => list.into_iter().enumerate().collect(),
        };

        entries
            .into_iter()
            .filter_map(|(probe, wire)| wire.map(|w| (probe, TargetConfig::from(w))))
            .inspect(|(probe, target)| {
                if !target.is_valid() {
                    tracing::warn!(
                        "Probe {} target has a minimum but no maximum; ignoring its bounds",
                        probe
                    );
                }
            })
            .collect()
    }
}

impl StateUpdate {
    pub fn into_snapshot(self) -> StateSnapshot {
        StateSnapshot {
            full_history: self.full_history,
            connected: self.connected,
            readings: self.probe_readings,
            targets: self.target_temps.into_targets(),
        }
    }
}

/// Commands sent to the bridge. Temperatures are always Celsius.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ClientCommand {
    SetProbeTargetTemp {
        probe: usize,
        preset: Option<String>,
        min_temp: Option<f64>,
        max_temp: Option<f64>,
    },
    ClearHistory,
    SetUnit {
        unit: TemperatureUnit,
    },
    SilenceAlarm,
    Poweroff,
}

impl ClientCommand {
    pub fn clear_probe_target(probe: usize) -> Self {
        ClientCommand::SetProbeTargetTemp {
            probe,
            preset: None,
            min_temp: None,
            max_temp: None,
        }
    }

    pub fn to_json(&self) -> String {
        // A tagged enum of plain fields cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Decodes one inbound frame. Commands this client does not know about
/// yield `Ok(None)`.
pub fn parse_server_message(text: &str) -> Result<Option<ServerMessage>> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ClientError::Protocol(e.to_string()))?;

    match value.get("cmd").and_then(|c| c.as_str()) {
        Some("state_update") | Some("unit_update") => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ClientError::Protocol(e.to_string())),
        Some(other) => {
            tracing::debug!("Ignoring unknown command {}", other);
            Ok(None)
        }
        None => Err(ClientError::Protocol("message has no cmd".to_string())),
    }
}
