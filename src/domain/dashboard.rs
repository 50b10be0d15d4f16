// Dashboard domain model - Everything shown around the chart
use super::device::{BatteryStatus, ConnectionState};
use super::telemetry::probe_label;
use super::unit::TemperatureUnit;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeCard {
    pub probe: usize,
    pub label: String,
    pub color: String,
    pub value_text: String,
    pub target_text: String,
}

impl ProbeCard {
    pub fn new(probe: usize, color: String) -> Self {
        Self {
            probe,
            label: probe_label(probe),
            color,
            value_text: "--".to_string(),
            target_text: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub unit: TemperatureUnit,
    pub offline: bool,
    pub connection: ConnectionState,
    pub battery: BatteryStatus,
    pub battery_text: String,
    pub alarm_sounding: bool,
    pub probes: Vec<ProbeCard>,
    /// Dismissible notice, e.g. a rejected history file.
    pub notice: Option<String>,
}

impl Dashboard {
    pub fn new(unit: TemperatureUnit, offline: bool) -> Self {
        let battery = BatteryStatus::Unknown;
        Self {
            unit,
            offline,
            connection: ConnectionState::Unknown,
            battery,
            battery_text: battery.text(),
            alarm_sounding: false,
            probes: Vec::new(),
            notice: None,
        }
    }

    pub fn set_battery(&mut self, battery: BatteryStatus) {
        self.battery = battery;
        self.battery_text = battery.text();
    }

    /// Card for `probe`, created on first use.
    pub fn card_mut(&mut self, probe: usize, color: &str) -> &mut ProbeCard {
        if let Some(pos) = self.probes.iter().position(|c| c.probe == probe) {
            return &mut self.probes[pos];
        }
        self.probes.push(ProbeCard::new(probe, color.to_string()));
        self.probes.sort_by_key(|c| c.probe);
        let pos = self.probes.iter().position(|c| c.probe == probe).unwrap_or(0);
        &mut self.probes[pos]
    }

    pub fn card(&mut self, probe: usize) -> Option<&mut ProbeCard> {
        self.probes.iter_mut().find(|c| c.probe == probe)
    }
}
