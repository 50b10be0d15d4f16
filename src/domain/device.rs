// Bridge device status as reported in state updates
use serde::Serialize;

/// Battery level the bridge reports while it is on external power.
pub const BATTERY_CHARGING: u32 = 0xffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Disconnected,
    Unknown,
}

impl ConnectionState {
    pub fn from_connected(connected: bool) -> Self {
        if connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "percent", rename_all = "snake_case")]
pub enum BatteryStatus {
    Unknown,
    Charging,
    Low(u32),
    Partial(u32),
    Full(u32),
}

impl BatteryStatus {
    pub fn from_level(level: Option<u32>) -> Self {
        match level {
            None => BatteryStatus::Unknown,
            Some(BATTERY_CHARGING) => BatteryStatus::Charging,
            Some(pct) if pct <= 10 => BatteryStatus::Low(pct),
            Some(pct) if pct >= 90 => BatteryStatus::Full(pct),
            Some(pct) => BatteryStatus::Partial(pct),
        }
    }

    pub fn text(&self) -> String {
        match self {
            BatteryStatus::Unknown | BatteryStatus::Charging => "--".to_string(),
            BatteryStatus::Low(pct) | BatteryStatus::Partial(pct) | BatteryStatus::Full(pct) => {
                format!("{}%", pct)
            }
        }
    }
}
