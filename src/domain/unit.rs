// Temperature units and display conversion
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

pub fn c_to_f(temp: f64) -> f64 {
    temp * 9.0 / 5.0 + 32.0
}

pub fn f_to_c(temp: f64) -> f64 {
    (temp - 32.0) * 5.0 / 9.0
}

/// Holds the current display unit. Every stored temperature is Celsius;
/// this is the only place that knows how to show it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    unit: TemperatureUnit,
}

impl UnitConverter {
    pub fn new(unit: TemperatureUnit) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Returns true if the unit actually changed.
    pub fn set_unit(&mut self, unit: TemperatureUnit) -> bool {
        let changed = self.unit != unit;
        self.unit = unit;
        changed
    }

    pub fn from_celsius(&self, temp_c: f64) -> f64 {
        match self.unit {
            TemperatureUnit::Celsius => temp_c,
            TemperatureUnit::Fahrenheit => c_to_f(temp_c),
        }
    }

    pub fn to_celsius(&self, temp: f64) -> f64 {
        match self.unit {
            TemperatureUnit::Celsius => temp,
            TemperatureUnit::Fahrenheit => f_to_c(temp),
        }
    }

    pub fn display(&self, temp_c: Option<f64>) -> Option<f64> {
        temp_c.map(|t| self.from_celsius(t))
    }
}

/// Formats a display temperature with at most one decimal place,
/// dropping a trailing ".0".
pub fn format_temp(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.1}", rounded)
    }
}
