// Probe target thresholds and their chart overlays
use super::unit::{format_temp, UnitConverter};
use serde::Serialize;

pub const STRIPLINE_TEMP_OPACITY: f64 = 0.5;
pub const STRIPLINE_RANGE_OPACITY: f64 = 0.15;

#[derive(Debug, Clone, PartialEq)]
pub struct TargetConfig {
    pub preset: Option<String>,
    pub min_c: Option<f64>,
    pub max_c: Option<f64>,
}

impl TargetConfig {
    pub fn new(preset: Option<String>, min_c: Option<f64>, max_c: Option<f64>) -> Self {
        Self {
            preset,
            min_c,
            max_c,
        }
    }

    /// A lower bound without an upper bound is not a threshold.
    pub fn is_valid(&self) -> bool {
        !(self.min_c.is_some() && self.max_c.is_none())
    }

    /// Bounds as an overlay shape, in Celsius.
    pub fn bounds(&self) -> Overlay {
        match (self.min_c, self.max_c) {
            (Some(start), Some(end)) => Overlay::Range { start, end },
            (None, Some(value)) => Overlay::Line { value },
            _ => Overlay::Hidden,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    Hidden,
    Line { value: f64 },
    Range { start: f64, end: f64 },
}

impl Overlay {
    /// Derives the display-unit overlay for a probe's target.
    pub fn for_target(target: Option<&TargetConfig>, units: &UnitConverter) -> Self {
        match target.map(TargetConfig::bounds) {
            Some(Overlay::Range { start, end }) => Overlay::Range {
                start: units.from_celsius(start),
                end: units.from_celsius(end),
            },
            Some(Overlay::Line { value }) => Overlay::Line {
                value: units.from_celsius(value),
            },
            _ => Overlay::Hidden,
        }
    }

    pub fn opacity(&self) -> f64 {
        match self {
            Overlay::Hidden => 0.0,
            Overlay::Line { .. } => STRIPLINE_TEMP_OPACITY,
            Overlay::Range { .. } => STRIPLINE_RANGE_OPACITY,
        }
    }

    /// Label drawn next to the strip line on the chart.
    pub fn label(&self) -> String {
        match self {
            Overlay::Hidden => String::new(),
            Overlay::Line { value } => format!("{}°", format_temp(*value)),
            Overlay::Range { start, end } => {
                format!("{}° ~ {}°", format_temp(*start), format_temp(*end))
            }
        }
    }

    /// Target text shown on the probe card.
    pub fn card_text(&self, units: &UnitConverter) -> String {
        let unit = units.unit();
        match self {
            Overlay::Hidden => String::new(),
            Overlay::Line { value } => format!("{}°{}", format_temp(*value), unit),
            Overlay::Range { start, end } => format!(
                "{}°{} ~ {}°{}",
                format_temp(*start),
                unit,
                format_temp(*end),
                unit
            ),
        }
    }
}
