// Telemetry data domain models
use super::target::TargetConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ten minutes, the span of a freshly reset chart window.
pub const DEFAULT_WINDOW_SPAN_MS: i64 = 10 * 60 * 1000;

/// Growth factor applied when a reading reaches the window's right edge.
const WINDOW_GROWTH: f64 = 1.25;

/// One sample of every probe at a single instant. `None` means the probe
/// reported nothing (unplugged or out of range).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub ts: i64,
    pub probes: Vec<Option<f64>>,
}

impl Reading {
    pub fn new(ts: i64, probes: Vec<Option<f64>>) -> Self {
        Self { ts, probes }
    }

    pub fn has_any_value(&self) -> bool {
        self.probes.iter().any(Option::is_some)
    }
}

/// Everything a single state update carries for the chart.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    pub full_history: bool,
    pub connected: bool,
    pub readings: Vec<Reading>,
    pub targets: BTreeMap<usize, TargetConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub x: i64,
    pub y_display: Option<f64>,
    pub temp_c: Option<f64>,
}

impl DataPoint {
    pub fn new(x: i64, temp_c: Option<f64>, y_display: Option<f64>) -> Self {
        Self {
            x,
            y_display,
            temp_c,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Series {
    pub probe: usize,
    pub name: String,
    pub color: String,
    pub legend_text: String,
    pub points: Vec<DataPoint>,
}

impl Series {
    pub fn new(probe: usize, color: String) -> Self {
        Self {
            probe,
            name: probe_label(probe),
            color,
            legend_text: "N/A".to_string(),
            points: Vec::new(),
        }
    }

    /// True when the last two points share `temp_c` and the incoming value
    /// matches them too, so the flat segment can be stretched.
    pub fn is_flat_at(&self, temp_c: Option<f64>) -> bool {
        match self.points.as_slice() {
            [.., before, last] => last.temp_c == temp_c && before.temp_c == last.temp_c,
            _ => false,
        }
    }

    pub fn last_point_mut(&mut self) -> Option<&mut DataPoint> {
        self.points.last_mut()
    }
}

/// "Probe 1" for index 0.
pub fn probe_label(probe: usize) -> String {
    format!("Probe {}", probe + 1)
}

/// Visible time domain of the chart, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartWindow {
    pub x_min: i64,
    pub x_max: i64,
}

impl ChartWindow {
    pub fn new(x_min: i64, x_max: i64) -> Self {
        Self { x_min, x_max }
    }

    pub fn starting_at(x_min: i64, span_ms: i64) -> Self {
        Self::new(x_min, x_min + span_ms)
    }

    /// Start of a replayed history: the first reading carrying any value,
    /// or `now_ms` if there is none.
    pub fn for_history(readings: &[Reading], span_ms: i64, now_ms: i64) -> Self {
        let x_min = readings
            .iter()
            .find(|r| r.has_any_value())
            .map(|r| r.ts)
            .unwrap_or(now_ms);
        Self::starting_at(x_min, span_ms)
    }

    /// Grows the right edge by a quarter of the current span once `ts`
    /// reaches it. Returns true if the window grew.
    pub fn extend_for(&mut self, ts: i64) -> bool {
        if ts < self.x_max {
            return false;
        }
        let span = (self.x_max - self.x_min) as f64;
        self.x_max = self.x_min + (span * WINDOW_GROWTH).round() as i64;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_grows_by_a_quarter() {
        let mut window = ChartWindow::new(0, 600_000);
        assert!(!window.extend_for(599_999));
        assert!(window.extend_for(600_000));
        assert_eq!(window.x_max, 750_000);
        assert_eq!(window.x_min, 0);
    }

    #[test]
    fn test_window_grows_once_per_call() {
        let mut window = ChartWindow::new(0, 600_000);
        assert!(window.extend_for(10_000_000));
        assert_eq!(window.x_max, 750_000);
    }

    #[test]
    fn test_history_window_skips_empty_readings() {
        let readings = vec![
            Reading::new(1_000, vec![None, None]),
            Reading::new(2_000, vec![None, Some(20.0)]),
        ];
        let window = ChartWindow::for_history(&readings, DEFAULT_WINDOW_SPAN_MS, 99);
        assert_eq!(window, ChartWindow::new(2_000, 2_000 + DEFAULT_WINDOW_SPAN_MS));

        let window = ChartWindow::for_history(&[], DEFAULT_WINDOW_SPAN_MS, 99);
        assert_eq!(window.x_min, 99);
    }

    #[test]
    fn test_flat_check_needs_two_points() {
        let mut series = Series::new(0, "#000".to_string());
        series.points.push(DataPoint::new(1, Some(20.0), Some(20.0)));
        assert!(!series.is_flat_at(Some(20.0)));

        series.points.push(DataPoint::new(2, Some(20.0), Some(20.0)));
        assert!(series.is_flat_at(Some(20.0)));
        assert!(!series.is_flat_at(Some(21.0)));
        assert!(!series.is_flat_at(None));
    }

    #[test]
    fn test_probe_label_is_one_based() {
        assert_eq!(probe_label(0), "Probe 1");
        assert_eq!(Series::new(3, "#fff".into()).name, "Probe 4");
    }
}
