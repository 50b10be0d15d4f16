// Telemetry reconciler - Folds state updates into one time series per probe
use crate::application::ports::ProbeObserver;
use crate::domain::target::{Overlay, TargetConfig};
use crate::domain::telemetry::{
    ChartWindow, DataPoint, Reading, Series, StateSnapshot, DEFAULT_WINDOW_SPAN_MS,
};
use crate::domain::unit::{format_temp, TemperatureUnit, UnitConverter};
use std::collections::BTreeMap;

const CARD_PLACEHOLDER: &str = "--";
const LEGEND_PLACEHOLDER: &str = "N/A";

#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    pub palette: Vec<String>,
    pub default_color: String,
    pub initial_span_ms: i64,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            palette: ["#357bcc", "#32a852", "#d4872a", "#bdb320"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_color: "#000000".to_string(),
            initial_span_ms: DEFAULT_WINDOW_SPAN_MS,
        }
    }
}

/// Sole owner of the series, targets and chart window. Everything else
/// reads them through the accessors below.
pub struct TelemetryReconciler {
    units: UnitConverter,
    settings: ReconcilerSettings,
    series: Vec<Series>,
    targets: BTreeMap<usize, TargetConfig>,
    overlays: Vec<Overlay>,
    window: ChartWindow,
    // Probe counts of the last two readings that appended points. Points
    // only line up across series when both match the incoming reading.
    recent_widths: [Option<usize>; 2],
    observer: Option<Box<dyn ProbeObserver>>,
}

impl TelemetryReconciler {
    pub fn new(unit: TemperatureUnit, settings: ReconcilerSettings, now_ms: i64) -> Self {
        let window = ChartWindow::starting_at(now_ms, settings.initial_span_ms);
        Self {
            units: UnitConverter::new(unit),
            settings,
            series: Vec::new(),
            targets: BTreeMap::new(),
            overlays: Vec::new(),
            window,
            recent_widths: [None, None],
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn ProbeObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn units(&self) -> &UnitConverter {
        &self.units
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn window(&self) -> ChartWindow {
        self.window
    }

    pub fn target(&self, probe: usize) -> Option<&TargetConfig> {
        self.targets.get(&probe)
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// Applies one state update. Returns true if telemetry was ingested,
    /// which is when the chart and the alarm need attention.
    pub fn apply_state(&mut self, snapshot: &StateSnapshot) -> bool {
        self.apply_state_at(snapshot, chrono::Utc::now().timestamp_millis())
    }

    pub fn apply_state_at(&mut self, snapshot: &StateSnapshot, now_ms: i64) -> bool {
        if snapshot.full_history {
            self.reset(&snapshot.readings, now_ms);
        }

        if !(snapshot.full_history || snapshot.connected) {
            tracing::debug!("Bridge not connected to thermometer; skipping readings");
            return false;
        }

        for reading in &snapshot.readings {
            self.append(reading);
        }
        self.apply_targets(&snapshot.targets);

        tracing::debug!(
            "Applied {} readings (full history: {}), {} series",
            snapshot.readings.len(),
            snapshot.full_history,
            self.series.len()
        );
        true
    }

    /// Replaces all telemetry with a saved history, the same way a full
    /// history update does. The file carries no targets.
    pub fn replace_history(&mut self, readings: &[Reading], now_ms: i64) {
        self.reset(readings, now_ms);
        for reading in readings {
            self.append(reading);
        }
        self.refresh_overlays();
    }

    fn reset(&mut self, readings: &[Reading], now_ms: i64) {
        self.series.clear();
        self.targets.clear();
        self.overlays.clear();
        self.recent_widths = [None, None];
        self.window = ChartWindow::for_history(readings, self.settings.initial_span_ms, now_ms);
        if let Some(observer) = self.observer.as_mut() {
            observer.reset();
        }
    }

    pub fn append(&mut self, reading: &Reading) {
        let duplicate = self.is_duplicate(reading);

        for (probe, &temp_c) in reading.probes.iter().enumerate() {
            if self.series.len() <= probe {
                self.create_series(probe);
            }

            let y_display = self.units.display(temp_c);
            let card_text = y_display
                .map(|v| format!("{}°", format_temp(v)))
                .unwrap_or_else(|| CARD_PLACEHOLDER.to_string());

            let series = &mut self.series[probe];
            series.legend_text = legend_text(y_display);

            if duplicate {
                if let Some(last) = series.last_point_mut() {
                    last.x = reading.ts;
                }
            } else {
                series.points.push(DataPoint::new(reading.ts, temp_c, y_display));
            }

            if let Some(observer) = self.observer.as_mut() {
                observer.current_value(probe, &card_text);
            }
        }

        if !duplicate && !reading.probes.is_empty() {
            self.recent_widths = [self.recent_widths[1], Some(reading.probes.len())];
        }

        self.window.extend_for(reading.ts);
    }

    // Stretching the last point is only safe when every series is flat at
    // the incoming value and the last two appends had this same width.
    fn is_duplicate(&self, reading: &Reading) -> bool {
        let width = reading.probes.len();
        width > 0
            && self.series.len() == width
            && self.recent_widths == [Some(width), Some(width)]
            && self
                .series
                .iter()
                .zip(&reading.probes)
                .all(|(series, temp_c)| series.is_flat_at(*temp_c))
    }

    fn create_series(&mut self, probe: usize) {
        let color = self.color_for(probe);
        tracing::info!("New probe {} (color {})", probe + 1, color);

        if let Some(observer) = self.observer.as_mut() {
            observer.probe_added(probe, &color);
        }
        self.series.push(Series::new(probe, color));
        self.overlays.push(Overlay::Hidden);
    }

    fn color_for(&self, probe: usize) -> String {
        if self.settings.palette.is_empty() {
            return self.settings.default_color.clone();
        }
        self.settings.palette[probe % self.settings.palette.len()].clone()
    }

    fn apply_targets(&mut self, targets: &BTreeMap<usize, TargetConfig>) {
        for probe in 0..self.series.len() {
            match targets.get(&probe) {
                Some(target) => {
                    self.targets.insert(probe, target.clone());
                }
                None => {
                    self.targets.remove(&probe);
                }
            }
        }

        if let Some((&probe, _)) = targets.range(self.series.len()..).next() {
            tracing::debug!("Ignoring targets from probe {} on; no readings yet", probe + 1);
        }

        self.refresh_overlays();
    }

    fn refresh_overlays(&mut self) {
        self.overlays = (0..self.series.len())
            .map(|probe| Overlay::for_target(self.targets.get(&probe), &self.units))
            .collect();

        if let Some(observer) = self.observer.as_mut() {
            for (probe, overlay) in self.overlays.iter().enumerate() {
                observer.target_changed(probe, &overlay.card_text(&self.units));
            }
        }
    }

    /// Switches the display unit, recomputing every stored point in place.
    /// Returns false if the unit was already current.
    pub fn set_unit(&mut self, unit: TemperatureUnit) -> bool {
        if !self.units.set_unit(unit) {
            return false;
        }

        for series in &mut self.series {
            for point in &mut series.points {
                point.y_display = self.units.display(point.temp_c);
            }
            let last = series.points.last().and_then(|p| p.y_display);
            series.legend_text = legend_text(last);

            if let Some(observer) = self.observer.as_mut() {
                let text = last
                    .map(|v| format!("{}°", format_temp(v)))
                    .unwrap_or_else(|| CARD_PLACEHOLDER.to_string());
                observer.current_value(series.probe, &text);
            }
        }

        self.refresh_overlays();
        tracing::info!("Display unit is now {}", unit);
        true
    }

    /// Rebuilds one reading per distinct timestamp from the stored points,
    /// ordered by time. Probes without a point at a timestamp are `None`.
    pub fn export_readings(&self) -> Vec<Reading> {
        let width = self.series.len();
        let mut rows: BTreeMap<i64, Vec<Option<f64>>> = BTreeMap::new();

        for (probe, series) in self.series.iter().enumerate() {
            for point in &series.points {
                rows.entry(point.x).or_insert_with(|| vec![None; width])[probe] = point.temp_c;
            }
        }

        rows.into_iter()
            .map(|(ts, probes)| Reading::new(ts, probes))
            .collect()
    }
}

fn legend_text(y_display: Option<f64>) -> String {
    y_display
        .map(|v| format!("{}°", format_temp(v)))
        .unwrap_or_else(|| LEGEND_PLACEHOLDER.to_string())
}
