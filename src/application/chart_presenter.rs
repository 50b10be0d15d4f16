// Chart presenter - Builds render frames from the reconciler and rate-limits redraws
use crate::application::ports::ChartSurface;
use crate::application::reconciler::TelemetryReconciler;
use crate::domain::target::Overlay;
use crate::domain::telemetry::ChartWindow;
use crate::domain::unit::TemperatureUnit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio::time::{Duration, Instant};

/// Everything the rendering widget needs for one paint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrame {
    pub unit: TemperatureUnit,
    pub window: ChartWindow,
    pub y_min: Option<f64>,
    pub series: Vec<SeriesFrame>,
    pub strip_lines: Vec<StripLineFrame>,
}

impl ChartFrame {
    pub fn empty(unit: TemperatureUnit, window: ChartWindow) -> Self {
        Self {
            unit,
            window,
            y_min: None,
            series: Vec::new(),
            strip_lines: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesFrame {
    pub probe: usize,
    pub name: String,
    pub color: String,
    pub legend_text: String,
    pub visible: bool,
    /// `(x, y)` pairs; `y` is `None` where the probe reported nothing.
    pub points: Vec<(i64, Option<f64>)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StripLineFrame {
    pub probe: usize,
    pub name: String,
    pub color: String,
    pub label: String,
    pub opacity: f64,
    #[serde(flatten)]
    pub overlay: Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewVisibility {
    pub page_visible: bool,
    pub chart_tab_active: bool,
}

impl ViewVisibility {
    pub fn visible() -> Self {
        Self {
            page_visible: true,
            chart_tab_active: true,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.page_visible && self.chart_tab_active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawOutcome {
    Rendered,
    Deferred,
    Suppressed,
}

#[derive(Debug, Clone)]
pub struct PresenterSettings {
    pub min_interval: Duration,
    pub retry_delay: Duration,
    pub y_axis_min_c: Option<f64>,
}

impl Default for PresenterSettings {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(50),
            retry_delay: Duration::from_millis(50),
            y_axis_min_c: None,
        }
    }
}

pub struct ChartPresenter {
    surface: Box<dyn ChartSurface>,
    min_interval: Duration,
    retry_delay: Duration,
    y_axis_min_c: Option<f64>,
    visibility: ViewVisibility,
    hidden_series: BTreeSet<usize>,
    last_render: Option<Instant>,
    // Single pending redraw; rescheduling replaces it.
    pending: Option<Instant>,
}

impl ChartPresenter {
    pub fn new(surface: Box<dyn ChartSurface>, settings: PresenterSettings) -> Self {
        Self {
            surface,
            min_interval: settings.min_interval,
            retry_delay: settings.retry_delay,
            y_axis_min_c: settings.y_axis_min_c,
            visibility: ViewVisibility::visible(),
            hidden_series: BTreeSet::new(),
            last_render: None,
            pending: None,
        }
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// Redraw unless the last one was less than the minimum interval ago,
    /// in which case a single redraw is scheduled instead.
    pub fn request_redraw(&mut self, model: &TelemetryReconciler, now: Instant) -> RedrawOutcome {
        self.redraw(model, self.min_interval, now)
    }

    /// Redraw now, for changes the operator is waiting to see.
    pub fn force_redraw(&mut self, model: &TelemetryReconciler, now: Instant) -> RedrawOutcome {
        self.redraw(model, Duration::ZERO, now)
    }

    /// Runs the scheduled redraw if its deadline has passed.
    pub fn fire_pending(
        &mut self,
        model: &TelemetryReconciler,
        now: Instant,
    ) -> Option<RedrawOutcome> {
        match self.pending {
            Some(deadline) if deadline <= now => {
                self.pending = None;
                Some(self.request_redraw(model, now))
            }
            _ => None,
        }
    }

    fn redraw(
        &mut self,
        model: &TelemetryReconciler,
        min_interval: Duration,
        now: Instant,
    ) -> RedrawOutcome {
        if !self.visibility.is_visible() {
            return RedrawOutcome::Suppressed;
        }

        if let Some(last) = self.last_render {
            if now.saturating_duration_since(last) < min_interval {
                self.pending = Some(now + self.retry_delay);
                return RedrawOutcome::Deferred;
            }
        }

        self.pending = None;
        self.last_render = Some(now);
        let frame = self.build_frame(model);
        tracing::trace!("Rendering {} series", frame.series.len());
        self.surface.render(frame);
        RedrawOutcome::Rendered
    }

    /// Page visibility or tab focus changed. Anything skipped while hidden
    /// is drawn as soon as the chart shows again.
    pub fn set_visibility(
        &mut self,
        visibility: ViewVisibility,
        model: &TelemetryReconciler,
        now: Instant,
    ) -> Option<RedrawOutcome> {
        if visibility == self.visibility {
            return None;
        }
        self.visibility = visibility;
        if visibility.is_visible() {
            Some(self.force_redraw(model, now))
        } else {
            None
        }
    }

    /// Legend click. Returns the new visibility of the series.
    pub fn toggle_series(&mut self, probe: usize, model: &TelemetryReconciler, now: Instant) -> bool {
        let visible = if self.hidden_series.remove(&probe) {
            true
        } else {
            self.hidden_series.insert(probe);
            false
        };
        self.force_redraw(model, now);
        visible
    }

    /// Sets the y-axis minimum from a value in the current display unit.
    pub fn set_y_axis_min(&mut self, value: Option<f64>, model: &TelemetryReconciler, now: Instant) {
        self.y_axis_min_c = value.map(|v| model.units().to_celsius(v));
        self.force_redraw(model, now);
    }

    pub fn build_frame(&self, model: &TelemetryReconciler) -> ChartFrame {
        let units = model.units();

        let series = model
            .series()
            .iter()
            .map(|s| SeriesFrame {
                probe: s.probe,
                name: s.name.clone(),
                color: s.color.clone(),
                legend_text: s.legend_text.clone(),
                visible: !self.hidden_series.contains(&s.probe),
                points: s.points.iter().map(|p| (p.x, p.y_display)).collect(),
            })
            .collect();

        let strip_lines = model
            .series()
            .iter()
            .zip(model.overlays())
            .map(|(s, overlay)| StripLineFrame {
                probe: s.probe,
                name: format!("{} Target", s.name),
                color: s.color.clone(),
                label: overlay.label(),
                opacity: overlay.opacity(),
                overlay: *overlay,
            })
            .collect();

        ChartFrame {
            unit: units.unit(),
            window: model.window(),
            y_min: self.y_axis_min_c.map(|c| units.from_celsius(c)),
            series,
            strip_lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::reconciler::ReconcilerSettings;
    use crate::domain::target::TargetConfig;
    use crate::domain::telemetry::{Reading, StateSnapshot};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSurface {
        frames: Arc<Mutex<Vec<ChartFrame>>>,
    }

    impl ChartSurface for RecordingSurface {
        fn render(&mut self, frame: ChartFrame) {
            self.frames.lock().unwrap().push(frame);
        }
    }

    fn model() -> TelemetryReconciler {
        let mut rec =
            TelemetryReconciler::new(TemperatureUnit::Celsius, ReconcilerSettings::default(), 0);
        let mut snapshot = StateSnapshot {
            full_history: true,
            connected: true,
            readings: vec![Reading::new(1_000, vec![Some(20.0), Some(100.0)])],
            ..StateSnapshot::default()
        };
        snapshot.targets.insert(1, TargetConfig::new(None, Some(90.0), Some(110.0)));
        rec.apply_state_at(&snapshot, 0);
        rec
    }

    fn presenter(settings: PresenterSettings) -> (ChartPresenter, Arc<Mutex<Vec<ChartFrame>>>) {
        let surface = RecordingSurface::default();
        let frames = surface.frames.clone();
        (ChartPresenter::new(Box::new(surface), settings), frames)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_coalesces_into_one_deferred_redraw() {
        let (mut presenter, frames) = presenter(PresenterSettings::default());
        let model = model();
        let t0 = Instant::now();

        assert_eq!(presenter.request_redraw(&model, t0), RedrawOutcome::Rendered);
        assert_eq!(presenter.request_redraw(&model, t0 + ms(10)), RedrawOutcome::Deferred);
        assert_eq!(presenter.request_redraw(&model, t0 + ms(20)), RedrawOutcome::Deferred);
        assert_eq!(presenter.pending_deadline(), Some(t0 + ms(70)));

        assert_eq!(presenter.fire_pending(&model, t0 + ms(69)), None);
        assert_eq!(
            presenter.fire_pending(&model, t0 + ms(70)),
            Some(RedrawOutcome::Rendered)
        );
        assert_eq!(presenter.pending_deadline(), None);
        assert_eq!(frames.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_forced_redraw_ignores_interval_and_cancels_pending() {
        let (mut presenter, frames) = presenter(PresenterSettings::default());
        let model = model();
        let t0 = Instant::now();

        presenter.request_redraw(&model, t0);
        presenter.request_redraw(&model, t0 + ms(5));
        assert!(presenter.pending_deadline().is_some());

        assert_eq!(presenter.force_redraw(&model, t0 + ms(6)), RedrawOutcome::Rendered);
        assert_eq!(presenter.pending_deadline(), None);
        assert_eq!(frames.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_hidden_view_suppresses_then_catches_up() {
        let (mut presenter, frames) = presenter(PresenterSettings::default());
        let model = model();
        let t0 = Instant::now();

        let hidden = ViewVisibility {
            page_visible: true,
            chart_tab_active: false,
        };
        assert_eq!(presenter.set_visibility(hidden, &model, t0), None);
        assert_eq!(presenter.request_redraw(&model, t0), RedrawOutcome::Suppressed);
        assert!(frames.lock().unwrap().is_empty());

        assert_eq!(
            presenter.set_visibility(ViewVisibility::visible(), &model, t0 + ms(1)),
            Some(RedrawOutcome::Rendered)
        );
        assert_eq!(frames.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_pending_redraw_fired_while_hidden_is_reissued_on_show() {
        let (mut presenter, frames) = presenter(PresenterSettings::default());
        let model = model();
        let t0 = Instant::now();

        presenter.request_redraw(&model, t0);
        presenter.request_redraw(&model, t0 + ms(1));
        let hidden = ViewVisibility {
            page_visible: false,
            chart_tab_active: true,
        };
        presenter.set_visibility(hidden, &model, t0 + ms(2));
        assert_eq!(
            presenter.fire_pending(&model, t0 + ms(60)),
            Some(RedrawOutcome::Suppressed)
        );

        presenter.set_visibility(ViewVisibility::visible(), &model, t0 + ms(500));
        assert_eq!(frames.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_frame_contents() {
        let (presenter, _) = presenter(PresenterSettings::default());
        let frame = presenter.build_frame(&model());

        assert_eq!(frame.series.len(), 2);
        assert_eq!(frame.series[0].points, vec![(1_000, Some(20.0))]);
        assert_eq!(frame.series[1].legend_text, "100°");
        assert_eq!(frame.strip_lines[0].opacity, 0.0);
        assert_eq!(frame.strip_lines[1].label, "90° ~ 110°");
        assert_eq!(frame.strip_lines[1].name, "Probe 2 Target");
        assert_eq!(frame.window, ChartWindow::new(1_000, 601_000));

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["strip_lines"][1]["kind"], "range");
        assert_eq!(json["unit"], "C");
    }

    #[test]
    fn test_axis_minimum_follows_unit() {
        let settings = PresenterSettings {
            y_axis_min_c: Some(0.0),
            ..PresenterSettings::default()
        };
        let (mut presenter, frames) = presenter(settings);
        let mut model = model();
        model.set_unit(TemperatureUnit::Fahrenheit);

        presenter.force_redraw(&model, Instant::now());
        let frame = frames.lock().unwrap()[0].clone();
        assert_eq!(frame.y_min, Some(32.0));
        assert_eq!(frame.series[1].points, vec![(1_000, Some(212.0))]);

        presenter.set_y_axis_min(Some(212.0), &model, Instant::now());
        model.set_unit(TemperatureUnit::Celsius);
        assert_eq!(presenter.build_frame(&model).y_min, Some(100.0));
    }

    #[test]
    fn test_legend_toggle_hides_series() {
        let (mut presenter, frames) = presenter(PresenterSettings::default());
        let model = model();
        let t0 = Instant::now();

        assert!(!presenter.toggle_series(1, &model, t0));
        assert!(!frames.lock().unwrap()[0].series[1].visible);
        assert!(presenter.toggle_series(1, &model, t0));
        assert!(frames.lock().unwrap()[1].series[1].visible);
    }
}
