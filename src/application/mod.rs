// Application layer - Telemetry state, redraw policy and operator use cases
pub mod alert_coordinator;
pub mod chart_presenter;
pub mod client;
pub mod ports;
pub mod probe_settings;
pub mod reconciler;
