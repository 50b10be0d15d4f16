use crate::application::probe_settings::Preset;
use crate::domain::unit::TemperatureUnit;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub server: ServerSettings,
    pub chart: ChartSettings,
    pub ui: UiSettings,
    #[serde(default)]
    pub presets: Vec<Preset>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub url: String,
    pub reconnect_delay_ms: u64,
    pub start_offline: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartSettings {
    pub min_redraw_interval_ms: u64,
    pub retry_delay_ms: u64,
    pub initial_span_minutes: i64,
    pub y_axis_min_c: Option<f64>,
    pub palette: Vec<String>,
    pub default_color: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiSettings {
    pub listen: SocketAddr,
    pub unit: TemperatureUnit,
    pub history_file: Option<PathBuf>,
    /// Largest accepted saved-history upload.
    pub max_upload_bytes: usize,
}

fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("server.url", "ws://127.0.0.1:8080/ws")?
        .set_default("server.reconnect_delay_ms", 1000)?
        .set_default("server.start_offline", false)?
        .set_default("chart.min_redraw_interval_ms", 50)?
        .set_default("chart.retry_delay_ms", 50)?
        .set_default("chart.initial_span_minutes", 10)?
        .set_default("chart.palette", vec!["#357bcc", "#32a852", "#d4872a", "#bdb320"])?
        .set_default("chart.default_color", "#000000")?
        .set_default("ui.listen", "127.0.0.1:3000")?
        .set_default("ui.unit", "F")?
        .set_default("ui.max_upload_bytes", 64_i64 * 1024 * 1024)
}

/// Defaults, then `config/ibbq.*` if present, then `IBBQ__SECTION__KEY`
/// environment overrides.
pub fn load_client_config() -> crate::error::Result<ClientConfig> {
    let settings = defaults()?
        .add_source(config::File::with_name("config/ibbq").required(false))
        .add_source(
            config::Environment::with_prefix("IBBQ")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> ClientConfig {
        defaults()
            .unwrap()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse("");

        assert_eq!(config.server.url, "ws://127.0.0.1:8080/ws");
        assert_eq!(config.server.reconnect_delay_ms, 1000);
        assert!(!config.server.start_offline);
        assert_eq!(config.chart.min_redraw_interval_ms, 50);
        assert_eq!(config.chart.initial_span_minutes, 10);
        assert_eq!(config.chart.palette.len(), 4);
        assert_eq!(config.chart.y_axis_min_c, None);
        assert_eq!(config.ui.unit, TemperatureUnit::Fahrenheit);
        assert_eq!(config.ui.listen.port(), 3000);
        assert_eq!(config.ui.max_upload_bytes, 64 * 1024 * 1024);
        assert!(config.presets.is_empty());
    }

    #[test]
    fn test_file_overrides() {
        let config = parse(
            r##"
            [server]
            url = "ws://ibbq.local/ws"
            start_offline = true

            [chart]
            y_axis_min_c = 0.0
            palette = ["#ff0000"]

            [ui]
            unit = "C"
            history_file = "cook.json"

            [[presets]]
            id = "lamb.medium"
            label = "Lamb - Medium"
            max_c = 60.0
            "##,
        );

        assert_eq!(config.server.url, "ws://ibbq.local/ws");
        assert!(config.server.start_offline);
        assert_eq!(config.server.reconnect_delay_ms, 1000);
        assert_eq!(config.chart.y_axis_min_c, Some(0.0));
        assert_eq!(config.chart.palette, vec!["#ff0000".to_string()]);
        assert_eq!(config.ui.unit, TemperatureUnit::Celsius);
        assert_eq!(config.ui.history_file, Some(PathBuf::from("cook.json")));
        assert_eq!(config.presets[0].id, "lamb.medium");
        assert_eq!(config.presets[0].min_c, None);
    }
}
