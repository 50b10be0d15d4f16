// Probe settings editor - Validates per-probe target input and builds commands
use crate::domain::target::TargetConfig;
use crate::domain::unit::UnitConverter;
use crate::infrastructure::protocol::ClientCommand;
use serde::{Deserialize, Serialize};

/// Single ceiling entered by hand.
pub const PRESET_CUSTOM_TEMP: &str = "custom.temp";
/// Min/max range entered by hand.
pub const PRESET_CUSTOM_RANGE: &str = "custom.range";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub min_c: Option<f64>,
    pub max_c: f64,
}

impl Preset {
    fn new(id: &str, label: &str, min_c: Option<f64>, max_c: f64) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            min_c,
            max_c,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PresetCatalog {
    presets: Vec<Preset>,
}

impl PresetCatalog {
    pub fn new(presets: Vec<Preset>) -> Self {
        Self { presets }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            Preset::new("beef.rare", "Beef - Rare", None, 52.0),
            Preset::new("beef.medium_rare", "Beef - Medium Rare", None, 57.0),
            Preset::new("beef.medium", "Beef - Medium", None, 63.0),
            Preset::new("beef.well_done", "Beef - Well Done", None, 71.0),
            Preset::new("beef.brisket", "Beef - Brisket", Some(90.0), 96.0),
            Preset::new("pork.chop", "Pork - Chop", None, 63.0),
            Preset::new("pork.pulled", "Pork - Pulled", Some(91.0), 96.0),
            Preset::new("poultry", "Poultry", None, 74.0),
            Preset::new("fish", "Fish", None, 63.0),
            Preset::new("smoker.low_slow", "Smoker - Low & Slow", Some(107.0), 121.0),
        ])
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }
}

/// The settings dialog for one probe. Bounds are raw text in the display
/// unit, exactly as typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSettingsForm {
    pub probe: usize,
    /// Empty when no preset is selected.
    pub preset: String,
    pub min_input: String,
    pub max_input: String,
    pub min_enabled: bool,
    pub max_enabled: bool,
}

/// Which fields are flagged invalid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    pub preset: bool,
    pub min: bool,
    pub max: bool,
}

pub struct ProbeSettingsEditor {
    catalog: PresetCatalog,
}

impl ProbeSettingsEditor {
    pub fn new(catalog: PresetCatalog) -> Self {
        Self { catalog }
    }

    /// Opens the dialog pre-filled from the probe's current target.
    pub fn open(
        &self,
        probe: usize,
        target: Option<&TargetConfig>,
        units: &UnitConverter,
    ) -> ProbeSettingsForm {
        let show = |c: Option<f64>| c.map(|c| display_int(c, units)).unwrap_or_default();

        let mut form = ProbeSettingsForm {
            probe,
            preset: String::new(),
            min_input: show(target.and_then(|t| t.min_c)),
            max_input: show(target.and_then(|t| t.max_c)),
            min_enabled: false,
            max_enabled: false,
        };
        let preset = target.and_then(|t| t.preset.clone()).unwrap_or_default();
        self.select_preset(&mut form, &preset, units);
        form
    }

    /// Applies a preset choice to the form's bound fields.
    pub fn select_preset(&self, form: &mut ProbeSettingsForm, preset: &str, units: &UnitConverter) {
        if preset == PRESET_CUSTOM_TEMP {
            form.preset = preset.to_string();
            form.min_enabled = false;
            form.min_input.clear();
            form.max_enabled = true;
        } else if preset == PRESET_CUSTOM_RANGE {
            form.preset = preset.to_string();
            form.min_enabled = true;
            form.max_enabled = true;
        } else if let Some(found) = self.catalog.get(preset) {
            form.preset = preset.to_string();
            form.min_enabled = false;
            form.min_input = found.min_c.map(|c| display_int(c, units)).unwrap_or_default();
            form.max_enabled = false;
            form.max_input = display_int(found.max_c, units);
        } else {
            form.preset.clear();
            form.min_enabled = false;
            form.min_input.clear();
            form.max_enabled = false;
            form.max_input.clear();
        }
    }

    /// Checks every field before giving up, so all problems are flagged at
    /// once. Returns the preset and the bounds in the display unit.
    ///
    /// Which bounds are editable comes from the preset; the form's own
    /// `*_enabled` flags are ignored, and catalogue presets always submit
    /// their catalogue bounds.
    pub fn validate(
        &self,
        form: &ProbeSettingsForm,
        units: &UnitConverter,
    ) -> Result<(String, Option<i64>, i64), FieldErrors> {
        let mut form = form.clone();
        let preset = form.preset.clone();
        self.select_preset(&mut form, &preset, units);

        let mut errors = FieldErrors::default();
        if form.preset.is_empty() {
            errors.preset = true;
        }

        let min = parse_int(&form.min_input);
        if form.min_enabled && min.is_none() {
            errors.min = true;
        }

        let max = parse_int(&form.max_input);
        match (min, max) {
            (_, None) => errors.max = true,
            (Some(min), Some(max)) if min >= max => errors.max = true,
            _ => {}
        }

        match max {
            Some(max) if errors == FieldErrors::default() => Ok((form.preset.clone(), min, max)),
            _ => Err(errors),
        }
    }

    /// Builds the command for a valid form, converting bounds to Celsius.
    pub fn submit(
        &self,
        form: &ProbeSettingsForm,
        units: &UnitConverter,
    ) -> Result<ClientCommand, FieldErrors> {
        let (preset, min, max) = self.validate(form, units)?;
        Ok(ClientCommand::SetProbeTargetTemp {
            probe: form.probe,
            preset: Some(preset),
            min_temp: min.map(|m| units.to_celsius(m as f64)),
            max_temp: Some(units.to_celsius(max as f64)),
        })
    }

    pub fn clear(&self, probe: usize) -> ClientCommand {
        ClientCommand::clear_probe_target(probe)
    }
}

fn parse_int(input: &str) -> Option<i64> {
    input.trim().parse().ok()
}

fn display_int(temp_c: f64, units: &UnitConverter) -> String {
    (units.from_celsius(temp_c).round() as i64).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::unit::TemperatureUnit;

    fn editor() -> ProbeSettingsEditor {
        ProbeSettingsEditor::new(PresetCatalog::builtin())
    }

    fn celsius() -> UnitConverter {
        UnitConverter::new(TemperatureUnit::Celsius)
    }

    fn fahrenheit() -> UnitConverter {
        UnitConverter::new(TemperatureUnit::Fahrenheit)
    }

    #[test]
    fn test_range_preset_requires_min() {
        let editor = editor();
        let mut form = editor.open(0, None, &celsius());
        editor.select_preset(&mut form, PRESET_CUSTOM_RANGE, &celsius());
        form.min_input = String::new();
        form.max_input = "70".to_string();

        let errors = editor.validate(&form, &celsius()).unwrap_err();
        assert_eq!(
            errors,
            FieldErrors {
                preset: false,
                min: true,
                max: false
            }
        );
    }

    #[test]
    fn test_range_preset_requires_min_whatever_the_flags_say() {
        let form = ProbeSettingsForm {
            probe: 0,
            preset: PRESET_CUSTOM_RANGE.into(),
            min_input: "".into(),
            max_input: "70".into(),
            min_enabled: false,
            max_enabled: true,
        };
        let errors = editor().validate(&form, &celsius()).unwrap_err();
        assert_eq!(
            errors,
            FieldErrors {
                preset: false,
                min: true,
                max: false
            }
        );
    }

    #[test]
    fn test_catalogue_preset_ignores_typed_bounds() {
        let form = ProbeSettingsForm {
            probe: 0,
            preset: "beef.rare".into(),
            min_input: "10".into(),
            max_input: "500".into(),
            min_enabled: true,
            max_enabled: true,
        };
        assert_eq!(
            editor().submit(&form, &celsius()).unwrap(),
            ClientCommand::SetProbeTargetTemp {
                probe: 0,
                preset: Some("beef.rare".into()),
                min_temp: None,
                max_temp: Some(52.0),
            }
        );
    }

    #[test]
    fn test_custom_temp_drops_a_typed_min() {
        let form = ProbeSettingsForm {
            probe: 0,
            preset: PRESET_CUSTOM_TEMP.into(),
            min_input: "90".into(),
            max_input: "70".into(),
            min_enabled: true,
            max_enabled: true,
        };
        assert_eq!(
            editor().validate(&form, &celsius()).unwrap(),
            (PRESET_CUSTOM_TEMP.to_string(), None, 70)
        );
    }

    #[test]
    fn test_errors_flagged_together() {
        let editor = editor();
        let form = ProbeSettingsForm {
            probe: 1,
            preset: PRESET_CUSTOM_RANGE.into(),
            min_input: "abc".into(),
            max_input: "".into(),
            min_enabled: true,
            max_enabled: true,
        };
        assert_eq!(
            editor.validate(&form, &celsius()).unwrap_err(),
            FieldErrors {
                preset: false,
                min: true,
                max: true
            }
        );

        let form = ProbeSettingsForm {
            preset: String::new(),
            ..form
        };
        assert_eq!(
            editor.validate(&form, &celsius()).unwrap_err(),
            FieldErrors {
                preset: true,
                min: false,
                max: true
            }
        );
    }

    #[test]
    fn test_max_must_exceed_min() {
        let editor = editor();
        let mut form = editor.open(0, None, &celsius());
        editor.select_preset(&mut form, PRESET_CUSTOM_RANGE, &celsius());
        form.min_input = "70".into();
        form.max_input = "70".into();

        let errors = editor.validate(&form, &celsius()).unwrap_err();
        assert!(errors.max);
        assert!(!errors.min);
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let editor = editor();
        let mut form = editor.open(0, None, &celsius());
        form.preset = "tofu".into();
        form.max_input = "70".into();
        assert!(editor.validate(&form, &celsius()).unwrap_err().preset);
    }

    #[test]
    fn test_custom_temp_submits_ceiling_in_celsius() {
        let editor = editor();
        let units = fahrenheit();
        let mut form = editor.open(3, None, &units);
        editor.select_preset(&mut form, PRESET_CUSTOM_TEMP, &units);
        assert!(!form.min_enabled);
        assert!(form.max_enabled);
        form.max_input = " 212 ".into();

        assert_eq!(
            editor.submit(&form, &units).unwrap(),
            ClientCommand::SetProbeTargetTemp {
                probe: 3,
                preset: Some(PRESET_CUSTOM_TEMP.into()),
                min_temp: None,
                max_temp: Some(100.0),
            }
        );
    }

    #[test]
    fn test_catalogue_preset_fills_and_locks_bounds() {
        let editor = editor();
        let units = fahrenheit();
        let mut form = editor.open(0, None, &units);
        editor.select_preset(&mut form, "pork.pulled", &units);

        assert!(!form.min_enabled && !form.max_enabled);
        assert_eq!(form.min_input, "196");
        assert_eq!(form.max_input, "205");

        let ClientCommand::SetProbeTargetTemp { min_temp, max_temp, .. } =
            editor.submit(&form, &units).unwrap()
        else {
            panic!("expected a target command");
        };
        assert!((min_temp.unwrap() - 91.11).abs() < 0.01);
        assert!((max_temp.unwrap() - 96.11).abs() < 0.01);
    }

    #[test]
    fn test_open_prefills_from_current_target() {
        let editor = editor();
        let target = TargetConfig::new(Some(PRESET_CUSTOM_RANGE.into()), Some(50.0), Some(70.0));
        let form = editor.open(2, Some(&target), &celsius());

        assert_eq!(form.preset, PRESET_CUSTOM_RANGE);
        assert_eq!(form.min_input, "50");
        assert_eq!(form.max_input, "70");
        assert!(form.min_enabled && form.max_enabled);
        assert!(editor.validate(&form, &celsius()).is_ok());
    }

    #[test]
    fn test_no_preset_clears_bounds() {
        let editor = editor();
        let target = TargetConfig::new(None, None, Some(70.0));
        let form = editor.open(0, Some(&target), &celsius());
        assert_eq!(form.preset, "");
        assert_eq!(form.max_input, "");
        assert!(!form.max_enabled);
    }

    #[test]
    fn test_clear_sends_all_nulls() {
        assert_eq!(
            editor().clear(1),
            ClientCommand::SetProbeTargetTemp {
                probe: 1,
                preset: None,
                min_temp: None,
                max_temp: None,
            }
        );
    }
}
