use super::driver::{CollisionPolicy, SourceSelector, TransformSpec};
use super::formula::Formula;
use super::position::ColumnPosition;
use crate::error::KolonaError;
use serde::{Deserialize, Serialize};
use std::path::Path;

const BGN_EUR_JSON: &str = include_str!("../../../../presets/bgn-eur.json");
const EUR_BGN_JSON: &str = include_str!("../../../../presets/eur-bgn.json");

/// Built-in presets, by name.
pub const PRESETS: &[&str] = &["bgn-eur", "eur-bgn"];

/// A saved set of transform parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preset {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Source field counted from the right. Exclusive with `source_column`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_column: Option<String>,
    pub formula: String,
    pub column: String,
}

impl Preset {
    /// Transform parameters for this preset. The preset must already be valid.
    pub fn to_spec(&self, on_collision: CollisionPolicy) -> Result<TransformSpec, KolonaError> {
        let source = match (&self.position, &self.source_column) {
            (Some(p), None) => SourceSelector::Position(ColumnPosition::new(*p)?),
            (None, Some(name)) => SourceSelector::Column(name.clone()),
            _ => {
                return Err(KolonaError::PresetInvalid(format!(
                    "preset '{}' must set exactly one of position or source_column",
                    self.name
                )))
            }
        };
        Ok(TransformSpec {
            source,
            formula: self.formula.clone(),
            column: self.column.clone(),
            on_collision,
        })
    }
}

/// Load a built-in preset by name.
pub fn load_preset(name: &str) -> Result<Preset, KolonaError> {
    let json = match name {
        "bgn-eur" => BGN_EUR_JSON,
        "eur-bgn" => EUR_BGN_JSON,
        _ => {
            return Err(KolonaError::PresetInvalid(format!(
                "unknown preset '{}'. Available: {}",
                name,
                PRESETS.join(", ")
            )))
        }
    };
    parse_preset_str(json)
}

/// Load a preset from a JSON file.
pub fn load_preset_file(path: &Path) -> Result<Preset, KolonaError> {
    let content = std::fs::read_to_string(path).map_err(|e| KolonaError::PresetLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let preset: Preset = serde_json::from_str(&content).map_err(|e| KolonaError::PresetLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_preset(&preset)?;
    Ok(preset)
}

pub fn parse_preset_str(json: &str) -> Result<Preset, KolonaError> {
    let preset: Preset = serde_json::from_str(json)?;
    validate_preset(&preset)?;
    Ok(preset)
}

/// Check that a preset can be turned into a transform.
pub fn validate_preset(preset: &Preset) -> Result<(), KolonaError> {
    if preset.name.trim().is_empty() {
        return Err(KolonaError::PresetInvalid("name must not be empty".into()));
    }

    if preset.column.trim().is_empty() {
        return Err(KolonaError::PresetInvalid(format!(
            "preset '{}' has an empty column name",
            preset.name
        )));
    }

    match (preset.position, &preset.source_column) {
        (Some(0), _) => {
            return Err(KolonaError::PresetInvalid(format!(
                "preset '{}': positions start at 1",
                preset.name
            )))
        }
        (Some(_), Some(_)) | (None, None) => {
            return Err(KolonaError::PresetInvalid(format!(
                "preset '{}' must set exactly one of position or source_column",
                preset.name
            )))
        }
        (None, Some(col)) if col.trim().is_empty() => {
            return Err(KolonaError::PresetInvalid(format!(
                "preset '{}' has an empty source_column",
                preset.name
            )))
        }
        _ => {}
    }

    Formula::parse(&preset.formula).map_err(|e| {
        KolonaError::PresetInvalid(format!("preset '{}': {}", preset.name, e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_presets_load() {
        for name in PRESETS {
            let preset = load_preset(name).unwrap();
            assert_eq!(&preset.name, name);
        }
    }

    #[test]
    fn test_bgn_eur_defaults() {
        let preset = load_preset("bgn-eur").unwrap();
        assert_eq!(preset.position, Some(3));
        assert_eq!(preset.formula, "x / 1.95583");
        assert_eq!(preset.column, "Цена в евро");

        let spec = preset.to_spec(CollisionPolicy::Reject).unwrap();
        assert_eq!(
            spec.source,
            SourceSelector::Position(ColumnPosition::new(3).unwrap())
        );
    }

    #[test]
    fn test_unknown_preset() {
        assert!(load_preset("usd").is_err());
    }

    #[test]
    fn test_source_column_preset() {
        let json = r#"{
            "name": "vat",
            "source_column": "Цена без ДДС",
            "formula": "x * 1.2",
            "column": "Цена с ДДС"
        }"#;
        let preset = parse_preset_str(json).unwrap();
        let spec = preset.to_spec(CollisionPolicy::Replace).unwrap();
        assert_eq!(spec.source, SourceSelector::Column("Цена без ДДС".into()));
        assert_eq!(spec.on_collision, CollisionPolicy::Replace);
    }

    #[test]
    fn test_both_sources_rejected() {
        let json = r#"{
            "name": "bad", "position": 1, "source_column": "Сума",
            "formula": "x", "column": "n"
        }"#;
        assert!(matches!(
            parse_preset_str(json),
            Err(KolonaError::PresetInvalid(_))
        ));
    }

    #[test]
    fn test_missing_source_rejected() {
        let json = r#"{ "name": "bad", "formula": "x", "column": "n" }"#;
        assert!(parse_preset_str(json).is_err());
    }

    #[test]
    fn test_zero_position_rejected() {
        let json = r#"{ "name": "bad", "position": 0, "formula": "x", "column": "n" }"#;
        assert!(parse_preset_str(json).is_err());
    }

    #[test]
    fn test_unparsable_formula_rejected() {
        let json = r#"{ "name": "bad", "position": 1, "formula": "open('x')", "column": "n" }"#;
        assert!(matches!(
            parse_preset_str(json),
            Err(KolonaError::PresetInvalid(_))
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let json = r#"{ "name": "bad", "position": 1, "formula": "x", "column": "n", "rate": 2 }"#;
        assert!(parse_preset_str(json).is_err());
    }

    #[test]
    fn test_load_preset_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"{ not json").unwrap();
        let err = load_preset_file(file.path()).unwrap_err();
        assert!(matches!(err, KolonaError::PresetLoad { .. }));
    }
}
