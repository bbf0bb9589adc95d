use kolona_core::error::KolonaError;
use kolona_core::model::Table;
use kolona_core::transform::presets::{self, Preset};
use kolona_core::transform::{CollisionPolicy, TransformOutcome, TransformSpec};
use std::path::PathBuf;

use crate::output;
use crate::{OutputArgs, TransformArgs};

/// Preset whose parameters fill in whatever the flags leave out.
const DEFAULT_PRESET: &str = "bgn-eur";

pub fn run(table_file: PathBuf, args: TransformArgs, out: OutputArgs) -> Result<(), KolonaError> {
    let json = std::fs::read_to_string(&table_file)?;
    let table: Table = serde_json::from_str(&json)?;

    let spec = match resolve_spec(&args)? {
        Some(spec) => spec,
        None => presets::load_preset(DEFAULT_PRESET)?.to_spec(policy(&args))?,
    };
    let outcome = kolona_core::apply_transform(&table, &spec)?;
    report(&spec, &outcome);

    output::emit(&outcome.table, &out)
}

/// Transform requested by the flags, if any. Flags override the preset.
pub fn resolve_spec(args: &TransformArgs) -> Result<Option<TransformSpec>, KolonaError> {
    let mut preset = match (&args.preset, &args.preset_file) {
        (Some(name), _) => presets::load_preset(name)?,
        (None, Some(path)) => presets::load_preset_file(path)?,
        (None, None) if requested(args) => presets::load_preset(DEFAULT_PRESET)?,
        (None, None) => return Ok(None),
    };

    apply_overrides(&mut preset, args);
    presets::validate_preset(&preset)?;
    Ok(Some(preset.to_spec(policy(args))?))
}

fn requested(args: &TransformArgs) -> bool {
    args.position.is_some() || args.column.is_some() || args.formula.is_some() || args.name.is_some()
}

fn apply_overrides(preset: &mut Preset, args: &TransformArgs) {
    if let Some(p) = args.position {
        preset.position = Some(p);
        preset.source_column = None;
    }
    if let Some(column) = &args.column {
        preset.source_column = Some(column.clone());
        preset.position = None;
    }
    if let Some(formula) = &args.formula {
        preset.formula = formula.clone();
    }
    if let Some(name) = &args.name {
        preset.column = name.clone();
    }
}

fn policy(args: &TransformArgs) -> CollisionPolicy {
    if args.replace {
        CollisionPolicy::Replace
    } else {
        CollisionPolicy::Reject
    }
}

pub fn report(spec: &TransformSpec, outcome: &TransformOutcome) {
    eprintln!(
        "Column '{}' from {}: {} computed, {} empty",
        spec.column.trim(),
        spec.source,
        outcome.computed,
        outcome.empty
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use kolona_core::transform::{ColumnPosition, SourceSelector};

    #[test]
    fn test_no_flags_no_transform() {
        assert!(resolve_spec(&TransformArgs::default()).unwrap().is_none());
    }

    #[test]
    fn test_flags_fill_from_default_preset() {
        let args = TransformArgs {
            formula: Some("x * 2".into()),
            ..TransformArgs::default()
        };
        let spec = resolve_spec(&args).unwrap().unwrap();
        assert_eq!(spec.formula, "x * 2");
        assert_eq!(spec.column, "Цена в евро");
        assert_eq!(
            spec.source,
            SourceSelector::Position(ColumnPosition::new(3).unwrap())
        );
    }

    #[test]
    fn test_column_flag_replaces_position() {
        let args = TransformArgs {
            column: Some("Сума".into()),
            replace: true,
            ..TransformArgs::default()
        };
        let spec = resolve_spec(&args).unwrap().unwrap();
        assert_eq!(spec.source, SourceSelector::Column("Сума".into()));
        assert_eq!(spec.on_collision, CollisionPolicy::Replace);
    }

    #[test]
    fn test_zero_position_rejected() {
        let args = TransformArgs {
            position: Some(0),
            ..TransformArgs::default()
        };
        assert!(resolve_spec(&args).is_err());
    }
}
