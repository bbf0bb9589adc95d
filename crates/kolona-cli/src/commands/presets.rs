use kolona_core::error::KolonaError;
use kolona_core::transform::presets;
use std::path::Path;

pub fn list() -> Result<(), KolonaError> {
    println!("Available presets:\n");
    for name in presets::PRESETS {
        let preset = presets::load_preset(name)?;
        let source = match (&preset.position, &preset.source_column) {
            (Some(p), _) => format!("position {p} from the right"),
            (None, Some(column)) => format!("column '{column}'"),
            (None, None) => "?".to_string(),
        };
        println!(
            "  {:<8} {} = {} ({})",
            name, preset.column, preset.formula, source
        );
        if let Some(ref desc) = preset.description {
            println!("           {desc}");
        }
        println!();
    }
    Ok(())
}

pub fn show(name: &str) -> Result<(), KolonaError> {
    let preset = presets::load_preset(name)?;
    println!("{}", serde_json::to_string_pretty(&preset)?);
    Ok(())
}

pub fn validate(path: &Path) -> Result<(), KolonaError> {
    let preset = presets::load_preset_file(path)?;
    println!(
        "OK: preset '{}' adds column '{}' = {}",
        preset.name, preset.column, preset.formula
    );
    Ok(())
}
