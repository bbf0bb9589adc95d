use kolona_core::error::KolonaError;
use kolona_core::model::Table;

pub fn print(table: &Table) -> Result<(), KolonaError> {
    let json = serde_json::to_string_pretty(table)?;
    println!("{json}");
    Ok(())
}
