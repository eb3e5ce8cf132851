use std::path::PathBuf;

use puc::exporter::{export_accounts, export_template};
use puc::models::ExportOptions;
use puc::settings::{get_data_dir, load_settings};
use puc::Result;

use super::open_store;

fn resolve_output(output: Option<String>, file_name: String) -> Result<PathBuf> {
    match output {
        Some(path) => Ok(PathBuf::from(path)),
        None => {
            let dir = get_data_dir().join("exports");
            std::fs::create_dir_all(&dir)?;
            Ok(dir.join(file_name))
        }
    }
}

pub fn run(mut options: ExportOptions, output: Option<String>) -> Result<()> {
    let (settings, store) = open_store()?;
    options.sheet = settings.default_sheet.clone();

    let buffer = export_accounts(&store, &options)?;
    let today = chrono::Local::now().format("%Y-%m-%d");
    let path = resolve_output(output, format!("puc-{today}.xlsx"))?;
    std::fs::write(&path, &buffer)?;

    println!("Exportado a {}", path.display());
    Ok(())
}

pub fn template(output: Option<String>) -> Result<()> {
    let settings = load_settings();
    let buffer = export_template(&settings.default_sheet)?;
    let path = resolve_output(output, "plantilla-puc.xlsx".to_string())?;
    std::fs::write(&path, &buffer)?;

    println!("Plantilla guardada en {}", path.display());
    Ok(())
}
