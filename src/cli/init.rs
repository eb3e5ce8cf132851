use std::path::PathBuf;

use puc::db::{get_connection, init_db};
use puc::settings::{load_settings, save_settings, shellexpand_path};
use puc::Result;

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }

    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(resolved.join("exports"))?;

    let conn = get_connection(&settings.db_path())?;
    init_db(&conn)?;

    println!("PUC inicializado en {}", resolved.display());
    Ok(())
}
