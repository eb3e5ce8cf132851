use std::path::PathBuf;

use comfy_table::Table;

use puc::db::get_connection;
use puc::fmt::format_bytes;
use puc::hierarchy::Level;
use puc::settings::{load_settings, settings_file_exists};
use puc::Result;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = PathBuf::from(&settings.data_dir);
    let db_path = settings.db_path();

    println!("Datos:          {}", data_dir.display());
    println!("Base de datos:  {}", db_path.display());
    println!("Hoja:           {} (desde la fila {})", settings.default_sheet, settings.start_row);
    if !settings_file_exists() {
        println!("Configuración:  (valores por defecto, sin guardar)");
    }

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("Tamaño:         {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let total: i64 = conn.query_row("SELECT count(*) FROM accounts", [], |r| r.get(0))?;
        let inactive: i64 =
            conn.query_row("SELECT count(*) FROM accounts WHERE is_active = 0", [], |r| r.get(0))?;

        let mut table = Table::new();
        table.set_header(vec!["Nivel", "Cuentas"]);
        for level in Level::ALL {
            let count: i64 = conn.query_row(
                "SELECT count(*) FROM accounts WHERE level = ?1",
                [level.number()],
                |r| r.get(0),
            )?;
            table.add_row(vec![level.label().to_string(), count.to_string()]);
        }

        println!();
        println!("Cuentas:        {total} ({inactive} inactivas)");
        println!("{table}");
    } else {
        println!();
        println!("No se encontró la base de datos. Ejecute `puc init`.");
    }

    Ok(())
}
