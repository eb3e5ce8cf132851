pub mod accounts;
pub mod derive;
pub mod export;
pub mod import;
pub mod init;
pub mod status;

use clap::{Parser, Subcommand};

use puc::settings::{load_settings, Settings};
use puc::store::SqliteStore;
use puc::Result;

/// Opens the configured database, creating the schema if needed.
pub(crate) fn open_store() -> Result<(Settings, SqliteStore)> {
    let settings = load_settings();
    let db_path = settings.db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteStore::open(&db_path)?;
    Ok((settings, store))
}

#[derive(Parser)]
#[command(name = "puc", about = "Importación, exportación y jerarquía del Plan Único de Cuentas (PUC).")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Elige el directorio de datos e inicializa la base de datos.
    Init {
        /// Directorio de datos (por defecto: ~/Documents/puc)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Importa cuentas desde un archivo XLSX/XLS/ODS/CSV.
    Import {
        /// Ruta de la hoja de cálculo
        file: String,
        /// Nombre de la hoja (por defecto el de la configuración, normalmente PUC)
        #[arg(long)]
        sheet: Option<String>,
        /// Primera fila de datos, desde 1 (por defecto 3)
        #[arg(long = "start-row")]
        start_row: Option<usize>,
        /// Actualiza las cuentas existentes en lugar de omitirlas
        #[arg(long)]
        overwrite: bool,
        /// No exige que las cuentas padre estén en el archivo
        #[arg(long = "no-hierarchy")]
        no_hierarchy: bool,
        /// Ignora las columnas de saldos
        #[arg(long = "no-balances")]
        no_balances: bool,
        /// Ignora las columnas fiscales
        #[arg(long = "no-fiscal")]
        no_fiscal: bool,
        /// Todo o nada: revierte todos los cambios si alguna fila falla
        #[arg(long)]
        atomic: bool,
        /// Imprime el resultado en JSON
        #[arg(long)]
        json: bool,
    },
    /// Valida un archivo sin importarlo.
    Validate {
        /// Ruta de la hoja de cálculo
        file: String,
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long = "start-row")]
        start_row: Option<usize>,
        #[arg(long = "no-hierarchy")]
        no_hierarchy: bool,
        #[arg(long)]
        json: bool,
    },
    /// Exporta las cuentas a XLSX con el formato de importación.
    Export {
        /// Archivo de salida (por defecto: <datos>/exports/puc-AAAA-MM-DD.xlsx)
        #[arg(long)]
        output: Option<String>,
        /// Filtro de estado: ACTIVA o INACTIVA
        #[arg(long)]
        status: Option<String>,
        /// Filtro de tipo: MADRE o DETALLE
        #[arg(long = "type")]
        account_type: Option<String>,
        /// Filtro de clase: un dígito de 1 a 9
        #[arg(long)]
        class: Option<String>,
        /// Solo cuentas que reciben movimientos (nivel 5)
        #[arg(long = "postable-only")]
        postable_only: bool,
        /// Incluye cuentas inactivas
        #[arg(long = "include-inactive")]
        include_inactive: bool,
        #[arg(long = "no-balances")]
        no_balances: bool,
        #[arg(long = "no-movements")]
        no_movements: bool,
        #[arg(long = "no-fiscal")]
        no_fiscal: bool,
    },
    /// Genera una plantilla de importación vacía.
    Template {
        /// Archivo de salida (por defecto: <datos>/exports/plantilla-puc.xlsx)
        #[arg(long)]
        output: Option<String>,
    },
    /// Consulta las cuentas guardadas.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Muestra nivel, padre, naturaleza y tipo derivados de un código.
    Derive {
        /// Código de cuenta, p. ej. 110505
        code: String,
    },
    /// Muestra la configuración y un resumen de la base de datos.
    Status,
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Lista las cuentas en orden de código.
    List {
        /// Filtro de clase: un dígito de 1 a 9
        #[arg(long)]
        class: Option<String>,
        #[arg(long = "include-inactive")]
        include_inactive: bool,
    },
    /// Imprime la jerarquía, opcionalmente desde un código raíz.
    Tree {
        root: Option<String>,
        /// Profundidad máxima
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Muestra una cuenta con sus ancestros y subcuentas.
    Show { code: String },
}
