use thiserror::Error;

#[derive(Error, Debug)]
pub enum PucError {
    #[error("Error de base de datos: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error de CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Error al escribir XLSX: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Error de JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing or unreadable sheet; raised before any row is processed.
    #[error("Formato de archivo inválido: {0}")]
    FileFormat(String),

    /// Bad export filter; raised before any row is written.
    #[error("Filtro de exportación inválido: {0}")]
    ExportQuery(String),

    #[error("Cuenta no encontrada: {0}")]
    UnknownAccount(String),

    #[error("Error de configuración: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PucError>;
