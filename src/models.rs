use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hierarchy::{self, AccountType, Level, NormalSide};

pub const MAX_NAME_LEN: usize = 500;
pub const DEFAULT_SHEET: &str = "PUC";
pub const DEFAULT_START_ROW: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Balances {
    pub opening: f64,
    pub closing: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movements {
    pub movement_id: Option<String>,
    pub debit_total: f64,
    pub credit_total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub operation_type: Option<String>,
    pub cost_center: Option<String>,
    pub type_code: Option<String>,
    pub aux_codes: [Option<String>; 4],
}

/// Tax-form flags carried on each account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalFlags {
    pub renta: bool,
    pub iva: bool,
    pub ica: bool,
    pub retencion: bool,
    pub exogena: bool,
}

impl FiscalFlags {
    pub fn as_array(&self) -> [bool; 5] {
        [self.renta, self.iva, self.ica, self.retencion, self.exogena]
    }

    pub fn from_array(flags: [bool; 5]) -> Self {
        let [renta, iva, ica, retencion, exogena] = flags;
        Self { renta, iva, ica, retencion, exogena }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fiscal {
    pub flags: FiscalFlags,
    pub note: Option<String>,
}

/// A persisted chart-of-accounts entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Option<i64>,
    pub code: String,
    pub name: String,
    pub level: Level,
    pub parent_code: Option<String>,
    pub account_type: AccountType,
    pub normal_side: NormalSide,
    pub active: bool,
    pub balances: Balances,
    pub movements: Movements,
    pub attributes: Attributes,
    pub fiscal: Fiscal,
}

impl Account {
    /// Builds an active account with every derived field computed from `code`.
    /// Returns `None` when the code is not a canonical PUC code.
    pub fn from_code(code: &str, name: &str) -> Option<Account> {
        let level = hierarchy::level(code)?;
        Some(Account {
            id: None,
            code: code.to_string(),
            name: name.to_string(),
            level,
            parent_code: hierarchy::parent_code(code),
            account_type: hierarchy::account_type(level),
            normal_side: hierarchy::normal_side(code)?,
            active: true,
            balances: Balances::default(),
            movements: Movements::default(),
            attributes: Attributes::default(),
            fiscal: Fiscal::default(),
        })
    }

    pub fn postable(&self) -> bool {
        self.level == Level::Detalle
    }

    pub fn status_label(&self) -> &'static str {
        if self.active {
            "ACTIVA"
        } else {
            "INACTIVA"
        }
    }
}

/// Parses `ACTIVA` / `INACTIVA` (case-insensitive).
pub fn parse_status(s: &str) -> Option<bool> {
    match s.trim().to_uppercase().as_str() {
        "ACTIVA" | "ACTIVO" => Some(true),
        "INACTIVA" | "INACTIVO" => Some(false),
        _ => None,
    }
}

/// Typed form of one spreadsheet row, produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    /// 1-based row number used in error messages.
    pub row: usize,
    pub code: String,
    pub name: String,
    /// `None` when the sheet left the status cell blank.
    pub active: Option<bool>,
    pub balances: Balances,
    pub movements: Movements,
    pub attributes: Attributes,
    pub fiscal: Fiscal,
}

impl CandidateRecord {
    pub fn new(row: usize, code: &str, name: &str) -> Self {
        Self {
            row,
            code: code.to_string(),
            name: name.to_string(),
            active: None,
            balances: Balances::default(),
            movements: Movements::default(),
            attributes: Attributes::default(),
            fiscal: Fiscal::default(),
        }
    }

    pub fn level(&self) -> Option<Level> {
        hierarchy::level(&self.code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    #[serde(rename = "hoja")]
    pub sheet: String,
    #[serde(rename = "fila_inicio")]
    pub start_row: usize,
    #[serde(rename = "sobreescribir")]
    pub overwrite: bool,
    #[serde(rename = "validar_jerarquia")]
    pub validate_hierarchy: bool,
    #[serde(rename = "importar_saldos")]
    pub import_balances: bool,
    #[serde(rename = "importar_fiscal")]
    pub import_fiscal: bool,
    /// Run the whole reconciliation in one transaction.
    #[serde(rename = "atomico")]
    pub atomic: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            sheet: DEFAULT_SHEET.to_string(),
            start_row: DEFAULT_START_ROW,
            overwrite: false,
            validate_hierarchy: true,
            import_balances: true,
            import_fiscal: true,
            atomic: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    #[serde(rename = "filtro_estado")]
    pub status: Option<String>,
    #[serde(rename = "filtro_tipo")]
    pub account_type: Option<String>,
    #[serde(rename = "filtro_clase")]
    pub class: Option<String>,
    #[serde(rename = "solo_movimientos")]
    pub postable_only: bool,
    #[serde(rename = "incluir_inactivas")]
    pub include_inactive: bool,
    #[serde(rename = "incluir_saldos")]
    pub include_balances: bool,
    #[serde(rename = "incluir_movimientos")]
    pub include_movements: bool,
    #[serde(rename = "incluir_fiscal")]
    pub include_fiscal: bool,
    #[serde(rename = "hoja")]
    pub sheet: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            status: None,
            account_type: None,
            class: None,
            postable_only: false,
            include_inactive: false,
            include_balances: true,
            include_movements: true,
            include_fiscal: true,
            sheet: DEFAULT_SHEET.to_string(),
        }
    }
}

/// Store-level query built from validated export options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFilter {
    pub active: Option<bool>,
    pub account_type: Option<AccountType>,
    pub class: Option<char>,
}

impl AccountFilter {
    pub fn matches(&self, account: &Account) -> bool {
        self.active.map_or(true, |a| account.active == a)
            && self.account_type.map_or(true, |t| account.account_type == t)
            && self.class.map_or(true, |c| account.code.starts_with(c))
    }
}

/// A problem tied to one sheet row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    #[serde(rename = "fila")]
    pub row: usize,
    pub error: String,
}

impl RowIssue {
    pub fn new(row: usize, error: impl Into<String>) -> Self {
        Self { row, error: error.into() }
    }
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fila {}: {}", self.row, self.error)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(rename = "es_valido")]
    pub valid: bool,
    #[serde(rename = "errores")]
    pub errors: Vec<RowIssue>,
    #[serde(rename = "advertencias")]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Errors rendered as `Fila <n>: <message>`.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    #[serde(rename = "total_procesadas")]
    pub processed: usize,
    #[serde(rename = "insertadas")]
    pub inserted: usize,
    #[serde(rename = "actualizadas")]
    pub updated: usize,
    #[serde(rename = "errores")]
    pub errored: usize,
    #[serde(rename = "omitidas")]
    pub skipped: usize,
}

/// Structured result returned for every import call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    #[serde(rename = "exito")]
    pub success: bool,
    #[serde(rename = "mensaje")]
    pub message: String,
    #[serde(rename = "resumen")]
    pub summary: ImportSummary,
    #[serde(rename = "errores")]
    pub errors: Vec<RowIssue>,
    #[serde(rename = "advertencias")]
    pub warnings: Vec<String>,
}

impl ImportOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }
}
